// SPDX-License-Identifier: MIT OR Apache-2.0
//! Data sub-packet terminator types (§4.1, §4.4.4, GLOSSARY).

use core::convert::TryFrom;
use core::fmt::{self, Display};

#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Terminates a ZMODEM data sub-packet and tells the receiver how the
/// sender intends to continue.
pub enum Packet {
    /// End of frame/file; receiver should stop reading data.
    ZCRCE = 0x68,
    /// Continue streaming; no ACK expected.
    ZCRCG = 0x69,
    /// Continue streaming; sender wants an ACK.
    ZCRCQ = 0x6a,
    /// Continue streaming; sender will wait for an ACK before sending more.
    ZCRCW = 0x6b,
}

const PACKETS: &[Packet] = &[Packet::ZCRCE, Packet::ZCRCG, Packet::ZCRCQ, Packet::ZCRCW];

/// Marker error: a byte following `ZDLE` in `DATA` pstate was not one of
/// the four recognized sub-packet terminators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotAPacketType;

impl Packet {
    /// CRC trailer length in bytes (including the terminator byte already
    /// consumed) for the given 32-bit-CRC flag: 5 for CRC-32, 3 for CRC-16.
    pub fn ncrc(crc32: bool) -> u32 {
        if crc32 {
            5
        } else {
            3
        }
    }
}

impl TryFrom<u8> for Packet {
    type Error = NotAPacketType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PACKETS
            .iter()
            .find(|p| value == **p as u8)
            .copied()
            .ok_or(NotAPacketType)
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#02x}", *self as u8)
    }
}
