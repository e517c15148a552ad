// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire-level constants for the ZMODEM protocol: control bytes, header and
//! sub-packet type codes, and capability bits. Values are taken from the
//! 1988 Forsberg specification and must match exactly.

/// Header and data-packet lead-in byte.
pub const ZPAD: u8 = b'*';
/// ZMODEM Data Link Escape.
pub const ZDLE: u8 = 0x18;
/// Escaped form of a byte whose low 7 bits equal `ZDLE`.
pub const ZDLEE: u8 = 0x58;

pub const XON: u8 = 0x11;
pub const XOFF: u8 = 0x13;
pub const CAN: u8 = 0x18;
pub const BS: u8 = 0x08;
pub const DEL: u8 = 0x7F;
pub const DLE: u8 = 0x10;
pub const GS: u8 = 0x1D;

/// Escaped forms of `DEL` and `0xFF`.
pub const ZRUB0: u8 = b'l';
pub const ZRUB1: u8 = b'm';

/// Number of consecutive `CAN` bytes that constitute a cancel request.
pub const CANCEL_COUNT: u32 = 5;

/// Default receiver capability advertisement: full duplex, overlapped I/O,
/// 32-bit frame check.
pub const DEFAULT_RCAPS: u8 = Zrinit::CANFDX.bits() | Zrinit::CANOVIO.bits() | Zrinit::CANFC32.bits();

/// Default maximum consecutive data-CRC errors before the session aborts.
pub const DEFAULT_MAX_ERRORS: u32 = 20;

/// Default response window, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u32 = 10;

/// Default connect window, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u32 = 30;

/// Default receiver serial number echoed in a `ZSINIT` `ZACK`.
pub const DEFAULT_SERIAL: u32 = 1;

/// Internal `pktbuf` capacity: the largest data sub-packet the parser can
/// assemble. Must be at least 1024 per spec; distinct from the advertised
/// `ZRINIT` packet-size tunable ([`DEFAULT_PKTSIZE`]).
pub const DEFAULT_PACKET_BUFFER_SIZE: usize = 2048;

/// Default advertised `ZRINIT` packet-buffer size (the sender's preferred
/// sub-packet length), distinct from the parser's own buffer capacity.
pub const DEFAULT_PKTSIZE: u32 = 512;

bitflags::bitflags! {
    /// `ZRINIT` capability flags (receiver -> sender).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Zrinit: u8 {
        /// Can send and receive in full-duplex.
        const CANFDX = 0x01;
        /// Can receive data in parallel with disk I/O.
        const CANOVIO = 0x02;
        /// Can send a break signal.
        const CANBRK = 0x04;
        /// Can decrypt.
        const CANCRY = 0x08;
        /// Can uncompress.
        const CANLZW = 0x10;
        /// Can use 32-bit frame check.
        const CANFC32 = 0x20;
        /// Expects control characters to be escaped.
        const ESCALL = 0x40;
        /// Expects the 8th bit to be escaped.
        const ESC8 = 0x80;
    }
}

bitflags::bitflags! {
    /// `ZSINIT` capability flags (sender -> receiver).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Zsinit: u8 {
        /// Sender requests control characters to be escaped.
        const TESCCTL = 0x40;
        /// Sender requests the 8th bit to be escaped.
        const TESC8 = 0x80;
    }
}

/// `ZFILE` management sub-field (low nibble of the 4th header byte).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum ZmMode {
    ZMNEW = 1,
    ZMCRC = 2,
    ZMAPND = 3,
    ZMCLOB = 4,
    ZMNEWL = 5,
    ZMDIFF = 6,
    ZMPROT = 7,
    ZMCHNG = 8,
}

pub const ZMMASK: u8 = 0x1F;

impl ZmMode {
    pub fn from_byte(b: u8) -> Option<ZmMode> {
        match b & ZMMASK {
            1 => Some(ZmMode::ZMNEW),
            2 => Some(ZmMode::ZMCRC),
            3 => Some(ZmMode::ZMAPND),
            4 => Some(ZmMode::ZMCLOB),
            5 => Some(ZmMode::ZMNEWL),
            6 => Some(ZmMode::ZMDIFF),
            7 => Some(ZmMode::ZMPROT),
            8 => Some(ZmMode::ZMCHNG),
            _ => None,
        }
    }
}

/// `ZFILE` conversion sub-field (3rd header byte).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum ZConv {
    ZCBIN = 1,
    ZCNL = 2,
    ZCRESUM = 3,
}

impl ZConv {
    pub fn from_byte(b: u8) -> Option<ZConv> {
        match b {
            1 => Some(ZConv::ZCBIN),
            2 => Some(ZConv::ZCNL),
            3 => Some(ZConv::ZCRESUM),
            _ => None,
        }
    }
}
