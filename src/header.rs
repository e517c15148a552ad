// SPDX-License-Identifier: MIT OR Apache-2.0
//! The three ZMODEM header formats (§4.2): `ZBIN`, `ZBIN32`, `ZHEX`. Builds
//! the outbound byte sequence for a header and verifies the CRC of a
//! fully-assembled incoming one.

use core::convert::TryFrom;
use core::fmt::{self, Display};
use tinyvec::ArrayVec;

use crate::consts::{XON, ZDLE, ZPAD};
use crate::crc::{check_crc16, check_crc32};
use crate::escape::Encoder;

/// Enough capacity for the longest escaped/hex-encoded header plus trailer.
const HEADER_BUF_SIZE: usize = 32;

#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Frame encoding: how the header's type/payload/CRC bytes are represented
/// on the wire.
pub enum Encoding {
    ZBIN = 0x41,
    ZHEX = 0x42,
    ZBIN32 = 0x43,
}

const ENCODINGS: &[Encoding] = &[Encoding::ZBIN, Encoding::ZHEX, Encoding::ZBIN32];

/// Marker error: a byte was not one of the three recognized encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotAnEncoding;

impl TryFrom<u8> for Encoding {
    type Error = NotAnEncoding;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ENCODINGS
            .iter()
            .find(|e| value == **e as u8)
            .copied()
            .ok_or(NotAnEncoding)
    }
}

impl Encoding {
    /// Number of CRC bytes carried by this encoding (already hex-expanded
    /// for `ZHEX`, i.e. this is the count of *logical* CRC bytes).
    pub fn crc_len(self) -> usize {
        match self {
            Encoding::ZBIN32 => 4,
            _ => 2,
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#02x}", *self as u8)
    }
}

#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// ZMODEM header (frame) types.
pub enum Frame {
    /// Request receive init.
    ZRQINIT = 0,
    /// Receiver capabilities and packet size.
    ZRINIT = 1,
    /// Send init sequence (optional).
    ZSINIT = 2,
    /// ACK to above.
    ZACK = 3,
    /// File name from sender.
    ZFILE = 4,
    /// To sender: skip this file.
    ZSKIP = 5,
    /// Last packet was garbled.
    ZNAK = 6,
    /// Abort batch transfers.
    ZABORT = 7,
    /// Finish session.
    ZFIN = 8,
    /// Resume data transfer at this position.
    ZRPOS = 9,
    /// Data packet(s) follow.
    ZDATA = 10,
    /// End of file.
    ZEOF = 11,
    /// Fatal read or write error detected.
    ZFERR = 12,
    /// Request for file CRC and response.
    ZCRC = 13,
    /// Receiver's challenge.
    ZCHALLENGE = 14,
    /// Request is complete.
    ZCOMPL = 15,
    /// Other end canceled session with CAN*5.
    ZCAN = 16,
    /// Request for free bytes on filesystem.
    ZFREECNT = 17,
    /// Command from sending program.
    ZCOMMAND = 18,
    /// Output to standard error, data follows.
    ZSTDERR = 19,
}

const FRAMES: &[Frame] = &[
    Frame::ZRQINIT,
    Frame::ZRINIT,
    Frame::ZSINIT,
    Frame::ZACK,
    Frame::ZFILE,
    Frame::ZSKIP,
    Frame::ZNAK,
    Frame::ZABORT,
    Frame::ZFIN,
    Frame::ZRPOS,
    Frame::ZDATA,
    Frame::ZEOF,
    Frame::ZFERR,
    Frame::ZCRC,
    Frame::ZCHALLENGE,
    Frame::ZCOMPL,
    Frame::ZCAN,
    Frame::ZFREECNT,
    Frame::ZCOMMAND,
    Frame::ZSTDERR,
];

/// Marker error: a byte was not one of the twenty recognized frame types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotAFrame;

impl TryFrom<u8> for Frame {
    type Error = NotAFrame;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FRAMES
            .iter()
            .find(|t| value == **t as u8)
            .copied()
            .ok_or(NotAFrame)
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#02x}", *self as u8)
    }
}

/// A decoded or to-be-encoded ZMODEM header: a frame type plus 4 payload
/// bytes (§3 `hdrdata`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub frame: Frame,
    pub payload: [u8; 4],
}

impl Header {
    pub const fn new(frame: Frame, payload: [u8; 4]) -> Self {
        Self { frame, payload }
    }

    pub const fn with_count(frame: Frame, count: u32) -> Self {
        Self {
            frame,
            payload: count.to_le_bytes(),
        }
    }

    /// Decodes the payload as a little-endian 32-bit count (offset, serial
    /// number, errno, ...), per §4.3's internal byte-ordering convention.
    pub fn count(&self) -> u32 {
        u32::from_le_bytes(self.payload)
    }

    /// Assembles the 5 CRC-covered bytes: type followed by payload.
    fn crc_input(&self) -> [u8; 5] {
        let mut buf = [0u8; 5];
        buf[0] = self.frame as u8;
        buf[1..].copy_from_slice(&self.payload);
        buf
    }

    /// Verifies a fully-assembled header's CRC. `raw` is the 5
    /// type||payload bytes; `crc` is the received CRC bytes (2 for
    /// `ZBIN`/`ZHEX`, 4 for `ZBIN32`).
    pub fn verify_crc(encoding: Encoding, raw: &[u8; 5], crc: &[u8]) -> bool {
        match encoding {
            Encoding::ZBIN32 => check_crc32(raw, crc),
            _ => check_crc16(raw, crc),
        }
    }

    /// Builds a `Header` from already-validated raw type/payload bytes.
    /// Returns `None` if `raw[0]` is not a recognized frame type.
    pub fn from_raw(raw: &[u8; 5]) -> Option<Header> {
        let frame = Frame::try_from(raw[0]).ok()?;
        let mut payload = [0u8; 4];
        payload.copy_from_slice(&raw[1..]);
        Some(Header { frame, payload })
    }

    /// Encodes this header for transmission in the given `encoding`,
    /// returning the complete on-wire byte sequence (lead-in, escaped or
    /// hex body, CRC, and any trailer).
    pub fn encode(&self, encoding: Encoding, escctrl: bool) -> ArrayVec<[u8; HEADER_BUF_SIZE]> {
        let raw = self.crc_input();
        let mut out: ArrayVec<[u8; HEADER_BUF_SIZE]> = ArrayVec::new();

        out.push(ZPAD);
        if encoding == Encoding::ZHEX {
            out.push(ZPAD);
        }
        out.push(ZDLE);
        out.push(encoding as u8);

        match encoding {
            Encoding::ZHEX => {
                let crc = crate::crc::crc16(&raw).to_be_bytes();
                let mut hexbuf = [0u8; 14];
                hex::encode_to_slice(raw, &mut hexbuf[..10]).expect("fixed-size buffer");
                hex::encode_to_slice(crc, &mut hexbuf[10..]).expect("fixed-size buffer");
                out.extend_from_slice(&hexbuf);
                out.push(b'\r');
                out.push(b'\n');
                if self.frame != Frame::ZACK && self.frame != Frame::ZFIN {
                    out.push(XON);
                }
            }
            Encoding::ZBIN => {
                let crc = crate::crc::crc16(&raw).to_be_bytes();
                let mut enc = Encoder::new();
                enc.encode_slice(&raw, escctrl, &mut out);
                enc.encode_slice(&crc, escctrl, &mut out);
            }
            Encoding::ZBIN32 => {
                let crc = crate::crc::crc32(&raw).to_le_bytes();
                let mut enc = Encoder::new();
                enc.encode_slice(&raw, escctrl, &mut out);
                enc.encode_slice(&crc, escctrl, &mut out);
            }
        }

        out
    }
}
