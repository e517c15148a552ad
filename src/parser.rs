// SPDX-License-Identifier: MIT OR Apache-2.0
//! The incremental byte parser (component D, §4.4): consumes raw input one
//! byte at a time, decodes the `ZDLE` escape convention, and emits
//! [`ParserEvent`]s for the session state machine to act on. Holds no
//! transport handle and performs no I/O of its own.

use core::convert::TryFrom;
use tinyvec::ArrayVec;

use crate::consts::{CAN, CANCEL_COUNT, XOFF, XON, ZDLE, ZPAD};
use crate::header::{Encoding, Header};
use crate::packet::Packet;

/// Low-level parse state (§3 `pstate`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PState {
    Idle,
    Header,
    Data,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdleSub {
    Zpad,
    Zdle,
    /// Saw one `O` while the `OO` flag is armed; waiting for the second.
    Oo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HeaderSub {
    Format,
    Payload,
    /// `ZHEX` only: waiting for the low nibble to complete a byte.
    LsPayload,
}

/// Outcome of feeding one byte to the parser. Anything other than `None`
/// is a semantic event the session state machine (or, for header CRC
/// failures, the facade loop directly) must act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserEvent {
    /// Nothing reached completion yet; keep feeding bytes.
    None,
    /// A complete header passed CRC verification.
    HeaderReceived { hdrfmt: Encoding, header: Header },
    /// A complete header failed CRC verification or carried an invalid
    /// frame type; `ZNAK` must be sent and no session state change made.
    HeaderBadCrc,
    /// A complete data sub-packet was assembled; `ok` reflects the CRC
    /// check (`CRKOK`). The payload is in [`Parser::packet`].
    DataReceived { ok: bool },
    /// A data sub-packet overflowed the packet buffer: protocol violation,
    /// the session must abort.
    Overflow,
    /// Five consecutive `CAN` bytes were observed.
    Cancel,
    /// The `"OO"` batch trailer was observed (only armed while the `OO`
    /// session flag is set).
    Oo,
}

/// Parser (§3 `pstate`/`psubstate`/`hdrdata`/`hdrndx`/`pktbuf`/`pktlen`/
/// `pkttype`/`ncrc`/`ncan`). Owned by [`crate::session::Session`] as part of
/// its single data-model record; kept in its own type because it is the
/// unit the property tests in §8 exercise directly.
pub struct Parser {
    pstate: PState,
    idle_sub: IdleSub,
    header_sub: HeaderSub,
    esc: bool,
    hdrfmt: Option<Encoding>,
    /// Type byte (index 0) plus 4 payload bytes.
    hdrdata: [u8; 5],
    hdrcrc: [u8; 4],
    hdrndx: usize,
    hex_high_nibble: Option<u8>,
    pktbuf: ArrayVec<[u8; crate::consts::DEFAULT_PACKET_BUFFER_SIZE]>,
    pkttype: Option<Packet>,
    crc32: bool,
    ncrc: u32,
    ncan: u32,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            pstate: PState::Idle,
            idle_sub: IdleSub::Zpad,
            header_sub: HeaderSub::Format,
            esc: false,
            hdrfmt: None,
            hdrdata: [0; 5],
            hdrcrc: [0; 4],
            hdrndx: 0,
            hex_high_nibble: None,
            pktbuf: ArrayVec::new(),
            pkttype: None,
            crc32: false,
            ncrc: 0,
            ncan: 0,
        }
    }

    pub fn pstate(&self) -> PState {
        self.pstate
    }

    /// The payload of the most recently completed data sub-packet.
    pub fn packet(&self) -> &[u8] {
        &self.pktbuf
    }

    pub fn packet_type(&self) -> Option<Packet> {
        self.pkttype
    }

    /// Invoked by a session action (`zmr_zdata`, `zmr_zfile`, `zmr_zsinit`,
    /// ...) to switch the parser into `DATA` pstate for the sub-packet that
    /// follows a header, per the encoding that header was sent in.
    pub fn enter_data_state(&mut self, encoding: Encoding) {
        self.pstate = PState::Data;
        self.esc = false;
        self.pktbuf.clear();
        self.pkttype = None;
        self.crc32 = encoding == Encoding::ZBIN32;
        self.ncrc = 0;
    }

    /// Returns the parser to `IDLE/ZPAD`, as required after every header or
    /// data sub-packet completion (§3 invariant 4).
    fn return_to_idle(&mut self) {
        self.pstate = PState::Idle;
        self.idle_sub = IdleSub::Zpad;
        self.esc = false;
        self.hdrndx = 0;
        self.hex_high_nibble = None;
    }

    /// Arms the `IDLE/OO` sub-state so a subsequent `"OO"` is recognized.
    /// The caller (session) owns the `OO` flag itself; this only affects
    /// how the *next* `feed_byte` call interprets `O` bytes when `armed`.
    pub fn feed_byte(&mut self, byte: u8, oo_armed: bool) -> ParserEvent {
        if byte == CAN {
            self.ncan += 1;
            if self.ncan >= CANCEL_COUNT {
                self.ncan = 0;
                return ParserEvent::Cancel;
            }
        } else {
            self.ncan = 0;
        }

        if !self.esc && (byte == XON || byte == XOFF) {
            return ParserEvent::None;
        }

        match self.pstate {
            PState::Idle => self.feed_idle(byte, oo_armed),
            PState::Header => self.feed_header(byte),
            PState::Data => self.feed_data(byte),
        }
    }

    fn feed_idle(&mut self, byte: u8, oo_armed: bool) -> ParserEvent {
        match self.idle_sub {
            IdleSub::Zpad => {
                if byte == ZPAD {
                    self.idle_sub = IdleSub::Zdle;
                } else if byte == b'O' && oo_armed {
                    self.idle_sub = IdleSub::Oo;
                }
                ParserEvent::None
            }
            IdleSub::Zdle => {
                if byte == ZDLE {
                    self.pstate = PState::Header;
                    self.header_sub = HeaderSub::Format;
                    self.hdrndx = 0;
                    self.esc = false;
                } else if byte == ZPAD {
                    // stay in Zdle, a repeated ZPAD (as in ZHEX lead-in)
                } else {
                    self.idle_sub = IdleSub::Zpad;
                }
                ParserEvent::None
            }
            IdleSub::Oo => {
                self.idle_sub = IdleSub::Zpad;
                if byte == b'O' {
                    ParserEvent::Oo
                } else if byte == ZPAD {
                    self.idle_sub = IdleSub::Zdle;
                    ParserEvent::None
                } else {
                    ParserEvent::None
                }
            }
        }
    }

    fn feed_header(&mut self, byte: u8) -> ParserEvent {
        match self.header_sub {
            HeaderSub::Format => match Encoding::try_from(byte) {
                Ok(encoding) => {
                    self.hdrfmt = Some(encoding);
                    self.hdrndx = 0;
                    self.header_sub = HeaderSub::Payload;
                    ParserEvent::None
                }
                Err(_) => {
                    self.return_to_idle();
                    ParserEvent::HeaderBadCrc
                }
            },
            HeaderSub::Payload if self.hdrfmt == Some(Encoding::ZHEX) => {
                match hex_nibble(byte) {
                    Some(nibble) => {
                        self.hex_high_nibble = Some(nibble);
                        self.header_sub = HeaderSub::LsPayload;
                        ParserEvent::None
                    }
                    None => {
                        self.return_to_idle();
                        ParserEvent::HeaderBadCrc
                    }
                }
            }
            HeaderSub::LsPayload => {
                let high = self.hex_high_nibble.take().unwrap_or(0);
                match hex_nibble(byte) {
                    Some(low) => {
                        let value = (high << 4) | low;
                        self.push_header_byte(value);
                        self.header_sub = HeaderSub::Payload;
                        self.try_complete_header()
                    }
                    None => {
                        self.return_to_idle();
                        ParserEvent::HeaderBadCrc
                    }
                }
            }
            HeaderSub::Payload => {
                // ZBIN / ZBIN32: apply ZDLE-escape decoding one byte at a time.
                if self.esc {
                    self.esc = false;
                    self.push_header_byte(crate::escape::unescape(byte));
                    self.try_complete_header()
                } else if byte == ZDLE {
                    self.esc = true;
                    ParserEvent::None
                } else {
                    self.push_header_byte(byte);
                    self.try_complete_header()
                }
            }
        }
    }

    /// Appends one decoded byte to the combined `hdrdata`/CRC region.
    fn push_header_byte(&mut self, value: u8) {
        if self.hdrndx < 5 {
            self.hdrdata[self.hdrndx] = value;
        } else {
            self.hdrcrc[self.hdrndx - 5] = value;
        }
        self.hdrndx += 1;
    }

    fn try_complete_header(&mut self) -> ParserEvent {
        let encoding = self.hdrfmt.expect("hdrfmt set before Payload sub-state");
        let needed = 5 + encoding.crc_len();
        if self.hdrndx < needed {
            return ParserEvent::None;
        }

        let crc_ok = Header::verify_crc(encoding, &self.hdrdata, &self.hdrcrc[..encoding.crc_len()]);
        self.return_to_idle();
        if !crc_ok {
            return ParserEvent::HeaderBadCrc;
        }
        match Header::from_raw(&self.hdrdata) {
            Some(header) => ParserEvent::HeaderReceived {
                hdrfmt: encoding,
                header,
            },
            None => ParserEvent::HeaderBadCrc,
        }
    }

    fn feed_data(&mut self, byte: u8) -> ParserEvent {
        if self.ncrc > 0 {
            return self.feed_data_crc(byte);
        }

        if self.esc {
            self.esc = false;
            if let Ok(packet) = Packet::try_from(byte) {
                self.pkttype = Some(packet);
                if self.pktbuf.try_push(byte).is_some() {
                    return self.abort_overflow();
                }
                self.ncrc = Packet::ncrc(self.crc32);
                return ParserEvent::None;
            }
            return self.push_packet_byte(crate::escape::unescape(byte));
        }

        if byte == ZDLE {
            self.esc = true;
            return ParserEvent::None;
        }

        self.push_packet_byte(byte)
    }

    fn feed_data_crc(&mut self, byte: u8) -> ParserEvent {
        let decoded = if self.esc {
            self.esc = false;
            crate::escape::unescape(byte)
        } else if byte == ZDLE {
            self.esc = true;
            return ParserEvent::None;
        } else {
            byte
        };

        if self.pktbuf.try_push(decoded).is_some() {
            return self.abort_overflow();
        }
        self.ncrc -= 1;

        if self.ncrc == 1 {
            let crc_width = if self.crc32 { 4 } else { 2 };
            let total = self.pktbuf.len();
            let crc_start = total - crc_width;
            let ok = if self.crc32 {
                crate::crc::check_crc32(&self.pktbuf[..crc_start], &self.pktbuf[crc_start..])
            } else {
                crate::crc::check_crc16(&self.pktbuf[..crc_start], &self.pktbuf[crc_start..])
            };
            // Exclude the terminator byte and CRC from the delivered payload.
            self.pktbuf.truncate(crc_start - 1);
            self.ncrc = 0;
            self.return_to_idle();
            return ParserEvent::DataReceived { ok };
        }

        ParserEvent::None
    }

    fn push_packet_byte(&mut self, value: u8) -> ParserEvent {
        if self.pktbuf.try_push(value).is_some() {
            return self.abort_overflow();
        }
        ParserEvent::None
    }

    fn abort_overflow(&mut self) -> ParserEvent {
        self.pktbuf.clear();
        self.return_to_idle();
        ParserEvent::Overflow
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Frame;

    fn feed_all(parser: &mut Parser, bytes: &[u8]) -> Vec<ParserEvent> {
        bytes
            .iter()
            .map(|&b| parser.feed_byte(b, false))
            .filter(|e| *e != ParserEvent::None)
            .collect()
    }

    #[test]
    fn header_round_trip_zbin() {
        let header = Header::with_count(Frame::ZRINIT, 0x0403_0201);
        let encoded = header.encode(Encoding::ZBIN, false);
        let mut parser = Parser::new();
        let events = feed_all(&mut parser, &encoded);
        assert_eq!(
            events,
            vec![ParserEvent::HeaderReceived {
                hdrfmt: Encoding::ZBIN,
                header,
            }]
        );
    }

    #[test]
    fn header_round_trip_zbin32() {
        let header = Header::with_count(Frame::ZDATA, 42);
        let encoded = header.encode(Encoding::ZBIN32, false);
        let mut parser = Parser::new();
        let events = feed_all(&mut parser, &encoded);
        assert_eq!(
            events,
            vec![ParserEvent::HeaderReceived {
                hdrfmt: Encoding::ZBIN32,
                header,
            }]
        );
    }

    #[test]
    fn header_round_trip_zhex() {
        let header = Header::with_count(Frame::ZRPOS, 7);
        let encoded = header.encode(Encoding::ZHEX, false);
        let mut parser = Parser::new();
        let events = feed_all(&mut parser, &encoded);
        assert_eq!(
            events,
            vec![ParserEvent::HeaderReceived {
                hdrfmt: Encoding::ZHEX,
                header,
            }]
        );
    }

    #[test]
    fn corrupted_header_crc_is_rejected() {
        let header = Header::with_count(Frame::ZRINIT, 1);
        let mut encoded = header.encode(Encoding::ZBIN, false);
        *encoded.last_mut().unwrap() ^= 0xFF;
        let mut parser = Parser::new();
        let events = feed_all(&mut parser, &encoded);
        assert_eq!(events, vec![ParserEvent::HeaderBadCrc]);
    }

    #[test]
    fn fragmentation_does_not_change_event_sequence() {
        let header = Header::with_count(Frame::ZFILE, 99);
        let encoded = header.encode(Encoding::ZHEX, false);

        let mut whole = Parser::new();
        let whole_events = feed_all(&mut whole, &encoded);

        for split in 1..encoded.len() {
            let mut fragmented = Parser::new();
            let mut events = Vec::new();
            for &b in &encoded[..split] {
                let e = fragmented.feed_byte(b, false);
                if e != ParserEvent::None {
                    events.push(e);
                }
            }
            for &b in &encoded[split..] {
                let e = fragmented.feed_byte(b, false);
                if e != ParserEvent::None {
                    events.push(e);
                }
            }
            assert_eq!(events, whole_events, "split at {split}");
        }
    }

    #[test]
    fn five_consecutive_cans_raise_one_cancel_regardless_of_count() {
        for n in 5..12 {
            let mut parser = Parser::new();
            let bytes = vec![CAN; n];
            let events = feed_all(&mut parser, &bytes);
            assert_eq!(events, vec![ParserEvent::Cancel], "n={n}");
        }
    }

    #[test]
    fn data_subpacket_round_trip_with_escapes() {
        let mut parser = Parser::new();
        parser.enter_data_state(Encoding::ZBIN32);

        let payload = [XON, XOFF, 0xFFu8, 0x7Fu8, b'@', b'\r'];
        let mut wire = tinyvec::ArrayVec::<[u8; 64]>::new();
        let mut enc = crate::escape::Encoder::new();
        enc.encode_slice(&payload, false, &mut wire);
        wire.extend([ZDLE, Packet::ZCRCE as u8]);
        let mut crc_input: Vec<u8> = payload.to_vec();
        crc_input.push(Packet::ZCRCE as u8);
        let crc = crate::crc::crc32(&crc_input).to_le_bytes();
        enc.encode_slice(&crc, false, &mut wire);

        let events = feed_all(&mut parser, &wire);
        assert_eq!(events, vec![ParserEvent::DataReceived { ok: true }]);
        assert_eq!(parser.packet(), &payload);
        assert_eq!(parser.packet_type(), Some(Packet::ZCRCE));
    }
}
