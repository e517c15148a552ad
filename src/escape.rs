// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `ZDLE` escape convention (§4.1): which raw bytes must be escaped on
//! the wire, and how an escaped byte is decoded back to its raw value.

use crate::consts::{DEL, DLE, GS, XOFF, XON, ZDLE, ZRUB0, ZRUB1};

/// Lookup table mapping a raw byte to its escaped transform. Used for
/// decoding: `UNZDLE_TABLE[escaped_byte]` recovers the raw byte for every
/// escaped byte except the four sub-packet terminators, which the caller
/// must special-case in `DATA` pstate before consulting this table.
///
/// <https://play.rust-lang.org/?version=stable&mode=debug&edition=2021&gist=20db24d9f0aaff4d13f0144416f34d46>
pub const UNZDLE_TABLE: [u8; 0x100] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f,
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x2b, 0x2c, 0x2d, 0x2e, 0x2f,
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x3b, 0x3c, 0x3d, 0x3e, 0x3f,
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f,
    0x60, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x6b, 0x7f, 0xff, 0x6e, 0x6f,
    0x70, 0x71, 0x72, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x7b, 0x7c, 0x7d, 0x7e, 0x7f,
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x8b, 0x8c, 0x8d, 0x8e, 0x8f,
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0x9b, 0x9c, 0x9d, 0x9e, 0x9f,
    0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xab, 0xac, 0xad, 0xae, 0xaf,
    0xb0, 0xb1, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xbb, 0xbc, 0xbd, 0xbe, 0xbf,
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x8b, 0x8c, 0x8d, 0x8e, 0x8f,
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0x9b, 0x9c, 0x9d, 0x9e, 0x9f,
    0xe0, 0xe1, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xeb, 0xec, 0xed, 0xee, 0xef,
    0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa, 0xfb, 0xfc, 0xfd, 0xfe, 0xff,
];

/// Raw bytes that must always be escaped, independent of the `ESCCTRL`
/// and `ATSIGN` session flags: `ZDLE` itself, `DLE`/`XON`/`XOFF`/`GS` on
/// either bit-7 state, and the two bytes with no safe 7-bit encoding
/// (`DEL`, `0xFF`).
fn always_escaped(raw: u8) -> bool {
    raw == ZDLE || matches!(raw & 0x7F, DLE | XON | XOFF | GS) || raw == DEL || raw == 0xFF
}

/// Whether `raw` must be escaped given the current `ESCCTRL` (sender
/// requested control-character escaping) and `atsign` (previous emitted
/// byte's low 7 bits were `@`) flags.
pub fn needs_escape(raw: u8, escctrl: bool, atsign: bool) -> bool {
    always_escaped(raw) || (atsign && raw == b'\r') || (escctrl && (raw & 0x7F) < 0x20)
}

/// Transforms a raw byte into the byte written immediately after `ZDLE`.
pub fn escape_transform(raw: u8) -> u8 {
    match raw {
        DEL => ZRUB0,
        0xFF => ZRUB1,
        other => other ^ 0x40,
    }
}

/// Reverses `escape_transform`: recovers the raw byte from the byte that
/// followed `ZDLE` on the wire. Must not be called with one of the four
/// sub-packet terminator bytes; those are not transformed and are handled
/// by the caller before falling back to this table.
pub fn unescape(escaped: u8) -> u8 {
    UNZDLE_TABLE[escaped as usize]
}

/// Tracks the `ATSIGN` flag (§3 invariant: "previous emitted byte was `@`")
/// across a stream of outbound bytes and escapes each one in turn.
#[derive(Debug, Default, Clone, Copy)]
pub struct Encoder {
    atsign: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self { atsign: false }
    }

    /// Encodes one raw byte, appending 1 or 2 bytes to `out`, and updates
    /// the `ATSIGN` tracking state.
    pub fn encode_byte(&mut self, raw: u8, escctrl: bool, out: &mut impl Extend<u8>) {
        if needs_escape(raw, escctrl, self.atsign) {
            out.extend([ZDLE, escape_transform(raw)]);
        } else {
            out.extend([raw]);
        }
        self.atsign = (raw & 0x7F) == b'@';
    }

    /// Encodes a full byte slice.
    pub fn encode_slice(&mut self, raw: &[u8], escctrl: bool, out: &mut impl Extend<u8>) {
        for &b in raw {
            self.encode_byte(b, escctrl, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyvec::ArrayVec;

    #[rstest::rstest]
    #[case(0x00, false, false, false)]
    #[case(ZDLE, false, false, true)]
    #[case(DLE, false, false, true)]
    #[case(XON, false, false, true)]
    #[case(XOFF, false, false, true)]
    #[case(GS, false, false, true)]
    #[case(DEL, false, false, true)]
    #[case(0xFF, false, false, true)]
    #[case(b'\r', false, false, false)]
    #[case(b'\r', false, true, true)]
    #[case(0x01, false, false, false)]
    #[case(0x01, true, false, true)]
    fn needs_escape_matches_rules(
        #[case] raw: u8,
        #[case] escctrl: bool,
        #[case] atsign: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(needs_escape(raw, escctrl, atsign), expected);
    }

    #[test]
    fn round_trips_every_byte_value() {
        let mut enc = Encoder::new();
        for raw in 0u16..=255 {
            let raw = raw as u8;
            let mut out: ArrayVec<[u8; 2]> = ArrayVec::new();
            enc.encode_byte(raw, false, &mut out);
            let decoded = if out.len() == 2 {
                assert_eq!(out[0], ZDLE);
                unescape(out[1])
            } else {
                out[0]
            };
            assert_eq!(decoded, raw, "byte {raw:#04x} did not round-trip");
        }
    }

    #[test]
    fn atsign_flag_escapes_following_cr() {
        let mut enc = Encoder::new();
        let mut out: ArrayVec<[u8; 4]> = ArrayVec::new();
        enc.encode_byte(b'@', false, &mut out);
        enc.encode_byte(b'\r', false, &mut out);
        assert_eq!(&out[..], &[b'@', ZDLE, escape_transform(b'\r')]);
    }
}
