// SPDX-License-Identifier: MIT OR Apache-2.0
//! Universal invariants from the testable-properties catalogue: escape
//! round-trip, header round-trip, fragmentation independence, idempotent
//! cancel, and CRC discrimination.

use zmodem_engine::escape::{unescape, Encoder};
use zmodem_engine::parser::{Parser, ParserEvent};
use zmodem_engine::{Encoding, Frame, Header};

#[test]
fn escape_round_trip_every_byte() {
    let mut enc = Encoder::new();
    for raw in 0u16..=255 {
        let raw = raw as u8;
        let mut out = Vec::new();
        enc.encode_byte(raw, false, &mut out);
        let decoded = if out.len() == 2 { unescape(out[1]) } else { out[0] };
        assert_eq!(decoded, raw);
    }
}

#[rstest::rstest]
#[case(Frame::ZRQINIT, Encoding::ZBIN)]
#[case(Frame::ZRINIT, Encoding::ZBIN32)]
#[case(Frame::ZSINIT, Encoding::ZHEX)]
#[case(Frame::ZACK, Encoding::ZBIN)]
#[case(Frame::ZFILE, Encoding::ZBIN32)]
#[case(Frame::ZSKIP, Encoding::ZHEX)]
#[case(Frame::ZNAK, Encoding::ZBIN)]
#[case(Frame::ZABORT, Encoding::ZBIN32)]
#[case(Frame::ZFIN, Encoding::ZHEX)]
#[case(Frame::ZRPOS, Encoding::ZBIN)]
#[case(Frame::ZDATA, Encoding::ZBIN32)]
#[case(Frame::ZEOF, Encoding::ZHEX)]
#[case(Frame::ZFERR, Encoding::ZBIN)]
#[case(Frame::ZCRC, Encoding::ZBIN32)]
#[case(Frame::ZCHALLENGE, Encoding::ZHEX)]
#[case(Frame::ZCOMPL, Encoding::ZBIN)]
#[case(Frame::ZCAN, Encoding::ZBIN32)]
#[case(Frame::ZFREECNT, Encoding::ZHEX)]
#[case(Frame::ZCOMMAND, Encoding::ZBIN)]
#[case(Frame::ZSTDERR, Encoding::ZBIN32)]
fn header_round_trip_every_frame_and_encoding(#[case] frame: Frame, #[case] encoding: Encoding) {
    let header = Header::with_count(frame, 0x0A0B_0C0D);
    let wire = header.encode(encoding, false);
    let mut parser = Parser::new();
    let mut events = Vec::new();
    for &b in wire.iter() {
        let e = parser.feed_byte(b, false);
        if e != ParserEvent::None {
            events.push(e);
        }
    }
    assert_eq!(
        events,
        vec![ParserEvent::HeaderReceived { hdrfmt: encoding, header }]
    );
}

#[test]
fn fragmentation_independence() {
    let header = Header::with_count(Frame::ZDATA, 12345);
    let wire = header.encode(Encoding::ZBIN32, false);

    let mut whole = Parser::new();
    let whole_events: Vec<_> = wire
        .iter()
        .map(|&b| whole.feed_byte(b, false))
        .filter(|e| *e != ParserEvent::None)
        .collect();

    for split in 1..wire.len() {
        let mut fragmented = Parser::new();
        let mut events = Vec::new();
        for chunk in [&wire[..split], &wire[split..]] {
            for &b in chunk {
                let e = fragmented.feed_byte(b, false);
                if e != ParserEvent::None {
                    events.push(e);
                }
            }
        }
        assert_eq!(events, whole_events, "split at byte {split}");
    }
}

#[test]
fn idempotent_cancel_regardless_of_run_length() {
    for n in 5..16 {
        let mut parser = Parser::new();
        let bytes = vec![0x18u8; n];
        let events: Vec<_> = bytes
            .iter()
            .map(|&b| parser.feed_byte(b, false))
            .filter(|e| *e != ParserEvent::None)
            .collect();
        assert_eq!(events, vec![ParserEvent::Cancel], "n={n}");
    }
}

#[test]
fn crc_discrimination_flags_single_bit_flip() {
    let header = Header::with_count(Frame::ZRINIT, 7);
    let mut wire = header.encode(Encoding::ZBIN, false);
    *wire.last_mut().unwrap() ^= 0x01;

    let mut parser = Parser::new();
    let events: Vec<_> = wire
        .iter()
        .map(|&b| parser.feed_byte(b, false))
        .filter(|e| *e != ParserEvent::None)
        .collect();
    assert_eq!(events, vec![ParserEvent::HeaderBadCrc]);
}
