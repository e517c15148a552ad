// SPDX-License-Identifier: MIT OR Apache-2.0
//! The session state machine (component E) and facade (component F), §4.5–4.6.

use log::{debug, error, trace, warn};

use crate::config::Config;
use crate::consts::{ZConv, ZmMode, Zrinit, Zsinit, ZMMASK};
use crate::error::{Error, Result};
use crate::header::{Encoding, Frame, Header};
use crate::parser::ParserEvent;
use crate::transport::{FileSink, Transport};
use crate::Parser;

/// High-level receive-side session states (§4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Start,
    InitWait,
    FileInfo,
    CrcWait,
    ReadReady,
    Reading,
    Finish,
    Command,
    Message,
    Done,
}

/// Semantic events posted by the parser (component D) to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Event {
    Rqinit,
    Sinit,
    File,
    Data,
    DataRcvd { ok: bool },
    Eof,
    Fin,
    Nak,
    Crc,
    Freecnt,
    Command,
    Stderr,
    Oo,
    Cancel,
    Error,
}

fn frame_to_event(frame: Frame) -> Event {
    match frame {
        Frame::ZRQINIT => Event::Rqinit,
        Frame::ZSINIT => Event::Sinit,
        Frame::ZFILE => Event::File,
        Frame::ZDATA => Event::Data,
        Frame::ZEOF => Event::Eof,
        Frame::ZFIN => Event::Fin,
        Frame::ZNAK => Event::Nak,
        Frame::ZCRC => Event::Crc,
        Frame::ZFREECNT => Event::Freecnt,
        Frame::ZCOMMAND => Event::Command,
        Frame::ZSTDERR => Event::Stderr,
        Frame::ZCAN => Event::Cancel,
        _ => Event::Error,
    }
}

/// Result of a [`Session::feed`] or [`Session::on_timeout`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Keep feeding bytes.
    Continue,
    /// The batch is complete (`ZM_XFRDONE`); the caller may stop feeding
    /// and drop the session.
    Done,
}

/// A single Zmodem receive session (component F facade over components
/// D and E). Generic over the embedder's transport and file sink.
pub struct Session<T: Transport, S: FileSink> {
    config: Config,
    parser: Parser,
    state: SessionState,

    escctrl: bool,
    crc32: bool,
    wait: bool,
    oo: bool,

    offset: u64,
    filesize: Option<u64>,
    timestamp: Option<u64>,
    f0: u8,
    f1: u8,
    file_crc: u32,
    scaps: Zsinit,
    attn: Option<Vec<u8>>,

    ntimeouts: u32,
    nerrors: u32,

    transport: T,
    sink: S,
}

impl<T: Transport, S: FileSink> Session<T, S> {
    /// Builds a new session. The sender is not greeted proactively: per
    /// §4.6, the receiver is reactive and only replies once it sees the
    /// sender's `ZRQINIT`.
    pub fn new(config: Config, transport: T, sink: S) -> Self {
        let escctrl = config.escctrl;
        Self {
            config,
            parser: Parser::new(),
            state: SessionState::Start,
            escctrl,
            crc32: true,
            wait: false,
            oo: false,
            offset: 0,
            filesize: None,
            timestamp: None,
            f0: 0,
            f1: 0,
            file_crc: 0,
            scaps: Zsinit::empty(),
            attn: None,
            ntimeouts: 0,
            nerrors: 0,
            transport,
            sink,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the last event was unexpected for the current state (§3
    /// `WAIT` flag). Cleared implicitly whenever a recognized event is
    /// handled successfully.
    pub fn waiting(&self) -> bool {
        self.wait
    }

    /// Feeds a chunk of raw bytes through the byte parser, dispatching any
    /// resulting events to the state machine. Bytes are consumed in order;
    /// a `Cancel` or unrecoverable error ends the iteration early.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Status> {
        for &byte in bytes {
            match self.parser.feed_byte(byte, self.oo) {
                ParserEvent::None => {}
                ParserEvent::HeaderBadCrc => {
                    warn!("header failed CRC check, sending ZNAK");
                    self.send_header(Frame::ZNAK, 0, Encoding::ZHEX)?;
                }
                ParserEvent::HeaderReceived { hdrfmt, header } => {
                    trace!("header received: {:?} ({:?})", header.frame, hdrfmt);
                    let status = self.dispatch(frame_to_event(header.frame), Some(header))?;
                    if status == Status::Done {
                        return Ok(Status::Done);
                    }
                }
                ParserEvent::DataReceived { ok } => {
                    let status = self.dispatch(Event::DataRcvd { ok }, None)?;
                    if status == Status::Done {
                        return Ok(Status::Done);
                    }
                }
                ParserEvent::Overflow => {
                    error!("packet buffer overflow, aborting session");
                    return Err(Error::ProtocolOverflow);
                }
                ParserEvent::Cancel => {
                    error!("cancel sequence received from peer");
                    return Err(Error::Cancelled);
                }
                ParserEvent::Oo => {
                    let status = self.dispatch(Event::Oo, None)?;
                    if status == Status::Done {
                        return Ok(Status::Done);
                    }
                }
            }
        }
        Ok(Status::Continue)
    }

    /// Drives the state-specific timeout/retry policy (§4.5 `zmr_*to`).
    /// The embedder calls this when it judges the expected response window
    /// (`self.timeout_hint()`) has elapsed with no new bytes.
    pub fn on_timeout(&mut self) -> Result<Status> {
        self.ntimeouts += 1;
        warn!("timeout in state {:?} (n={})", self.state, self.ntimeouts);
        match self.state {
            SessionState::Start | SessionState::InitWait => {
                if self.ntimeouts > 4 {
                    error!("retries exhausted waiting for ZRQINIT/ZSINIT data");
                    return Err(Error::RetriesExhausted(self.ntimeouts));
                }
                self.send_zrinit()?;
                Ok(Status::Continue)
            }
            SessionState::CrcWait => {
                if self.ntimeouts > 2 {
                    self.state = SessionState::Start;
                    self.send_zrinit()?;
                } else {
                    self.send_header(Frame::ZCRC, 0, Encoding::ZHEX)?;
                }
                Ok(Status::Continue)
            }
            SessionState::Reading | SessionState::ReadReady => {
                if self.ntimeouts > 2 {
                    self.state = SessionState::Start;
                    self.send_zrinit()?;
                } else {
                    self.send_zrpos(self.offset)?;
                }
                Ok(Status::Continue)
            }
            SessionState::Finish | SessionState::Done | SessionState::Command | SessionState::Message => {
                error!("timeout in terminal/auxiliary state {:?}", self.state);
                Err(Error::RetriesExhausted(self.ntimeouts))
            }
            SessionState::FileInfo => {
                self.send_zrinit()?;
                self.state = SessionState::Start;
                Ok(Status::Continue)
            }
        }
    }

    /// Advisory response-window hint for the current state, in seconds.
    pub fn timeout_hint(&self) -> u32 {
        match self.state {
            SessionState::Start | SessionState::InitWait => self.config.connect_timeout_secs,
            _ => self.config.timeout_secs,
        }
    }

    fn dispatch(&mut self, event: Event, header: Option<Header>) -> Result<Status> {
        if event == Event::Cancel {
            error!("ZCAN header received, aborting session");
            return Err(Error::Cancelled);
        }

        self.wait = false;
        let next = match self.state {
            SessionState::Start => self.on_start(event, header),
            SessionState::InitWait => self.on_init_wait(event),
            SessionState::FileInfo => self.on_file_info(event),
            SessionState::CrcWait => self.on_crc_wait(event, header),
            SessionState::ReadReady => self.on_read_ready(event, header),
            SessionState::Reading => self.on_reading(event),
            SessionState::Finish => self.on_finish(event),
            SessionState::Command => self.on_command(event),
            SessionState::Message => self.on_message(event),
            SessionState::Done => Ok(Status::Done),
        }?;
        Ok(next)
    }

    fn on_start(&mut self, event: Event, header: Option<Header>) -> Result<Status> {
        match event {
            Event::Rqinit => {
                self.zmr_zrinit()?;
                Ok(Status::Continue)
            }
            Event::Sinit => {
                self.zmr_zsinit(header.expect("Sinit event carries a header"))?;
                Ok(Status::Continue)
            }
            Event::File => {
                self.zmr_zfile(header.expect("File event carries a header"))?;
                Ok(Status::Continue)
            }
            Event::Freecnt => {
                self.zmr_freecnt()?;
                Ok(Status::Continue)
            }
            Event::Command => {
                self.zmr_enter_aux(SessionState::Command)?;
                Ok(Status::Continue)
            }
            Event::Stderr => {
                self.zmr_enter_aux(SessionState::Message)?;
                Ok(Status::Continue)
            }
            _ => self.zmr_error(),
        }
    }

    fn on_init_wait(&mut self, event: Event) -> Result<Status> {
        match event {
            Event::DataRcvd { ok } => self.zmr_zsinitdata(ok),
            _ => self.zmr_error(),
        }
    }

    fn on_file_info(&mut self, event: Event) -> Result<Status> {
        match event {
            Event::DataRcvd { ok } => self.zmr_filename(ok),
            _ => self.zmr_error(),
        }
    }

    fn on_crc_wait(&mut self, event: Event, header: Option<Header>) -> Result<Status> {
        match event {
            Event::Crc => {
                self.zmr_zcrc(header.expect("Crc event carries a header"))?;
                Ok(Status::Continue)
            }
            Event::Nak => self.zmr_nakcrc(),
            _ => self.zmr_error(),
        }
    }

    fn on_read_ready(&mut self, event: Event, header: Option<Header>) -> Result<Status> {
        match event {
            Event::Data => self.zmr_zdata(header.expect("Data event carries a header")),
            Event::Eof => self.zmr_zeof(header.expect("Eof event carries a header")),
            Event::Fin => self.zmr_zfin(),
            _ => self.zmr_error(),
        }
    }

    fn on_reading(&mut self, event: Event) -> Result<Status> {
        match event {
            Event::DataRcvd { ok } => self.zmr_filedata(ok),
            _ => self.zmr_error(),
        }
    }

    fn on_finish(&mut self, event: Event) -> Result<Status> {
        match event {
            Event::Oo => self.zmr_oo(),
            Event::Rqinit => {
                self.zmr_zrinit()?;
                Ok(Status::Continue)
            }
            _ => self.zmr_error(),
        }
    }

    fn on_command(&mut self, event: Event) -> Result<Status> {
        match event {
            Event::DataRcvd { .. } => {
                debug!("command payload received, no originating action taken");
                self.state = SessionState::Start;
                Ok(Status::Continue)
            }
            _ => self.zmr_error(),
        }
    }

    fn on_message(&mut self, event: Event) -> Result<Status> {
        match event {
            Event::DataRcvd { .. } => {
                debug!("stderr payload received from sender");
                self.state = SessionState::Start;
                Ok(Status::Continue)
            }
            _ => self.zmr_error(),
        }
    }

    // ---- actions -------------------------------------------------------

    fn zmr_zrinit(&mut self) -> Result<()> {
        debug!("state: {:?} -> Start (ZRINIT)", self.state);
        self.oo = false;
        self.state = SessionState::Start;
        self.send_zrinit()
    }

    fn zmr_zsinit(&mut self, header: Header) -> Result<()> {
        self.scaps = Zsinit::from_bits_truncate(header.payload[3]);
        self.escctrl = self.scaps.contains(Zsinit::TESCCTL);
        self.parser.enter_data_state(Encoding::ZBIN32);
        debug!("state: {:?} -> InitWait (ZSINIT)", self.state);
        self.state = SessionState::InitWait;
        Ok(())
    }

    fn zmr_zsinitdata(&mut self, ok: bool) -> Result<Status> {
        if ok {
            self.attn = Some(self.parser.packet().to_vec());
            self.send_header(Frame::ZACK, self.config_serial(), self.encoding_for_data())?;
        } else {
            warn!("ZSINIT sub-packet failed CRC");
            self.send_header(Frame::ZNAK, 0, Encoding::ZHEX)?;
        }
        self.state = SessionState::Start;
        Ok(Status::Continue)
    }

    fn zmr_freecnt(&mut self) -> Result<()> {
        self.send_header(Frame::ZACK, 0xFFFF_FFFF, self.encoding_for_data())
    }

    fn zmr_enter_aux(&mut self, next: SessionState) -> Result<()> {
        self.parser.enter_data_state(self.encoding_for_data());
        self.state = next;
        Ok(())
    }

    fn zmr_zfile(&mut self, header: Header) -> Result<()> {
        // §4.5 zmr_zfile: f0 = hdrdata[4] (payload[3]), f1 = hdrdata[3] (payload[2]).
        self.f0 = header.payload[3];
        self.f1 = header.payload[2];
        self.nerrors = 0;
        self.oo = false;
        self.parser.enter_data_state(Encoding::ZBIN32);
        debug!("state: {:?} -> FileInfo (ZFILE)", self.state);
        self.state = SessionState::FileInfo;
        Ok(())
    }

    fn zmr_filename(&mut self, ok: bool) -> Result<Status> {
        if !ok {
            warn!("file-info sub-packet failed CRC");
            self.send_header(Frame::ZNAK, 0, Encoding::ZHEX)?;
            return Ok(Status::Continue);
        }

        let payload = self.parser.packet().to_vec();
        let (name, len, mtime) = parse_file_info(&payload);
        self.filesize = len;
        self.timestamp = mtime;

        if self.f1 & ZMMASK == ZmMode::ZMCRC as u8 {
            debug!("state: FileInfo -> CrcWait (ZMCRC requested)");
            self.state = SessionState::CrcWait;
            self.send_header(Frame::ZCRC, 0, Encoding::ZHEX)?;
        } else {
            if self.f0 != ZConv::ZCRESUM as u8 {
                self.offset = 0;
            }
            self.sink
                .on_file(&name, self.filesize)
                .map_err(|e| Error::Sink(Box::new(e)))?;
            debug!("state: FileInfo -> ReadReady (offset={})", self.offset);
            self.state = SessionState::ReadReady;
            self.send_zrpos(self.offset)?;
        }
        Ok(Status::Continue)
    }

    fn zmr_zcrc(&mut self, header: Header) -> Result<()> {
        self.file_crc = header.count();
        self.state = SessionState::ReadReady;
        self.send_zrpos(self.offset)
    }

    fn zmr_nakcrc(&mut self) -> Result<Status> {
        warn!("ZNAK in CrcWait, resending ZCRC");
        self.send_header(Frame::ZCRC, 0, Encoding::ZHEX)?;
        Ok(Status::Continue)
    }

    fn zmr_zdata(&mut self, header: Header) -> Result<Status> {
        let sender_offset = header.count() as u64;
        if sender_offset != self.offset {
            warn!(
                "ZDATA offset mismatch: sender={} local={}",
                sender_offset, self.offset
            );
            if let Some(attn) = self.attn.clone() {
                self.transport.write(&attn).map_err(Error::Io)?;
            }
            self.send_zrpos(self.offset)?;
            return Ok(Status::Continue);
        }
        self.parser.enter_data_state(Encoding::ZBIN32);
        self.state = SessionState::Reading;
        Ok(Status::Continue)
    }

    fn zmr_filedata(&mut self, ok: bool) -> Result<Status> {
        if !ok {
            self.nerrors += 1;
            warn!("data sub-packet failed CRC (nerrors={})", self.nerrors);
            if self.nerrors > self.config.max_errors {
                error!("max data errors exceeded, aborting");
                return Err(Error::BadCrc);
            }
            self.state = SessionState::ReadReady;
            self.send_zrpos(self.offset)?;
            return Ok(Status::Continue);
        }

        let pkttype = self.parser.packet_type();
        let zcnl = self.f0 == ZConv::ZCNL as u8;
        let len = self.parser.packet().len() as u64;
        if let Err(e) = self.sink.on_data(self.offset, self.parser.packet(), zcnl) {
            error!("file sink rejected data: {e}");
            self.send_header(Frame::ZFERR, 0, self.encoding_for_data())?;
            self.state = SessionState::Finish;
            return Ok(Status::Continue);
        }
        self.offset += len;

        use crate::packet::Packet;
        match pkttype {
            Some(Packet::ZCRCE) | Some(Packet::ZCRCW) => {
                self.state = SessionState::ReadReady;
            }
            _ => {
                self.parser.enter_data_state(Encoding::ZBIN32);
            }
        }
        if matches!(pkttype, Some(Packet::ZCRCQ) | Some(Packet::ZCRCW)) {
            self.send_header(Frame::ZACK, self.offset as u32, self.encoding_for_data())?;
        }
        Ok(Status::Continue)
    }

    fn zmr_zeof(&mut self, header: Header) -> Result<Status> {
        if header.count() as u64 != self.offset {
            warn!("spurious ZEOF ignored (offset mismatch)");
            return Ok(Status::Continue);
        }
        self.sink
            .on_file_complete()
            .map_err(|e| Error::Sink(Box::new(e)))?;
        self.state = SessionState::Start;
        self.send_zrinit()?;
        Ok(Status::Continue)
    }

    fn zmr_zfin(&mut self) -> Result<Status> {
        self.send_header(Frame::ZFIN, 0, Encoding::ZHEX)?;
        self.oo = true;
        self.attn = None;
        self.f0 = 0;
        self.f1 = 0;
        debug!("state: ReadReady -> Finish (ZFIN)");
        self.state = SessionState::Finish;
        Ok(Status::Continue)
    }

    fn zmr_oo(&mut self) -> Result<Status> {
        debug!("OO trailer received, batch complete");
        self.state = SessionState::Done;
        Ok(Status::Done)
    }

    fn zmr_error(&mut self) -> Result<Status> {
        warn!("unexpected event in state {:?}", self.state);
        self.wait = true;
        self.oo = false;
        Ok(Status::Continue)
    }

    // ---- header emission helpers ---------------------------------------

    fn config_serial(&self) -> u32 {
        self.config.serial
    }

    fn encoding_for_data(&self) -> Encoding {
        if self.crc32 {
            Encoding::ZBIN32
        } else {
            Encoding::ZBIN
        }
    }

    fn send_header(&mut self, frame: Frame, count: u32, encoding: Encoding) -> Result<()> {
        let header = Header::with_count(frame, count);
        let wire = header.encode(encoding, self.escctrl);
        self.transport.write(&wire).map_err(Error::Io)
    }

    fn send_zrinit(&mut self) -> Result<()> {
        let size = self.config.max_packet_size;
        let mut rcaps = self.config.rcaps;
        if self.config.escctrl {
            rcaps.insert(Zrinit::ESCALL);
        }
        let payload = [
            (size & 0xFF) as u8,
            ((size >> 8) & 0xFF) as u8,
            0,
            rcaps.bits(),
        ];
        let header = Header::new(Frame::ZRINIT, payload);
        let wire = header.encode(Encoding::ZHEX, self.escctrl);
        self.transport.write(&wire).map_err(Error::Io)
    }

    fn send_zrpos(&mut self, offset: u64) -> Result<()> {
        self.send_header(Frame::ZRPOS, offset as u32, self.encoding_for_data())
    }
}

/// Parses the `ZFILE` sub-packet payload: a `NUL`-terminated filename
/// followed by an ASCII metadata tuple (`len mtime mode serial fremaining
/// bremaining ftype`). Unparsable metadata fields are left as `None`
/// rather than rejecting the file outright.
fn parse_file_info(payload: &[u8]) -> (String, Option<u64>, Option<u64>) {
    let nul = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    let name = String::from_utf8_lossy(&payload[..nul]).into_owned();
    let rest = if nul < payload.len() {
        String::from_utf8_lossy(&payload[nul + 1..])
    } else {
        String::from_utf8_lossy(&[])
    };
    let mut fields = rest.split_whitespace();
    let len = fields.next().and_then(|s| s.parse::<u64>().ok());
    let mtime = fields.next().and_then(|s| u64::from_str_radix(s, 8).ok());
    (name, len, mtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct RecordingTransport(Rc<RefCell<Vec<u8>>>);

    impl Transport for RecordingTransport {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            self.0.borrow_mut().extend_from_slice(bytes);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        files: Vec<(String, Option<u64>)>,
        data: Vec<(u64, Vec<u8>)>,
        completed: u32,
    }

    #[derive(Debug)]
    struct SinkError;
    impl core::fmt::Display for SinkError {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write!(f, "sink error")
        }
    }
    impl std::error::Error for SinkError {}

    impl FileSink for RecordingSink {
        type Error = SinkError;
        fn on_file(&mut self, name: &str, size: Option<u64>) -> core::result::Result<(), Self::Error> {
            self.files.push((name.to_string(), size));
            Ok(())
        }
        fn on_data(&mut self, offset: u64, data: &[u8], _zcnl: bool) -> core::result::Result<(), Self::Error> {
            self.data.push((offset, data.to_vec()));
            Ok(())
        }
        fn on_file_complete(&mut self) -> core::result::Result<(), Self::Error> {
            self.completed += 1;
            Ok(())
        }
    }

    fn data_subpacket(payload: &[u8], terminator: crate::packet::Packet, crc32: bool) -> Vec<u8> {
        let mut wire = Vec::new();
        let mut enc = crate::escape::Encoder::new();
        enc.encode_slice(payload, false, &mut wire);
        wire.push(crate::consts::ZDLE);
        wire.push(terminator as u8);
        let mut crc_input = payload.to_vec();
        crc_input.push(terminator as u8);
        if crc32 {
            let crc = crate::crc::crc32(&crc_input).to_le_bytes();
            enc.encode_slice(&crc, false, &mut wire);
        } else {
            let crc = crate::crc::crc16(&crc_input).to_be_bytes();
            enc.encode_slice(&crc, false, &mut wire);
        }
        wire
    }

    #[test]
    fn clean_one_file_transfer() {
        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let mut session = Session::new(Config::default(), transport, sink);

        session.feed(&Header::with_count(Frame::ZRQINIT, 0).encode(Encoding::ZHEX, false)).unwrap();
        assert_eq!(session.state(), SessionState::Start);

        session
            .feed(&Header::new(Frame::ZFILE, [0, 0, 0, 0]).encode(Encoding::ZBIN32, false))
            .unwrap();
        assert_eq!(session.state(), SessionState::FileInfo);

        let info = data_subpacket(b"hi.txt\0 5 0 0 1 0 0 0", crate::packet::Packet::ZCRCW, true);
        session.feed(&info).unwrap();
        assert_eq!(session.state(), SessionState::ReadReady);

        session
            .feed(&Header::with_count(Frame::ZDATA, 0).encode(Encoding::ZBIN32, false))
            .unwrap();
        assert_eq!(session.state(), SessionState::Reading);

        let data = data_subpacket(b"hello", crate::packet::Packet::ZCRCE, true);
        session.feed(&data).unwrap();
        assert_eq!(session.offset(), 5);
        assert_eq!(session.state(), SessionState::ReadReady);

        session
            .feed(&Header::with_count(Frame::ZEOF, 5).encode(Encoding::ZBIN32, false))
            .unwrap();
        assert_eq!(session.state(), SessionState::Start);

        session.feed(&Header::with_count(Frame::ZFIN, 0).encode(Encoding::ZHEX, false)).unwrap();
        assert_eq!(session.state(), SessionState::Finish);

        let status = session.feed(b"OO").unwrap();
        assert_eq!(status, Status::Done);
        assert_eq!(session.state(), SessionState::Done);
    }

    #[test]
    fn bad_data_crc_triggers_zrpos_and_resync() {
        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let mut session = Session::new(Config::default(), transport, sink);
        session.feed(&Header::with_count(Frame::ZRQINIT, 0).encode(Encoding::ZHEX, false)).unwrap();
        session
            .feed(&Header::new(Frame::ZFILE, [0, 0, 0, 0]).encode(Encoding::ZBIN32, false))
            .unwrap();
        let info = data_subpacket(b"hi.txt\0 5 0 0 1 0 0 0", crate::packet::Packet::ZCRCW, true);
        session.feed(&info).unwrap();
        session
            .feed(&Header::with_count(Frame::ZDATA, 0).encode(Encoding::ZBIN32, false))
            .unwrap();

        let mut corrupted = data_subpacket(b"hello", crate::packet::Packet::ZCRCE, true);
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        session.feed(&corrupted).unwrap();

        assert_eq!(session.offset(), 0);
        assert_eq!(session.state(), SessionState::ReadReady);

        session
            .feed(&Header::with_count(Frame::ZDATA, 0).encode(Encoding::ZBIN32, false))
            .unwrap();
        assert_eq!(session.state(), SessionState::Reading);
        session.feed(&data_subpacket(b"hello", crate::packet::Packet::ZCRCE, true)).unwrap();
        assert_eq!(session.offset(), 5);
    }

    #[test]
    fn cancel_stream_returns_error() {
        let transport = RecordingTransport::default();
        let sink = RecordingSink::default();
        let mut session = Session::new(Config::default(), transport, sink);
        let result = session.feed(&[0x18; 5]);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
