// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collaborator traits the embedder implements (§1, §6): how the session
//! writes reply bytes, and how it delivers received file data.

/// Where the session writes bytes destined for the peer. Implemented by the
/// embedder over whatever carries the byte stream (serial port, socket,
/// pipe, in-memory buffer in tests).
pub trait Transport {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

impl<W: std::io::Write> Transport for W {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        std::io::Write::write_all(self, bytes)
    }
}

/// Where the session delivers an incoming file's metadata and data.
/// Implemented by the embedder (filesystem, in-memory buffer, etc).
pub trait FileSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once per incoming file, before any data arrives.
    fn on_file(&mut self, name: &str, size: Option<u64>) -> Result<(), Self::Error>;

    /// Called for each sub-packet of file data, in order. `offset` is the
    /// position of `data[0]` in the file, after any `ZRPOS`-driven resync.
    /// `zcnl` mirrors the sender's conversion byte: when true the sink
    /// should apply local newline translation (`\r`, `\n`, `\r\n`, `\n\r`
    /// to the local line terminator) before persisting the bytes.
    fn on_data(&mut self, offset: u64, data: &[u8], zcnl: bool) -> Result<(), Self::Error>;

    /// Called once the file has been fully received.
    fn on_file_complete(&mut self) -> Result<(), Self::Error>;
}
