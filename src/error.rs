// SPDX-License-Identifier: MIT OR Apache-2.0
//! Crate error type (§7).

use thiserror::Error;

/// Crate-local result alias.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A data sub-packet failed CRC verification more times in a row than
    /// the session's `max_errors` budget allows.
    #[error("too many consecutive data CRC failures")]
    BadCrc,

    /// A data sub-packet or header exceeded its buffer capacity: the peer
    /// is not speaking this protocol correctly and the session cannot
    /// recover.
    #[error("packet exceeded the maximum buffer size")]
    ProtocolOverflow,

    /// The peer sent a cancel sequence (five or more consecutive `CAN`
    /// bytes).
    #[error("transfer canceled by peer")]
    Cancelled,

    /// The embedder's transport returned an I/O error while the session
    /// tried to write a reply.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedder's file sink rejected a write or name.
    #[error("file sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The session exhausted its configured retry budget without making
    /// forward progress.
    #[error("retries exhausted after {0} attempts")]
    RetriesExhausted(u32),
}
