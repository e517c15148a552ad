// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transport-agnostic ZMODEM receiver protocol engine.
//!
//! This crate implements the receiver side of the Zmodem file-transfer
//! protocol as a byte-driven, incremental state machine: feed it bytes as
//! they arrive from whatever carries them (serial line, socket, test
//! harness) and it drives header parsing, CRC verification, data
//! sub-packet reassembly, and the receive-side session negotiation,
//! calling back into the embedder's [`Transport`] and [`FileSink`] as it
//! goes. It never opens a file descriptor or spawns a thread itself.
//!
//! ```ignore
//! let mut session = Session::new(Config::default(), my_transport, my_sink);
//! loop {
//!     let bytes = my_transport.read_some();
//!     if session.feed(&bytes)? == Status::Done {
//!         break;
//!     }
//! }
//! ```

pub mod config;
pub mod consts;
pub mod crc;
pub mod error;
pub mod escape;
pub mod header;
pub mod packet;
pub mod parser;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use header::{Encoding, Frame, Header};
pub use packet::Packet;
pub use parser::Parser;
pub use session::{Session, SessionState, Status};
pub use transport::{FileSink, Transport};
