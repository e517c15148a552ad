// SPDX-License-Identifier: MIT OR Apache-2.0
//! Session tunables (§6), gathered into one builder-style struct instead of
//! top-level constants.

use crate::consts::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ERRORS, DEFAULT_PKTSIZE, DEFAULT_RCAPS,
    DEFAULT_SERIAL, DEFAULT_TIMEOUT_SECS,
};

/// Tunables for a [`crate::session::Session`]. Construct with
/// [`Config::default`] and override fields via the setters.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) rcaps: crate::consts::Zrinit,
    pub(crate) max_packet_size: u32,
    pub(crate) max_errors: u32,
    pub(crate) serial: u32,
    pub(crate) timeout_secs: u32,
    pub(crate) connect_timeout_secs: u32,
    pub(crate) escctrl: bool,
}

impl Config {
    /// Advertised receiver capability bits (`ZRINIT` payload), used when the
    /// session replies to `ZRQINIT`/`ZFILE`.
    pub fn rcaps(mut self, rcaps: crate::consts::Zrinit) -> Self {
        self.rcaps = rcaps;
        self
    }

    /// Packet-buffer size advertised in `ZRINIT` (the sender's preferred
    /// sub-packet length).
    pub fn max_packet_size(mut self, size: u32) -> Self {
        self.max_packet_size = size;
        self
    }

    /// Number of consecutive bad-CRC or out-of-sequence data sub-packets
    /// tolerated before the session gives up and reports an error.
    pub fn max_errors(mut self, count: u32) -> Self {
        self.max_errors = count;
        self
    }

    /// Serial number advertised in `ZRINIT` (`§3`, `ZF2`/byte-2 payload).
    pub fn serial(mut self, serial: u32) -> Self {
        self.serial = serial;
        self
    }

    /// Inactivity timeout (seconds) the embedder should apply between
    /// `feed` calls; advisory only, enforced by [`crate::session::Session::on_timeout`].
    pub fn timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Timeout (seconds) allowed for the initial `ZRQINIT`/`ZRINIT`
    /// handshake before the session gives up.
    pub fn connect_timeout_secs(mut self, secs: u32) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Whether to ask the peer to escape all control characters
    /// (`ESCCTRL`), for transports that cannot pass them through cleanly.
    pub fn escctrl(mut self, escctrl: bool) -> Self {
        self.escctrl = escctrl;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rcaps: crate::consts::Zrinit::from_bits_truncate(DEFAULT_RCAPS),
            max_packet_size: DEFAULT_PKTSIZE,
            max_errors: DEFAULT_MAX_ERRORS,
            serial: DEFAULT_SERIAL,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            escctrl: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_stick() {
        let config = Config::default().max_errors(5).serial(42);
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.serial, 42);
        assert_eq!(config.max_packet_size, DEFAULT_PKTSIZE);
    }
}
