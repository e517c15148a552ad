// SPDX-License-Identifier: MIT OR Apache-2.0
//! CRC-16/XMODEM and CRC-32/ISO-HDLC running checksums, and the residue
//! checks used to validate a received header or sub-packet in one shot.

use crc::{Crc, CRC_16_XMODEM, CRC_32_ISO_HDLC};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Residue a correct CRC-32 computation (including the four received CRC
/// bytes) must equal.
pub const CRC32_MAGIC_RESIDUE: u32 = 0xDEBB_20E3;

/// Computes the CRC-16 of `data` (type||payload, or packet payload||terminator).
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Computes the CRC-32 of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Verifies a CRC-16 header or sub-packet: the checksum of `data` followed by
/// the two received big-endian CRC bytes must be zero.
pub fn check_crc16(data: &[u8], received: &[u8]) -> bool {
    let mut digest = CRC16.digest();
    digest.update(data);
    digest.update(received);
    digest.finalize() == 0
}

/// Verifies a CRC-32 header or sub-packet against the magic residue.
pub fn check_crc32(data: &[u8], received: &[u8]) -> bool {
    let mut digest = CRC32.digest();
    digest.update(data);
    digest.update(received);
    digest.finalize() == CRC32_MAGIC_RESIDUE
}

/// Appends the big-endian CRC-16 of `data` and returns the number of bytes
/// written (2).
pub fn append_crc16(data: &[u8], out: &mut [u8]) -> usize {
    out[..2].copy_from_slice(&crc16(data).to_be_bytes());
    2
}

/// Appends the little-endian, one's-complemented CRC-32 of `data` and
/// returns the number of bytes written (4).
pub fn append_crc32(data: &[u8], out: &mut [u8]) -> usize {
    out[..4].copy_from_slice(&crc32(data).to_le_bytes());
    4
}
