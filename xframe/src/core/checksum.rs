//! CRC-32/IEEE over fragment payloads.
//!
//! Only the payload is covered; the header travels unprotected.
//!
//! ```rust
//! use xframe::checksum;
//!
//! let payload = b"fragment bytes";
//! assert!(checksum::verify(payload, checksum::compute(payload)));
//! ```

#[inline]
pub fn compute(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// True if `payload` hashes to `expected`.
#[inline]
pub fn verify(payload: &[u8], expected: u32) -> bool {
    compute(payload) == expected
}
