//! Splitting a frame into bounded fragments.
//!
//! ```rust
//! use xframe::fragment;
//!
//! let frame = vec![0xABu8; 2600];
//! let fragments = fragment(&frame, 1, 1024).unwrap();
//! assert_eq!(fragments.len(), 3);
//! ```

use crate::core::Packet;
use crate::error::{Error, Result};

/// Number of fragments needed for `len` bytes at `max_payload` per fragment.
pub fn fragment_count(len: usize, max_payload: usize) -> usize {
    len.div_ceil(max_payload)
}

/// Lazily yields the fragments of one frame, in sequence order.
///
/// Each call to [`fragment`] yields a fresh sequence; clones advance
/// independently.
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    frame: &'a [u8],
    frame_id: u32,
    max_payload: usize,
    total: u16,
    next: u16,
}

impl<'a> Fragments<'a> {
    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn total_fragments(&self) -> u16 {
        self.total
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = Packet<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }

        let sequence = self.next;
        let start = sequence as usize * self.max_payload;
        let end = core::cmp::min(start + self.max_payload, self.frame.len());
        self.next += 1;

        Some(Packet::new(
            self.frame_id,
            sequence,
            self.total,
            &self.frame[start..end],
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Fragments<'_> {}

/// Splits `frame` into fragments of at most `max_payload` bytes tagged with
/// `frame_id`.
///
/// Fails with [`Error::FrameTooLarge`] when the fragment count does not fit
/// the 16-bit header field.
pub fn fragment(frame: &[u8], frame_id: u32, max_payload: usize) -> Result<Fragments<'_>> {
    if max_payload == 0 || max_payload > u16::MAX as usize {
        return Err(Error::InvalidConfig("max_payload must be in 1..=65535"));
    }
    if frame.is_empty() {
        return Err(Error::EmptyFrame);
    }

    let fragments = fragment_count(frame.len(), max_payload);
    let total = u16::try_from(fragments).map_err(|_| Error::FrameTooLarge { fragments })?;

    Ok(Fragments {
        frame,
        frame_id,
        max_payload,
        total,
        next: 0,
    })
}
