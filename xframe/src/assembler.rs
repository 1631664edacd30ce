//! Per-receiver frame reassembly.
//!
//! A receiver only ever tracks one frame. Fragments may arrive out of
//! order, duplicated or corrupted; the frame is emitted once every
//! fragment of the tracked frame id has arrived with a valid checksum.
//! A fragment carrying a different frame id abandons whatever was
//! collected so far: for a live stream a stale frame is worthless.
//!
//! ```text
//!            other frame id / first packet
//!   Idle ───────────────────────────────────▶ Collecting(id, total, parts)
//!    ▲                                              │      ▲
//!    │                                              │      │ same id, stored
//!    │          all parts present (frame emitted)   │      │ (or dropped on
//!    └──────────────────────────────────────────────┘──────┘  bad checksum)
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::core::{Packet, PacketHeader, checksum};
use crate::error::{Error, Result};

/// Counters describing what an assembler has seen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Fragments stored after checksum validation, duplicates included.
    pub packets_accepted: u64,

    /// Fragments whose sequence number had already been stored.
    pub duplicates: u64,

    /// Fragments dropped on CRC mismatch.
    pub checksum_errors: u64,

    /// Datagrams too short to carry a header and payload.
    pub malformed: u64,

    /// Fragments whose sequence number is not below their fragment count.
    pub out_of_range: u64,

    /// Frames emitted.
    pub frames_completed: u64,

    /// Partial frames discarded because a newer frame id arrived.
    pub frames_abandoned: u64,

    /// Completion checks that found a gap.
    pub incomplete_frames: u64,
}

/// Observable assembler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Idle,
    Collecting {
        frame_id: u32,
        total_fragments: u16,
        received: usize,
    },
}

#[derive(Debug)]
struct PartialFrame {
    frame_id: u32,
    total_fragments: u16,
    /// Keyed by sequence number; the key set is the received set.
    fragments: HashMap<u16, Vec<u8>>,
}

impl PartialFrame {
    fn new(header: &PacketHeader) -> Self {
        Self {
            frame_id: header.frame_id,
            total_fragments: header.total_fragments,
            fragments: HashMap::with_capacity(header.total_fragments as usize),
        }
    }

    fn is_complete(&self) -> bool {
        self.fragments.len() == self.total_fragments as usize
    }

    /// Concatenates fragments in sequence order, or reports the first gap.
    fn into_frame(mut self) -> core::result::Result<Vec<u8>, u16> {
        let size = self.fragments.values().map(Vec::len).sum();
        let mut frame = Vec::with_capacity(size);

        for sequence in 0..self.total_fragments {
            let part = self.fragments.remove(&sequence).ok_or(sequence)?;
            frame.extend_from_slice(&part);
        }

        Ok(frame)
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Collecting(PartialFrame),
}

#[derive(Debug)]
struct Inner {
    state: State,
    stats: AssemblerStats,
}

/// Reassembles the fragments of one receiver's stream into frames.
///
/// All methods take `&self`; the state is guarded by an internal mutex so
/// one assembler can be shared between tasks. With a single reader the
/// lock is never contended.
#[derive(Debug)]
pub struct FrameAssembler {
    inner: Mutex<Inner>,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: State::Idle,
                stats: AssemblerStats::default(),
            }),
        }
    }

    // `Inner` is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decodes a raw datagram and feeds it to the assembler.
    ///
    /// Short datagrams fail with [`Error::MalformedHeader`] without touching
    /// the assembly state.
    pub fn push_datagram(&self, datagram: &[u8]) -> Result<Option<Vec<u8>>> {
        match Packet::parse(datagram) {
            Ok(packet) => self.push(&packet.header, packet.payload),
            Err(err) => {
                self.lock().stats.malformed += 1;
                Err(err)
            }
        }
    }

    /// Feeds one fragment.
    ///
    /// Returns `Ok(Some(frame))` when this fragment completes the tracked
    /// frame, `Ok(None)` while fragments are outstanding, and
    /// [`Error::ChecksumMismatch`] when the payload is corrupt (the fragment
    /// is dropped and collection continues).
    ///
    /// A fragment with `sequence >= total_fragments` could never be part of
    /// a complete frame; it fails with [`Error::SequenceOutOfRange`] before
    /// the state is looked at, so it neither abandons nor buffers anything.
    ///
    /// If the completion check finds a gap, [`Error::IncompleteFrame`] is
    /// returned and the assembler goes back to idle.
    pub fn push(&self, header: &PacketHeader, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if header.sequence >= header.total_fragments {
            inner.stats.out_of_range += 1;
            return Err(Error::SequenceOutOfRange {
                frame_id: header.frame_id,
                sequence: header.sequence,
                total_fragments: header.total_fragments,
            });
        }

        let tracking = matches!(
            &inner.state,
            State::Collecting(partial) if partial.frame_id == header.frame_id
        );
        if !tracking {
            if let State::Collecting(stale) = &inner.state
                && !stale.fragments.is_empty()
            {
                debug!(
                    "Abandoning frame {} with {}/{} fragments",
                    stale.frame_id,
                    stale.fragments.len(),
                    stale.total_fragments
                );
                inner.stats.frames_abandoned += 1;
            }
            debug!(
                "New frame started: id={}, total fragments={}",
                header.frame_id, header.total_fragments
            );
            inner.state = State::Collecting(PartialFrame::new(header));
        }

        if !checksum::verify(payload, header.checksum) {
            inner.stats.checksum_errors += 1;
            return Err(Error::ChecksumMismatch {
                frame_id: header.frame_id,
                sequence: header.sequence,
            });
        }

        let State::Collecting(partial) = &mut inner.state else {
            return Ok(None);
        };

        if partial
            .fragments
            .insert(header.sequence, payload.to_vec())
            .is_some()
        {
            inner.stats.duplicates += 1;
        }
        inner.stats.packets_accepted += 1;

        trace!(
            "Received fragment {}/{} for frame {} ({} bytes)",
            header.sequence,
            partial.total_fragments,
            partial.frame_id,
            payload.len()
        );

        if !partial.is_complete() {
            return Ok(None);
        }

        let State::Collecting(partial) = core::mem::replace(&mut inner.state, State::Idle) else {
            return Ok(None);
        };
        let frame_id = partial.frame_id;

        match partial.into_frame() {
            Ok(frame) => {
                inner.stats.frames_completed += 1;
                debug!("Frame {} assembled: {} bytes", frame_id, frame.len());
                Ok(Some(frame))
            }
            Err(missing) => {
                inner.stats.incomplete_frames += 1;
                Err(Error::IncompleteFrame { frame_id, missing })
            }
        }
    }

    pub fn state(&self) -> AssemblerState {
        match &self.lock().state {
            State::Idle => AssemblerState::Idle,
            State::Collecting(partial) => AssemblerState::Collecting {
                frame_id: partial.frame_id,
                total_fragments: partial.total_fragments,
                received: partial.fragments.len(),
            },
        }
    }

    /// Drops any partial frame without counting it as abandoned.
    pub fn reset(&self) {
        self.lock().state = State::Idle;
    }

    pub fn stats(&self) -> AssemblerStats {
        self.lock().stats
    }
}
