// Copyright (c) 2022-2023 The Coldsign Developers

//! Multipart payload assembler
//!
//! Owns the reconstruction buffer for one scanning session: slots indexed by
//! frame number, duplicate suppression, missing-frame tracking and
//! completion detection. The camera scans whatever frame is visible, so
//! fragments arrive in any order and repeat freely; only the slot count
//! decides completion.

use log::debug;

use coldsign_uos::frame::{reassembly_header, MultipartFrame};
use coldsign_uos::{UosError, RESERVED_LEADING_BYTES};

use super::error::Error;

/// Result of accepting one fragment
#[derive(Clone, PartialEq, Debug)]
pub enum AssemblyStatus {
    /// Fragments outstanding
    InProgress {
        completed: u16,
        total: u16,
        /// 1-indexed frames still unseen
        missing: Vec<u16>,
    },

    /// All fragments seen; the payload with its synthetic header, returned
    /// exactly once
    Complete(Vec<u8>),
}

/// Reconstruction state for one fragmented payload
pub struct Assembler {
    total: u16,
    slots: Vec<Option<Vec<u8>>>,
    // one-shot completion latch, completion must not fire twice even if
    // redundant frames race the busy flag
    complete: bool,
}

impl Assembler {
    /// Create an assembler for a payload of `total` frames, fixed for the
    /// life of the assembly
    pub fn new(total: u16) -> Self {
        Self {
            total,
            slots: vec![None; total as usize],
            complete: false,
        }
    }

    /// Fixed frame count
    pub fn total(&self) -> u16 {
        self.total
    }

    /// Number of distinct frames seen
    pub fn completed(&self) -> u16 {
        self.slots.iter().filter(|s| s.is_some()).count() as u16
    }

    /// 1-indexed frames still unseen
    pub fn missing(&self) -> Vec<u16> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i as u16 + 1)
            .collect()
    }

    /// Completion has fired
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Accept one fragment.
    ///
    /// Duplicates are silent no-ops. A malformed fragment is rejected
    /// without touching the accumulated slots, so the user can rescan it.
    pub fn accept(&mut self, frame: &MultipartFrame) -> Result<AssemblyStatus, Error> {
        if frame.total() != self.total {
            return Err(Error::FrameCountMismatch(frame.total(), self.total));
        }

        if frame.index as usize >= self.slots.len() {
            return Err(Error::Payload(UosError::InvalidFrame));
        }

        // Fragment zero heads the reassembled payload; a reserved leading
        // byte would make the result ambiguous on re-decode
        if frame.index == 0
            && frame
                .payload
                .first()
                .map_or(true, |b| RESERVED_LEADING_BYTES.contains(b))
        {
            return Err(Error::AmbiguousFrameZero);
        }

        if self.complete {
            // completion already fired, redundant frames are no-ops
            return Ok(AssemblyStatus::InProgress {
                completed: self.total,
                total: self.total,
                missing: Vec::new(),
            });
        }

        let slot = &mut self.slots[frame.index as usize];
        if slot.is_none() {
            *slot = Some(frame.payload.to_vec());
        }

        if self.completed() == self.total {
            self.complete = true;

            let mut out = reassembly_header(self.total).to_vec();
            for part in self.slots.iter().flatten() {
                out.extend_from_slice(part);
            }

            debug!("multipart payload complete, {} bytes", out.len());
            Ok(AssemblyStatus::Complete(out))
        } else {
            let completed = self.completed();
            debug!("frame {} accepted ({completed}/{})", frame.index, self.total);
            Ok(AssemblyStatus::InProgress {
                completed,
                total: self.total,
                missing: self.missing(),
            })
        }
    }

    /// Start over: clear all slots and the completion latch, keeping the
    /// known frame count
    pub fn reset(&mut self) {
        self.slots = vec![None; self.total as usize];
        self.complete = false;
    }
}
