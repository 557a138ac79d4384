// Copyright (c) 2022-2023 The Coldsign Developers

//! UOS (Universal Offline Signatures) wire format for Coldsign
//!
//! This crate provides the QR-level encodings consumed and produced by the
//! [engine][`coldsign-core`]: the per-frame header used to carry a payload
//! across one or more QR codes, the binary signing envelope transported
//! inside those frames, the legacy JSON envelope used by older online
//! companions, and a minimal RLP reader for rendering Ethereum-family
//! transactions.
//!
//! Encodings are a primitive binary layout to simplify implementation for
//! the online companions generating the QR stream. Multi-byte fields are
//! big-endian on the wire.
//!
//! [`coldsign-core`]: ../coldsign_core/index.html

use bitflags::bitflags;

pub mod envelope;
pub mod frame;
pub mod legacy;
pub mod rlp;

bitflags! {
    /// Flags byte leading every QR frame
    pub struct FrameFlags: u8 {
        /// Frame is one fragment of a multipart payload
        const MULTIPART = 0b0000_1000;
    }
}

/// Length of the legacy frame header (flags + declared length), also the
/// fixed offset deducted from declared sizes on the wire
pub const HEADER_LEN: usize = 5;

/// Per-frame overhead of a multipart frame
/// (flags + packet size + declared size + index)
pub const MULTIPART_HEADER_LEN: usize = 9;

/// Extra frames allowed over the exact chunk count, tolerating sender-side
/// rounding of the frame cycle
pub const FRAME_MARGIN: u16 = 2;

/// Sanity bound on derived frame counts; a declared size implying a longer
/// cycle is a malformed header, not a scannable payload
pub const MAX_FRAME_COUNT: u16 = 4096;

/// Marker byte of the synthetic reassembly header, equal to the raw
/// [`FrameFlags::MULTIPART`] bit
pub const MULTIPART_MARKER: u8 = 0x08;

/// Leading byte of a legacy JSON payload (`{`)
pub const JSON_SENTINEL: u8 = 0x7b;

/// Bytes a frame-zero fragment must not begin with: either would make the
/// reassembled payload ambiguous with a marker-headed or JSON payload on
/// re-decode
pub const RESERVED_LEADING_BYTES: [u8; 2] = [MULTIPART_MARKER, JSON_SENTINEL];

/// UOS wire format errors
#[derive(Clone, PartialEq, Debug, thiserror::Error)]
pub enum UosError {
    /// Frame header could not be parsed
    #[error("QR frame header could not be parsed")]
    InvalidFrame,

    /// Declared length inconsistent with the scanned buffer
    #[error("QR frame length does not match its declared size")]
    InvalidLength,

    /// Envelope action / variant byte not recognised
    #[error("unsupported signing action {0:#04x}")]
    UnsupportedAction(u8),

    /// Payload is neither a known envelope nor a legacy JSON request
    #[error("scanned payload is not a recognised signing request")]
    MalformedPayload,

    /// RLP item truncated or ill-formed
    #[error("transaction payload is not valid RLP")]
    InvalidRlp,
}

impl From<encdec::Error> for UosError {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => UosError::InvalidLength,
            encdec::Error::Utf8 => UosError::MalformedPayload,
        }
    }
}
