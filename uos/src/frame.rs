// Copyright (c) 2022-2023 The Coldsign Developers

//! QR frame codec
//!
//! A scanned QR buffer is either one fragment of a multipart payload or a
//! self-contained legacy frame, discriminated by the [`MULTIPART`]
//! bit of the leading flags byte.
//!
//! ## Multipart frame encoding:
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     FLAGS     |          PACKET_SIZE          | DECLARED_SIZE |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+               +
//! |                     (u32, DECLARED_SIZE = message size       |
//! +                                + HEADER_LEN)  +-+-+-+-+-+-+-+-+
//! |                                               |  FRAME_INDEX  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      ...      |                                               |
//! +-+-+-+-+-+-+-+-+                                               /
//! /                       FRAGMENT PAYLOAD                        /
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! ## Legacy frame encoding:
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     FLAGS     |                 DECLARED_LEN                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      ...      |                                               |
//! +-+-+-+-+-+-+-+-+                                               /
//! /             PAYLOAD (DECLARED_LEN - HEADER_LEN bytes)         /
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! [`MULTIPART`]: crate::FrameFlags::MULTIPART

use byteorder::{BigEndian, ByteOrder};
use encdec::{Decode, Encode};

use crate::{FrameFlags, UosError, FRAME_MARGIN, HEADER_LEN, MULTIPART_HEADER_LEN};

/// One scanned QR buffer, classified by the flags byte
#[derive(Clone, PartialEq, Debug)]
pub enum Frame<'a> {
    /// Fragment of a multipart payload
    Multipart(MultipartFrame<'a>),
    /// Self-contained legacy payload
    Single(&'a [u8]),
}

/// Multipart frame descriptor: size header, fragment index and payload slice
#[derive(Clone, PartialEq, Debug)]
pub struct MultipartFrame<'a> {
    /// Size of one full frame as emitted by the sender
    pub packet_size: u16,

    /// Total payload size across all fragments
    pub message_size: u32,

    /// Fragment index, 0-based
    pub index: u16,

    /// Fragment payload
    pub payload: &'a [u8],
}

impl MultipartFrame<'_> {
    /// Total frame count derived from the size header, see [`total_frames`]
    pub fn total(&self) -> u16 {
        total_frames(self.message_size, self.packet_size)
    }
}

/// Derive the total frame count for a multipart payload.
///
/// The sender emits [`FRAME_MARGIN`] frames over the exact chunk count to
/// cover rounding of its frame cycle, so the receiver must expect the same
/// margin. `packet_size` must exceed [`MULTIPART_HEADER_LEN`], enforced at
/// frame parse time. Saturates at `u16::MAX`; [`Frame::parse`] rejects
/// anything over [`MAX_FRAME_COUNT`][crate::MAX_FRAME_COUNT] before an
/// assembler is sized from it.
pub fn total_frames(message_size: u32, packet_size: u16) -> u16 {
    let chunk = (packet_size as u64).saturating_sub(MULTIPART_HEADER_LEN as u64).max(1);
    let exact = (message_size as u64 + chunk - 1) / chunk;
    exact.saturating_add(FRAME_MARGIN as u64).min(u16::MAX as u64) as u16
}

impl<'a> Frame<'a> {
    /// Parse a single scanned buffer
    pub fn parse(buff: &'a [u8]) -> Result<Self, UosError> {
        Self::decode(buff).map(|(f, _n)| f)
    }
}

impl<'a> Decode<'a> for Frame<'a> {
    type Output = Frame<'a>;
    type Error = UosError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), UosError> {
        if buff.is_empty() {
            return Err(UosError::InvalidFrame);
        }

        let flags = FrameFlags::from_bits_truncate(buff[0]);

        if flags.contains(FrameFlags::MULTIPART) {
            // Size header must be present along with at least one payload byte
            if buff.len() <= MULTIPART_HEADER_LEN {
                return Err(UosError::InvalidFrame);
            }

            let packet_size = BigEndian::read_u16(&buff[1..3]);
            let declared_size = BigEndian::read_u32(&buff[3..7]);
            let index = BigEndian::read_u16(&buff[7..9]);

            if packet_size as usize <= MULTIPART_HEADER_LEN {
                return Err(UosError::InvalidFrame);
            }

            let message_size = declared_size
                .checked_sub(HEADER_LEN as u32)
                .filter(|s| *s > 0)
                .ok_or(UosError::InvalidFrame)?;

            let frame = MultipartFrame {
                packet_size,
                message_size,
                index,
                payload: &buff[MULTIPART_HEADER_LEN..],
            };

            let total = frame.total();
            if total > crate::MAX_FRAME_COUNT || frame.index >= total {
                return Err(UosError::InvalidFrame);
            }

            Ok((Frame::Multipart(frame), buff.len()))
        } else {
            if buff.len() < HEADER_LEN {
                return Err(UosError::InvalidFrame);
            }

            let declared_len = BigEndian::read_u32(&buff[1..5]) as usize;
            let len = declared_len
                .checked_sub(HEADER_LEN)
                .ok_or(UosError::InvalidLength)?;

            if buff.len() < HEADER_LEN + len {
                return Err(UosError::InvalidLength);
            }

            Ok((Frame::Single(&buff[HEADER_LEN..HEADER_LEN + len]), HEADER_LEN + len))
        }
    }
}

impl<'a> Encode for Frame<'a> {
    type Error = UosError;

    fn encode_len(&self) -> Result<usize, UosError> {
        match self {
            Frame::Multipart(f) => Ok(MULTIPART_HEADER_LEN + f.payload.len()),
            Frame::Single(p) => Ok(HEADER_LEN + p.len()),
        }
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, UosError> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(UosError::InvalidLength);
        }

        match self {
            Frame::Multipart(f) => {
                buff[0] = FrameFlags::MULTIPART.bits();
                BigEndian::write_u16(&mut buff[1..3], f.packet_size);
                BigEndian::write_u32(&mut buff[3..7], f.message_size + HEADER_LEN as u32);
                BigEndian::write_u16(&mut buff[7..9], f.index);
                buff[MULTIPART_HEADER_LEN..n].copy_from_slice(f.payload);
            }
            Frame::Single(p) => {
                buff[0] = FrameFlags::empty().bits();
                BigEndian::write_u32(&mut buff[1..5], (p.len() + HEADER_LEN) as u32);
                buff[HEADER_LEN..n].copy_from_slice(p);
            }
        }

        Ok(n)
    }
}

impl Frame<'_> {
    /// Encode to an owned buffer
    pub fn to_vec(&self) -> Result<Vec<u8>, UosError> {
        let mut buff = vec![0u8; self.encode_len()?];
        self.encode(&mut buff)?;
        Ok(buff)
    }
}

/// Build the synthetic header prepended to a reassembled payload
/// (marker + total frame count + frame-number-zero) so the result decodes
/// through the same path as a single frame
pub fn reassembly_header(total: u16) -> [u8; HEADER_LEN] {
    let mut h = [0u8; HEADER_LEN];
    h[0] = crate::MULTIPART_MARKER;
    BigEndian::write_u16(&mut h[1..3], total);
    BigEndian::write_u16(&mut h[3..5], 0);
    h
}

/// Strip the synthetic reassembly header, if present
pub fn strip_reassembly_header(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.len() > HEADER_LEN && FrameFlags::from_bits_truncate(bytes[0]).contains(FrameFlags::MULTIPART)
    {
        Some(&bytes[HEADER_LEN..])
    } else {
        None
    }
}

/// Split a payload into the full multipart frame cycle for a given packet
/// size.
///
/// The fragment count matches what [`total_frames`] derives on the receiving
/// side, with the payload spread evenly so every frame carries at least one
/// byte. Payloads shorter than the frame count belong in a single legacy
/// frame instead.
pub fn encode_frames(message: &[u8], packet_size: u16) -> Result<Vec<Vec<u8>>, UosError> {
    if packet_size as usize <= MULTIPART_HEADER_LEN || message.is_empty() {
        return Err(UosError::InvalidFrame);
    }

    let total = total_frames(message.len() as u32, packet_size);
    if message.len() < total as usize {
        return Err(UosError::InvalidLength);
    }

    let base = message.len() / total as usize;
    let rem = message.len() % total as usize;

    let mut frames = Vec::with_capacity(total as usize);
    let mut offset = 0;
    for index in 0..total {
        let len = if (index as usize) < rem { base + 1 } else { base };
        let frame = Frame::Multipart(MultipartFrame {
            packet_size,
            message_size: message.len() as u32,
            index,
            payload: &message[offset..offset + len],
        });
        frames.push(frame.to_vec()?);
        offset += len;
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Round-trip helper in the spirit of the APDU codec tests
    fn encode_decode_frame(frame: &Frame) {
        let buff = frame.to_vec().expect("encode failed");

        let expected_n = frame.encode_len().expect("get length failed");
        assert_eq!(buff.len(), expected_n, "encode length mismatch");

        let (decoded, n) = Frame::decode(&buff).expect("decode failed");
        assert_eq!(frame, &decoded);
        assert_eq!(n, expected_n);
    }

    #[test]
    fn encode_decode_multipart() {
        let payload = [0x45u8, 0x01, 0xaa, 0xbb];
        let frame = Frame::Multipart(MultipartFrame {
            packet_size: 64,
            message_size: 128,
            index: 2,
            payload: &payload,
        });

        encode_decode_frame(&frame);
    }

    #[test]
    fn encode_decode_single() {
        let payload = [0x53u8, 0x01, 0x00, 0x11, 0x22];
        encode_decode_frame(&Frame::Single(&payload));
    }

    #[test]
    fn total_frame_derivation() {
        // one chunk plus the fixed margin
        assert_eq!(total_frames(20, 41), 3);
        // exact chunk boundary
        assert_eq!(total_frames(64, 41), 4);
        // boundary + 1 rolls into another chunk
        assert_eq!(total_frames(65, 41), 5);
    }

    #[test]
    fn rejects_truncated_multipart_header() {
        let buff = [FrameFlags::MULTIPART.bits(), 0x00, 0x40, 0x00];
        assert_eq!(Frame::parse(&buff), Err(UosError::InvalidFrame));
    }

    #[test]
    fn rejects_undersized_packet_size() {
        let frame = Frame::Multipart(MultipartFrame {
            packet_size: MULTIPART_HEADER_LEN as u16,
            message_size: 32,
            index: 0,
            payload: &[0xaa],
        });
        let buff = frame.to_vec().unwrap();
        assert_eq!(Frame::parse(&buff), Err(UosError::InvalidFrame));
    }

    #[test]
    fn rejects_index_out_of_range() {
        let frame = Frame::Multipart(MultipartFrame {
            packet_size: 41,
            message_size: 20,
            index: 3, // total is 3, valid indices 0..=2
            payload: &[0xaa],
        });
        let buff = frame.to_vec().unwrap();
        assert_eq!(Frame::parse(&buff), Err(UosError::InvalidFrame));
    }

    #[test]
    fn rejects_absurd_frame_count() {
        // chunk size 1, a million-byte declaration: not a scannable cycle
        let frame = Frame::Multipart(MultipartFrame {
            packet_size: 10,
            message_size: 1_000_000,
            index: 0,
            payload: &[0xaa],
        });
        let buff = frame.to_vec().unwrap();
        assert_eq!(Frame::parse(&buff), Err(UosError::InvalidFrame));
    }

    #[test]
    fn rejects_short_legacy_declaration() {
        // declared less than the header itself
        let buff = [0x00, 0x00, 0x00, 0x00, 0x02, 0xaa];
        assert_eq!(Frame::parse(&buff), Err(UosError::InvalidLength));
    }

    #[test]
    fn rejects_legacy_payload_shorter_than_declared() {
        let mut buff = Frame::Single(&[0xaa, 0xbb, 0xcc]).to_vec().unwrap();
        buff.truncate(buff.len() - 1);
        assert_eq!(Frame::parse(&buff), Err(UosError::InvalidLength));
    }

    #[test]
    fn frame_cycle_reassembles() {
        let message: Vec<u8> = (0u8..100).collect();
        let frames = encode_frames(&message, 41).unwrap();

        assert_eq!(frames.len() as u16, total_frames(100, 41));

        let mut out = Vec::new();
        for f in &frames {
            match Frame::parse(f).unwrap() {
                Frame::Multipart(m) => out.extend_from_slice(m.payload),
                _ => panic!("expected multipart frame"),
            }
        }
        assert_eq!(out, message);
    }

    #[test]
    fn reassembly_header_strips() {
        let h = reassembly_header(7);
        let mut blob = h.to_vec();
        blob.extend_from_slice(&[0x45, 0x01, 0xaa]);

        assert_eq!(strip_reassembly_header(&blob), Some(&blob[HEADER_LEN..]));
        assert_eq!(strip_reassembly_header(&[0x45, 0x01, 0xaa]), None);
    }
}
