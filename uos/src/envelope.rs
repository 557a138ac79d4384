// Copyright (c) 2022-2023 The Coldsign Developers

//! UOS signing envelope
//!
//! The envelope is carried inside QR frames (reassembled first when
//! multipart) and describes one signing request: the chain family, the
//! requested action, the originating account, the network identifier and the
//! opaque payload bytes.
//!
//! ## Ethereum-family encoding:
//! ```text
//! 0        1        2                 22
//! +--------+--------+--- ... ---------+--- ... ---+
//! |  0x45  | ACTION | SENDER ADDRESS  |  PAYLOAD  |
//! +--------+--------+--- (20 bytes) --+--- ... ---+
//! ```
//!
//! ## Substrate-family encoding:
//! ```text
//! 0        1        2         3                35                67
//! +--------+--------+---------+--- ... --------+--- ... --------+--- ... ---+
//! |  0x53  | SCHEME | VARIANT | SENDER PUBKEY  |  GENESIS HASH  |  PAYLOAD  |
//! +--------+--------+---------+-- (32 bytes) --+-- (32 bytes) --+--- ... ---+
//! ```

use encdec::{Decode, Encode};
use num_enum::TryFromPrimitive;
use strum::{Display, EnumString};

use crate::UosError;

/// Chain-family tag, first byte of every binary envelope
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumString, TryFromPrimitive)]
#[repr(u8)]
pub enum ChainTag {
    /// Account-balance model, RLP payloads
    Ethereum = 0x45,
    /// Hierarchically-derived keys, SCALE payloads
    Substrate = 0x53,
}

/// Requested action for Ethereum-family envelopes
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumString, TryFromPrimitive)]
#[repr(u8)]
pub enum EthereumAction {
    /// Sign an arbitrary message
    SignData = 0x00,
    /// Sign an RLP-encoded transaction
    SignTransaction = 0x01,
    /// Sign a payload the sender has already hashed
    SignPrehashed = 0x02,
}

/// Requested action / payload form for Substrate-family envelopes
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumString, TryFromPrimitive)]
#[repr(u8)]
pub enum SubstrateVariant {
    /// Sign a mortal transaction payload
    MortalTransaction = 0x00,
    /// Payload is already a hash, sign verbatim
    Prehashed = 0x01,
    /// Sign an immortal transaction payload
    ImmortalTransaction = 0x02,
    /// Sign an arbitrary message
    Message = 0x03,
}

/// Signature scheme requested by a Substrate-family envelope
#[derive(Copy, Clone, PartialEq, Debug, Display, EnumString, TryFromPrimitive)]
#[repr(u8)]
pub enum CryptoScheme {
    Ed25519 = 0x00,
    Sr25519 = 0x01,
}

/// A decoded signing envelope
#[derive(Clone, PartialEq, Debug)]
pub enum Envelope<'a> {
    /// Ethereum-family request
    Ethereum {
        action: EthereumAction,
        /// 20-byte sender address
        sender: &'a [u8; 20],
        /// RLP transaction or message bytes
        payload: &'a [u8],
    },
    /// Substrate-family request
    Substrate {
        scheme: CryptoScheme,
        variant: SubstrateVariant,
        /// 32-byte sender public key
        sender: &'a [u8; 32],
        /// Genesis hash identifying the network
        genesis_hash: &'a [u8; 32],
        /// SCALE transaction or message bytes
        payload: &'a [u8],
    },
}

impl<'a> Envelope<'a> {
    /// Parse an envelope from reassembled or single-frame payload bytes
    pub fn parse(buff: &'a [u8]) -> Result<Self, UosError> {
        Self::decode(buff).map(|(e, _n)| e)
    }
}

impl<'a> Decode<'a> for Envelope<'a> {
    type Output = Envelope<'a>;
    type Error = UosError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), UosError> {
        let tag = buff
            .first()
            .and_then(|b| ChainTag::try_from(*b).ok())
            .ok_or(UosError::MalformedPayload)?;

        match tag {
            ChainTag::Ethereum => {
                if buff.len() < 22 {
                    return Err(UosError::MalformedPayload);
                }

                let action = EthereumAction::try_from(buff[1])
                    .map_err(|_| UosError::UnsupportedAction(buff[1]))?;
                let sender = buff[2..22]
                    .try_into()
                    .map_err(|_| UosError::MalformedPayload)?;

                Ok((
                    Envelope::Ethereum {
                        action,
                        sender,
                        payload: &buff[22..],
                    },
                    buff.len(),
                ))
            }
            ChainTag::Substrate => {
                if buff.len() < 67 {
                    return Err(UosError::MalformedPayload);
                }

                let scheme = CryptoScheme::try_from(buff[1])
                    .map_err(|_| UosError::UnsupportedAction(buff[1]))?;
                let variant = SubstrateVariant::try_from(buff[2])
                    .map_err(|_| UosError::UnsupportedAction(buff[2]))?;
                let sender = buff[3..35]
                    .try_into()
                    .map_err(|_| UosError::MalformedPayload)?;
                let genesis_hash = buff[35..67]
                    .try_into()
                    .map_err(|_| UosError::MalformedPayload)?;

                Ok((
                    Envelope::Substrate {
                        scheme,
                        variant,
                        sender,
                        genesis_hash,
                        payload: &buff[67..],
                    },
                    buff.len(),
                ))
            }
        }
    }
}

impl<'a> Encode for Envelope<'a> {
    type Error = UosError;

    fn encode_len(&self) -> Result<usize, UosError> {
        match self {
            Envelope::Ethereum { payload, .. } => Ok(22 + payload.len()),
            Envelope::Substrate { payload, .. } => Ok(67 + payload.len()),
        }
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, UosError> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(UosError::InvalidLength);
        }

        match self {
            Envelope::Ethereum {
                action,
                sender,
                payload,
            } => {
                buff[0] = ChainTag::Ethereum as u8;
                buff[1] = *action as u8;
                buff[2..22].copy_from_slice(&sender[..]);
                buff[22..n].copy_from_slice(payload);
            }
            Envelope::Substrate {
                scheme,
                variant,
                sender,
                genesis_hash,
                payload,
            } => {
                buff[0] = ChainTag::Substrate as u8;
                buff[1] = *scheme as u8;
                buff[2] = *variant as u8;
                buff[3..35].copy_from_slice(&sender[..]);
                buff[35..67].copy_from_slice(&genesis_hash[..]);
                buff[67..n].copy_from_slice(payload);
            }
        }

        Ok(n)
    }
}

impl Envelope<'_> {
    /// Encode to an owned buffer
    pub fn to_vec(&self) -> Result<Vec<u8>, UosError> {
        let mut buff = vec![0u8; self.encode_len()?];
        self.encode(&mut buff)?;
        Ok(buff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_ethereum() {
        let sender = [0x11u8; 20];
        let e = Envelope::Ethereum {
            action: EthereumAction::SignTransaction,
            sender: &sender,
            payload: &[0xc0, 0x01, 0x02],
        };

        let buff = e.to_vec().unwrap();
        assert_eq!(Envelope::parse(&buff), Ok(e));
    }

    #[test]
    fn encode_decode_substrate() {
        let sender = [0x22u8; 32];
        let genesis = [0x33u8; 32];
        let e = Envelope::Substrate {
            scheme: CryptoScheme::Sr25519,
            variant: SubstrateVariant::Message,
            sender: &sender,
            genesis_hash: &genesis,
            payload: b"hello",
        };

        let buff = e.to_vec().unwrap();
        assert_eq!(Envelope::parse(&buff), Ok(e));
    }

    #[test]
    fn rejects_unknown_chain_tag() {
        assert_eq!(
            Envelope::parse(&[0x99, 0x00, 0x00]),
            Err(UosError::MalformedPayload)
        );
    }

    #[test]
    fn rejects_unknown_action() {
        let mut buff = vec![ChainTag::Ethereum as u8, 0x07];
        buff.extend_from_slice(&[0u8; 20]);
        assert_eq!(Envelope::parse(&buff), Err(UosError::UnsupportedAction(0x07)));
    }

    #[test]
    fn rejects_truncated_substrate() {
        let buff = [ChainTag::Substrate as u8, 0x01, 0x03, 0xaa];
        assert_eq!(Envelope::parse(&buff), Err(UosError::MalformedPayload));
    }
}
