// Copyright (c) 2022-2023 The Coldsign Developers

//! Payload decoder
//!
//! Classifies reassembled or single-frame bytes into a [DecodedRequest].
//! Checks run in a fixed order: legacy JSON requests are handled by
//! [decode_legacy] before any frame parsing, reassembled payloads carry the
//! synthetic frame header which is stripped here, everything else is a
//! binary UOS envelope.
//!
//! Hashing of oversized payloads goes through the injected
//! [Driver][super::Driver]; the decoder never hashes anything itself.

use log::debug;

use coldsign_uos::{
    envelope::{CryptoScheme, Envelope, EthereumAction, SubstrateVariant},
    frame,
    legacy::{LegacyAction, LegacyRequest},
    rlp, UosError,
};

use super::{error::Error, sign::SignatureScheme, Driver, HashAlgorithm};
use crate::networks::ChainFamily;

/// Substrate-family payloads over this size are hashed before signing
pub const INLINE_SIGNING_LIMIT: usize = 256;

/// Ethereum-family message requests carry no network identifier; they
/// resolve against the family default
const ETHEREUM_DEFAULT_NETWORK: &str = "1";

/// A classified signing request, held pending user confirmation.
///
/// Consumers match exhaustively; an unhandled action cannot fall through.
#[derive(Clone, PartialEq, Debug)]
pub enum DecodedRequest {
    /// Balance-transferring transaction
    Transaction {
        family: ChainFamily,
        scheme: SignatureScheme,
        network_key: String,
        sender_address: String,
        recipient_address: String,

        /// Exact bytes handed to the signer
        bytes_to_sign: Vec<u8>,

        /// Transfer value, `0x`-hex, where the encoding exposes one
        value: Option<String>,
        /// Fee price, `0x`-hex, where the encoding exposes one
        fee: Option<String>,

        /// Original payload retained for display when only its hash is
        /// signed
        prehash: Option<Vec<u8>>,

        /// Payload exceeded [INLINE_SIGNING_LIMIT] and was hashed
        is_oversized: bool,
    },

    /// Arbitrary-data signing request
    Message {
        family: ChainFamily,
        scheme: SignatureScheme,
        network_key: String,
        sender_address: String,

        /// Exact bytes handed to the signer
        bytes_to_sign: Vec<u8>,

        /// Original payload for display
        message: Vec<u8>,

        /// Payload renders as text; binary payloads render as hex
        is_ascii_displayable: bool,

        /// The signed bytes are a hash, the UI must warn
        is_hash: bool,
    },
}

impl DecodedRequest {
    pub fn network_key(&self) -> &str {
        match self {
            DecodedRequest::Transaction { network_key, .. } => network_key,
            DecodedRequest::Message { network_key, .. } => network_key,
        }
    }

    pub fn sender_address(&self) -> &str {
        match self {
            DecodedRequest::Transaction { sender_address, .. } => sender_address,
            DecodedRequest::Message { sender_address, .. } => sender_address,
        }
    }

    pub fn scheme(&self) -> SignatureScheme {
        match self {
            DecodedRequest::Transaction { scheme, .. } => *scheme,
            DecodedRequest::Message { scheme, .. } => *scheme,
        }
    }

    pub fn bytes_to_sign(&self) -> &[u8] {
        match self {
            DecodedRequest::Transaction { bytes_to_sign, .. } => bytes_to_sign,
            DecodedRequest::Message { bytes_to_sign, .. } => bytes_to_sign,
        }
    }

    /// The signable bytes are a hash of the displayed payload
    pub(crate) fn signs_hash(&self) -> bool {
        match self {
            DecodedRequest::Transaction {
                family,
                is_oversized,
                ..
            } => *is_oversized || *family == ChainFamily::Ethereum,
            DecodedRequest::Message { is_hash, .. } => *is_hash,
        }
    }
}

impl From<CryptoScheme> for SignatureScheme {
    fn from(s: CryptoScheme) -> Self {
        match s {
            CryptoScheme::Ed25519 => SignatureScheme::Ed25519,
            CryptoScheme::Sr25519 => SignatureScheme::Sr25519,
        }
    }
}

/// Every byte renders as text
pub(crate) fn is_displayable_ascii(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| (0x20..=0x7e).contains(b) || matches!(*b, b'\n' | b'\r' | b'\t'))
}

/// Decode reassembled or single-frame payload bytes
pub fn decode_payload<D: Driver>(drv: &D, bytes: &[u8]) -> Result<DecodedRequest, Error> {
    // assembler output carries the synthetic frame header
    let bytes = frame::strip_reassembly_header(bytes).unwrap_or(bytes);

    match Envelope::parse(bytes)? {
        Envelope::Ethereum {
            action,
            sender,
            payload,
        } => {
            let sender_address = format!("0x{}", hex::encode(sender));
            debug!("ethereum envelope, action {action}, {} payload bytes", payload.len());

            match action {
                EthereumAction::SignTransaction => {
                    decode_ethereum_transaction(drv, sender_address, payload)
                }
                EthereumAction::SignData => Ok(message_request(
                    ChainFamily::Ethereum,
                    SignatureScheme::Ecdsa,
                    ETHEREUM_DEFAULT_NETWORK.to_string(),
                    sender_address,
                    payload,
                    false,
                )),
                EthereumAction::SignPrehashed => Ok(message_request(
                    ChainFamily::Ethereum,
                    SignatureScheme::Ecdsa,
                    ETHEREUM_DEFAULT_NETWORK.to_string(),
                    sender_address,
                    payload,
                    true,
                )),
            }
        }
        Envelope::Substrate {
            scheme,
            variant,
            sender,
            genesis_hash,
            payload,
        } => {
            let sender_address = hex::encode(sender);
            let network_key = format!("0x{}", hex::encode(genesis_hash));
            let scheme = SignatureScheme::from(scheme);
            debug!("substrate envelope, variant {variant}, {} payload bytes", payload.len());

            match variant {
                SubstrateVariant::MortalTransaction | SubstrateVariant::ImmortalTransaction => {
                    let is_oversized = payload.len() > INLINE_SIGNING_LIMIT;
                    let (bytes_to_sign, prehash) = if is_oversized {
                        (
                            drv.hash(payload, HashAlgorithm::Blake2b256),
                            Some(payload.to_vec()),
                        )
                    } else {
                        (payload.to_vec(), None)
                    };

                    Ok(DecodedRequest::Transaction {
                        family: ChainFamily::Substrate,
                        scheme,
                        network_key,
                        // the SCALE call is opaque here; transfers are
                        // reviewed against the originating account
                        recipient_address: sender_address.clone(),
                        sender_address,
                        bytes_to_sign,
                        value: None,
                        fee: None,
                        prehash,
                        is_oversized,
                    })
                }
                SubstrateVariant::Prehashed => Ok(message_request(
                    ChainFamily::Substrate,
                    scheme,
                    network_key,
                    sender_address,
                    payload,
                    true,
                )),
                SubstrateVariant::Message => {
                    let is_oversized = payload.len() > INLINE_SIGNING_LIMIT;
                    if is_oversized {
                        let hashed = drv.hash(payload, HashAlgorithm::Blake2b256);
                        Ok(DecodedRequest::Message {
                            family: ChainFamily::Substrate,
                            scheme,
                            network_key,
                            sender_address,
                            bytes_to_sign: hashed,
                            message: payload.to_vec(),
                            is_ascii_displayable: is_displayable_ascii(payload),
                            is_hash: true,
                        })
                    } else {
                        Ok(message_request(
                            ChainFamily::Substrate,
                            scheme,
                            network_key,
                            sender_address,
                            payload,
                            false,
                        ))
                    }
                }
            }
        }
    }
}

/// Decode a legacy JSON request (already classified by
/// [legacy::classify][coldsign_uos::legacy::classify])
pub fn decode_legacy<D: Driver>(drv: &D, req: &LegacyRequest) -> Result<DecodedRequest, Error> {
    match req.action {
        LegacyAction::SignTransaction => {
            let rlp_hex = req.data.rlp.as_deref().ok_or(UosError::MalformedPayload)?;
            let raw = hex::decode(rlp_hex.trim_start_matches("0x"))
                .map_err(|_| UosError::MalformedPayload)?;

            decode_ethereum_transaction(drv, req.data.account.to_lowercase(), &raw)
        }
        LegacyAction::SignData => {
            let text = req.data.data.as_deref().ok_or(UosError::MalformedPayload)?;

            Ok(message_request(
                ChainFamily::Ethereum,
                SignatureScheme::Ecdsa,
                ETHEREUM_DEFAULT_NETWORK.to_string(),
                req.data.account.to_lowercase(),
                text.as_bytes(),
                false,
            ))
        }
    }
}

fn decode_ethereum_transaction<D: Driver>(
    drv: &D,
    sender_address: String,
    payload: &[u8],
) -> Result<DecodedRequest, Error> {
    let tx = rlp::decode_transaction(payload)?;
    let network_key = tx.chain_id().to_string();

    // Ethereum always signs the keccak hash of the encoded transaction
    let bytes_to_sign = drv.hash(payload, HashAlgorithm::Keccak256);

    Ok(DecodedRequest::Transaction {
        family: ChainFamily::Ethereum,
        scheme: SignatureScheme::Ecdsa,
        network_key,
        sender_address,
        recipient_address: format!("0x{}", hex::encode(tx.recipient)),
        bytes_to_sign,
        value: Some(format!("0x{}", hex_or_zero(tx.value))),
        fee: Some(format!("0x{}", hex_or_zero(tx.gas_price))),
        prehash: Some(payload.to_vec()),
        is_oversized: false,
    })
}

fn message_request(
    family: ChainFamily,
    scheme: SignatureScheme,
    network_key: String,
    sender_address: String,
    payload: &[u8],
    is_hash: bool,
) -> DecodedRequest {
    DecodedRequest::Message {
        family,
        scheme,
        network_key,
        sender_address,
        bytes_to_sign: payload.to_vec(),
        message: payload.to_vec(),
        is_ascii_displayable: is_displayable_ascii(payload),
        is_hash,
    }
}

fn hex_or_zero(b: &[u8]) -> String {
    if b.is_empty() {
        "0".to_string()
    } else {
        hex::encode(b)
    }
}

#[cfg(test)]
mod tests {
    use sha2::{Digest, Sha256};
    use zeroize::Zeroizing;

    use super::*;
    use crate::engine::{AddressFormat, DriverError, SignatureScheme};

    /// Hash-only driver stand-in
    struct TestHasher;

    impl Driver for TestHasher {
        fn derive_address(
            &self,
            _secret: &[u8],
            _suffix: &str,
            _format: AddressFormat,
        ) -> Result<String, DriverError> {
            Err(DriverError::DerivationFailed)
        }

        fn sign(
            &self,
            _bytes: &[u8],
            _secret: &[u8],
            _scheme: SignatureScheme,
            _suffix: &str,
        ) -> Result<Vec<u8>, DriverError> {
            Err(DriverError::SignFailed)
        }

        fn hash(&self, bytes: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
            let mut h = Sha256::new();
            h.update(algorithm.to_string().as_bytes());
            h.update(bytes);
            h.finalize().to_vec()
        }

        fn decrypt(
            &self,
            _encrypted_seed: &[u8],
            _pin: &str,
        ) -> Result<Zeroizing<Vec<u8>>, DriverError> {
            Err(DriverError::DecryptFailed)
        }

        fn encrypt(&self, _seed: &[u8], _pin: &str) -> Result<Vec<u8>, DriverError> {
            Err(DriverError::DecryptFailed)
        }
    }

    const SENDER: [u8; 32] = [0xab; 32];
    const GENESIS: [u8; 32] = [0xcd; 32];

    fn substrate(variant: SubstrateVariant, payload: &[u8]) -> Vec<u8> {
        Envelope::Substrate {
            scheme: CryptoScheme::Sr25519,
            variant,
            sender: &SENDER,
            genesis_hash: &GENESIS,
            payload,
        }
        .to_vec()
        .unwrap()
    }

    #[test]
    fn message_hello_signs_raw_bytes() {
        let buff = substrate(SubstrateVariant::Message, b"hello");
        let r = decode_payload(&TestHasher, &buff).unwrap();

        match r {
            DecodedRequest::Message {
                bytes_to_sign,
                is_ascii_displayable,
                is_hash,
                ..
            } => {
                assert_eq!(bytes_to_sign, b"hello");
                assert!(is_ascii_displayable);
                assert!(!is_hash);
            }
            r => panic!("unexpected request: {r:?}"),
        }
    }

    #[test]
    fn binary_message_is_not_displayable() {
        let buff = substrate(SubstrateVariant::Message, &[0x00, 0x01, 0xff]);
        let r = decode_payload(&TestHasher, &buff).unwrap();

        match r {
            DecodedRequest::Message {
                bytes_to_sign,
                is_ascii_displayable,
                ..
            } => {
                // exact signable bytes exposed even when the UI shows hex
                assert_eq!(bytes_to_sign, vec![0x00, 0x01, 0xff]);
                assert!(!is_ascii_displayable);
            }
            r => panic!("unexpected request: {r:?}"),
        }
    }

    #[test]
    fn oversized_transaction_signs_the_hash() {
        let payload = vec![0x5a; INLINE_SIGNING_LIMIT + 44];
        let buff = substrate(SubstrateVariant::MortalTransaction, &payload);
        let r = decode_payload(&TestHasher, &buff).unwrap();

        match r {
            DecodedRequest::Transaction {
                bytes_to_sign,
                prehash,
                is_oversized,
                ..
            } => {
                assert!(is_oversized);
                assert_eq!(
                    bytes_to_sign,
                    TestHasher.hash(&payload, HashAlgorithm::Blake2b256)
                );
                // display layer still receives the original payload
                assert_eq!(prehash, Some(payload));
            }
            r => panic!("unexpected request: {r:?}"),
        }
    }

    #[test]
    fn inline_transaction_signs_verbatim() {
        let payload = vec![0x5a; 80];
        let buff = substrate(SubstrateVariant::ImmortalTransaction, &payload);
        let r = decode_payload(&TestHasher, &buff).unwrap();

        match r {
            DecodedRequest::Transaction {
                bytes_to_sign,
                prehash,
                is_oversized,
                ..
            } => {
                assert!(!is_oversized);
                assert_eq!(bytes_to_sign, payload);
                assert_eq!(prehash, None);
            }
            r => panic!("unexpected request: {r:?}"),
        }
    }

    #[test]
    fn prehashed_variant_is_flagged() {
        let digest = [0x11u8; 32];
        let buff = substrate(SubstrateVariant::Prehashed, &digest);
        let r = decode_payload(&TestHasher, &buff).unwrap();

        match r {
            DecodedRequest::Message {
                bytes_to_sign,
                is_hash,
                ..
            } => {
                assert!(is_hash);
                assert_eq!(bytes_to_sign, digest.to_vec());
            }
            r => panic!("unexpected request: {r:?}"),
        }
    }

    // EIP-155 example transaction, chain id 1
    const ETH_TX: &str = "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080";

    #[test]
    fn legacy_json_matches_binary_envelope() {
        let raw = hex::decode(ETH_TX).unwrap();
        let sender = [0x44u8; 20];

        let binary = Envelope::Ethereum {
            action: EthereumAction::SignTransaction,
            sender: &sender,
            payload: &raw,
        }
        .to_vec()
        .unwrap();
        let from_binary = decode_payload(&TestHasher, &binary).unwrap();

        let json = coldsign_uos::legacy::LegacyRequest {
            action: LegacyAction::SignTransaction,
            data: coldsign_uos::legacy::LegacyData {
                account: format!("0x{}", hex::encode(sender)),
                rlp: Some(format!("0x{ETH_TX}")),
                data: None,
            },
        };
        let from_json = decode_legacy(&TestHasher, &json).unwrap();

        assert_eq!(from_binary, from_json);

        match from_binary {
            DecodedRequest::Transaction {
                network_key,
                recipient_address,
                bytes_to_sign,
                ..
            } => {
                assert_eq!(network_key, "1");
                assert_eq!(recipient_address, format!("0x{}", "35".repeat(20)));
                assert_eq!(bytes_to_sign, TestHasher.hash(&raw, HashAlgorithm::Keccak256));
            }
            r => panic!("unexpected request: {r:?}"),
        }
    }

    #[test]
    fn legacy_transaction_requires_rlp() {
        let json = LegacyRequest {
            action: LegacyAction::SignTransaction,
            data: coldsign_uos::legacy::LegacyData {
                account: "0xab".to_string(),
                rlp: None,
                data: None,
            },
        };

        assert_eq!(
            decode_legacy(&TestHasher, &json),
            Err(Error::Payload(UosError::MalformedPayload))
        );
    }
}
