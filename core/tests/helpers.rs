#![allow(unused)]

use std::cell::RefCell;
use std::collections::HashMap;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use coldsign_core::account::{KeyKind, ResolvedAccount, SecretBlob};
use coldsign_core::engine::{
    AccountStore, AddressFormat, Driver, DriverError, HashAlgorithm, SignatureScheme,
};
use coldsign_core::networks;
use coldsign_core::uos::envelope::{CryptoScheme, Envelope, EthereumAction, SubstrateVariant};
use coldsign_core::uos::frame::Frame;

pub const SENDER_PUBKEY: [u8; 32] = [0xab; 32];
pub const ETH_SENDER: [u8; 20] = [0x44; 20];

pub fn init_logger() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

/// Deterministic driver standing in for the cryptographic engine
#[derive(Default)]
pub struct TestDriver {
    pub sign_calls: RefCell<u32>,
    pub last_suffix: RefCell<Option<String>>,
}

impl Driver for TestDriver {
    fn derive_address(
        &self,
        secret: &[u8],
        suffix: &str,
        _format: AddressFormat,
    ) -> Result<String, DriverError> {
        let mut h = Sha256::new();
        h.update(secret);
        h.update(suffix.as_bytes());
        Ok(hex::encode(&h.finalize()[..8]))
    }

    fn sign(
        &self,
        bytes: &[u8],
        secret: &[u8],
        scheme: SignatureScheme,
        suffix: &str,
    ) -> Result<Vec<u8>, DriverError> {
        *self.sign_calls.borrow_mut() += 1;
        *self.last_suffix.borrow_mut() = Some(suffix.to_string());

        let mut h = Sha256::new();
        h.update([scheme.tag()]);
        h.update(secret);
        h.update(suffix.as_bytes());
        h.update(bytes);
        let a = h.finalize();

        // 64-byte stand-in signature
        let mut sig = a.to_vec();
        sig.extend_from_slice(&Sha256::digest(a));
        Ok(sig)
    }

    fn hash(&self, bytes: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
        let mut h = Sha256::new();
        h.update(algorithm.to_string().as_bytes());
        h.update(bytes);
        h.finalize().to_vec()
    }

    fn decrypt(&self, encrypted_seed: &[u8], pin: &str) -> Result<Zeroizing<Vec<u8>>, DriverError> {
        let key = Sha256::digest(pin.as_bytes());
        if encrypted_seed.len() < 8 || encrypted_seed[..8] != key[..8] {
            return Err(DriverError::DecryptFailed);
        }
        Ok(Zeroizing::new(encrypted_seed[8..].to_vec()))
    }

    fn encrypt(&self, seed: &[u8], pin: &str) -> Result<Vec<u8>, DriverError> {
        let key = Sha256::digest(pin.as_bytes());
        let mut out = key[..8].to_vec();
        out.extend_from_slice(seed);
        Ok(out)
    }
}

/// In-memory account store keyed by (address, network)
#[derive(Default)]
pub struct TestAccounts {
    accounts: HashMap<(String, String), ResolvedAccount>,
}

impl TestAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, account: ResolvedAccount) -> Self {
        self.accounts.insert(
            (account.address.clone(), account.network_key.clone()),
            account,
        );
        self
    }
}

impl AccountStore for TestAccounts {
    fn resolve(&self, address: &str, network_key: &str) -> Option<ResolvedAccount> {
        self.accounts
            .get(&(address.to_string(), network_key.to_string()))
            .cloned()
    }
}

pub fn kusama_genesis() -> [u8; 32] {
    let raw = hex::decode(&networks::KUSAMA_GENESIS[2..]).unwrap();
    raw.try_into().unwrap()
}

/// Identity-derived account matching [SENDER_PUBKEY] on Kusama
pub fn kusama_account(has_password: bool) -> ResolvedAccount {
    ResolvedAccount {
        address: hex::encode(SENDER_PUBKEY),
        network_key: networks::KUSAMA_GENESIS.to_string(),
        display_name: "kusama staking".to_string(),
        key_kind: KeyKind::IdentityDerived {
            path: "//kusama//0".to_string(),
        },
        has_password,
        secret: SecretBlob::new(b"identity root ref".to_vec()),
    }
}

/// Legacy flat account matching [ETH_SENDER] on Ethereum mainnet
pub fn eth_legacy_account(drv: &TestDriver, pin: &str) -> ResolvedAccount {
    ResolvedAccount {
        address: format!("0x{}", hex::encode(ETH_SENDER)),
        network_key: "1".to_string(),
        display_name: "old eth wallet".to_string(),
        key_kind: KeyKind::Legacy,
        has_password: false,
        secret: SecretBlob::new(drv.encrypt(b"legacy seed", pin).unwrap()),
    }
}

/// Substrate envelope bytes for the default test sender
pub fn substrate_envelope(scheme: CryptoScheme, variant: SubstrateVariant, payload: &[u8]) -> Vec<u8> {
    Envelope::Substrate {
        scheme,
        variant,
        sender: &SENDER_PUBKEY,
        genesis_hash: &kusama_genesis(),
        payload,
    }
    .to_vec()
    .unwrap()
}

pub fn message_envelope(payload: &[u8]) -> Vec<u8> {
    substrate_envelope(CryptoScheme::Sr25519, SubstrateVariant::Message, payload)
}

pub fn transaction_envelope(payload: &[u8]) -> Vec<u8> {
    substrate_envelope(
        CryptoScheme::Sr25519,
        SubstrateVariant::MortalTransaction,
        payload,
    )
}

pub fn ethereum_envelope(action: EthereumAction, payload: &[u8]) -> Vec<u8> {
    Envelope::Ethereum {
        action,
        sender: &ETH_SENDER,
        payload,
    }
    .to_vec()
    .unwrap()
}

/// Wrap envelope bytes in a single legacy frame
pub fn single_frame(envelope: &[u8]) -> Vec<u8> {
    Frame::Single(envelope).to_vec().unwrap()
}

// EIP-155 example transaction: chain id 1, 1 ether to 0x3535...
pub const ETH_TX: &str = "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080";
