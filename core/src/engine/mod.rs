// Copyright (c) 2022-2023 The Coldsign Developers

//! The [Scanner] drives the signing path of the device.
//!
//! Raw bytes from each camera scan event enter through
//! [`on_scan`][Scanner::on_scan] and flow one way: frame codec →
//! multipart assembler (when fragmented) → payload decoder → account
//! resolution → held pending user confirmation → signing dispatcher.
//!
//! One [ScanSession] exists at a time, scoped to the active screen and
//! mutated only here. The `busy` flag is the single concurrency guard for
//! the whole pipeline: frames are delivered as discrete events and a frame
//! arriving while a decode or signing step is in flight is dropped without
//! touching session state.

use log::{debug, warn};
use strum::{Display, EnumString};
use zeroize::Zeroizing;

use coldsign_uos::{
    frame::Frame,
    legacy::{self, TextPayload},
};

use crate::account::ResolvedAccount;
use crate::networks;

mod assembler;
pub use assembler::{Assembler, AssemblyStatus};

pub mod decode;
pub use decode::DecodedRequest;

mod error;
pub use error::{DriverError, Error};

mod output;
pub use output::{MessageDetails, ScanOutcome, TransactionDetails};

mod sign;
pub use sign::{Auth, SignatureResult, SignatureScheme};

/// Hash algorithms requested from the [Driver]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString)]
pub enum HashAlgorithm {
    Keccak256,
    Blake2b256,
}

/// Address formats for [Driver::derive_address]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString)]
pub enum AddressFormat {
    /// `0x`-prefixed 20-byte hex
    EthereumHex,
    /// SS58 with a network prefix
    Ss58,
}

/// [`Driver`] trait provides the cryptographic engine for [`Scanner`]
/// instances.
///
/// All calls are request/response with no shared state; failures are opaque
/// to the engine and surfaced to the user unchanged. Secrets passed in are
/// opaque seed references or encrypted blobs owned by the account store.
pub trait Driver {
    /// Derive a display address for a secret and derivation suffix
    fn derive_address(
        &self,
        secret: &[u8],
        suffix: &str,
        format: AddressFormat,
    ) -> Result<String, DriverError>;

    /// Sign `bytes` under the given scheme. `suffix` carries the SURI-style
    /// derivation path and password for hierarchically-derived keys and is
    /// empty for flat seeds.
    fn sign(
        &self,
        bytes: &[u8],
        secret: &[u8],
        scheme: SignatureScheme,
        suffix: &str,
    ) -> Result<Vec<u8>, DriverError>;

    /// Hash `bytes` with the given algorithm
    fn hash(&self, bytes: &[u8], algorithm: HashAlgorithm) -> Vec<u8>;

    /// Decrypt a legacy encrypted seed with a user PIN
    fn decrypt(&self, encrypted_seed: &[u8], pin: &str) -> Result<Zeroizing<Vec<u8>>, DriverError>;

    /// Encrypt a seed under a user PIN
    fn encrypt(&self, seed: &[u8], pin: &str) -> Result<Vec<u8>, DriverError>;
}

impl<T: Driver> Driver for &T {
    fn derive_address(
        &self,
        secret: &[u8],
        suffix: &str,
        format: AddressFormat,
    ) -> Result<String, DriverError> {
        T::derive_address(self, secret, suffix, format)
    }

    fn sign(
        &self,
        bytes: &[u8],
        secret: &[u8],
        scheme: SignatureScheme,
        suffix: &str,
    ) -> Result<Vec<u8>, DriverError> {
        T::sign(self, bytes, secret, scheme, suffix)
    }

    fn hash(&self, bytes: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
        T::hash(self, bytes, algorithm)
    }

    fn decrypt(&self, encrypted_seed: &[u8], pin: &str) -> Result<Zeroizing<Vec<u8>>, DriverError> {
        T::decrypt(self, encrypted_seed, pin)
    }

    fn encrypt(&self, seed: &[u8], pin: &str) -> Result<Vec<u8>, DriverError> {
        T::encrypt(self, seed, pin)
    }
}

/// [`AccountStore`] trait resolves scanned addresses to stored accounts
pub trait AccountStore {
    /// Look up the single account matching an address on a network.
    ///
    /// `None` means no key material exists; the engine never guesses or
    /// falls back to an unrelated account.
    fn resolve(&self, address: &str, network_key: &str) -> Option<ResolvedAccount>;
}

impl<T: AccountStore> AccountStore for &T {
    fn resolve(&self, address: &str, network_key: &str) -> Option<ResolvedAccount> {
        T::resolve(self, address, network_key)
    }
}

/// Decoded request held pending user confirmation
struct PendingRequest {
    request: DecodedRequest,
    sender: ResolvedAccount,
}

/// Live state for one scanning attempt
#[derive(Default)]
struct ScanSession {
    /// Scan events are dropped while a decode/signing step is in flight
    busy: bool,
    /// Present only while reconstructing a fragmented payload
    multipart: Option<Assembler>,
    /// Most recently decoded, not-yet-signed request
    decoded: Option<PendingRequest>,
    /// Last produced signature
    signed: Option<SignatureResult>,
    /// Last user-visible failure, cleared on the next successful step
    error: Option<String>,
}

/// Scan session controller, owning the session state and the injected
/// collaborators
pub struct Scanner<D: Driver, A: AccountStore> {
    session: ScanSession,
    driver: D,
    accounts: A,
}

impl<D: Driver, A: AccountStore> Scanner<D, A> {
    /// Create a scanner with the provided driver and account store
    pub fn new(driver: D, accounts: A) -> Self {
        Self {
            session: ScanSession::default(),
            driver,
            accounts,
        }
    }

    /// Handle one scan event.
    ///
    /// Returns [ScanOutcome::Ignored] without touching any state while the
    /// session is busy. Any error leaves multipart progress intact (unless
    /// the error is the assembly's own) and returns the session to ready
    /// with the message recorded for display.
    pub fn on_scan(&mut self, raw: &[u8]) -> Result<ScanOutcome, Error> {
        if self.session.busy {
            debug!("scanner busy, dropping frame");
            return Ok(ScanOutcome::Ignored);
        }

        match self.handle_scan(raw) {
            Ok(outcome) => {
                self.session.error = None;
                Ok(outcome)
            }
            Err(e) => {
                debug!("scan failed: {e}");
                self.session.busy = false;
                self.session.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn handle_scan(&mut self, raw: &[u8]) -> Result<ScanOutcome, Error> {
        // Textual payloads (legacy JSON, network specs, address QRs) never
        // pass through the frame codec
        if let Ok(text) = core::str::from_utf8(raw) {
            match legacy::classify(text)? {
                Some(TextPayload::Address) => return Err(Error::AddressNotPayload),
                Some(TextPayload::Network(spec)) => {
                    debug!("scanned network spec for {}", spec.genesis_hash);
                    return Ok(ScanOutcome::Network(spec));
                }
                Some(TextPayload::Request(req)) => {
                    self.session.busy = true;
                    let request = decode::decode_legacy(&self.driver, &req)?;
                    return self.complete_request(request);
                }
                None => (),
            }
        }

        match Frame::parse(raw)? {
            Frame::Multipart(f) => {
                let assembler = self
                    .session
                    .multipart
                    .get_or_insert_with(|| Assembler::new(f.total()));

                match assembler.accept(&f)? {
                    AssemblyStatus::InProgress {
                        completed,
                        total,
                        missing,
                    } => Ok(ScanOutcome::NeedFrames {
                        completed,
                        total,
                        missing,
                    }),
                    AssemblyStatus::Complete(blob) => {
                        // flip busy before decoding so a racing camera
                        // callback cannot re-enter the completed assembly
                        self.session.busy = true;
                        let request = decode::decode_payload(&self.driver, &blob)?;
                        self.complete_request(request)
                    }
                }
            }
            Frame::Single(payload) => {
                self.session.busy = true;
                let request = decode::decode_payload(&self.driver, payload)?;
                self.complete_request(request)
            }
        }
    }

    fn complete_request(&mut self, request: DecodedRequest) -> Result<ScanOutcome, Error> {
        let network = networks::lookup(request.network_key())
            .ok_or_else(|| Error::UnknownNetwork(request.network_key().to_string()))?;

        let sender = self
            .accounts
            .resolve(request.sender_address(), request.network_key())
            .ok_or_else(|| Error::NoAccount {
                address: request.sender_address().to_string(),
                network: network.title.to_string(),
            })?;

        let outcome = outcome_for(&request, network.title, &sender);

        // assembly is finished with; progress cleared for the next payload
        self.session.multipart = None;
        self.session.decoded = Some(PendingRequest { request, sender });

        Ok(outcome)
    }

    /// Sign the pending request once the user has confirmed it.
    ///
    /// [Error::PasswordRequired] / [Error::PinRequired] ask the caller to
    /// gather a credential and retry; the pending request is retained. The
    /// credential is wiped when `auth` drops, it is never cached.
    pub fn sign(&mut self, auth: Auth) -> Result<SignatureResult, Error> {
        let pending = self.session.decoded.as_ref().ok_or(Error::NothingToSign)?;

        match sign::dispatch(&self.driver, &pending.request, &pending.sender, &auth) {
            Ok(result) => {
                self.session.decoded = None;
                self.session.multipart = None;
                self.session.error = None;
                self.session.busy = false;
                self.session.signed = Some(result.clone());
                Ok(result)
            }
            Err(e @ (Error::PasswordRequired | Error::PinRequired)) => Err(e),
            Err(e) => {
                if matches!(e, Error::Driver(_)) {
                    // engine failures may indicate a corrupted key reference
                    warn!("signing engine error: {e}");
                }
                self.session.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Abort the current assembly: clear accumulated fragments and any
    /// partially decoded request, keep scanning
    pub fn start_over(&mut self) {
        if let Some(a) = self.session.multipart.as_mut() {
            a.reset();
        }
        self.session.decoded = None;
        self.session.error = None;
        self.session.busy = false;
    }

    /// Reset the whole session: leaving the screen, cancelling, or after a
    /// signature has been handed off
    pub fn cleanup(&mut self) {
        self.session = ScanSession::default();
    }

    /// Suppress scan events (screen lost focus); late camera callbacks for
    /// in-flight frames are dropped
    pub fn set_busy(&mut self) {
        self.session.busy = true;
    }

    /// Accept scan events (screen gained focus)
    pub fn set_ready(&mut self) {
        self.session.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.session.busy
    }

    /// Last user-visible failure
    pub fn error(&self) -> Option<&str> {
        self.session.error.as_deref()
    }

    /// Decoded request awaiting confirmation
    pub fn pending(&self) -> Option<&DecodedRequest> {
        self.session.decoded.as_ref().map(|p| &p.request)
    }

    /// Last produced signature
    pub fn signature(&self) -> Option<&SignatureResult> {
        self.session.signed.as_ref()
    }

    /// Distinct frames seen in the current assembly
    pub fn frames_completed(&self) -> u16 {
        self.session.multipart.as_ref().map_or(0, |a| a.completed())
    }

    /// Fixed frame count of the current assembly
    pub fn frames_total(&self) -> u16 {
        self.session.multipart.as_ref().map_or(0, |a| a.total())
    }

    /// 1-indexed frames still to scan, for user feedback
    pub fn missed_frames(&self) -> Vec<u16> {
        self.session
            .multipart
            .as_ref()
            .map_or_else(Vec::new, |a| a.missing())
    }
}

fn outcome_for(
    request: &DecodedRequest,
    network_title: &str,
    sender: &ResolvedAccount,
) -> ScanOutcome {
    match request {
        DecodedRequest::Transaction {
            network_key,
            sender_address,
            recipient_address,
            value,
            fee,
            prehash,
            is_oversized,
            ..
        } => ScanOutcome::Transaction(TransactionDetails {
            network_key: network_key.clone(),
            network_title: network_title.to_string(),
            sender: sender_address.clone(),
            sender_name: sender.display_name.clone(),
            recipient: recipient_address.clone(),
            value: value.clone(),
            fee: fee.clone(),
            is_oversized: *is_oversized,
            prehash: prehash.clone(),
        }),
        DecodedRequest::Message {
            network_key,
            sender_address,
            message,
            is_ascii_displayable,
            is_hash,
            ..
        } => ScanOutcome::Message(MessageDetails {
            network_key: network_key.clone(),
            network_title: network_title.to_string(),
            sender: sender_address.clone(),
            sender_name: sender.display_name.clone(),
            message: match is_ascii_displayable {
                true => String::from_utf8_lossy(message).into_owned(),
                false => format!("0x{}", hex::encode(message)),
            },
            is_ascii_displayable: *is_ascii_displayable,
            is_hash: *is_hash,
        }),
    }
}
