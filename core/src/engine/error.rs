// Copyright (c) 2022-2023 The Coldsign Developers

use coldsign_uos::UosError;

/// [Scanner][super::Scanner] errors
///
/// Display strings are the user-visible messages; the scan session
/// controller is the single place deciding presentation, components below it
/// only return these. Nothing here is fatal, every error returns the
/// session to ready.
#[derive(Clone, PartialEq, Debug, thiserror::Error)]
pub enum Error {
    /// Wire-format failure (framing, envelope, RLP)
    #[error(transparent)]
    Payload(#[from] UosError),

    /// Frame total conflicts with the session's fixed count
    #[error("frame declares {0} total frames where {1} were expected, start over to rescan")]
    FrameCountMismatch(u16, u16),

    /// Fragment zero would alias a marker or JSON payload on re-decode
    #[error("first fragment begins with a reserved byte and cannot be decoded")]
    AmbiguousFrameZero,

    /// Scanned an address QR rather than a signable payload
    #[error("QR contains an account address; create a transaction in your online wallet and scan the QR it presents")]
    AddressNotPayload,

    /// Network key missing from the registry
    #[error("network {0} is not known to this device")]
    UnknownNetwork(String),

    /// No key material stored for the requested account
    #[error("no private key found for account {address} in your key storage for the {network} chain")]
    NoAccount { address: String, network: String },

    /// Identity-derived account needs its derivation password
    #[error("account requires a derivation password")]
    PasswordRequired,

    /// Legacy account seed is PIN-encrypted
    #[error("account requires a PIN to unlock")]
    PinRequired,

    /// PIN failed to unlock the seed
    #[error("invalid PIN")]
    InvalidPin,

    /// Signing requested with no decoded payload pending
    #[error("nothing to sign, scan a payload first")]
    NothingToSign,

    /// Cryptographic engine failure, may indicate a corrupted key reference
    #[error("signing engine error: {0}")]
    Driver(#[from] DriverError),
}

/// Opaque failures reported by the [Driver][super::Driver]
#[derive(Copy, Clone, PartialEq, Debug, thiserror::Error)]
pub enum DriverError {
    /// Seed decryption failed
    #[error("decryption failed")]
    DecryptFailed,

    /// Signature could not be produced
    #[error("signing failed")]
    SignFailed,

    /// Key derivation failed
    #[error("key derivation failed")]
    DerivationFailed,
}
