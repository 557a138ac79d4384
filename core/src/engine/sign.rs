// Copyright (c) 2022-2023 The Coldsign Developers

//! Signing dispatcher
//!
//! Selects the signing algorithm and key-derivation path for a resolved
//! sender: identity-derived accounts sign through a SURI-style suffix built
//! from their derivation path and optional password, legacy accounts unlock
//! their encrypted seed with a PIN immediately before the signing call.
//! Secrets are wiped as soon as the single call returns.

use core::fmt;

use strum::{Display, EnumString};
use zeroize::Zeroize;

use crate::account::{KeyKind, ResolvedAccount};

use super::{
    decode::DecodedRequest,
    error::{DriverError, Error},
    Driver,
};

/// Signature scheme, also the tag byte prefixed to the output encoding so
/// the online companion can disambiguate
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString)]
#[repr(u8)]
pub enum SignatureScheme {
    Ed25519 = 0x00,
    Sr25519 = 0x01,
    Ecdsa = 0x02,
}

impl SignatureScheme {
    /// Output-encoding tag byte
    pub fn tag(&self) -> u8 {
        *self as u8
    }
}

/// Credentials supplied with a signing attempt
#[derive(Clone, PartialEq)]
pub enum Auth {
    None,
    /// Derivation password for a password-protected identity account
    Password(String),
    /// PIN unlocking a legacy account seed
    Pin(String),
}

impl Auth {
    fn password(&self) -> Option<&str> {
        match self {
            Auth::Password(p) => Some(p),
            _ => None,
        }
    }

    fn pin(&self) -> Option<&str> {
        match self {
            Auth::Pin(p) => Some(p),
            _ => None,
        }
    }
}

impl Drop for Auth {
    fn drop(&mut self) {
        match self {
            Auth::Password(s) | Auth::Pin(s) => s.zeroize(),
            Auth::None => (),
        }
    }
}

/// Redacted, credentials must not reach logs
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => write!(f, "Auth::None"),
            Auth::Password(_) => write!(f, "Auth::Password(..)"),
            Auth::Pin(_) => write!(f, "Auth::Pin(..)"),
        }
    }
}

/// A produced signature, ready for QR display
#[derive(Clone, PartialEq, Debug)]
pub struct SignatureResult {
    /// Lower-hex of the scheme tag byte followed by the raw signature
    pub hex_signature: String,

    /// The hash that was signed, when the signable bytes were a hash of the
    /// displayed payload
    pub signed_hash: Option<Vec<u8>>,
}

/// Build the SURI-style derivation suffix for an identity-derived account
fn derivation_suffix(path: &str, password: Option<&str>) -> String {
    match password {
        Some(p) => format!("{path}///{p}"),
        None => path.to_string(),
    }
}

/// Sign a decoded request on behalf of a resolved sender.
///
/// [Error::PasswordRequired] / [Error::PinRequired] are prompts: the caller
/// gathers the credential and retries with the same pending request.
pub(crate) fn dispatch<D: Driver>(
    drv: &D,
    request: &DecodedRequest,
    account: &ResolvedAccount,
    auth: &Auth,
) -> Result<SignatureResult, Error> {
    let scheme = request.scheme();
    let bytes = request.bytes_to_sign();

    let signature = match &account.key_kind {
        KeyKind::IdentityDerived { path } => {
            if account.has_password && auth.password().is_none() {
                return Err(Error::PasswordRequired);
            }

            let mut suffix = derivation_suffix(path, auth.password());
            let r = drv.sign(bytes, account.secret.as_bytes(), scheme, &suffix);
            // the password lives exactly as long as the signing call
            suffix.zeroize();
            r?
        }
        KeyKind::Legacy => {
            let pin = auth.pin().ok_or(Error::PinRequired)?;

            let seed = drv
                .decrypt(account.secret.as_bytes(), pin)
                .map_err(|e| match e {
                    // uniform failure, no partial-match information
                    DriverError::DecryptFailed => Error::InvalidPin,
                    e => Error::Driver(e),
                })?;

            // seed is wiped on drop at the end of this arm
            drv.sign(bytes, seed.as_slice(), scheme, "")?
        }
    };

    let mut tagged = Vec::with_capacity(signature.len() + 1);
    tagged.push(scheme.tag());
    tagged.extend_from_slice(&signature);

    let signed_hash = match request.signs_hash() {
        true => Some(bytes.to_vec()),
        false => None,
    };

    Ok(SignatureResult {
        hex_signature: hex::encode(&tagged),
        signed_hash,
    })
}
