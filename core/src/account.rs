// Copyright (c) 2022-2023 The Coldsign Developers

//! Account metadata returned by the [AccountStore][crate::engine::AccountStore]

use core::fmt;

use zeroize::Zeroize;

/// Key material kind, selecting the signing path
#[derive(Clone, PartialEq, Debug)]
pub enum KeyKind {
    /// Flat account with an independently encrypted seed, unlocked by PIN
    Legacy,

    /// Account derived from a shared identity root
    IdentityDerived {
        /// Derivation path under the identity root (`//kusama//0` style)
        path: String,
    },
}

/// Opaque encrypted-seed-or-reference blob, consumed only by the
/// [Driver][crate::engine::Driver]. Wiped on drop.
#[derive(Clone)]
pub struct SecretBlob(Vec<u8>);

impl SecretBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SecretBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Drop for SecretBlob {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Redacted, key material must not reach logs
impl fmt::Debug for SecretBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBlob({} bytes)", self.0.len())
    }
}

/// Read-only account snapshot resolved for a scanned request.
///
/// The engine only consumes these, it never writes back to the store.
#[derive(Clone, Debug)]
pub struct ResolvedAccount {
    /// Account address in the network's canonical form
    pub address: String,

    /// Network the account belongs to
    pub network_key: String,

    /// User-facing account name
    pub display_name: String,

    /// Signing path selector
    pub key_kind: KeyKind,

    /// Identity-derived account is protected by a derivation password
    pub has_password: bool,

    /// Encrypted seed (legacy) or seed reference (identity-derived)
    pub secret: SecretBlob,
}
