// Copyright (c) 2022-2023 The Coldsign Developers

use coldsign_uos::legacy::NetworkSpec;

/// [`Scanner`][super::Scanner] outcomes surfaced to the calling screen.
///
/// The engine never decides navigation, it only reports what the scanned
/// payload turned out to be.
#[derive(Clone, PartialEq, Debug)]
pub enum ScanOutcome {
    /// Scanner busy or screen unfocused, event dropped
    Ignored,

    /// Multipart assembly in progress
    NeedFrames {
        completed: u16,
        total: u16,
        /// 1-indexed frames still to scan, for user feedback
        missing: Vec<u16>,
    },

    /// Scanned a network-spec document rather than a signing request
    Network(NetworkSpec),

    /// Transaction decoded and sender resolved, pending user review
    Transaction(TransactionDetails),

    /// Message decoded and sender resolved, pending user review
    Message(MessageDetails),
}

/// Review-screen details for a decoded transaction
#[derive(Clone, PartialEq, Debug)]
pub struct TransactionDetails {
    pub network_key: String,
    pub network_title: String,

    pub sender: String,
    pub sender_name: String,
    pub recipient: String,

    /// Transfer value, `0x`-hex, where the chain encoding exposes one
    pub value: Option<String>,
    /// Fee price, `0x`-hex, where the chain encoding exposes one
    pub fee: Option<String>,

    /// Payload exceeded the inline-signing threshold; only its hash is
    /// signed, warn the user
    pub is_oversized: bool,

    /// Original payload for rendering when only its hash is signed
    pub prehash: Option<Vec<u8>>,
}

/// Review-screen details for a decoded message
#[derive(Clone, PartialEq, Debug)]
pub struct MessageDetails {
    pub network_key: String,
    pub network_title: String,

    pub sender: String,
    pub sender_name: String,

    /// Message text when displayable, `0x`-hex rendering otherwise
    pub message: String,
    pub is_ascii_displayable: bool,

    /// The bytes being signed are a hash, warn the user
    pub is_hash: bool,
}
