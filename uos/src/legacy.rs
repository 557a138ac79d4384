// Copyright (c) 2022-2023 The Coldsign Developers

//! Legacy JSON envelope and scan-text classification
//!
//! Older online companions encode a whole request as a JSON document in a
//! single QR code. These payloads are classified before any frame parsing:
//! an address QR (a wallet showing its own address) is rejected with a
//! dedicated error, a network-spec document adds a network rather than
//! signing anything, and everything else JSON-shaped is a legacy Ethereum
//! signing request.

use serde::Deserialize;

use crate::UosError;

/// Legacy request action field
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyAction {
    SignTransaction,
    SignData,
}

/// Body of a legacy request
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct LegacyData {
    /// Sender account, `0x`-prefixed
    pub account: String,

    /// RLP transaction hex for `signTransaction`
    #[serde(default)]
    pub rlp: Option<String>,

    /// Message text for `signData`
    #[serde(default)]
    pub data: Option<String>,
}

/// A legacy Ethereum signing request
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct LegacyRequest {
    pub action: LegacyAction,
    pub data: LegacyData,
}

/// A network-spec payload, identified by its `genesisHash` field
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Genesis hash of the chain, `0x`-prefixed hex
    pub genesis_hash: String,

    /// Display title
    #[serde(default)]
    pub title: Option<String>,

    /// Default SS58 prefix / chain id, where provided
    #[serde(default)]
    pub prefix: Option<u16>,
}

/// Classified textual QR payload
#[derive(Clone, PartialEq, Debug)]
pub enum TextPayload {
    /// The QR encodes a bare account address, not a request
    Address,
    /// Network-spec document
    Network(NetworkSpec),
    /// Legacy signing request
    Request(LegacyRequest),
}

/// True for QR text carrying an address rather than a payload
pub fn is_address_string(text: &str) -> bool {
    text.starts_with("0x") || text.starts_with("ethereum:") || text.starts_with("substrate:")
}

/// Classify textual scan data.
///
/// `Ok(None)` means the text is not a textual payload at all and should be
/// handed to the binary frame codec. JSON that matches neither known
/// document shape is a hard error rather than falling through, since a
/// binary re-parse of JSON text cannot succeed.
pub fn classify(text: &str) -> Result<Option<TextPayload>, UosError> {
    if is_address_string(text) {
        return Ok(Some(TextPayload::Address));
    }

    if !text.trim_start().starts_with('{') {
        return Ok(None);
    }

    if let Ok(spec) = serde_json::from_str::<NetworkSpec>(text) {
        return Ok(Some(TextPayload::Network(spec)));
    }

    match serde_json::from_str::<LegacyRequest>(text) {
        Ok(req) => Ok(Some(TextPayload::Request(req))),
        Err(_) => Err(UosError::MalformedPayload),
    }
}
