// Copyright (c) 2022-2023 The Coldsign Developers

//! Built-in network registry
//!
//! Maps network keys (decimal chain ids for Ethereum-family networks,
//! genesis-hash hex for Substrate-family networks) to display metadata.
//! Resolution failures quote the title from this table so the user knows
//! which chain a key was missing for.

use strum::{Display, EnumString};

/// Ledger protocol category, selecting decode and signing rules
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString)]
pub enum ChainFamily {
    /// Account-balance model, RLP transactions, ecdsa signatures
    Ethereum,
    /// Hierarchically-derived keys, SCALE payloads
    Substrate,
}

/// Static metadata for one known network
#[derive(Clone, PartialEq, Debug)]
pub struct NetworkInfo {
    pub key: &'static str,
    pub title: &'static str,
    pub family: ChainFamily,
}

pub const POLKADOT_GENESIS: &str =
    "0x91b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3";
pub const KUSAMA_GENESIS: &str =
    "0xb0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe";
pub const WESTEND_GENESIS: &str =
    "0xe143f23803ac50e8f6f8e62695d1ce9e4e1d68aa36c1cd2cfd15340213f3423e";

/// Networks known to this build
pub const NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        key: "1",
        title: "Ethereum",
        family: ChainFamily::Ethereum,
    },
    NetworkInfo {
        key: "3",
        title: "Ropsten Testnet",
        family: ChainFamily::Ethereum,
    },
    NetworkInfo {
        key: "42",
        title: "Kovan Testnet",
        family: ChainFamily::Ethereum,
    },
    NetworkInfo {
        key: "61",
        title: "Ethereum Classic",
        family: ChainFamily::Ethereum,
    },
    NetworkInfo {
        key: POLKADOT_GENESIS,
        title: "Polkadot",
        family: ChainFamily::Substrate,
    },
    NetworkInfo {
        key: KUSAMA_GENESIS,
        title: "Kusama",
        family: ChainFamily::Substrate,
    },
    NetworkInfo {
        key: WESTEND_GENESIS,
        title: "Westend",
        family: ChainFamily::Substrate,
    },
];

/// Look up a network by key
pub fn lookup(key: &str) -> Option<&'static NetworkInfo> {
    NETWORKS.iter().find(|n| n.key == key)
}

/// Display title for a key, falling back to the key itself
pub fn title(key: &str) -> &str {
    lookup(key).map(|n| n.title).unwrap_or(key)
}
