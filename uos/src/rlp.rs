// Copyright (c) 2022-2023 The Coldsign Developers

//! Minimal RLP reader for Ethereum-family transactions
//!
//! Only what the review screen needs: walking the outer list of an unsigned
//! transaction and borrowing the display fields. Signing never depends on
//! this module, the signable bytes are always the undecoded payload.

use crate::UosError;

/// Display fields of an RLP-encoded unsigned transaction
#[derive(Clone, PartialEq, Debug)]
pub struct TransactionFields<'a> {
    pub nonce: &'a [u8],
    pub gas_price: &'a [u8],
    pub gas_limit: &'a [u8],
    /// Empty for contract creation
    pub recipient: &'a [u8],
    pub value: &'a [u8],
    pub data: &'a [u8],
    /// EIP-155 chain id, present on 9-item payloads
    pub chain_id: Option<&'a [u8]>,
}

impl TransactionFields<'_> {
    /// Chain id as an integer, defaulting to mainnet when the payload
    /// predates replay protection
    pub fn chain_id(&self) -> u64 {
        match self.chain_id {
            None => 1,
            Some(b) if b.len() > 8 => u64::MAX,
            Some(b) => b.iter().fold(0u64, |acc, x| (acc << 8) | *x as u64),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
enum Item<'a> {
    Bytes(&'a [u8]),
    List(&'a [u8]),
}

/// Read one RLP item from the head of `buff`, returning it with its total
/// encoded length
fn read_item(buff: &[u8]) -> Result<(Item, usize), UosError> {
    let first = *buff.first().ok_or(UosError::InvalidRlp)?;

    let (payload_at, len, list) = match first {
        0x00..=0x7f => return Ok((Item::Bytes(&buff[..1]), 1)),
        0x80..=0xb7 => (1, (first - 0x80) as usize, false),
        0xb8..=0xbf => {
            let lenlen = (first - 0xb7) as usize;
            (1 + lenlen, read_length(&buff[1..], lenlen)?, false)
        }
        0xc0..=0xf7 => (1, (first - 0xc0) as usize, true),
        0xf8..=0xff => {
            let lenlen = (first - 0xf7) as usize;
            (1 + lenlen, read_length(&buff[1..], lenlen)?, true)
        }
    };

    if buff.len() < payload_at + len {
        return Err(UosError::InvalidRlp);
    }

    let payload = &buff[payload_at..payload_at + len];
    let item = match list {
        true => Item::List(payload),
        false => Item::Bytes(payload),
    };

    Ok((item, payload_at + len))
}

fn read_length(buff: &[u8], lenlen: usize) -> Result<usize, UosError> {
    if lenlen > core::mem::size_of::<usize>() || buff.len() < lenlen {
        return Err(UosError::InvalidRlp);
    }
    Ok(buff[..lenlen]
        .iter()
        .fold(0usize, |acc, x| (acc << 8) | *x as usize))
}

/// Decode the display fields of an unsigned transaction payload.
///
/// Accepts the 6-item pre-EIP-155 form and the 9-item replay-protected form
/// (`[nonce, gas_price, gas_limit, to, value, data, chain_id, 0, 0]`).
pub fn decode_transaction(buff: &[u8]) -> Result<TransactionFields, UosError> {
    let (outer, n) = read_item(buff)?;
    let mut body = match (outer, n == buff.len()) {
        (Item::List(body), true) => body,
        _ => return Err(UosError::InvalidRlp),
    };

    let mut fields: Vec<&[u8]> = Vec::with_capacity(9);
    while !body.is_empty() {
        let (item, n) = read_item(body)?;
        match item {
            Item::Bytes(b) => fields.push(b),
            // transaction fields are flat
            Item::List(_) => return Err(UosError::InvalidRlp),
        }
        body = &body[n..];
    }

    if fields.len() != 6 && fields.len() != 9 {
        return Err(UosError::InvalidRlp);
    }

    Ok(TransactionFields {
        nonce: fields[0],
        gas_price: fields[1],
        gas_limit: fields[2],
        recipient: fields[3],
        value: fields[4],
        data: fields[5],
        chain_id: fields.get(6).copied(),
    })
}
