//! Hash primitives shared by the proof verifier and the transaction logs.
//!
//! Peer-chain digests (receipts, block ids, merkle nodes) are SHA-256. Local
//! transaction ids are derived with keccak256 since CosmWasm does not expose
//! the hash of the executing transaction.
//!
//! # Block id layout
//! `sha256(header_bytes)` with bytes 0-3 replaced by the big-endian block
//! number.
//!
//! # Local transaction id layout (keccak256 over 4 + N + 8 + 4 + 8 bytes)
//! - tag (4 bytes, e.g. `b"xfer"`)
//! - this chain name (variable)
//! - block height (u64, big-endian)
//! - transaction index (u32, big-endian)
//! - contract nonce (u64, big-endian)

use cosmwasm_std::{Binary, Env};
use sha2::{Digest as _, Sha256};
use tiny_keccak::{Hasher, Keccak};

use crate::error::ContractError;

/// 32-byte digest
pub type Digest = [u8; 32];

/// Compute sha256 of arbitrary data
pub fn sha256(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> Digest {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Compute the id of a block from its serialized header.
pub fn compute_block_id(header_bytes: &[u8], block_num: u32) -> Digest {
    let mut id = sha256(header_bytes);
    id[0..4].copy_from_slice(&block_num.to_be_bytes());
    id
}

/// Derive the id of a transaction originated by this contract.
pub fn compute_trx_id(tag: &[u8; 4], this_chain: &str, env: &Env, nonce: u64) -> Digest {
    let tx_index = env.transaction.as_ref().map(|t| t.index).unwrap_or(0);

    let mut data = Vec::with_capacity(4 + this_chain.len() + 8 + 4 + 8);
    data.extend_from_slice(tag);
    data.extend_from_slice(this_chain.as_bytes());
    data.extend_from_slice(&env.block.height.to_be_bytes());
    data.extend_from_slice(&tx_index.to_be_bytes());
    data.extend_from_slice(&nonce.to_be_bytes());
    keccak256(&data)
}

/// Convert 32-byte hash to hex string (for attributes/logging)
pub fn bytes32_to_hex(bytes: &Digest) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a 32-byte hash from a message field
pub fn parse_hash(value: &Binary) -> Result<Digest, ContractError> {
    value
        .to_vec()
        .try_into()
        .map_err(|_| ContractError::InvalidHashLength { got: value.len() })
}

/// Parse a list of 32-byte hashes (merkle paths)
pub fn parse_hashes(values: &[Binary]) -> Result<Vec<Digest>, ContractError> {
    values.iter().map(parse_hash).collect()
}
