//! Two-level inclusion proofs of peer-chain transactions.
//!
//! Level one: the receipt digest reaches the block header's
//! `transaction_mroot`. Level two: the block id reaches the
//! `block_id_merkle_root` of an anchor block held by the peer chain's light
//! client contract. Receipts and headers travel as raw JSON bytes; digests
//! are taken over those exact bytes before decoding.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{from_json, Addr, Binary, QuerierWrapper, Uint128};

use crate::error::ContractError;
use crate::hash::{compute_block_id, parse_hash, parse_hashes, sha256, Digest};
use crate::merkle;

// ============================================================================
// Wire Types
// ============================================================================

/// Proof bundle submitted by a relay
#[cw_serde]
pub struct TrxProof {
    /// Serialized `TrxReceipt`
    pub receipt: Binary,
    /// Sibling path from the receipt digest to `transaction_mroot`
    pub receipt_path: Vec<Binary>,
    /// Serialized `BlockHeader`
    pub block_header: Binary,
    /// Sibling path from the block id to the anchor block's root
    pub block_id_path: Vec<Binary>,
}

#[cw_serde]
pub struct BlockHeader {
    pub block_num: u32,
    pub timestamp: u64,
    pub producer: String,
    pub previous: Binary,
    pub transaction_mroot: Binary,
}

#[cw_serde]
pub enum ReceiptStatus {
    Executed,
    SoftFail,
    HardFail,
    Expired,
}

#[cw_serde]
pub struct ReceiptQuantity {
    pub symbol: String,
    pub amount: Uint128,
}

#[cw_serde]
pub enum ReceiptAction {
    /// Token transfer into the peer chain's bridge contract
    Transfer {
        from: String,
        to: String,
        quantity: ReceiptQuantity,
        memo: String,
    },
    /// Settlement executed by the peer chain's bridge contract
    Cash {
        seq_num: u64,
        from_chain: String,
        orig_trx_id: Binary,
        to: String,
        quantity: ReceiptQuantity,
    },
}

#[cw_serde]
pub struct TrxReceipt {
    pub trx_id: Binary,
    pub status: ReceiptStatus,
    /// Contract that executed the action
    pub contract: String,
    pub action: ReceiptAction,
}

// ============================================================================
// Light Client Interface
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum LightClientQueryMsg {
    #[returns(AnchorBlockResponse)]
    AnchorBlock { block_num: u32 },
}

#[cw_serde]
pub struct AnchorBlockResponse {
    pub block_num: u32,
    pub block_id_merkle_root: Binary,
}

// ============================================================================
// Verification
// ============================================================================

/// Receipt and header whose inclusion has been proven
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiedReceipt {
    pub receipt: TrxReceipt,
    pub block_num: u32,
    pub block_id: Digest,
}

pub fn decode_receipt(bytes: &Binary) -> Result<TrxReceipt, ContractError> {
    from_json(bytes).map_err(|e| ContractError::InvalidReceipt {
        reason: e.to_string(),
    })
}

pub fn decode_block_header(bytes: &Binary) -> Result<BlockHeader, ContractError> {
    from_json(bytes).map_err(|e| ContractError::InvalidBlockHeader {
        reason: e.to_string(),
    })
}

/// Fetch the anchor root from the light client.
pub fn query_anchor_root(
    querier: &QuerierWrapper,
    light_client: &Addr,
    block_num: u32,
) -> Result<Digest, ContractError> {
    let anchor: AnchorBlockResponse = querier
        .query_wasm_smart(light_client, &LightClientQueryMsg::AnchorBlock { block_num })
        .map_err(|_| ContractError::AnchorBlockUnavailable { block_num })?;
    if anchor.block_num != block_num {
        return Err(ContractError::AnchorBlockUnavailable { block_num });
    }
    parse_hash(&anchor.block_id_merkle_root)
}

/// Verify both proof levels against `anchor_root`.
pub fn verify_proof(
    proof: &TrxProof,
    expected_block_num: u64,
    anchor_block_num: u32,
    anchor_root: &Digest,
) -> Result<VerifiedReceipt, ContractError> {
    let header = decode_block_header(&proof.block_header)?;
    if u64::from(header.block_num) != expected_block_num {
        return Err(ContractError::InvalidBlockHeader {
            reason: format!(
                "block_num {} does not match claimed {}",
                header.block_num, expected_block_num
            ),
        });
    }
    if anchor_block_num < header.block_num {
        return Err(ContractError::InvalidBlockHeader {
            reason: format!(
                "anchor block {} precedes block {}",
                anchor_block_num, header.block_num
            ),
        });
    }

    let trx_mroot = parse_hash(&header.transaction_mroot)?;
    let receipt_leaf = sha256(proof.receipt.as_slice());
    let receipt_path = parse_hashes(&proof.receipt_path)?;
    if !merkle::verify(&receipt_leaf, &receipt_path, &trx_mroot) {
        return Err(ContractError::MerkleVerificationFailed {
            level: "receipt".to_string(),
        });
    }

    let block_id = compute_block_id(proof.block_header.as_slice(), header.block_num);
    let block_id_path = parse_hashes(&proof.block_id_path)?;
    if !merkle::verify(&block_id, &block_id_path, anchor_root) {
        return Err(ContractError::MerkleVerificationFailed {
            level: "block_id".to_string(),
        });
    }

    let receipt = decode_receipt(&proof.receipt)?;
    if receipt.status != ReceiptStatus::Executed {
        return Err(ContractError::InvalidReceipt {
            reason: "transaction was not executed".to_string(),
        });
    }

    Ok(VerifiedReceipt {
        receipt,
        block_num: header.block_num,
        block_id,
    })
}
