//! Error types for the IBC token contract
//!
//! Every variant aborts the whole transaction. Nothing is retried here; the
//! relay decides whether and when to resubmit.

use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: only admin can perform this action")]
    Unauthorized,

    #[error("Unauthorized: relay {relay} must sign its own submission")]
    UnauthorizedRelay { relay: String },

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Contract is not active")]
    GlobalInactive,

    #[error("All transfers and withdrawals are locked")]
    GloballyLocked,

    #[error("Peer chain not registered: {chain}")]
    PeerChainNotFound { chain: String },

    #[error("Peer chain not active: {chain}")]
    PeerChainInactive { chain: String },

    #[error("Token not registered: {symbol}")]
    TokenNotFound { symbol: String },

    #[error("Token not active: {symbol}")]
    TokenInactive { symbol: String },

    #[error("Symbol {symbol} is already registered with a different role")]
    SymbolConflict { symbol: String },

    #[error("Invalid symbol: {symbol}")]
    InvalidSymbol { symbol: String },

    #[error("Invalid peer chain name: {chain}")]
    InvalidChainName { chain: String },

    #[error("Invalid peer token contract: {contract}")]
    InvalidPeerContract { contract: String },

    #[error("Invalid memo: {reason}")]
    InvalidMemo { reason: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Invalid fee: {reason}")]
    InvalidFee { reason: String },

    #[error("No funds sent")]
    NoFundsSent,

    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        available: Uint128,
        required: Uint128,
    },

    #[error("Insufficient bridge liquidity for {symbol}")]
    InsufficientLiquidity { symbol: String },

    #[error("Maximum supply of {symbol} would be exceeded")]
    MaxSupplyExceeded { symbol: String },

    #[error("Balance slot not empty")]
    BalanceNotEmpty,

    #[error("Invalid hash length: expected 32 bytes, got {got}")]
    InvalidHashLength { got: usize },

    // ========================================================================
    // Quota Errors
    // ========================================================================

    #[error("Minimum once amount is {min}")]
    BelowMinimumAmount { min: Uint128 },

    #[error("Maximum once amount is {max}")]
    AboveMaximumAmount { max: Uint128 },

    #[error("Quota exceeded: {limit_type} limit is {limit}, requested {requested}")]
    QuotaExceeded {
        limit_type: String,
        limit: Uint128,
        requested: Uint128,
    },

    #[error("Per-block original transaction limit of {limit} reached")]
    BlockTrxLimitReached { limit: u32 },

    #[error("Original transaction table is full ({limit} records)")]
    OrigTrxTableFull { limit: u32 },

    // ========================================================================
    // Replay / Ordering Errors
    // ========================================================================

    #[error("Invalid seq_num: expected {expected}, got {got}")]
    InvalidSeqNum { expected: u64, got: u64 },

    #[error("Original transaction {orig_trx_id} already settled")]
    DuplicateSettlement { orig_trx_id: String },

    #[error("orig_trx_block_num {got} is lower than the latest settled block {latest}")]
    OrigTrxBlockNumRegressed { latest: u64, got: u64 },

    #[error("Time slot {got} is lower than the latest original transaction slot {latest}")]
    NonMonotonicTimeSlot { latest: u64, got: u64 },

    // ========================================================================
    // Proof Errors
    // ========================================================================

    #[error("Merkle verification failed: {level}")]
    MerkleVerificationFailed { level: String },

    #[error("Invalid transaction receipt: {reason}")]
    InvalidReceipt { reason: String },

    #[error("Invalid block header: {reason}")]
    InvalidBlockHeader { reason: String },

    #[error("Anchor block {block_num} unavailable from light client")]
    AnchorBlockUnavailable { block_num: u32 },

    // ========================================================================
    // Rollback Errors
    // ========================================================================

    #[error("Original transaction not found: {trx_id}")]
    OrigTrxNotFound { trx_id: String },

    #[error("Rollback not eligible: slot {time_slot} is after last confirmed slot {last_confirmed}")]
    RollbackNotEligible { time_slot: u64, last_confirmed: u64 },

    #[error("Original transaction {trx_id} cannot be rolled back automatically")]
    Unrollbackable { trx_id: String },

    // ========================================================================
    // Hub Errors
    // ========================================================================

    #[error("Hub has {limit} unfinished transactions")]
    HubCapacityReached { limit: u64 },

    #[error("Hub transaction not found: {trx_id}")]
    HubTrxNotFound { trx_id: String },
}
