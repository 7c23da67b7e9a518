//! IBC Token Contract - Proof-Verified Cross-Chain Token Bridge
//!
//! This contract moves tokens between this chain and EOSIO-style peer chains
//! without trusted operators: every settlement carries a merkle proof checked
//! against anchor blocks held by a light-client contract.
//!
//! # Outbound Flow
//! 1. User locks an accepted token (native or CW20), or withdraws a pegged
//!    token by transferring it to this contract
//! 2. The transfer is appended to the peer chain's original-transaction log
//! 3. A relay settles it on the peer chain, then proves the settlement here
//!    with `CashConfirm`, which retires the entry
//!
//! # Inbound Flow
//! 1. A relay submits `Cash` with a proof of the peer-chain transfer
//! 2. Settlements are accepted strictly in `seq_num` order, once each
//! 3. The receiver is paid, or the hub forwards the amount to a third chain
//!
//! # Failure Handling
//! - Entries older than the confirmation watermark are refunded by `Rollback`
//!   minus the failed fee
//! - Entries that cannot be refunded are moved to an audit table
//! - Admin-only force rollback and removal for incident repair
//!
//! # Safety Switches
//! - `SetGlobal` disables every bridge operation
//! - `LockAll` stops outbound transfers and withdrawals only
//! - Per-token once/daily/per-minute quotas

pub mod cash_trxs;
pub mod contract;
pub mod error;
mod execute;
pub mod fee_manager;
pub mod hash;
pub mod ledger;
pub mod memo;
pub mod merkle;
pub mod msg;
pub mod orig_trxs;
pub mod proof;
mod query;
pub mod rate_limit;
pub mod state;

pub use crate::error::ContractError;
pub use crate::fee_manager::{calculate_fee, FeeKind, FeeRule, FeeSchedule};
pub use crate::hash::{bytes32_to_hex, sha256, Digest};
pub use crate::merkle::MerkleTree;
