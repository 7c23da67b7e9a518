//! Message types for the IBC token contract
//!
//! This module defines all messages for instantiation, execution, and queries.

use common::AssetInfo;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Uint128};
use cw20::Cw20ReceiveMsg;

use crate::fee_manager::{FeeKind, FeeRule, FeeSchedule};
use crate::proof::TrxProof;
use crate::state::{
    AcceptedToken, CashAction, CashTrx, HubTrx, OrigTrx, OrigTrxAction, PeerChain,
    PeerChainState, PeggedToken, Quantity, RemovalReason, RemovedTrx, TokenRef,
};

// ============================================================================
// Instantiate & Migrate
// ============================================================================

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address for contract management
    pub admin: String,
    /// Name of this chain as registered on peer chains
    pub this_chain: String,
    /// Reserved account name that relays settlements to another peer chain
    pub hub_account: Option<String>,
}

// ============================================================================
// Execute Messages
// ============================================================================

#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Outbound Transfers
    // ========================================================================
    /// Lock one native coin for a peer chain. Memo: `receiver@chain[ notes]`
    TransferNative { memo: String },

    /// Lock a CW20 token (called via CW20 send)
    Receive(Cw20ReceiveMsg),

    /// Move a pegged token. When `to` is this contract the amount is
    /// withdrawn to the token's origin chain.
    Transfer {
        to: String,
        symbol: String,
        amount: Uint128,
        memo: String,
    },

    // ========================================================================
    // Settlement
    // ========================================================================
    /// Settle a proven transfer made on a peer chain. Sender must be `relay`.
    Cash {
        seq_num: u64,
        from_chain: String,
        orig_trx_id: Binary,
        proof: TrxProof,
        orig_trx_block_num: u64,
        anchor_block_num: u32,
        to: String,
        quantity: Quantity,
        memo: String,
        relay: String,
    },

    /// Retire an original transaction the peer chain has cashed
    CashConfirm {
        from_chain: String,
        cash_trx_id: Binary,
        proof: TrxProof,
        cash_trx_block_num: u64,
        anchor_block_num: u32,
        orig_trx_id: Binary,
    },

    // ========================================================================
    // Rollback
    // ========================================================================
    /// Refund an original transaction the peer chain never cashed
    Rollback {
        peer_chain: String,
        trx_id: Binary,
        relay: String,
    },

    /// Remove an eligible original transaction that cannot be refunded
    RmUnableRb {
        peer_chain: String,
        trx_id: Binary,
        relay: String,
    },

    // ========================================================================
    // Incident Repair (Admin)
    // ========================================================================
    FcRollback {
        peer_chain: String,
        trx_ids: Vec<Binary>,
    },

    FcRmOrigTrx {
        peer_chain: String,
        trx_ids: Vec<Binary>,
    },

    /// Reset the counters and logs of a peer chain
    ForceInit { peer_chain: String },

    // ========================================================================
    // Global Switches (Admin)
    // ========================================================================
    LockAll {},

    UnlockAll {},

    SetGlobal { active: bool },

    // ========================================================================
    // Configuration (Admin)
    // ========================================================================
    RegPeerChain {
        name: String,
        info: String,
        peer_token_contract: String,
        light_client: String,
        free_account: Option<String>,
        max_original_trxs_per_block: u32,
        max_origtrxs_table_records: u32,
        cache_cashtrxs_table_records: u32,
        active: bool,
    },

    SetPeerChainActive { name: String, active: bool },

    RegAcceptToken {
        symbol: String,
        asset: AssetInfo,
        max_accept: Uint128,
        min_once_transfer: Uint128,
        max_once_transfer: Uint128,
        max_daily_transfer: Uint128,
        max_tfs_per_minute: u32,
        fees: Option<FeeSchedule>,
        active: bool,
    },

    RegPegToken {
        symbol: String,
        peer_chain: String,
        peer_contract: String,
        max_supply: Uint128,
        min_once_withdraw: Uint128,
        max_once_withdraw: Uint128,
        max_daily_withdraw: Uint128,
        max_wds_per_minute: u32,
        fees: Option<FeeSchedule>,
        active: bool,
    },

    SetTokenFee {
        symbol: String,
        kind: FeeKind,
        rule: FeeRule,
    },

    SetTokenActive { symbol: String, active: bool },

    // ========================================================================
    // Balance Slots
    // ========================================================================
    Open { owner: String, symbol: String },

    Close { symbol: String },
}

/// Payload of a CW20 send to this contract
#[cw_serde]
pub enum ReceiveMsg {
    Transfer { memo: String },
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    #[returns(StatusResponse)]
    Status {},

    #[returns(PeerChain)]
    PeerChain { name: String },

    #[returns(PeerChainsResponse)]
    PeerChains {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(PeerChainState)]
    PeerChainState { name: String },

    #[returns(AcceptedToken)]
    AcceptedToken { symbol: String },

    #[returns(AcceptedTokensResponse)]
    AcceptedTokens {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(PeggedToken)]
    PeggedToken { symbol: String },

    #[returns(PeggedTokensResponse)]
    PeggedTokens {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(BalanceResponse)]
    Balance { owner: String, symbol: String },

    #[returns(Option<OrigTrxResponse>)]
    OrigTrx { peer_chain: String, trx_id: Binary },

    #[returns(OrigTrxsResponse)]
    OrigTrxs {
        peer_chain: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    /// Entries appended at or after `time_slot`
    #[returns(OrigTrxsResponse)]
    OrigTrxsSinceSlot {
        peer_chain: String,
        time_slot: u64,
        limit: Option<u32>,
    },

    #[returns(Option<CashTrxResponse>)]
    CashTrx { peer_chain: String, seq_num: u64 },

    #[returns(CashTrxsResponse)]
    CashTrxs {
        peer_chain: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(Option<CashTrxResponse>)]
    CashTrxByOrig {
        peer_chain: String,
        orig_trx_id: Binary,
    },

    #[returns(RemovedTrxsResponse)]
    RemovedUnrollbackables {
        peer_chain: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(Option<HubTrxResponse>)]
    HubTrx { forwarded_trx_id: Binary },

    #[returns(HubTrxsResponse)]
    HubTrxs {
        start_after: Option<Binary>,
        limit: Option<u32>,
    },

    /// Preview a fee without state changes
    #[returns(CalculateFeeResponse)]
    CalculateFee {
        symbol: String,
        kind: FeeKind,
        amount: Uint128,
    },

    #[returns(VerifyMerklePathResponse)]
    VerifyMerklePath {
        leaf: Binary,
        path: Vec<Binary>,
        root: Binary,
    },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ConfigResponse {
    pub admin: Addr,
    pub this_chain: String,
    pub active: bool,
    pub locked: bool,
    pub hub_account: Option<String>,
}

#[cw_serde]
pub struct StatusResponse {
    pub active: bool,
    pub locked: bool,
    pub peer_chains: u32,
    pub accepted_tokens: u32,
    pub pegged_tokens: u32,
    pub hub_unfinished_trxs: u64,
}

#[cw_serde]
pub struct PeerChainsResponse {
    pub peer_chains: Vec<PeerChain>,
}

#[cw_serde]
pub struct AcceptedTokensResponse {
    pub tokens: Vec<AcceptedToken>,
}

#[cw_serde]
pub struct PeggedTokensResponse {
    pub tokens: Vec<PeggedToken>,
}

#[cw_serde]
pub struct BalanceResponse {
    pub owner: Addr,
    pub symbol: String,
    pub balance: Uint128,
}

#[cw_serde]
pub struct OrigTrxResponse {
    pub id: u64,
    pub block_time_slot: u64,
    pub trx_id: Binary,
    pub action: OrigTrxAction,
}

impl From<OrigTrx> for OrigTrxResponse {
    fn from(trx: OrigTrx) -> Self {
        Self {
            id: trx.id,
            block_time_slot: trx.block_time_slot,
            trx_id: Binary::from(trx.trx_id.to_vec()),
            action: trx.action,
        }
    }
}

#[cw_serde]
pub struct OrigTrxsResponse {
    pub orig_trxs: Vec<OrigTrxResponse>,
}

#[cw_serde]
pub struct CashTrxResponse {
    pub seq_num: u64,
    pub block_time_slot: u64,
    pub trx_id: Binary,
    pub action: CashAction,
    pub orig_trx_id: Binary,
    pub orig_trx_block_num: u64,
}

impl From<CashTrx> for CashTrxResponse {
    fn from(trx: CashTrx) -> Self {
        Self {
            seq_num: trx.seq_num,
            block_time_slot: trx.block_time_slot,
            trx_id: Binary::from(trx.trx_id.to_vec()),
            action: trx.action,
            orig_trx_id: Binary::from(trx.orig_trx_id.to_vec()),
            orig_trx_block_num: trx.orig_trx_block_num,
        }
    }
}

#[cw_serde]
pub struct CashTrxsResponse {
    pub cash_trxs: Vec<CashTrxResponse>,
}

#[cw_serde]
pub struct RemovedTrxResponse {
    pub id: u64,
    pub removed_time_slot: u64,
    pub reason: RemovalReason,
    pub orig_trx: OrigTrxResponse,
}

impl From<RemovedTrx> for RemovedTrxResponse {
    fn from(removed: RemovedTrx) -> Self {
        Self {
            id: removed.id,
            removed_time_slot: removed.removed_time_slot,
            reason: removed.reason,
            orig_trx: removed.orig_trx.into(),
        }
    }
}

#[cw_serde]
pub struct RemovedTrxsResponse {
    pub removed: Vec<RemovedTrxResponse>,
}

#[cw_serde]
pub struct HubTrxResponse {
    pub cash_seq_num: u64,
    pub cash_time_slot: u64,
    pub from_chain: String,
    pub from_account: String,
    pub orig_trx_id: Binary,
    pub to_chain: String,
    pub to_account: String,
    pub token: TokenRef,
    pub quantity: Quantity,
    pub forwarded_trx_id: Binary,
    pub forwarded_time_slot: u64,
}

impl From<HubTrx> for HubTrxResponse {
    fn from(trx: HubTrx) -> Self {
        Self {
            cash_seq_num: trx.cash_seq_num,
            cash_time_slot: trx.cash_time_slot,
            from_chain: trx.from_chain,
            from_account: trx.from_account,
            orig_trx_id: Binary::from(trx.orig_trx_id.to_vec()),
            to_chain: trx.to_chain,
            to_account: trx.to_account,
            token: trx.token,
            quantity: trx.quantity,
            forwarded_trx_id: Binary::from(trx.forwarded_trx_id.to_vec()),
            forwarded_time_slot: trx.forwarded_time_slot,
        }
    }
}

#[cw_serde]
pub struct HubTrxsResponse {
    pub unfinished_trxs: u64,
    pub hub_trxs: Vec<HubTrxResponse>,
}

#[cw_serde]
pub struct CalculateFeeResponse {
    pub symbol: String,
    pub kind: FeeKind,
    pub rule: FeeRule,
    pub gross: Uint128,
    pub fee: Uint128,
    pub net: Uint128,
}

#[cw_serde]
pub struct VerifyMerklePathResponse {
    pub valid: bool,
    pub computed_root: Binary,
}
