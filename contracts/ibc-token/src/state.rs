//! State definitions for the IBC token contract
//!
//! Tables scoped to a peer chain use the chain name as the first key
//! component. Multi-index tables are a primary `Map` plus explicit index
//! `Map`s that the owning module keeps in sync.

use common::AssetInfo;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Empty, Env, Uint128};
use cw_storage_plus::{Item, Map};

use crate::fee_manager::FeeSchedule;
use crate::hash::Digest;
use crate::rate_limit::RateWindow;

// ============================================================================
// Core Configuration
// ============================================================================

/// Contract configuration
#[cw_serde]
pub struct Config {
    /// Admin address for contract management
    pub admin: Addr,
    /// Name of this chain as seen by peer chains (memo suffix)
    pub this_chain: String,
    /// Global switch; when false every bridge operation is rejected
    pub active: bool,
    /// Kill switch for outbound transfers and withdrawals
    pub locked: bool,
    /// Reserved destination that relays settlements onward
    pub hub_account: Option<String>,
}

/// Registered peer chain
#[cw_serde]
pub struct PeerChain {
    pub name: String,
    pub info: String,
    /// Bridge contract account on the peer chain
    pub peer_token_contract: String,
    /// Contract on this chain that stores anchor blocks of the peer chain
    pub light_client: Addr,
    /// Account exempt from fees
    pub free_account: Option<String>,
    /// 0 = unlimited
    pub max_original_trxs_per_block: u32,
    /// 0 = unlimited
    pub max_origtrxs_table_records: u32,
    pub cache_cashtrxs_table_records: u32,
    pub active: bool,
}

impl PeerChain {
    pub fn is_free_account(&self, account: &str) -> bool {
        self.free_account.as_deref() == Some(account)
    }
}

/// Mutable per-peer-chain counters
#[cw_serde]
pub struct PeerChainState {
    /// Last accepted settlement sequence number
    pub cash_seq_num: u64,
    pub last_confirmed_orig_trx_block_time_slot: u64,
    pub last_confirmed_orig_trx_id: u64,
    /// Slot of the most recently appended original transaction
    pub last_orig_trx_time_slot: u64,
    pub current_block_time_slot: u64,
    pub current_block_trxs: u32,
    pub origtrxs_next_id: u64,
    pub origtrxs_records: u32,
    pub cashtrxs_records: u32,
    pub rmdunrbs_next_id: u64,
}

impl Default for PeerChainState {
    /// Original transaction ids start at 1, so the `(0, 0)` watermark sits
    /// before every entry.
    fn default() -> Self {
        Self {
            cash_seq_num: 0,
            last_confirmed_orig_trx_block_time_slot: 0,
            last_confirmed_orig_trx_id: 0,
            last_orig_trx_time_slot: 0,
            current_block_time_slot: 0,
            current_block_trxs: 0,
            origtrxs_next_id: 1,
            origtrxs_records: 0,
            cashtrxs_records: 0,
            rmdunrbs_next_id: 0,
        }
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Amount of a token identified by symbol
#[cw_serde]
pub struct Quantity {
    pub symbol: String,
    pub amount: Uint128,
}

impl Quantity {
    pub fn new(symbol: impl Into<String>, amount: Uint128) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.symbol)
    }
}

/// Local token locked here and represented by a peg on peer chains
#[cw_serde]
pub struct AcceptedToken {
    pub symbol: String,
    pub asset: AssetInfo,
    /// Outstanding locked amount
    pub accept: Uint128,
    pub max_accept: Uint128,
    pub min_once_transfer: Uint128,
    pub max_once_transfer: Uint128,
    pub max_daily_transfer: Uint128,
    /// 0 = default of 100
    pub max_tfs_per_minute: u32,
    pub fees: FeeSchedule,
    pub total_transfer: Uint128,
    pub total_transfer_times: u64,
    pub total_cash: Uint128,
    pub total_cash_times: u64,
    pub active: bool,
    /// Outbound transfer window
    pub window: RateWindow,
}

/// Token issued here for an asset locked on a peer chain
#[cw_serde]
pub struct PeggedToken {
    pub symbol: String,
    /// Chain the original token lives on
    pub peer_chain: String,
    /// Original token contract on the peer chain
    pub peer_contract: String,
    pub supply: Uint128,
    pub max_supply: Uint128,
    pub min_once_withdraw: Uint128,
    pub max_once_withdraw: Uint128,
    pub max_daily_withdraw: Uint128,
    /// 0 = default of 100
    pub max_wds_per_minute: u32,
    pub fees: FeeSchedule,
    pub total_issue: Uint128,
    pub total_issue_times: u64,
    pub total_withdraw: Uint128,
    pub total_withdraw_times: u64,
    pub active: bool,
    /// Withdraw window
    pub window: RateWindow,
}

/// Which table a symbol lives in
#[cw_serde]
pub enum TokenRef {
    Accepted { symbol: String },
    Pegged { symbol: String },
}

impl TokenRef {
    pub fn symbol(&self) -> &str {
        match self {
            TokenRef::Accepted { symbol } | TokenRef::Pegged { symbol } => symbol,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TokenRef::Accepted { .. } => "accepted",
            TokenRef::Pegged { .. } => "pegged",
        }
    }
}

// ============================================================================
// Transaction Logs
// ============================================================================

/// Who gets a reversal credit when an original transaction is rolled back
#[cw_serde]
pub enum Originator {
    Account { addr: Addr },
    /// Hub forwarding a settlement onward
    HubForward,
    /// Hub returning a failed forward to its origin
    HubReturn,
}

#[cw_serde]
pub struct OrigTrxAction {
    pub token: TokenRef,
    pub originator: Originator,
    pub quantity: Quantity,
    pub peer_receiver: String,
    pub memo: String,
}

/// Outbound transaction awaiting confirmation from the peer chain
#[cw_serde]
pub struct OrigTrx {
    pub id: u64,
    pub block_time_slot: u64,
    pub trx_id: Digest,
    pub action: OrigTrxAction,
}

#[cw_serde]
pub struct CashAction {
    pub to: String,
    pub quantity: Quantity,
    pub memo: String,
}

/// Settlement accepted from the peer chain
#[cw_serde]
pub struct CashTrx {
    pub seq_num: u64,
    pub block_time_slot: u64,
    /// Local settlement id
    pub trx_id: Digest,
    pub action: CashAction,
    pub orig_trx_id: Digest,
    pub orig_trx_block_num: u64,
}

#[cw_serde]
pub enum RemovalReason {
    Unrollbackable,
    ForceRemoved,
    Trimmed,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Unrollbackable => "unrollbackable",
            RemovalReason::ForceRemoved => "force_removed",
            RemovalReason::Trimmed => "trimmed",
        }
    }
}

/// Audit record of an original transaction removed without a refund
#[cw_serde]
pub struct RemovedTrx {
    pub id: u64,
    pub removed_time_slot: u64,
    pub reason: RemovalReason,
    pub orig_trx: OrigTrx,
}

// ============================================================================
// Hub
// ============================================================================

/// Settlement relayed by the hub, keyed by the forwarded trx id
#[cw_serde]
pub struct HubTrx {
    pub cash_seq_num: u64,
    pub cash_time_slot: u64,
    pub from_chain: String,
    pub from_account: String,
    pub orig_trx_id: Digest,
    pub to_chain: String,
    pub to_account: String,
    pub token: TokenRef,
    /// Amount forwarded (after the success fee)
    pub quantity: Quantity,
    pub forwarded_trx_id: Digest,
    pub forwarded_time_slot: u64,
}

#[cw_serde]
#[derive(Default)]
pub struct HubGlobals {
    pub unfinished_trxs: u64,
}

// ============================================================================
// Constants
// ============================================================================

/// Contract name for cw2 migration info
pub const CONTRACT_NAME: &str = "crates.io:ibc-token";

/// Contract version for cw2 migration info
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Length of a time slot in nanoseconds (500 ms)
pub const TIME_SLOT_NANOS: u64 = 500_000_000;

/// Cap on hub transactions that are forwarded but not yet finished
pub const MAX_HUB_UNFINISHED_TRXS: u64 = 1000;

/// Upper bound on records removed by a single trim call
pub const TRIM_BATCH: u32 = 10;

pub fn time_slot(env: &Env) -> u64 {
    env.block.time.nanos() / TIME_SLOT_NANOS
}

// ============================================================================
// Core State Storage
// ============================================================================

pub const CONFIG: Item<Config> = Item::new("config");

/// Counter mixed into locally derived transaction ids
pub const TRX_NONCE: Item<u64> = Item::new("trx_nonce");

pub const PEER_CHAINS: Map<&str, PeerChain> = Map::new("peer_chains");

pub const PEER_CHAIN_STATE: Map<&str, PeerChainState> = Map::new("peer_chain_state");

/// Key: symbol
pub const ACCEPTS: Map<&str, AcceptedToken> = Map::new("accepts");

/// Key: `AssetInfo::key()`, Value: symbol
pub const ACCEPT_BY_ASSET: Map<&str, String> = Map::new("accept_by_asset");

/// Key: symbol
pub const PEGS: Map<&str, PeggedToken> = Map::new("pegs");

/// Pegged token balances
/// Key: (owner, symbol)
pub const BALANCES: Map<(&Addr, &str), Uint128> = Map::new("balances");

// ============================================================================
// Original Transactions
// ============================================================================

/// Key: (peer_chain, id)
pub const ORIG_TRXS: Map<(&str, u64), OrigTrx> = Map::new("orig_trxs");

/// Key: (peer_chain, trx_id), Value: id
pub const ORIG_TRX_BY_HASH: Map<(&str, &[u8]), u64> = Map::new("orig_trx_by_hash");

/// Key: (peer_chain, block_time_slot, id)
pub const ORIG_TRX_BY_SLOT: Map<(&str, u64, u64), Empty> = Map::new("orig_trx_by_slot");

/// Key: (peer_chain, id)
pub const RMD_UNRBS: Map<(&str, u64), RemovedTrx> = Map::new("rmd_unrbs");

// ============================================================================
// Cash Transactions
// ============================================================================

/// Key: (peer_chain, seq_num)
pub const CASH_TRXS: Map<(&str, u64), CashTrx> = Map::new("cash_trxs");

/// Key: (peer_chain, orig_trx_id), Value: seq_num
pub const CASH_TRX_BY_ORIG: Map<(&str, &[u8]), u64> = Map::new("cash_trx_by_orig");

/// Key: (peer_chain, orig_trx_block_num, seq_num)
pub const CASH_TRX_BY_BLOCK: Map<(&str, u64, u64), Empty> = Map::new("cash_trx_by_block");

// ============================================================================
// Hub
// ============================================================================

/// Key: forwarded trx id
pub const HUB_TRXS: Map<&[u8], HubTrx> = Map::new("hub_trxs");

/// Key: (from_chain, orig_trx_id), Value: forwarded trx id
pub const HUB_TRX_BY_ORIG: Map<(&str, &[u8]), Digest> = Map::new("hub_trx_by_orig");

pub const HUB_GLOBALS: Item<HubGlobals> = Item::new("hub_globals");
