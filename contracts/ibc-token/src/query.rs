//! Query handlers for the IBC token contract.
//!
//! This module contains all query message handlers for retrieving contract state.

use cosmwasm_std::{Binary, Deps, Order, StdError, StdResult, Uint128};
use cw_storage_plus::Bound;

use crate::fee_manager::{calculate_fee, FeeKind};
use crate::hash::{parse_hash, Digest};
use crate::merkle;
use crate::msg::{
    AcceptedTokensResponse, BalanceResponse, CalculateFeeResponse, CashTrxResponse,
    CashTrxsResponse, ConfigResponse, HubTrxResponse, HubTrxsResponse, OrigTrxResponse,
    OrigTrxsResponse, PeerChainsResponse, PeggedTokensResponse, RemovedTrxsResponse,
    StatusResponse, VerifyMerklePathResponse,
};
use crate::state::{
    AcceptedToken, PeerChain, PeerChainState, PeggedToken, ACCEPTS, BALANCES, CASH_TRXS,
    CASH_TRX_BY_ORIG, CONFIG, HUB_GLOBALS, HUB_TRXS, ORIG_TRXS, ORIG_TRX_BY_HASH,
    ORIG_TRX_BY_SLOT, PEER_CHAINS, PEER_CHAIN_STATE, PEGS, RMD_UNRBS,
};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 50;

fn page_size(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize
}

fn to_digest(value: &Binary) -> StdResult<Digest> {
    parse_hash(value).map_err(|e| StdError::generic_err(e.to_string()))
}

// ============================================================================
// Core Queries
// ============================================================================

/// Query contract configuration.
pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        admin: config.admin,
        this_chain: config.this_chain,
        active: config.active,
        locked: config.locked,
        hub_account: config.hub_account,
    })
}

/// Query contract status summary.
pub fn query_status(deps: Deps) -> StdResult<StatusResponse> {
    let config = CONFIG.load(deps.storage)?;
    let hub = HUB_GLOBALS.may_load(deps.storage)?.unwrap_or_default();

    let peer_chains = PEER_CHAINS
        .keys(deps.storage, None, None, Order::Ascending)
        .count();
    let accepted_tokens = ACCEPTS.keys(deps.storage, None, None, Order::Ascending).count();
    let pegged_tokens = PEGS.keys(deps.storage, None, None, Order::Ascending).count();

    Ok(StatusResponse {
        active: config.active,
        locked: config.locked,
        peer_chains: peer_chains as u32,
        accepted_tokens: accepted_tokens as u32,
        pegged_tokens: pegged_tokens as u32,
        hub_unfinished_trxs: hub.unfinished_trxs,
    })
}

// ============================================================================
// Peer Chains
// ============================================================================

pub fn query_peer_chain(deps: Deps, name: String) -> StdResult<PeerChain> {
    PEER_CHAINS.load(deps.storage, &name)
}

pub fn query_peer_chains(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<PeerChainsResponse> {
    let limit = page_size(limit);
    let start = start_after.as_deref().map(Bound::exclusive);

    let peer_chains = PEER_CHAINS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, chain)| chain))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(PeerChainsResponse { peer_chains })
}

pub fn query_peer_chain_state(deps: Deps, name: String) -> StdResult<PeerChainState> {
    PEER_CHAIN_STATE.load(deps.storage, &name)
}

// ============================================================================
// Tokens
// ============================================================================

pub fn query_accepted_token(deps: Deps, symbol: String) -> StdResult<AcceptedToken> {
    ACCEPTS.load(deps.storage, &symbol)
}

pub fn query_accepted_tokens(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<AcceptedTokensResponse> {
    let limit = page_size(limit);
    let start = start_after.as_deref().map(Bound::exclusive);

    let tokens = ACCEPTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, token)| token))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(AcceptedTokensResponse { tokens })
}

pub fn query_pegged_token(deps: Deps, symbol: String) -> StdResult<PeggedToken> {
    PEGS.load(deps.storage, &symbol)
}

pub fn query_pegged_tokens(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<PeggedTokensResponse> {
    let limit = page_size(limit);
    let start = start_after.as_deref().map(Bound::exclusive);

    let tokens = PEGS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, token)| token))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(PeggedTokensResponse { tokens })
}

/// Pegged token balance; missing slots read as zero.
pub fn query_balance(deps: Deps, owner: String, symbol: String) -> StdResult<BalanceResponse> {
    let owner = deps.api.addr_validate(&owner)?;
    let balance = BALANCES
        .may_load(deps.storage, (&owner, symbol.as_str()))?
        .unwrap_or_default();
    Ok(BalanceResponse {
        owner,
        symbol,
        balance,
    })
}

// ============================================================================
// Original Transactions
// ============================================================================

pub fn query_orig_trx(
    deps: Deps,
    peer_chain: String,
    trx_id: Binary,
) -> StdResult<Option<OrigTrxResponse>> {
    let trx_id = to_digest(&trx_id)?;
    let Some(id) = ORIG_TRX_BY_HASH.may_load(deps.storage, (peer_chain.as_str(), trx_id.as_slice()))?
    else {
        return Ok(None);
    };
    Ok(ORIG_TRXS
        .may_load(deps.storage, (peer_chain.as_str(), id))?
        .map(Into::into))
}

pub fn query_orig_trxs(
    deps: Deps,
    peer_chain: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<OrigTrxsResponse> {
    let limit = page_size(limit);
    let start = start_after.map(Bound::exclusive);

    let orig_trxs = ORIG_TRXS
        .prefix(peer_chain.as_str())
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, trx)| trx.into()))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(OrigTrxsResponse { orig_trxs })
}

/// Entries appended at or after `time_slot`, in slot order.
pub fn query_orig_trxs_since_slot(
    deps: Deps,
    peer_chain: String,
    time_slot: u64,
    limit: Option<u32>,
) -> StdResult<OrigTrxsResponse> {
    let limit = page_size(limit);

    let orig_trxs = ORIG_TRX_BY_SLOT
        .sub_prefix(peer_chain.as_str())
        .keys(
            deps.storage,
            Some(Bound::inclusive((time_slot, 0u64))),
            None,
            Order::Ascending,
        )
        .take(limit)
        .map(|key| {
            let (_, id) = key?;
            ORIG_TRXS
                .load(deps.storage, (peer_chain.as_str(), id))
                .map(OrigTrxResponse::from)
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(OrigTrxsResponse { orig_trxs })
}

pub fn query_removed_unrollbackables(
    deps: Deps,
    peer_chain: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<RemovedTrxsResponse> {
    let limit = page_size(limit);
    let start = start_after.map(Bound::exclusive);

    let removed = RMD_UNRBS
        .prefix(peer_chain.as_str())
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, removed)| removed.into()))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(RemovedTrxsResponse { removed })
}

// ============================================================================
// Cash Transactions
// ============================================================================

pub fn query_cash_trx(
    deps: Deps,
    peer_chain: String,
    seq_num: u64,
) -> StdResult<Option<CashTrxResponse>> {
    Ok(CASH_TRXS
        .may_load(deps.storage, (peer_chain.as_str(), seq_num))?
        .map(Into::into))
}

pub fn query_cash_trxs(
    deps: Deps,
    peer_chain: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<CashTrxsResponse> {
    let limit = page_size(limit);
    let start = start_after.map(Bound::exclusive);

    let cash_trxs = CASH_TRXS
        .prefix(peer_chain.as_str())
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, trx)| trx.into()))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(CashTrxsResponse { cash_trxs })
}

pub fn query_cash_trx_by_orig(
    deps: Deps,
    peer_chain: String,
    orig_trx_id: Binary,
) -> StdResult<Option<CashTrxResponse>> {
    let orig_trx_id = to_digest(&orig_trx_id)?;
    let Some(seq_num) =
        CASH_TRX_BY_ORIG.may_load(deps.storage, (peer_chain.as_str(), orig_trx_id.as_slice()))?
    else {
        return Ok(None);
    };
    query_cash_trx(deps, peer_chain, seq_num)
}

// ============================================================================
// Hub
// ============================================================================

pub fn query_hub_trx(deps: Deps, forwarded_trx_id: Binary) -> StdResult<Option<HubTrxResponse>> {
    let forwarded_trx_id = to_digest(&forwarded_trx_id)?;
    Ok(HUB_TRXS
        .may_load(deps.storage, forwarded_trx_id.as_slice())?
        .map(Into::into))
}

pub fn query_hub_trxs(
    deps: Deps,
    start_after: Option<Binary>,
    limit: Option<u32>,
) -> StdResult<HubTrxsResponse> {
    let limit = page_size(limit);
    let start = start_after.as_ref().map(|b| Bound::exclusive(b.as_slice()));
    let globals = HUB_GLOBALS.may_load(deps.storage)?.unwrap_or_default();

    let hub_trxs = HUB_TRXS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, trx)| trx.into()))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(HubTrxsResponse {
        unfinished_trxs: globals.unfinished_trxs,
        hub_trxs,
    })
}

// ============================================================================
// Utilities
// ============================================================================

/// Preview the fee charged on `amount` of an accepted or pegged token.
pub fn query_calculate_fee(
    deps: Deps,
    symbol: String,
    kind: FeeKind,
    amount: Uint128,
) -> StdResult<CalculateFeeResponse> {
    let fees = if let Some(token) = ACCEPTS.may_load(deps.storage, &symbol)? {
        token.fees
    } else if let Some(token) = PEGS.may_load(deps.storage, &symbol)? {
        token.fees
    } else {
        return Err(StdError::not_found(format!("token {}", symbol)));
    };

    let rule = fees.rule(kind).clone();
    let (net, fee) = calculate_fee(&rule, amount);
    Ok(CalculateFeeResponse {
        symbol,
        kind,
        rule,
        gross: amount,
        fee,
        net,
    })
}

/// Recombine `leaf` with a canonical path and compare against `root`.
pub fn query_verify_merkle_path(
    leaf: Binary,
    path: Vec<Binary>,
    root: Binary,
) -> StdResult<VerifyMerklePathResponse> {
    let leaf = to_digest(&leaf)?;
    let root = to_digest(&root)?;
    let path = path.iter().map(to_digest).collect::<StdResult<Vec<_>>>()?;

    let computed = merkle::compute_root(&leaf, &path);
    Ok(VerifyMerklePathResponse {
        valid: computed == root,
        computed_root: Binary::from(computed.to_vec()),
    })
}
