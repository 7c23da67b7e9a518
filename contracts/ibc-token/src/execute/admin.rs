//! Admin operation handlers.
//!
//! Global switches and the peer chain reset used after an incident.

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use super::hub::delete_by_hub_trx_id;
use super::{ensure_admin, load_peer_chain};
use crate::cash_trxs;
use crate::error::ContractError;
use crate::orig_trxs;
use crate::state::{Originator, PeerChainState, CONFIG, PEER_CHAIN_STATE};

// ============================================================================
// Global Switches
// ============================================================================

/// Stop all outbound transfers and withdrawals. Settlement keeps running.
pub fn execute_lock_all(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    config.locked = true;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "lock_all")
        .add_attribute("locked", "true"))
}

pub fn execute_unlock_all(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    config.locked = false;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "unlock_all")
        .add_attribute("locked", "false"))
}

pub fn execute_set_global(
    deps: DepsMut,
    info: MessageInfo,
    active: bool,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    config.active = active;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "set_global")
        .add_attribute("active", active.to_string()))
}

// ============================================================================
// Peer Chain Reset
// ============================================================================

/// Drop both logs of a peer chain and zero its counters.
///
/// Token accounting is left as is; outstanding original transactions are
/// expected to have been settled or force-rolled back beforehand. Hub
/// forwards dropped with the log are finished, and the audit table of
/// removed transactions is kept along with its id counter.
pub fn execute_force_init(
    deps: DepsMut,
    info: MessageInfo,
    peer_chain: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;
    load_peer_chain(deps.storage, &peer_chain)?;

    let previous = PEER_CHAIN_STATE
        .may_load(deps.storage, &peer_chain)?
        .unwrap_or_default();
    let dropped = orig_trxs::clear(deps.storage, &peer_chain)?;
    cash_trxs::clear(deps.storage, &peer_chain)?;

    // Forwards that lived here can no longer be confirmed or rolled back
    let mut finished_hub_trxs = 0u32;
    for entry in dropped
        .iter()
        .filter(|entry| entry.action.originator == Originator::HubForward)
    {
        if delete_by_hub_trx_id(deps.storage, &entry.trx_id)?.is_some() {
            finished_hub_trxs += 1;
        }
    }

    // Audit ids keep counting: the removed-transaction table is never reset
    let state = PeerChainState {
        rmdunrbs_next_id: previous.rmdunrbs_next_id,
        ..PeerChainState::default()
    };
    PEER_CHAIN_STATE.save(deps.storage, &peer_chain, &state)?;

    Ok(Response::new()
        .add_attribute("action", "force_init")
        .add_attribute("peer_chain", peer_chain)
        .add_attribute("dropped_orig_trxs", dropped.len().to_string())
        .add_attribute("finished_hub_trxs", finished_hub_trxs.to_string())
        .add_attribute("dropped_cash_trxs", previous.cashtrxs_records.to_string())
        .add_attribute("previous_cash_seq_num", previous.cash_seq_num.to_string()))
}
