//! Rollback engine.
//!
//! An original transaction is pending until it is confirmed (retired),
//! rolled back (refunded minus the failed fee), or removed to the audit
//! table. A relay may act on an entry only when its position
//! `(block_time_slot, id)` is at or before the last confirmed position:
//! the peer chain settles in order, so such an entry was skipped there.
//! The admin variants bypass that check.

use cosmwasm_std::{Addr, Binary, CosmosMsg, DepsMut, Env, MessageInfo, Response, Storage, Uint128};

use super::hub::{delete_by_hub_trx_id, rollback_by_hub_trx_id};
use super::{ensure_active, ensure_admin, load_peer_chain, token_fees};
use crate::error::ContractError;
use crate::fee_manager::calculate_fee;
use crate::hash::{bytes32_to_hex, parse_hash, parse_hashes};
use crate::ledger;
use crate::orig_trxs;
use crate::state::{
    time_slot, Config, OrigTrx, OrigTrxAction, Originator, PeerChainState,
    RemovalReason, TokenRef, ACCEPTS, CONFIG, PEER_CHAIN_STATE, PEGS,
};

// ============================================================================
// Relay Operations
// ============================================================================

/// Refund an eligible original transaction, paying the failed fee to the relay
pub fn execute_rollback(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    peer_chain: String,
    trx_id: Binary,
    relay: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_active(&config)?;
    let relay_addr = authorize_relay(&deps, &info, &relay)?;

    let chain = load_peer_chain(deps.storage, &peer_chain)?;
    let mut state = PEER_CHAIN_STATE.load(deps.storage, &peer_chain)?;
    let trx_id = parse_hash(&trx_id)?;
    let entry = orig_trxs::load_by_hash(deps.storage, &peer_chain, &trx_id)?;
    ensure_eligible(&state, &entry)?;
    if entry.action.originator == Originator::HubReturn {
        return Err(ContractError::Unrollbackable {
            trx_id: bytes32_to_hex(&trx_id),
        });
    }

    let fees = token_fees(deps.storage, &entry.action.token)?;
    let gross = entry.action.quantity.amount;
    let (refund, fee) = match &entry.action.originator {
        Originator::Account { addr } if chain.is_free_account(addr.as_str()) => {
            (gross, Uint128::zero())
        }
        _ => calculate_fee(&fees.failed, gross),
    };

    orig_trxs::remove(deps.storage, &peer_chain, &mut state, &entry);
    PEER_CHAIN_STATE.save(deps.storage, &peer_chain, &state)?;

    let mut messages: Vec<CosmosMsg> = vec![];
    let refund_msgs = refund_entry(deps.storage, &config, &env, &entry, refund)?;
    if let Some(msg) = ledger::pay_out(deps.storage, &entry.action.token, &relay_addr, fee)? {
        messages.push(msg);
    }
    messages.extend(refund_msgs.messages);

    let mut response = Response::new()
        .add_messages(messages)
        .add_attribute("action", "rollback")
        .add_attribute("peer_chain", peer_chain)
        .add_attribute("trx_id", bytes32_to_hex(&trx_id))
        .add_attribute("quantity", entry.action.quantity.to_string())
        .add_attribute("refund", refund.to_string())
        .add_attribute("fee", fee.to_string())
        .add_attribute("relay", relay_addr);
    if let Some(returned) = refund_msgs.hub_return {
        response = response.add_attribute("hub_return_trx_id", bytes32_to_hex(&returned));
    }
    Ok(response)
}

/// Drop an eligible original transaction that cannot be refunded
pub fn execute_rm_unable_rb(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    peer_chain: String,
    trx_id: Binary,
    relay: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_active(&config)?;
    let relay_addr = authorize_relay(&deps, &info, &relay)?;

    load_peer_chain(deps.storage, &peer_chain)?;
    let mut state = PEER_CHAIN_STATE.load(deps.storage, &peer_chain)?;
    let trx_id = parse_hash(&trx_id)?;
    let entry = orig_trxs::load_by_hash(deps.storage, &peer_chain, &trx_id)?;
    ensure_eligible(&state, &entry)?;

    let removed = remove_to_audit(
        deps.storage,
        &peer_chain,
        &mut state,
        entry,
        RemovalReason::Unrollbackable,
        time_slot(&env),
    )?;
    PEER_CHAIN_STATE.save(deps.storage, &peer_chain, &state)?;

    Ok(Response::new()
        .add_attribute("action", "rm_unable_rb")
        .add_attribute("peer_chain", peer_chain)
        .add_attribute("trx_id", bytes32_to_hex(&trx_id))
        .add_attribute("audit_id", removed.to_string())
        .add_attribute("relay", relay_addr))
}

// ============================================================================
// Admin Operations
// ============================================================================

/// Refund original transactions in full, regardless of eligibility
pub fn execute_fc_rollback(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    peer_chain: String,
    trx_ids: Vec<Binary>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    load_peer_chain(deps.storage, &peer_chain)?;
    let trx_ids = parse_hashes(&trx_ids)?;

    let mut messages: Vec<CosmosMsg> = vec![];
    let mut rolled_back = vec![];
    for trx_id in trx_ids {
        let mut state = PEER_CHAIN_STATE.load(deps.storage, &peer_chain)?;
        let entry = orig_trxs::load_by_hash(deps.storage, &peer_chain, &trx_id)?;
        if entry.action.originator == Originator::HubReturn {
            return Err(ContractError::Unrollbackable {
                trx_id: bytes32_to_hex(&trx_id),
            });
        }
        orig_trxs::remove(deps.storage, &peer_chain, &mut state, &entry);
        PEER_CHAIN_STATE.save(deps.storage, &peer_chain, &state)?;

        let refund = refund_entry(
            deps.storage,
            &config,
            &env,
            &entry,
            entry.action.quantity.amount,
        )?;
        messages.extend(refund.messages);
        rolled_back.push(bytes32_to_hex(&trx_id));
    }

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "fc_rollback")
        .add_attribute("peer_chain", peer_chain)
        .add_attribute("count", rolled_back.len().to_string())
        .add_attribute("trx_ids", rolled_back.join(",")))
}

/// Remove original transactions to the audit table, regardless of eligibility
pub fn execute_fc_rm_orig_trx(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    peer_chain: String,
    trx_ids: Vec<Binary>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    load_peer_chain(deps.storage, &peer_chain)?;
    let trx_ids = parse_hashes(&trx_ids)?;
    let mut state = PEER_CHAIN_STATE.load(deps.storage, &peer_chain)?;

    let mut removed = vec![];
    for trx_id in trx_ids {
        let entry = orig_trxs::load_by_hash(deps.storage, &peer_chain, &trx_id)?;
        remove_to_audit(
            deps.storage,
            &peer_chain,
            &mut state,
            entry,
            RemovalReason::ForceRemoved,
            time_slot(&env),
        )?;
        removed.push(bytes32_to_hex(&trx_id));
    }
    PEER_CHAIN_STATE.save(deps.storage, &peer_chain, &state)?;

    Ok(Response::new()
        .add_attribute("action", "fc_rm_orig_trx")
        .add_attribute("peer_chain", peer_chain)
        .add_attribute("count", removed.len().to_string())
        .add_attribute("trx_ids", removed.join(",")))
}

// ============================================================================
// Helpers
// ============================================================================

fn authorize_relay(deps: &DepsMut, info: &MessageInfo, relay: &str) -> Result<Addr, ContractError> {
    let relay_addr = deps.api.addr_validate(relay)?;
    if info.sender != relay_addr {
        return Err(ContractError::UnauthorizedRelay {
            relay: relay.to_string(),
        });
    }
    Ok(relay_addr)
}

/// Reject entries positioned after the last confirmed original transaction.
pub(crate) fn ensure_eligible(state: &PeerChainState, entry: &OrigTrx) -> Result<(), ContractError> {
    let position = (entry.block_time_slot, entry.id);
    let watermark = (
        state.last_confirmed_orig_trx_block_time_slot,
        state.last_confirmed_orig_trx_id,
    );
    if position > watermark {
        return Err(ContractError::RollbackNotEligible {
            time_slot: entry.block_time_slot,
            last_confirmed: state.last_confirmed_orig_trx_block_time_slot,
        });
    }
    Ok(())
}

/// Audit-remove an entry; a hub forward also finishes its hub record.
fn remove_to_audit(
    storage: &mut dyn Storage,
    peer_chain: &str,
    state: &mut PeerChainState,
    entry: OrigTrx,
    reason: RemovalReason,
    time_slot: u64,
) -> Result<u64, ContractError> {
    if entry.action.originator == Originator::HubForward {
        delete_by_hub_trx_id(storage, &entry.trx_id)?;
    }
    let removed = orig_trxs::remove_to_audit(storage, peer_chain, state, entry, reason, time_slot)?;
    Ok(removed.id)
}

struct Refund {
    messages: Vec<CosmosMsg>,
    hub_return: Option<[u8; 32]>,
}

/// Reverse the outbound accounting of `entry` and deliver `refund`.
///
/// Account originators are paid directly; hub forwards are sent back toward
/// their origin chain.
fn refund_entry(
    storage: &mut dyn Storage,
    config: &Config,
    env: &Env,
    entry: &OrigTrx,
    refund: Uint128,
) -> Result<Refund, ContractError> {
    restore_outbound(storage, &entry.action)?;

    match &entry.action.originator {
        Originator::Account { addr } => {
            let messages = ledger::pay_out(storage, &entry.action.token, addr, refund)?
                .into_iter()
                .collect();
            Ok(Refund {
                messages,
                hub_return: None,
            })
        }
        Originator::HubForward => {
            let returned = rollback_by_hub_trx_id(storage, config, env, &entry.trx_id, refund)?;
            Ok(Refund {
                messages: vec![],
                hub_return: returned.map(|r| r.trx_id),
            })
        }
        Originator::HubReturn => Err(ContractError::Unrollbackable {
            trx_id: bytes32_to_hex(&entry.trx_id),
        }),
    }
}

/// Undo the custody change made when the entry was appended.
fn restore_outbound(storage: &mut dyn Storage, action: &OrigTrxAction) -> Result<(), ContractError> {
    let amount = action.quantity.amount;
    match &action.token {
        TokenRef::Accepted { symbol } => {
            let mut token = ACCEPTS.load(storage, symbol)?;
            token.accept = token.accept.checked_sub(amount)?;
            ACCEPTS.save(storage, symbol, &token)?;
        }
        TokenRef::Pegged { symbol } => {
            let mut token = PEGS.load(storage, symbol)?;
            token.supply = token.supply.checked_add(amount)?;
            PEGS.save(storage, symbol, &token)?;
        }
    }
    Ok(())
}
