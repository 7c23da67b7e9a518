//! Hub relay.
//!
//! A settlement addressed to `config.hub_account` is not credited locally.
//! Its memo names the final destination (`to_account@to_chain`) and the
//! net amount is immediately forwarded there as a new original transaction.
//! The hub record lives until the forward is confirmed or rolled back.

use cosmwasm_std::{Env, Storage, Uint128};

use super::{load_active_peer_chain, next_trx_id};
use crate::error::ContractError;
use crate::hash::{bytes32_to_hex, Digest};
use crate::memo::parse_memo;
use crate::orig_trxs;
use crate::state::{
    time_slot, Config, HubTrx, OrigTrx, OrigTrxAction, Originator, Quantity, TokenRef, ACCEPTS,
    HUB_GLOBALS, HUB_TRXS, HUB_TRX_BY_ORIG, MAX_HUB_UNFINISHED_TRXS, PEER_CHAIN_STATE, PEGS,
};

/// Settlement received by the hub account
pub(crate) struct HubCash<'a> {
    pub from_chain: &'a str,
    pub from_account: &'a str,
    pub orig_trx_id: Digest,
    pub cash_seq_num: u64,
    pub token: TokenRef,
    /// Amount left after the success fee
    pub net: Uint128,
    pub memo: &'a str,
}

/// Record a settlement to the hub and forward it.
pub(crate) fn ibc_cash_to_hub(
    storage: &mut dyn Storage,
    config: &Config,
    env: &Env,
    cash: HubCash,
) -> Result<HubTrx, ContractError> {
    let mut globals = HUB_GLOBALS.may_load(storage)?.unwrap_or_default();
    if globals.unfinished_trxs >= MAX_HUB_UNFINISHED_TRXS {
        return Err(ContractError::HubCapacityReached {
            limit: MAX_HUB_UNFINISHED_TRXS,
        });
    }

    let dest = parse_memo(cash.memo)?;
    if dest.chain == cash.from_chain {
        return Err(ContractError::InvalidMemo {
            reason: "hub cannot forward back to the sending chain".to_string(),
        });
    }
    if cash.net.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "Nothing left to forward after fees".to_string(),
        });
    }

    let quantity = Quantity::new(cash.token.symbol(), cash.net);
    let forwarded = ibc_transfer_from_hub(
        storage,
        config,
        env,
        &dest.chain,
        &dest.receiver,
        cash.token.clone(),
        quantity.clone(),
        Originator::HubForward,
    )?;

    let hub_trx = HubTrx {
        cash_seq_num: cash.cash_seq_num,
        cash_time_slot: time_slot(env),
        from_chain: cash.from_chain.to_string(),
        from_account: cash.from_account.to_string(),
        orig_trx_id: cash.orig_trx_id,
        to_chain: dest.chain,
        to_account: dest.receiver,
        token: cash.token,
        quantity,
        forwarded_trx_id: forwarded.trx_id,
        forwarded_time_slot: forwarded.block_time_slot,
    };
    HUB_TRXS.save(storage, hub_trx.forwarded_trx_id.as_slice(), &hub_trx)?;
    HUB_TRX_BY_ORIG.save(
        storage,
        (cash.from_chain, hub_trx.orig_trx_id.as_slice()),
        &hub_trx.forwarded_trx_id,
    )?;

    globals.unfinished_trxs += 1;
    HUB_GLOBALS.save(storage, &globals)?;

    Ok(hub_trx)
}

/// Append an original transaction sent by the hub to `to_chain`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn ibc_transfer_from_hub(
    storage: &mut dyn Storage,
    config: &Config,
    env: &Env,
    to_chain: &str,
    to_account: &str,
    token: TokenRef,
    quantity: Quantity,
    originator: Originator,
) -> Result<OrigTrx, ContractError> {
    let chain = load_active_peer_chain(storage, to_chain)?;

    match &token {
        TokenRef::Accepted { symbol } => {
            let mut accepted = ACCEPTS.load(storage, symbol)?;
            accepted.accept = accepted.accept.checked_add(quantity.amount)?;
            accepted.total_transfer = accepted.total_transfer.checked_add(quantity.amount)?;
            accepted.total_transfer_times += 1;
            ACCEPTS.save(storage, symbol, &accepted)?;
        }
        TokenRef::Pegged { symbol } => {
            let mut pegged = PEGS.load(storage, symbol)?;
            pegged.supply = pegged.supply.checked_sub(quantity.amount)?;
            pegged.total_withdraw = pegged.total_withdraw.checked_add(quantity.amount)?;
            pegged.total_withdraw_times += 1;
            PEGS.save(storage, symbol, &pegged)?;
        }
    }

    let tag = match originator {
        Originator::HubReturn => b"hubr",
        _ => b"hubf",
    };
    let trx_id = next_trx_id(storage, config, env, tag)?;

    let mut state = PEER_CHAIN_STATE.load(storage, to_chain)?;
    let entry = orig_trxs::append(
        storage,
        &chain,
        &mut state,
        time_slot(env),
        trx_id,
        OrigTrxAction {
            token,
            originator,
            quantity,
            peer_receiver: to_account.to_string(),
            memo: String::new(),
        },
    )?;
    PEER_CHAIN_STATE.save(storage, to_chain, &state)?;

    Ok(entry)
}

/// Finish a forward that the destination chain has cashed.
pub(crate) fn delete_by_hub_trx_id(
    storage: &mut dyn Storage,
    forwarded_trx_id: &Digest,
) -> Result<Option<HubTrx>, ContractError> {
    let Some(hub_trx) = HUB_TRXS.may_load(storage, forwarded_trx_id.as_slice())? else {
        return Ok(None);
    };
    HUB_TRXS.remove(storage, forwarded_trx_id.as_slice());
    HUB_TRX_BY_ORIG.remove(
        storage,
        (hub_trx.from_chain.as_str(), hub_trx.orig_trx_id.as_slice()),
    );

    let mut globals = HUB_GLOBALS.may_load(storage)?.unwrap_or_default();
    globals.unfinished_trxs = globals.unfinished_trxs.saturating_sub(1);
    HUB_GLOBALS.save(storage, &globals)?;

    Ok(Some(hub_trx))
}

/// Send the remainder of a failed forward back to where it came from.
///
/// The forward's own accounting must already be reversed by the caller.
/// Returns the hub-return original transaction, if anything was left.
pub(crate) fn rollback_by_hub_trx_id(
    storage: &mut dyn Storage,
    config: &Config,
    env: &Env,
    forwarded_trx_id: &Digest,
    remainder: Uint128,
) -> Result<Option<OrigTrx>, ContractError> {
    let hub_trx = delete_by_hub_trx_id(storage, forwarded_trx_id)?.ok_or_else(|| {
        ContractError::HubTrxNotFound {
            trx_id: bytes32_to_hex(forwarded_trx_id),
        }
    })?;
    if remainder.is_zero() {
        return Ok(None);
    }

    let quantity = Quantity::new(hub_trx.token.symbol(), remainder);
    let returned = ibc_transfer_from_hub(
        storage,
        config,
        env,
        &hub_trx.from_chain,
        &hub_trx.from_account,
        hub_trx.token,
        quantity,
        Originator::HubReturn,
    )?;
    Ok(Some(returned))
}
