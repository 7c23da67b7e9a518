//! Outbound transfer handlers.
//!
//! Accepted tokens are locked here for a peer chain. Pegged tokens move
//! between local holders, or are withdrawn back to their origin chain when
//! sent to this contract. Every bridge-bound transfer becomes an original
//! transaction awaiting confirmation.

use common::AssetInfo;
use cosmwasm_std::{Addr, DepsMut, Env, MessageInfo, Response, Uint128};
use cw20::Cw20ReceiveMsg;

use super::{ensure_active, ensure_unlocked, load_active_peer_chain, next_trx_id};
use crate::error::ContractError;
use crate::fee_manager::{calculate_fee, FeeSchedule};
use crate::hash::bytes32_to_hex;
use crate::ledger;
use crate::memo::{parse_memo, TransferMemo};
use crate::msg::ReceiveMsg;
use crate::orig_trxs;
use crate::rate_limit::{check_and_update, QuotaLimits};
use crate::state::{
    time_slot, Config, OrigTrxAction, Originator, PeerChain, Quantity, TokenRef, ACCEPTS,
    ACCEPT_BY_ASSET, CONFIG, PEER_CHAIN_STATE, PEGS,
};

/// Lock one native coin for a peer chain
pub fn execute_transfer_native(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    memo: String,
) -> Result<Response, ContractError> {
    if info.funds.is_empty() {
        return Err(ContractError::NoFundsSent);
    }
    if info.funds.len() > 1 {
        return Err(ContractError::InvalidAmount {
            reason: "Only one token type allowed per transaction".to_string(),
        });
    }

    let coin = &info.funds[0];
    let asset = AssetInfo::Native {
        denom: coin.denom.clone(),
    };
    lock_accepted(deps, env, info.sender.clone(), asset, coin.amount, memo)
}

/// Lock a CW20 token sent to this contract
pub fn execute_receive(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    cw20_msg: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    let sender = deps.api.addr_validate(&cw20_msg.sender)?;
    let asset = AssetInfo::Cw20 {
        contract_addr: info.sender,
    };

    let receive_msg: ReceiveMsg = cosmwasm_std::from_json(&cw20_msg.msg)?;
    match receive_msg {
        ReceiveMsg::Transfer { memo } => {
            lock_accepted(deps, env, sender, asset, cw20_msg.amount, memo)
        }
    }
}

fn lock_accepted(
    deps: DepsMut,
    env: Env,
    sender: Addr,
    asset: AssetInfo,
    amount: Uint128,
    memo: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_active(&config)?;
    ensure_unlocked(&config)?;

    if amount.is_zero() {
        return Err(ContractError::NoFundsSent);
    }

    let symbol = ACCEPT_BY_ASSET
        .may_load(deps.storage, &asset.key())?
        .ok_or_else(|| ContractError::TokenNotFound {
            symbol: asset.to_string(),
        })?;
    let mut token = ACCEPTS.load(deps.storage, &symbol)?;
    if !token.active {
        return Err(ContractError::TokenInactive { symbol });
    }

    let memo = parse_memo(&memo)?;
    let chain = load_active_peer_chain(deps.storage, &memo.chain)?;

    let limits = QuotaLimits {
        min_once: token.min_once_transfer,
        max_once: token.max_once_transfer,
        max_daily: token.max_daily_transfer,
        max_per_minute: token.max_tfs_per_minute,
        outstanding: Some((token.accept, token.max_accept)),
    };
    token.window = check_and_update(&token.window, &limits, amount, env.block.time.seconds())?;
    preview_fee(&chain, sender.as_str(), &memo, &token.fees, amount)?;

    token.accept = token.accept.checked_add(amount)?;
    token.total_transfer = token.total_transfer.checked_add(amount)?;
    token.total_transfer_times += 1;
    ACCEPTS.save(deps.storage, &symbol, &token)?;

    let token_ref = TokenRef::Accepted {
        symbol: symbol.clone(),
    };
    record_outbound(
        deps,
        &env,
        &config,
        &chain,
        sender,
        token_ref,
        amount,
        memo,
        "transfer",
    )
}

/// Move a pegged token locally, or withdraw it when `to` is this contract
pub fn execute_transfer(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    to: String,
    symbol: String,
    amount: Uint128,
    memo: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_active(&config)?;

    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "Amount must be positive".to_string(),
        });
    }

    let mut token = PEGS
        .may_load(deps.storage, &symbol)?
        .ok_or_else(|| ContractError::TokenNotFound {
            symbol: symbol.clone(),
        })?;
    if !token.active {
        return Err(ContractError::TokenInactive { symbol });
    }

    if to != env.contract.address.as_str() {
        let recipient = deps.api.addr_validate(&to)?;
        ledger::debit(deps.storage, &info.sender, &symbol, amount)?;
        ledger::credit(deps.storage, &recipient, &symbol, amount)?;

        return Ok(Response::new()
            .add_attribute("action", "transfer_local")
            .add_attribute("from", info.sender)
            .add_attribute("to", recipient)
            .add_attribute("symbol", symbol)
            .add_attribute("amount", amount.to_string()));
    }

    ensure_unlocked(&config)?;
    let memo = parse_memo(&memo)?;
    if memo.chain != token.peer_chain {
        return Err(ContractError::InvalidMemo {
            reason: format!("{} can only be withdrawn to {}", symbol, token.peer_chain),
        });
    }
    let chain = load_active_peer_chain(deps.storage, &memo.chain)?;

    let limits = QuotaLimits {
        min_once: token.min_once_withdraw,
        max_once: token.max_once_withdraw,
        max_daily: token.max_daily_withdraw,
        max_per_minute: token.max_wds_per_minute,
        outstanding: None,
    };
    token.window = check_and_update(&token.window, &limits, amount, env.block.time.seconds())?;
    preview_fee(&chain, info.sender.as_str(), &memo, &token.fees, amount)?;

    ledger::debit(deps.storage, &info.sender, &symbol, amount)?;
    token.supply = token.supply.checked_sub(amount)?;
    token.total_withdraw = token.total_withdraw.checked_add(amount)?;
    token.total_withdraw_times += 1;
    PEGS.save(deps.storage, &symbol, &token)?;

    let token_ref = TokenRef::Pegged {
        symbol: symbol.clone(),
    };
    record_outbound(
        deps,
        &env,
        &config,
        &chain,
        info.sender,
        token_ref,
        amount,
        memo,
        "withdraw",
    )
}

/// Reject transfers that would not cover the success fee on arrival.
fn preview_fee(
    chain: &PeerChain,
    sender: &str,
    memo: &TransferMemo,
    fees: &FeeSchedule,
    amount: Uint128,
) -> Result<(), ContractError> {
    if chain.is_free_account(sender) || chain.is_free_account(&memo.receiver) {
        return Ok(());
    }
    let (net, _) = calculate_fee(&fees.success, amount);
    if net.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "Amount does not cover the success fee".to_string(),
        });
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn record_outbound(
    deps: DepsMut,
    env: &Env,
    config: &Config,
    chain: &PeerChain,
    sender: Addr,
    token: TokenRef,
    amount: Uint128,
    memo: TransferMemo,
    action: &str,
) -> Result<Response, ContractError> {
    let trx_id = next_trx_id(deps.storage, config, env, b"xfer")?;
    let slot = time_slot(env);

    let mut state = PEER_CHAIN_STATE.load(deps.storage, &chain.name)?;
    let entry = orig_trxs::append(
        deps.storage,
        chain,
        &mut state,
        slot,
        trx_id,
        OrigTrxAction {
            quantity: Quantity::new(token.symbol(), amount),
            token,
            originator: Originator::Account {
                addr: sender.clone(),
            },
            peer_receiver: memo.receiver.clone(),
            memo: memo.notes,
        },
    )?;
    PEER_CHAIN_STATE.save(deps.storage, &chain.name, &state)?;

    Ok(Response::new()
        .add_attribute("action", action)
        .add_attribute("trx_id", bytes32_to_hex(&entry.trx_id))
        .add_attribute("orig_trx_num", entry.id.to_string())
        .add_attribute("time_slot", slot.to_string())
        .add_attribute("sender", sender)
        .add_attribute("peer_chain", &chain.name)
        .add_attribute("receiver", memo.receiver)
        .add_attribute("symbol", entry.action.quantity.symbol)
        .add_attribute("amount", amount.to_string()))
}
