//! Settlement intake.
//!
//! A relay proves that a transfer into the peer chain's bridge contract was
//! executed, and this contract credits the receiver here. Settlements of a
//! peer chain are accepted strictly in `seq_num` order and each original
//! transaction can be settled once.

use cosmwasm_std::{Binary, CosmosMsg, DepsMut, Env, MessageInfo, Response, Storage, Uint128};

use super::hub::{ibc_cash_to_hub, HubCash};
use super::{ensure_active, load_active_peer_chain, next_trx_id};
use crate::cash_trxs;
use crate::error::ContractError;
use crate::fee_manager::{calculate_fee, FeeSchedule};
use crate::hash::{bytes32_to_hex, parse_hash};
use crate::ledger;
use crate::memo::parse_memo;
use crate::proof::{query_anchor_root, verify_proof, ReceiptAction, TrxProof};
use crate::state::{
    time_slot, CashAction, CashTrx, PeerChain, Quantity, TokenRef, ACCEPTS, CONFIG,
    PEER_CHAIN_STATE, PEGS,
};

/// Settle a transfer proven to have happened on `from_chain`
#[allow(clippy::too_many_arguments)]
pub fn execute_cash(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
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
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_active(&config)?;

    let relay_addr = deps.api.addr_validate(&relay)?;
    if info.sender != relay_addr {
        return Err(ContractError::UnauthorizedRelay { relay });
    }

    let chain = load_active_peer_chain(deps.storage, &from_chain)?;
    let mut state = PEER_CHAIN_STATE.load(deps.storage, &from_chain)?;

    // Replay and ordering checks
    if seq_num != state.cash_seq_num + 1 {
        return Err(ContractError::InvalidSeqNum {
            expected: state.cash_seq_num + 1,
            got: seq_num,
        });
    }
    if let Some(latest) = cash_trxs::latest_block_num(deps.storage, &from_chain)? {
        if orig_trx_block_num < latest {
            return Err(ContractError::OrigTrxBlockNumRegressed {
                latest,
                got: orig_trx_block_num,
            });
        }
    }
    let orig_trx_id = parse_hash(&orig_trx_id)?;
    if cash_trxs::find_by_orig(deps.storage, &from_chain, &orig_trx_id)?.is_some() {
        return Err(ContractError::DuplicateSettlement {
            orig_trx_id: bytes32_to_hex(&orig_trx_id),
        });
    }
    if quantity.amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "Amount must be positive".to_string(),
        });
    }

    // Proof
    let anchor_root = query_anchor_root(&deps.querier, &chain.light_client, anchor_block_num)?;
    let verified = verify_proof(&proof, orig_trx_block_num, anchor_block_num, &anchor_root)?;
    let receipt = verified.receipt;
    if parse_hash(&receipt.trx_id)? != orig_trx_id {
        return Err(invalid_receipt("trx_id does not match orig_trx_id"));
    }
    let ReceiptAction::Transfer {
        from,
        to: bridge,
        quantity: proven,
        memo: proven_memo,
    } = receipt.action
    else {
        return Err(invalid_receipt("expected a transfer action"));
    };
    if bridge != chain.peer_token_contract {
        return Err(invalid_receipt("transfer was not sent to the bridge contract"));
    }
    if proven.symbol != quantity.symbol || proven.amount != quantity.amount {
        return Err(invalid_receipt("quantity does not match"));
    }
    let dest = parse_memo(&proven_memo)?;
    if dest.chain != config.this_chain {
        return Err(invalid_receipt("memo targets another chain"));
    }
    if dest.receiver != to {
        return Err(invalid_receipt("memo receiver does not match"));
    }
    if dest.notes != memo {
        return Err(invalid_receipt("memo does not match"));
    }

    // Route: the peer returned our token, or the peer locked its own
    let (token, fees) = if receipt.contract == chain.peer_token_contract {
        release_accepted(deps.storage, &quantity)?
    } else {
        issue_pegged(deps.storage, &chain, &receipt.contract, &quantity)?
    };

    let (net, fee) = if chain.is_free_account(&to) || chain.is_free_account(&from) {
        (quantity.amount, Uint128::zero())
    } else {
        calculate_fee(&fees.success, quantity.amount)
    };

    let mut messages: Vec<CosmosMsg> = vec![];
    if let Some(msg) = ledger::pay_out(deps.storage, &token, &relay_addr, fee)? {
        messages.push(msg);
    }

    let settlement_id = next_trx_id(deps.storage, &config, &env, b"cash")?;
    let slot = time_slot(&env);

    let mut response = Response::new();
    if config.hub_account.as_deref() == Some(to.as_str()) {
        let hub_trx = ibc_cash_to_hub(
            deps.storage,
            &config,
            &env,
            HubCash {
                from_chain: &from_chain,
                from_account: &from,
                orig_trx_id,
                cash_seq_num: seq_num,
                token: token.clone(),
                net,
                memo: &memo,
            },
        )?;
        response = response
            .add_attribute("hub_to_chain", &hub_trx.to_chain)
            .add_attribute("hub_to_account", &hub_trx.to_account)
            .add_attribute("hub_trx_id", bytes32_to_hex(&hub_trx.forwarded_trx_id));
    } else {
        let recipient = deps.api.addr_validate(&to)?;
        if let Some(msg) = ledger::pay_out(deps.storage, &token, &recipient, net)? {
            messages.push(msg);
        }
    }

    cash_trxs::append(
        deps.storage,
        &from_chain,
        &mut state,
        &CashTrx {
            seq_num,
            block_time_slot: slot,
            trx_id: settlement_id,
            action: CashAction {
                to: to.clone(),
                quantity: quantity.clone(),
                memo,
            },
            orig_trx_id,
            orig_trx_block_num,
        },
    )?;
    state.cash_seq_num = seq_num;
    let pruned = cash_trxs::trim(
        deps.storage,
        &from_chain,
        &mut state,
        chain.cache_cashtrxs_table_records,
    )?;
    PEER_CHAIN_STATE.save(deps.storage, &from_chain, &state)?;

    Ok(response
        .add_messages(messages)
        .add_attribute("action", "cash")
        .add_attribute("seq_num", seq_num.to_string())
        .add_attribute("from_chain", from_chain)
        .add_attribute("orig_trx_id", bytes32_to_hex(&orig_trx_id))
        .add_attribute("trx_id", bytes32_to_hex(&settlement_id))
        .add_attribute("token", token.kind())
        .add_attribute("to", to)
        .add_attribute("quantity", quantity.to_string())
        .add_attribute("net", net.to_string())
        .add_attribute("fee", fee.to_string())
        .add_attribute("relay", relay_addr)
        .add_attribute("pruned", pruned.to_string()))
}

fn invalid_receipt(reason: &str) -> ContractError {
    ContractError::InvalidReceipt {
        reason: reason.to_string(),
    }
}

/// Peer chain burned a peg of one of our accepted tokens.
///
/// Runs even for an inactive token so in-flight transfers can settle.
fn release_accepted(
    storage: &mut dyn Storage,
    quantity: &Quantity,
) -> Result<(TokenRef, FeeSchedule), ContractError> {
    let symbol = quantity.symbol.as_str();
    let mut token = ACCEPTS
        .may_load(storage, symbol)?
        .ok_or_else(|| ContractError::TokenNotFound {
            symbol: symbol.to_string(),
        })?;
    if token.accept < quantity.amount {
        return Err(ContractError::InsufficientLiquidity {
            symbol: symbol.to_string(),
        });
    }

    token.accept -= quantity.amount;
    token.total_cash = token.total_cash.checked_add(quantity.amount)?;
    token.total_cash_times += 1;
    ACCEPTS.save(storage, symbol, &token)?;

    Ok((
        TokenRef::Accepted {
            symbol: symbol.to_string(),
        },
        token.fees,
    ))
}

/// Peer chain locked its own token; issue the peg here. Inactive pegs
/// still settle.
fn issue_pegged(
    storage: &mut dyn Storage,
    chain: &PeerChain,
    token_contract: &str,
    quantity: &Quantity,
) -> Result<(TokenRef, FeeSchedule), ContractError> {
    let symbol = quantity.symbol.as_str();
    let mut token = PEGS
        .may_load(storage, symbol)?
        .ok_or_else(|| ContractError::TokenNotFound {
            symbol: symbol.to_string(),
        })?;
    if token.peer_chain != chain.name || token.peer_contract != token_contract {
        return Err(invalid_receipt("token contract does not match the peg"));
    }

    let supply = token.supply.checked_add(quantity.amount)?;
    if supply > token.max_supply {
        return Err(ContractError::MaxSupplyExceeded {
            symbol: symbol.to_string(),
        });
    }
    token.supply = supply;
    token.total_issue = token.total_issue.checked_add(quantity.amount)?;
    token.total_issue_times += 1;
    PEGS.save(storage, symbol, &token)?;

    Ok((
        TokenRef::Pegged {
            symbol: symbol.to_string(),
        },
        token.fees,
    ))
}
