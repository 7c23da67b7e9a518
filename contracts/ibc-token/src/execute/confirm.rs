//! Round-trip acknowledgment.
//!
//! Proof that the peer chain executed `cash` for one of our original
//! transactions retires the entry and advances the rollback watermark.

use cosmwasm_std::{Binary, DepsMut, Env, MessageInfo, Response};

use super::hub::delete_by_hub_trx_id;
use super::{ensure_active, load_peer_chain};
use crate::error::ContractError;
use crate::hash::{bytes32_to_hex, parse_hash};
use crate::orig_trxs;
use crate::proof::{query_anchor_root, verify_proof, ReceiptAction, TrxProof};
use crate::state::{time_slot, Originator, CONFIG, PEER_CHAIN_STATE};

#[allow(clippy::too_many_arguments)]
pub fn execute_cash_confirm(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    from_chain: String,
    cash_trx_id: Binary,
    proof: TrxProof,
    cash_trx_block_num: u64,
    anchor_block_num: u32,
    orig_trx_id: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_active(&config)?;

    let chain = load_peer_chain(deps.storage, &from_chain)?;
    let cash_trx_id = parse_hash(&cash_trx_id)?;
    let orig_trx_id = parse_hash(&orig_trx_id)?;

    let anchor_root = query_anchor_root(&deps.querier, &chain.light_client, anchor_block_num)?;
    let verified = verify_proof(&proof, cash_trx_block_num, anchor_block_num, &anchor_root)?;
    let receipt = verified.receipt;
    if parse_hash(&receipt.trx_id)? != cash_trx_id {
        return Err(ContractError::InvalidReceipt {
            reason: "trx_id does not match cash_trx_id".to_string(),
        });
    }
    if receipt.contract != chain.peer_token_contract {
        return Err(ContractError::InvalidReceipt {
            reason: "cash was not executed by the bridge contract".to_string(),
        });
    }
    let ReceiptAction::Cash {
        seq_num,
        from_chain: cash_from_chain,
        orig_trx_id: cashed_orig,
        to,
        quantity,
    } = receipt.action
    else {
        return Err(ContractError::InvalidReceipt {
            reason: "expected a cash action".to_string(),
        });
    };
    if cash_from_chain != config.this_chain || parse_hash(&cashed_orig)? != orig_trx_id {
        return Err(ContractError::InvalidReceipt {
            reason: "cash does not settle this original transaction".to_string(),
        });
    }

    let mut state = PEER_CHAIN_STATE.load(deps.storage, &from_chain)?;
    let entry = orig_trxs::load_by_hash(deps.storage, &from_chain, &orig_trx_id)?;
    if entry.action.peer_receiver != to
        || entry.action.quantity.symbol != quantity.symbol
        || entry.action.quantity.amount != quantity.amount
    {
        return Err(ContractError::InvalidReceipt {
            reason: "cashed transfer does not match the original".to_string(),
        });
    }
    orig_trxs::remove(deps.storage, &from_chain, &mut state, &entry);

    let position = (entry.block_time_slot, entry.id);
    let watermark = (
        state.last_confirmed_orig_trx_block_time_slot,
        state.last_confirmed_orig_trx_id,
    );
    if position > watermark {
        state.last_confirmed_orig_trx_block_time_slot = entry.block_time_slot;
        state.last_confirmed_orig_trx_id = entry.id;
    }

    let mut response = Response::new();
    if entry.action.originator == Originator::HubForward {
        if let Some(hub_trx) = delete_by_hub_trx_id(deps.storage, &entry.trx_id)? {
            response = response.add_attribute("hub_completed", bytes32_to_hex(&hub_trx.orig_trx_id));
        }
    }

    let trimmed = if chain.max_origtrxs_table_records > 0 {
        orig_trxs::trim(
            deps.storage,
            &from_chain,
            &mut state,
            chain.max_origtrxs_table_records,
            time_slot(&env),
        )?
    } else {
        0
    };
    PEER_CHAIN_STATE.save(deps.storage, &from_chain, &state)?;

    Ok(response
        .add_attribute("action", "cash_confirm")
        .add_attribute("from_chain", from_chain)
        .add_attribute("orig_trx_id", bytes32_to_hex(&orig_trx_id))
        .add_attribute("cash_trx_id", bytes32_to_hex(&cash_trx_id))
        .add_attribute("cash_seq_num", seq_num.to_string())
        .add_attribute("last_confirmed_slot", state.last_confirmed_orig_trx_block_time_slot.to_string())
        .add_attribute("trimmed", trimmed.to_string()))
}
