//! IBC Token Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{
    execute_cash, execute_cash_confirm, execute_close, execute_fc_rm_orig_trx,
    execute_fc_rollback, execute_force_init, execute_lock_all, execute_open, execute_receive,
    execute_reg_accept_token, execute_reg_peer_chain, execute_reg_peg_token,
    execute_rm_unable_rb, execute_rollback, execute_set_global, execute_set_peer_chain_active,
    execute_set_token_active, execute_set_token_fee, execute_transfer, execute_transfer_native,
    execute_unlock_all,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_accepted_token, query_accepted_tokens, query_balance, query_calculate_fee,
    query_cash_trx, query_cash_trx_by_orig, query_cash_trxs, query_config, query_hub_trx,
    query_hub_trxs, query_orig_trx, query_orig_trxs, query_orig_trxs_since_slot,
    query_peer_chain, query_peer_chain_state, query_peer_chains, query_pegged_token,
    query_pegged_tokens, query_removed_unrollbackables, query_status, query_verify_merkle_path,
};
use crate::state::{
    Config, HubGlobals, CONFIG, CONTRACT_NAME, CONTRACT_VERSION, HUB_GLOBALS, TRX_NONCE,
};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    // Validate admin address
    let admin = deps.api.addr_validate(&msg.admin)?;
    if msg.this_chain.is_empty() {
        return Err(ContractError::InvalidChainName {
            chain: msg.this_chain,
        });
    }

    let config = Config {
        admin: admin.clone(),
        this_chain: msg.this_chain.clone(),
        active: true,
        locked: false,
        hub_account: msg.hub_account.clone(),
    };
    CONFIG.save(deps.storage, &config)?;
    TRX_NONCE.save(deps.storage, &0u64)?;
    HUB_GLOBALS.save(deps.storage, &HubGlobals::default())?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("admin", admin)
        .add_attribute("this_chain", msg.this_chain)
        .add_attribute("hub_account", msg.hub_account.unwrap_or_default()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Outbound
        ExecuteMsg::TransferNative { memo } => execute_transfer_native(deps, env, info, memo),
        ExecuteMsg::Receive(cw20_msg) => execute_receive(deps, env, info, cw20_msg),
        ExecuteMsg::Transfer {
            to,
            symbol,
            amount,
            memo,
        } => execute_transfer(deps, env, info, to, symbol, amount, memo),

        // Settlement
        ExecuteMsg::Cash {
            seq_num,
            from_chain,
            orig_trx_id,
            proof,
            orig_trx_block_num,
            anchor_block_num,
            to,
            quantity,
            memo,
            relay,
        } => execute_cash(
            deps,
            env,
            info,
            seq_num,
            from_chain,
            orig_trx_id,
            proof,
            orig_trx_block_num,
            anchor_block_num,
            to,
            quantity,
            memo,
            relay,
        ),
        ExecuteMsg::CashConfirm {
            from_chain,
            cash_trx_id,
            proof,
            cash_trx_block_num,
            anchor_block_num,
            orig_trx_id,
        } => execute_cash_confirm(
            deps,
            env,
            info,
            from_chain,
            cash_trx_id,
            proof,
            cash_trx_block_num,
            anchor_block_num,
            orig_trx_id,
        ),

        // Rollback
        ExecuteMsg::Rollback {
            peer_chain,
            trx_id,
            relay,
        } => execute_rollback(deps, env, info, peer_chain, trx_id, relay),
        ExecuteMsg::RmUnableRb {
            peer_chain,
            trx_id,
            relay,
        } => execute_rm_unable_rb(deps, env, info, peer_chain, trx_id, relay),
        ExecuteMsg::FcRollback {
            peer_chain,
            trx_ids,
        } => execute_fc_rollback(deps, env, info, peer_chain, trx_ids),
        ExecuteMsg::FcRmOrigTrx {
            peer_chain,
            trx_ids,
        } => execute_fc_rm_orig_trx(deps, env, info, peer_chain, trx_ids),
        ExecuteMsg::ForceInit { peer_chain } => execute_force_init(deps, info, peer_chain),

        // Global switches
        ExecuteMsg::LockAll {} => execute_lock_all(deps, info),
        ExecuteMsg::UnlockAll {} => execute_unlock_all(deps, info),
        ExecuteMsg::SetGlobal { active } => execute_set_global(deps, info, active),

        // Configuration
        ExecuteMsg::RegPeerChain {
            name,
            info: chain_info,
            peer_token_contract,
            light_client,
            free_account,
            max_original_trxs_per_block,
            max_origtrxs_table_records,
            cache_cashtrxs_table_records,
            active,
        } => execute_reg_peer_chain(
            deps,
            info,
            name,
            chain_info,
            peer_token_contract,
            light_client,
            free_account,
            max_original_trxs_per_block,
            max_origtrxs_table_records,
            cache_cashtrxs_table_records,
            active,
        ),
        ExecuteMsg::SetPeerChainActive { name, active } => {
            execute_set_peer_chain_active(deps, info, name, active)
        }
        ExecuteMsg::RegAcceptToken {
            symbol,
            asset,
            max_accept,
            min_once_transfer,
            max_once_transfer,
            max_daily_transfer,
            max_tfs_per_minute,
            fees,
            active,
        } => execute_reg_accept_token(
            deps,
            info,
            symbol,
            asset,
            max_accept,
            min_once_transfer,
            max_once_transfer,
            max_daily_transfer,
            max_tfs_per_minute,
            fees,
            active,
        ),
        ExecuteMsg::RegPegToken {
            symbol,
            peer_chain,
            peer_contract,
            max_supply,
            min_once_withdraw,
            max_once_withdraw,
            max_daily_withdraw,
            max_wds_per_minute,
            fees,
            active,
        } => execute_reg_peg_token(
            deps,
            info,
            symbol,
            peer_chain,
            peer_contract,
            max_supply,
            min_once_withdraw,
            max_once_withdraw,
            max_daily_withdraw,
            max_wds_per_minute,
            fees,
            active,
        ),
        ExecuteMsg::SetTokenFee { symbol, kind, rule } => {
            execute_set_token_fee(deps, info, symbol, kind, rule)
        }
        ExecuteMsg::SetTokenActive { symbol, active } => {
            execute_set_token_active(deps, info, symbol, active)
        }

        // Balance slots
        ExecuteMsg::Open { owner, symbol } => execute_open(deps, info, owner, symbol),
        ExecuteMsg::Close { symbol } => execute_close(deps, info, symbol),
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        // Core queries
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Status {} => to_json_binary(&query_status(deps)?),
        QueryMsg::PeerChain { name } => to_json_binary(&query_peer_chain(deps, name)?),
        QueryMsg::PeerChains { start_after, limit } => {
            to_json_binary(&query_peer_chains(deps, start_after, limit)?)
        }
        QueryMsg::PeerChainState { name } => to_json_binary(&query_peer_chain_state(deps, name)?),

        // Tokens
        QueryMsg::AcceptedToken { symbol } => {
            to_json_binary(&query_accepted_token(deps, symbol)?)
        }
        QueryMsg::AcceptedTokens { start_after, limit } => {
            to_json_binary(&query_accepted_tokens(deps, start_after, limit)?)
        }
        QueryMsg::PeggedToken { symbol } => to_json_binary(&query_pegged_token(deps, symbol)?),
        QueryMsg::PeggedTokens { start_after, limit } => {
            to_json_binary(&query_pegged_tokens(deps, start_after, limit)?)
        }
        QueryMsg::Balance { owner, symbol } => {
            to_json_binary(&query_balance(deps, owner, symbol)?)
        }

        // Transaction logs
        QueryMsg::OrigTrx { peer_chain, trx_id } => {
            to_json_binary(&query_orig_trx(deps, peer_chain, trx_id)?)
        }
        QueryMsg::OrigTrxs {
            peer_chain,
            start_after,
            limit,
        } => to_json_binary(&query_orig_trxs(deps, peer_chain, start_after, limit)?),
        QueryMsg::OrigTrxsSinceSlot {
            peer_chain,
            time_slot,
            limit,
        } => to_json_binary(&query_orig_trxs_since_slot(
            deps, peer_chain, time_slot, limit,
        )?),
        QueryMsg::CashTrx {
            peer_chain,
            seq_num,
        } => to_json_binary(&query_cash_trx(deps, peer_chain, seq_num)?),
        QueryMsg::CashTrxs {
            peer_chain,
            start_after,
            limit,
        } => to_json_binary(&query_cash_trxs(deps, peer_chain, start_after, limit)?),
        QueryMsg::CashTrxByOrig {
            peer_chain,
            orig_trx_id,
        } => to_json_binary(&query_cash_trx_by_orig(deps, peer_chain, orig_trx_id)?),
        QueryMsg::RemovedUnrollbackables {
            peer_chain,
            start_after,
            limit,
        } => to_json_binary(&query_removed_unrollbackables(
            deps,
            peer_chain,
            start_after,
            limit,
        )?),

        // Hub
        QueryMsg::HubTrx { forwarded_trx_id } => {
            to_json_binary(&query_hub_trx(deps, forwarded_trx_id)?)
        }
        QueryMsg::HubTrxs { start_after, limit } => {
            to_json_binary(&query_hub_trxs(deps, start_after, limit)?)
        }

        // Utilities
        QueryMsg::CalculateFee {
            symbol,
            kind,
            amount,
        } => to_json_binary(&query_calculate_fee(deps, symbol, kind, amount)?),
        QueryMsg::VerifyMerklePath { leaf, path, root } => {
            to_json_binary(&query_verify_merkle_path(leaf, path, root)?)
        }
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if HUB_GLOBALS.may_load(deps.storage)?.is_none() {
        HUB_GLOBALS.save(deps.storage, &HubGlobals::default())?;
    }

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
