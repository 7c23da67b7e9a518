//! Registration handlers.
//!
//! This module handles:
//! - Peer chain registration and activation
//! - Accepted token registration (local assets locked for peer chains)
//! - Pegged token registration (peer assets issued here)
//! - Per-token fee rules and activation

use common::AssetInfo;
use cosmwasm_std::{DepsMut, MessageInfo, Response, Uint128};

use super::{ensure_admin, load_peer_chain};
use crate::error::ContractError;
use crate::fee_manager::{FeeKind, FeeRule, FeeSchedule};
use crate::rate_limit::RateWindow;
use crate::state::{
    AcceptedToken, PeerChain, PeggedToken, ACCEPTS, ACCEPT_BY_ASSET, CONFIG, PEER_CHAINS,
    PEER_CHAIN_STATE, PEGS,
};

// ============================================================================
// Validation
// ============================================================================

/// Peer chain names follow account name rules: 1-12 of `a-z`, `1-5`, `.`
fn validate_chain_name(name: &str) -> Result<(), ContractError> {
    let valid = !name.is_empty()
        && name.len() <= 12
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || (b'1'..=b'5').contains(&b) || b == b'.');
    if !valid {
        return Err(ContractError::InvalidChainName {
            chain: name.to_string(),
        });
    }
    Ok(())
}

/// Symbols are 1-7 uppercase letters
fn validate_symbol(symbol: &str) -> Result<(), ContractError> {
    let valid = !symbol.is_empty()
        && symbol.len() <= 7
        && symbol.bytes().all(|b| b.is_ascii_uppercase());
    if !valid {
        return Err(ContractError::InvalidSymbol {
            symbol: symbol.to_string(),
        });
    }
    Ok(())
}

fn validate_fees(fees: &FeeSchedule) -> Result<(), ContractError> {
    fees.validate().map_err(|e| ContractError::InvalidFee {
        reason: e.to_string(),
    })
}

fn validate_once_bounds(min_once: Uint128, max_once: Uint128) -> Result<(), ContractError> {
    if min_once.is_zero() || min_once > max_once {
        return Err(ContractError::InvalidAmount {
            reason: "once bounds must satisfy 0 < min <= max".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Peer Chains
// ============================================================================

/// Register or update a peer chain. Counters survive re-registration.
#[allow(clippy::too_many_arguments)]
pub fn execute_reg_peer_chain(
    deps: DepsMut,
    info: MessageInfo,
    name: String,
    chain_info: String,
    peer_token_contract: String,
    light_client: String,
    free_account: Option<String>,
    max_original_trxs_per_block: u32,
    max_origtrxs_table_records: u32,
    cache_cashtrxs_table_records: u32,
    active: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    validate_chain_name(&name)?;
    if name == config.this_chain {
        return Err(ContractError::InvalidChainName { chain: name });
    }
    if peer_token_contract.is_empty() {
        return Err(ContractError::InvalidPeerContract {
            contract: peer_token_contract,
        });
    }
    let light_client = deps.api.addr_validate(&light_client)?;

    let chain = PeerChain {
        name: name.clone(),
        info: chain_info,
        peer_token_contract: peer_token_contract.clone(),
        light_client: light_client.clone(),
        free_account,
        max_original_trxs_per_block,
        max_origtrxs_table_records,
        cache_cashtrxs_table_records,
        active,
    };
    PEER_CHAINS.save(deps.storage, &name, &chain)?;
    if !PEER_CHAIN_STATE.has(deps.storage, &name) {
        PEER_CHAIN_STATE.save(deps.storage, &name, &Default::default())?;
    }

    Ok(Response::new()
        .add_attribute("action", "reg_peer_chain")
        .add_attribute("peer_chain", name)
        .add_attribute("peer_token_contract", peer_token_contract)
        .add_attribute("light_client", light_client)
        .add_attribute("active", active.to_string()))
}

pub fn execute_set_peer_chain_active(
    deps: DepsMut,
    info: MessageInfo,
    name: String,
    active: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    let mut chain = load_peer_chain(deps.storage, &name)?;
    chain.active = active;
    PEER_CHAINS.save(deps.storage, &name, &chain)?;

    Ok(Response::new()
        .add_attribute("action", "set_peer_chain_active")
        .add_attribute("peer_chain", name)
        .add_attribute("active", active.to_string()))
}

// ============================================================================
// Tokens
// ============================================================================

/// Register or update a local token that can be locked for peer chains.
///
/// The asset binding is fixed once registered. Re-registration keeps the
/// outstanding amount, the running totals and the rate window.
#[allow(clippy::too_many_arguments)]
pub fn execute_reg_accept_token(
    deps: DepsMut,
    info: MessageInfo,
    symbol: String,
    asset: AssetInfo,
    max_accept: Uint128,
    min_once_transfer: Uint128,
    max_once_transfer: Uint128,
    max_daily_transfer: Uint128,
    max_tfs_per_minute: u32,
    fees: Option<FeeSchedule>,
    active: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    validate_symbol(&symbol)?;
    if PEGS.has(deps.storage, &symbol) {
        return Err(ContractError::SymbolConflict { symbol });
    }
    validate_once_bounds(min_once_transfer, max_once_transfer)?;
    let fees = fees.unwrap_or_else(FeeSchedule::free);
    validate_fees(&fees)?;

    let asset_key = asset.key();
    if let Some(owner) = ACCEPT_BY_ASSET.may_load(deps.storage, &asset_key)? {
        if owner != symbol {
            return Err(ContractError::SymbolConflict { symbol });
        }
    }

    let token = match ACCEPTS.may_load(deps.storage, &symbol)? {
        Some(existing) => {
            if existing.asset != asset {
                return Err(ContractError::SymbolConflict { symbol });
            }
            AcceptedToken {
                max_accept,
                min_once_transfer,
                max_once_transfer,
                max_daily_transfer,
                max_tfs_per_minute,
                fees,
                active,
                ..existing
            }
        }
        None => AcceptedToken {
            symbol: symbol.clone(),
            asset: asset.clone(),
            accept: Uint128::zero(),
            max_accept,
            min_once_transfer,
            max_once_transfer,
            max_daily_transfer,
            max_tfs_per_minute,
            fees,
            total_transfer: Uint128::zero(),
            total_transfer_times: 0,
            total_cash: Uint128::zero(),
            total_cash_times: 0,
            active,
            window: RateWindow::default(),
        },
    };
    ACCEPTS.save(deps.storage, &symbol, &token)?;
    ACCEPT_BY_ASSET.save(deps.storage, &asset_key, &symbol)?;

    Ok(Response::new()
        .add_attribute("action", "reg_accept_token")
        .add_attribute("symbol", symbol)
        .add_attribute("asset", asset.to_string())
        .add_attribute("max_accept", max_accept.to_string())
        .add_attribute("active", active.to_string()))
}

/// Register or update a token issued here for an asset of `peer_chain`.
#[allow(clippy::too_many_arguments)]
pub fn execute_reg_peg_token(
    deps: DepsMut,
    info: MessageInfo,
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
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    validate_symbol(&symbol)?;
    if ACCEPTS.has(deps.storage, &symbol) {
        return Err(ContractError::SymbolConflict { symbol });
    }
    load_peer_chain(deps.storage, &peer_chain)?;
    validate_once_bounds(min_once_withdraw, max_once_withdraw)?;
    let fees = fees.unwrap_or_else(FeeSchedule::free);
    validate_fees(&fees)?;

    let token = match PEGS.may_load(deps.storage, &symbol)? {
        Some(existing) => {
            if existing.peer_chain != peer_chain || existing.peer_contract != peer_contract {
                return Err(ContractError::SymbolConflict { symbol });
            }
            if max_supply < existing.supply {
                return Err(ContractError::MaxSupplyExceeded { symbol });
            }
            PeggedToken {
                max_supply,
                min_once_withdraw,
                max_once_withdraw,
                max_daily_withdraw,
                max_wds_per_minute,
                fees,
                active,
                ..existing
            }
        }
        None => PeggedToken {
            symbol: symbol.clone(),
            peer_chain: peer_chain.clone(),
            peer_contract: peer_contract.clone(),
            supply: Uint128::zero(),
            max_supply,
            min_once_withdraw,
            max_once_withdraw,
            max_daily_withdraw,
            max_wds_per_minute,
            fees,
            total_issue: Uint128::zero(),
            total_issue_times: 0,
            total_withdraw: Uint128::zero(),
            total_withdraw_times: 0,
            active,
            window: RateWindow::default(),
        },
    };
    PEGS.save(deps.storage, &symbol, &token)?;

    Ok(Response::new()
        .add_attribute("action", "reg_peg_token")
        .add_attribute("symbol", symbol)
        .add_attribute("peer_chain", peer_chain)
        .add_attribute("peer_contract", peer_contract)
        .add_attribute("max_supply", max_supply.to_string())
        .add_attribute("active", active.to_string()))
}

/// Replace the success or failed fee rule of a token.
pub fn execute_set_token_fee(
    deps: DepsMut,
    info: MessageInfo,
    symbol: String,
    kind: FeeKind,
    rule: FeeRule,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    rule.validate().map_err(|e| ContractError::InvalidFee {
        reason: e.to_string(),
    })?;

    if let Some(mut token) = ACCEPTS.may_load(deps.storage, &symbol)? {
        token.fees.set_rule(kind, rule.clone());
        ACCEPTS.save(deps.storage, &symbol, &token)?;
    } else if let Some(mut token) = PEGS.may_load(deps.storage, &symbol)? {
        token.fees.set_rule(kind, rule.clone());
        PEGS.save(deps.storage, &symbol, &token)?;
    } else {
        return Err(ContractError::TokenNotFound { symbol });
    }

    Ok(Response::new()
        .add_attribute("action", "set_token_fee")
        .add_attribute("symbol", symbol)
        .add_attribute("kind", kind.as_str())
        .add_attribute("mode", rule.mode.as_str())
        .add_attribute("fixed", rule.fixed.to_string())
        .add_attribute("ratio_bps", rule.ratio_bps.to_string()))
}

pub fn execute_set_token_active(
    deps: DepsMut,
    info: MessageInfo,
    symbol: String,
    active: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender)?;

    let kind = if let Some(mut token) = ACCEPTS.may_load(deps.storage, &symbol)? {
        token.active = active;
        ACCEPTS.save(deps.storage, &symbol, &token)?;
        "accepted"
    } else if let Some(mut token) = PEGS.may_load(deps.storage, &symbol)? {
        token.active = active;
        PEGS.save(deps.storage, &symbol, &token)?;
        "pegged"
    } else {
        return Err(ContractError::TokenNotFound { symbol });
    };

    Ok(Response::new()
        .add_attribute("action", "set_token_active")
        .add_attribute("symbol", symbol)
        .add_attribute("token", kind)
        .add_attribute("active", active.to_string()))
}
