//! Execute handlers for the IBC token contract.
//!
//! This module contains all execute message handlers, organized by category:
//! - `outgoing` - native/cw20 locks and pegged token transfers and withdrawals
//! - `cash` - settlement of proven peer-chain transfers
//! - `confirm` - retirement of original transactions cashed on the peer
//! - `rollback` - refunds and audited removals of unconfirmed transfers
//! - `hub` - onward relaying of settlements addressed to the hub account
//! - `config` - peer chain and token registration
//! - `admin` - global switches and peer chain reset
//! - `account` - pegged balance slots

mod account;
mod admin;
mod cash;
mod config;
mod confirm;
mod hub;
mod outgoing;
mod rollback;

pub use account::*;
pub use admin::*;
pub use cash::*;
pub use config::*;
pub use confirm::*;
pub use outgoing::*;
pub use rollback::*;

use cosmwasm_std::{Addr, Env, StdResult, Storage};

use crate::error::ContractError;
use crate::fee_manager::FeeSchedule;
use crate::hash::{compute_trx_id, Digest};
use crate::state::{Config, PeerChain, TokenRef, ACCEPTS, PEER_CHAINS, PEGS, TRX_NONCE};

// ============================================================================
// Shared Helpers
// ============================================================================

pub(crate) fn ensure_admin(config: &Config, sender: &Addr) -> Result<(), ContractError> {
    if *sender != config.admin {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

pub(crate) fn ensure_active(config: &Config) -> Result<(), ContractError> {
    if !config.active {
        return Err(ContractError::GlobalInactive);
    }
    Ok(())
}

pub(crate) fn ensure_unlocked(config: &Config) -> Result<(), ContractError> {
    if config.locked {
        return Err(ContractError::GloballyLocked);
    }
    Ok(())
}

pub(crate) fn load_peer_chain(storage: &dyn Storage, name: &str) -> Result<PeerChain, ContractError> {
    PEER_CHAINS
        .may_load(storage, name)?
        .ok_or_else(|| ContractError::PeerChainNotFound {
            chain: name.to_string(),
        })
}

pub(crate) fn load_active_peer_chain(
    storage: &dyn Storage,
    name: &str,
) -> Result<PeerChain, ContractError> {
    let chain = load_peer_chain(storage, name)?;
    if !chain.active {
        return Err(ContractError::PeerChainInactive {
            chain: name.to_string(),
        });
    }
    Ok(chain)
}

pub(crate) fn token_fees(storage: &dyn Storage, token: &TokenRef) -> StdResult<FeeSchedule> {
    match token {
        TokenRef::Accepted { symbol } => Ok(ACCEPTS.load(storage, symbol)?.fees),
        TokenRef::Pegged { symbol } => Ok(PEGS.load(storage, symbol)?.fees),
    }
}

/// Derive the id of a transaction originated here and bump the nonce.
pub(crate) fn next_trx_id(
    storage: &mut dyn Storage,
    config: &Config,
    env: &Env,
    tag: &[u8; 4],
) -> StdResult<Digest> {
    let nonce = TRX_NONCE.may_load(storage)?.unwrap_or_default();
    TRX_NONCE.save(storage, &(nonce + 1))?;
    Ok(compute_trx_id(tag, &config.this_chain, env, nonce))
}
