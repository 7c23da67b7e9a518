//! Pegged balance slots.

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use crate::error::ContractError;
use crate::ledger;
use crate::state::PEGS;

/// Create an empty balance slot for `owner`. Anyone may pay for it.
pub fn execute_open(
    deps: DepsMut,
    _info: MessageInfo,
    owner: String,
    symbol: String,
) -> Result<Response, ContractError> {
    if !PEGS.has(deps.storage, &symbol) {
        return Err(ContractError::TokenNotFound { symbol });
    }
    let owner = deps.api.addr_validate(&owner)?;
    ledger::open(deps.storage, &owner, &symbol)?;

    Ok(Response::new()
        .add_attribute("action", "open")
        .add_attribute("owner", owner)
        .add_attribute("symbol", symbol))
}

/// Remove the sender's empty balance slot.
pub fn execute_close(
    deps: DepsMut,
    info: MessageInfo,
    symbol: String,
) -> Result<Response, ContractError> {
    ledger::close(deps.storage, &info.sender, &symbol)?;

    Ok(Response::new()
        .add_attribute("action", "close")
        .add_attribute("owner", info.sender)
        .add_attribute("symbol", symbol))
}
