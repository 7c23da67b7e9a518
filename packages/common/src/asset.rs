//! Asset descriptors for tokens held in bridge custody.
//!
//! An accepted token is either a native bank denom or a CW20 contract. The
//! bridge locks it on outbound transfers and pays it out on settlement and
//! rollback, so both the lookup key and the payout message live here.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_binary, Addr, BankMsg, Coin, CosmosMsg, StdResult, Uint128, WasmMsg};
use cw20::Cw20ExecuteMsg;

/// Where an asset lives on this chain
#[cw_serde]
pub enum AssetInfo {
    /// Native bank denom (e.g. "uluna")
    Native { denom: String },
    /// CW20 token contract
    Cw20 { contract_addr: Addr },
}

impl AssetInfo {
    /// Key used by reverse lookups (denom or contract address)
    pub fn key(&self) -> String {
        match self {
            AssetInfo::Native { denom } => denom.clone(),
            AssetInfo::Cw20 { contract_addr } => contract_addr.to_string(),
        }
    }
}

impl std::fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetInfo::Native { denom } => write!(f, "native:{}", denom),
            AssetInfo::Cw20 { contract_addr } => write!(f, "cw20:{}", contract_addr),
        }
    }
}

/// An amount of a specific asset
#[cw_serde]
pub struct Asset {
    pub info: AssetInfo,
    pub amount: Uint128,
}

impl Asset {
    pub fn new(info: AssetInfo, amount: impl Into<Uint128>) -> Self {
        Self {
            info,
            amount: amount.into(),
        }
    }

    /// Build the message that sends this asset from the contract to `recipient`.
    pub fn into_msg(self, recipient: impl Into<String>) -> StdResult<CosmosMsg> {
        let recipient = recipient.into();
        match self.info {
            AssetInfo::Native { denom } => Ok(CosmosMsg::Bank(BankMsg::Send {
                to_address: recipient,
                amount: vec![Coin {
                    denom,
                    amount: self.amount,
                }],
            })),
            AssetInfo::Cw20 { contract_addr } => Ok(CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr: contract_addr.to_string(),
                msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
                    recipient,
                    amount: self.amount,
                })?,
                funds: vec![],
            })),
        }
    }
}
