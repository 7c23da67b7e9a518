//! Balance ledger for pegged tokens and payouts of both token kinds.

use common::Asset;
use cosmwasm_std::{Addr, CosmosMsg, Storage, Uint128};

use crate::error::ContractError;
use crate::state::{TokenRef, ACCEPTS, BALANCES};

pub fn balance(storage: &dyn Storage, owner: &Addr, symbol: &str) -> Result<Uint128, ContractError> {
    Ok(BALANCES
        .may_load(storage, (owner, symbol))?
        .unwrap_or_default())
}

pub fn credit(
    storage: &mut dyn Storage,
    owner: &Addr,
    symbol: &str,
    amount: Uint128,
) -> Result<(), ContractError> {
    let current = balance(storage, owner, symbol)?;
    BALANCES.save(storage, (owner, symbol), &current.checked_add(amount)?)?;
    Ok(())
}

pub fn debit(
    storage: &mut dyn Storage,
    owner: &Addr,
    symbol: &str,
    amount: Uint128,
) -> Result<(), ContractError> {
    let current = balance(storage, owner, symbol)?;
    if current < amount {
        return Err(ContractError::InsufficientBalance {
            available: current,
            required: amount,
        });
    }
    BALANCES.save(storage, (owner, symbol), &(current - amount))?;
    Ok(())
}

/// Create an empty balance slot. Existing slots are left untouched.
pub fn open(storage: &mut dyn Storage, owner: &Addr, symbol: &str) -> Result<(), ContractError> {
    if !BALANCES.has(storage, (owner, symbol)) {
        BALANCES.save(storage, (owner, symbol), &Uint128::zero())?;
    }
    Ok(())
}

/// Remove a balance slot; it must be empty.
pub fn close(storage: &mut dyn Storage, owner: &Addr, symbol: &str) -> Result<(), ContractError> {
    if !balance(storage, owner, symbol)?.is_zero() {
        return Err(ContractError::BalanceNotEmpty);
    }
    BALANCES.remove(storage, (owner, symbol));
    Ok(())
}

/// Deliver `amount` of `token` to `recipient`.
///
/// Pegged tokens are credited in the ledger; accepted tokens leave the
/// contract as a bank or cw20 transfer message.
pub fn pay_out(
    storage: &mut dyn Storage,
    token: &TokenRef,
    recipient: &Addr,
    amount: Uint128,
) -> Result<Option<CosmosMsg>, ContractError> {
    if amount.is_zero() {
        return Ok(None);
    }
    match token {
        TokenRef::Accepted { symbol } => {
            let accepted = ACCEPTS.load(storage, symbol)?;
            let msg = Asset::new(accepted.asset, amount).into_msg(recipient)?;
            Ok(Some(msg))
        }
        TokenRef::Pegged { symbol } => {
            credit(storage, recipient, symbol, amount)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::mock_dependencies;

    #[test]
    fn test_credit_debit() {
        let mut deps = mock_dependencies();
        let alice = Addr::unchecked("alice");

        credit(deps.as_mut().storage, &alice, "PEOS", Uint128::from(50u128)).unwrap();
        debit(deps.as_mut().storage, &alice, "PEOS", Uint128::from(20u128)).unwrap();
        assert_eq!(
            balance(deps.as_ref().storage, &alice, "PEOS").unwrap(),
            Uint128::from(30u128)
        );

        assert_eq!(
            debit(deps.as_mut().storage, &alice, "PEOS", Uint128::from(31u128)).unwrap_err(),
            ContractError::InsufficientBalance {
                available: Uint128::from(30u128),
                required: Uint128::from(31u128),
            }
        );
    }

    #[test]
    fn test_open_close() {
        let mut deps = mock_dependencies();
        let bob = Addr::unchecked("bob");

        open(deps.as_mut().storage, &bob, "PEOS").unwrap();
        assert!(BALANCES.has(deps.as_ref().storage, (&bob, "PEOS")));

        credit(deps.as_mut().storage, &bob, "PEOS", Uint128::one()).unwrap();
        // reopening keeps the balance
        open(deps.as_mut().storage, &bob, "PEOS").unwrap();
        assert_eq!(
            close(deps.as_mut().storage, &bob, "PEOS").unwrap_err(),
            ContractError::BalanceNotEmpty
        );

        debit(deps.as_mut().storage, &bob, "PEOS", Uint128::one()).unwrap();
        close(deps.as_mut().storage, &bob, "PEOS").unwrap();
        assert!(!BALANCES.has(deps.as_ref().storage, (&bob, "PEOS")));
    }

    #[test]
    fn test_pay_out_pegged_credits_ledger() {
        let mut deps = mock_dependencies();
        let carol = Addr::unchecked("carol");
        let token = TokenRef::Pegged {
            symbol: "PEOS".to_string(),
        };

        let msg = pay_out(deps.as_mut().storage, &token, &carol, Uint128::from(7u128)).unwrap();
        assert!(msg.is_none());
        assert_eq!(
            balance(deps.as_ref().storage, &carol, "PEOS").unwrap(),
            Uint128::from(7u128)
        );

        // zero payouts are skipped entirely
        assert!(pay_out(deps.as_mut().storage, &token, &carol, Uint128::zero())
            .unwrap()
            .is_none());
    }
}
