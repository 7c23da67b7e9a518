//! Original-transaction log.
//!
//! One table per peer chain of outbound transfers awaiting confirmation.
//! Entries are appended in non-decreasing time slot order and ids increase
//! by one, so id order is also slot order. Callers pass the chain's
//! `PeerChainState` in and save it afterwards.

use cosmwasm_std::{Empty, Order, StdResult, Storage};

use crate::error::ContractError;
use crate::hash::{bytes32_to_hex, Digest};
use crate::state::{
    OrigTrx, OrigTrxAction, PeerChain, PeerChainState, RemovalReason, RemovedTrx, TRIM_BATCH,
    ORIG_TRXS, ORIG_TRX_BY_HASH, ORIG_TRX_BY_SLOT, RMD_UNRBS,
};

/// Append a new entry at `time_slot`.
pub fn append(
    storage: &mut dyn Storage,
    chain: &PeerChain,
    state: &mut PeerChainState,
    time_slot: u64,
    trx_id: Digest,
    action: OrigTrxAction,
) -> Result<OrigTrx, ContractError> {
    if time_slot < state.last_orig_trx_time_slot {
        return Err(ContractError::NonMonotonicTimeSlot {
            latest: state.last_orig_trx_time_slot,
            got: time_slot,
        });
    }

    if time_slot != state.current_block_time_slot {
        state.current_block_time_slot = time_slot;
        state.current_block_trxs = 0;
    }
    let per_block = chain.max_original_trxs_per_block;
    if per_block > 0 && state.current_block_trxs >= per_block {
        return Err(ContractError::BlockTrxLimitReached { limit: per_block });
    }

    let cap = chain.max_origtrxs_table_records;
    if cap > 0 && state.origtrxs_records >= cap {
        trim(storage, chain.name.as_str(), state, cap - 1, time_slot)?;
        if state.origtrxs_records >= cap {
            return Err(ContractError::OrigTrxTableFull { limit: cap });
        }
    }

    let entry = OrigTrx {
        id: state.origtrxs_next_id,
        block_time_slot: time_slot,
        trx_id,
        action,
    };
    ORIG_TRXS.save(storage, (chain.name.as_str(), entry.id), &entry)?;
    ORIG_TRX_BY_HASH.save(storage, (chain.name.as_str(), entry.trx_id.as_slice()), &entry.id)?;
    ORIG_TRX_BY_SLOT.save(storage, (chain.name.as_str(), time_slot, entry.id), &Empty {})?;

    state.origtrxs_next_id += 1;
    state.origtrxs_records += 1;
    state.current_block_trxs += 1;
    state.last_orig_trx_time_slot = time_slot;

    Ok(entry)
}

pub fn find_by_hash(
    storage: &dyn Storage,
    peer_chain: &str,
    trx_id: &Digest,
) -> StdResult<Option<OrigTrx>> {
    match ORIG_TRX_BY_HASH.may_load(storage, (peer_chain, trx_id.as_slice()))? {
        Some(id) => ORIG_TRXS.may_load(storage, (peer_chain, id)),
        None => Ok(None),
    }
}

/// Load an entry or fail with `OrigTrxNotFound`.
pub fn load_by_hash(
    storage: &dyn Storage,
    peer_chain: &str,
    trx_id: &Digest,
) -> Result<OrigTrx, ContractError> {
    find_by_hash(storage, peer_chain, trx_id)?.ok_or_else(|| ContractError::OrigTrxNotFound {
        trx_id: bytes32_to_hex(trx_id),
    })
}

/// Remove an entry and its indices.
pub fn remove(
    storage: &mut dyn Storage,
    peer_chain: &str,
    state: &mut PeerChainState,
    entry: &OrigTrx,
) {
    ORIG_TRXS.remove(storage, (peer_chain, entry.id));
    ORIG_TRX_BY_HASH.remove(storage, (peer_chain, entry.trx_id.as_slice()));
    ORIG_TRX_BY_SLOT.remove(storage, (peer_chain, entry.block_time_slot, entry.id));
    state.origtrxs_records = state.origtrxs_records.saturating_sub(1);
}

/// Remove an entry without refund and keep an audit record of it.
pub fn remove_to_audit(
    storage: &mut dyn Storage,
    peer_chain: &str,
    state: &mut PeerChainState,
    entry: OrigTrx,
    reason: RemovalReason,
    time_slot: u64,
) -> StdResult<RemovedTrx> {
    remove(storage, peer_chain, state, &entry);
    let removed = RemovedTrx {
        id: state.rmdunrbs_next_id,
        removed_time_slot: time_slot,
        reason,
        orig_trx: entry,
    };
    RMD_UNRBS.save(storage, (peer_chain, removed.id), &removed)?;
    state.rmdunrbs_next_id += 1;
    Ok(removed)
}

/// Drop the oldest entries while the table holds more than `max_records`.
///
/// Only entries from slots strictly before the last confirmed slot are
/// dropped; they are written to the audit table.
pub fn trim(
    storage: &mut dyn Storage,
    peer_chain: &str,
    state: &mut PeerChainState,
    max_records: u32,
    time_slot: u64,
) -> StdResult<u32> {
    let mut dropped = 0u32;
    while state.origtrxs_records > max_records && dropped < TRIM_BATCH {
        let oldest = ORIG_TRXS
            .prefix(peer_chain)
            .range(storage, None, None, Order::Ascending)
            .next()
            .transpose()?;
        let Some((_, entry)) = oldest else {
            break;
        };
        if entry.block_time_slot >= state.last_confirmed_orig_trx_block_time_slot {
            break;
        }
        remove_to_audit(
            storage,
            peer_chain,
            state,
            entry,
            RemovalReason::Trimmed,
            time_slot,
        )?;
        dropped += 1;
    }
    Ok(dropped)
}

/// Delete every entry of a peer chain and return what was dropped.
///
/// The audit table is not touched.
pub fn clear(storage: &mut dyn Storage, peer_chain: &str) -> StdResult<Vec<OrigTrx>> {
    let entries = ORIG_TRXS
        .prefix(peer_chain)
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, entry)| entry))
        .collect::<StdResult<Vec<_>>>()?;
    for entry in &entries {
        ORIG_TRXS.remove(storage, (peer_chain, entry.id));
        ORIG_TRX_BY_HASH.remove(storage, (peer_chain, entry.trx_id.as_slice()));
        ORIG_TRX_BY_SLOT.remove(storage, (peer_chain, entry.block_time_slot, entry.id));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Originator, Quantity, TokenRef};
    use cosmwasm_std::testing::mock_dependencies;
    use cosmwasm_std::{Addr, Uint128};

    fn chain(per_block: u32, cap: u32) -> PeerChain {
        PeerChain {
            name: "eos".to_string(),
            info: String::new(),
            peer_token_contract: "bosibc.io".to_string(),
            light_client: Addr::unchecked("light"),
            free_account: None,
            max_original_trxs_per_block: per_block,
            max_origtrxs_table_records: cap,
            cache_cashtrxs_table_records: 10,
            active: true,
        }
    }

    fn action() -> OrigTrxAction {
        OrigTrxAction {
            token: TokenRef::Accepted {
                symbol: "LUNA".to_string(),
            },
            originator: Originator::Account {
                addr: Addr::unchecked("alice"),
            },
            quantity: Quantity::new("LUNA", Uint128::from(10u128)),
            peer_receiver: "bob".to_string(),
            memo: String::new(),
        }
    }

    fn id(n: u8) -> Digest {
        [n; 32]
    }

    #[test]
    fn test_append_and_lookup() {
        let mut deps = mock_dependencies();
        let chain = chain(0, 0);
        let mut state = PeerChainState::default();

        let a = append(deps.as_mut().storage, &chain, &mut state, 10, id(1), action()).unwrap();
        let b = append(deps.as_mut().storage, &chain, &mut state, 10, id(2), action()).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(state.origtrxs_records, 2);
        assert_eq!(state.current_block_trxs, 2);

        let found = find_by_hash(deps.as_ref().storage, "eos", &id(2)).unwrap().unwrap();
        assert_eq!(found, b);
        assert!(find_by_hash(deps.as_ref().storage, "bos", &id(2)).unwrap().is_none());
    }

    #[test]
    fn test_rejects_earlier_slot() {
        let mut deps = mock_dependencies();
        let chain = chain(0, 0);
        let mut state = PeerChainState::default();
        append(deps.as_mut().storage, &chain, &mut state, 10, id(1), action()).unwrap();
        assert_eq!(
            append(deps.as_mut().storage, &chain, &mut state, 9, id(2), action()).unwrap_err(),
            ContractError::NonMonotonicTimeSlot { latest: 10, got: 9 }
        );
    }

    #[test]
    fn test_per_block_limit() {
        let mut deps = mock_dependencies();
        let chain = chain(2, 0);
        let mut state = PeerChainState::default();
        append(deps.as_mut().storage, &chain, &mut state, 10, id(1), action()).unwrap();
        append(deps.as_mut().storage, &chain, &mut state, 10, id(2), action()).unwrap();
        assert_eq!(
            append(deps.as_mut().storage, &chain, &mut state, 10, id(3), action()).unwrap_err(),
            ContractError::BlockTrxLimitReached { limit: 2 }
        );
        // next slot starts a fresh block count
        append(deps.as_mut().storage, &chain, &mut state, 11, id(3), action()).unwrap();
        assert_eq!(state.current_block_trxs, 1);
    }

    #[test]
    fn test_remove_drops_indices() {
        let mut deps = mock_dependencies();
        let chain = chain(0, 0);
        let mut state = PeerChainState::default();
        append(deps.as_mut().storage, &chain, &mut state, 10, id(1), action()).unwrap();

        let entry = load_by_hash(deps.as_ref().storage, "eos", &id(1)).unwrap();
        remove(deps.as_mut().storage, "eos", &mut state, &entry);
        assert_eq!(state.origtrxs_records, 0);
        assert!(ORIG_TRX_BY_SLOT
            .keys(deps.as_ref().storage, None, None, Order::Ascending)
            .next()
            .is_none());
        assert!(matches!(
            load_by_hash(deps.as_ref().storage, "eos", &id(1)).unwrap_err(),
            ContractError::OrigTrxNotFound { .. }
        ));
    }

    #[test]
    fn test_full_table_trims_confirmed_history() {
        let mut deps = mock_dependencies();
        let chain = chain(0, 2);
        let mut state = PeerChainState::default();
        append(deps.as_mut().storage, &chain, &mut state, 10, id(1), action()).unwrap();
        append(deps.as_mut().storage, &chain, &mut state, 20, id(2), action()).unwrap();

        // nothing is older than the watermark yet
        assert_eq!(
            append(deps.as_mut().storage, &chain, &mut state, 30, id(3), action()).unwrap_err(),
            ContractError::OrigTrxTableFull { limit: 2 }
        );

        state.last_confirmed_orig_trx_block_time_slot = 15;
        append(deps.as_mut().storage, &chain, &mut state, 30, id(3), action()).unwrap();
        assert_eq!(state.origtrxs_records, 2);
        assert!(find_by_hash(deps.as_ref().storage, "eos", &id(1)).unwrap().is_none());

        let audit = RMD_UNRBS.load(deps.as_ref().storage, ("eos", 0)).unwrap();
        assert_eq!(audit.reason, RemovalReason::Trimmed);
        assert_eq!(audit.orig_trx.trx_id, id(1));
        assert_eq!(state.rmdunrbs_next_id, 1);
    }

    #[test]
    fn test_clear() {
        let mut deps = mock_dependencies();
        let chain = chain(0, 0);
        let mut state = PeerChainState::default();
        append(deps.as_mut().storage, &chain, &mut state, 10, id(1), action()).unwrap();
        append(deps.as_mut().storage, &chain, &mut state, 11, id(2), action()).unwrap();

        let found = find_by_hash(deps.as_ref().storage, "eos", &id(1)).unwrap().unwrap();
        remove_to_audit(
            deps.as_mut().storage,
            "eos",
            &mut state,
            found,
            RemovalReason::ForceRemoved,
            12,
        )
        .unwrap();

        let dropped = clear(deps.as_mut().storage, "eos").unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].trx_id, id(2));
        assert!(RMD_UNRBS.has(deps.as_ref().storage, ("eos", 0)));
        assert!(ORIG_TRXS
            .keys(deps.as_ref().storage, None, None, Order::Ascending)
            .next()
            .is_none());
        assert!(ORIG_TRX_BY_HASH
            .keys(deps.as_ref().storage, None, None, Order::Ascending)
            .next()
            .is_none());
    }
}
