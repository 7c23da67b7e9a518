//! Cash-confirmation log.
//!
//! Settlements accepted from a peer chain, keyed by `seq_num`. The log is a
//! replay guard: a live entry blocks a second settlement of the same
//! original transaction. Retention only ever prunes the lowest `seq_num`
//! and never touches the two most recent distinct `orig_trx_block_num`
//! groups.

use cosmwasm_std::{Empty, Order, StdResult, Storage};
use cw_storage_plus::Bound;

use crate::hash::Digest;
use crate::state::{CashTrx, PeerChainState, TRIM_BATCH, CASH_TRXS, CASH_TRX_BY_BLOCK, CASH_TRX_BY_ORIG};

/// Highest `orig_trx_block_num` in the log.
pub fn latest_block_num(storage: &dyn Storage, peer_chain: &str) -> StdResult<Option<u64>> {
    let latest = CASH_TRX_BY_BLOCK
        .sub_prefix(peer_chain)
        .keys(storage, None, None, Order::Descending)
        .next()
        .transpose()?;
    Ok(latest.map(|(block_num, _)| block_num))
}

/// Lowest block number that retention must keep: the second highest
/// distinct block number, or the highest when only one group exists.
pub fn retention_floor(storage: &dyn Storage, peer_chain: &str) -> StdResult<Option<u64>> {
    let Some(highest) = latest_block_num(storage, peer_chain)? else {
        return Ok(None);
    };
    let second = CASH_TRX_BY_BLOCK
        .sub_prefix(peer_chain)
        .keys(
            storage,
            None,
            Some(Bound::exclusive((highest, 0u64))),
            Order::Descending,
        )
        .next()
        .transpose()?;
    Ok(Some(second.map(|(block_num, _)| block_num).unwrap_or(highest)))
}

pub fn find_by_orig(
    storage: &dyn Storage,
    peer_chain: &str,
    orig_trx_id: &Digest,
) -> StdResult<Option<CashTrx>> {
    match CASH_TRX_BY_ORIG.may_load(storage, (peer_chain, orig_trx_id.as_slice()))? {
        Some(seq_num) => CASH_TRXS.may_load(storage, (peer_chain, seq_num)),
        None => Ok(None),
    }
}

pub fn append(
    storage: &mut dyn Storage,
    peer_chain: &str,
    state: &mut PeerChainState,
    entry: &CashTrx,
) -> StdResult<()> {
    CASH_TRXS.save(storage, (peer_chain, entry.seq_num), entry)?;
    CASH_TRX_BY_ORIG.save(
        storage,
        (peer_chain, entry.orig_trx_id.as_slice()),
        &entry.seq_num,
    )?;
    CASH_TRX_BY_BLOCK.save(
        storage,
        (peer_chain, entry.orig_trx_block_num, entry.seq_num),
        &Empty {},
    )?;
    state.cashtrxs_records += 1;
    Ok(())
}

fn remove(storage: &mut dyn Storage, peer_chain: &str, entry: &CashTrx) {
    CASH_TRXS.remove(storage, (peer_chain, entry.seq_num));
    CASH_TRX_BY_ORIG.remove(storage, (peer_chain, entry.orig_trx_id.as_slice()));
    CASH_TRX_BY_BLOCK.remove(storage, (peer_chain, entry.orig_trx_block_num, entry.seq_num));
}

/// Prune the lowest `seq_num` entries while more than `max_records` remain.
pub fn trim(
    storage: &mut dyn Storage,
    peer_chain: &str,
    state: &mut PeerChainState,
    max_records: u32,
) -> StdResult<u32> {
    let Some(floor) = retention_floor(storage, peer_chain)? else {
        return Ok(0);
    };

    let mut removed = 0u32;
    while state.cashtrxs_records > max_records && removed < TRIM_BATCH {
        let lowest = CASH_TRXS
            .prefix(peer_chain)
            .range(storage, None, None, Order::Ascending)
            .next()
            .transpose()?;
        let Some((_, entry)) = lowest else {
            break;
        };
        if entry.orig_trx_block_num >= floor {
            break;
        }
        remove(storage, peer_chain, &entry);
        state.cashtrxs_records -= 1;
        removed += 1;
    }
    Ok(removed)
}

/// Delete every entry of a peer chain.
pub fn clear(storage: &mut dyn Storage, peer_chain: &str) -> StdResult<()> {
    let entries = CASH_TRXS
        .prefix(peer_chain)
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, entry)| entry))
        .collect::<StdResult<Vec<_>>>()?;
    for entry in entries {
        remove(storage, peer_chain, &entry);
    }
    Ok(())
}
