//! Settlement intake tests: proofs, ordering, replay protection, fees and
//! retention of the cash-confirmation log.

mod suite;

use cosmwasm_std::{Addr, Binary, Uint128};
use cw_multi_test::Executor;

use ibc_token::msg::{CashTrxResponse, CashTrxsResponse, ExecuteMsg, QueryMsg};

use suite::*;

// ============================================================================
// Fees & Accounting
// ============================================================================

#[test]
fn test_cash_pegged_nets_success_fee() {
    let mut suite = Suite::new();
    let user = suite.user.clone();
    let relay = suite.relay.clone();

    let transfer = PeerTransfer::pegged("eos-1", user.as_str(), 100, 10);
    let res = suite.cash(1, &transfer).unwrap();
    assert_eq!(attr(&res, "net"), Some("99".to_string()));
    assert_eq!(attr(&res, "fee"), Some("1".to_string()));

    assert_eq!(suite.balance(user.as_str(), EOS), Uint128::new(99));
    assert_eq!(suite.balance(relay.as_str(), EOS), Uint128::new(1));

    let token = suite.pegged(EOS);
    assert_eq!(token.supply, Uint128::new(100));
    assert_eq!(token.total_issue, Uint128::new(100));
    assert_eq!(token.total_issue_times, 1);

    let state = suite.peer_state(PEER);
    assert_eq!(state.cash_seq_num, 1);
    assert_eq!(state.cashtrxs_records, 1);

    let entry: Option<CashTrxResponse> = suite
        .app
        .wrap()
        .query_wasm_smart(
            &suite.bridge,
            &QueryMsg::CashTrxByOrig {
                peer_chain: PEER.to_string(),
                orig_trx_id: Binary::from(transfer.trx_id.to_vec()),
            },
        )
        .unwrap();
    let entry = entry.unwrap();
    assert_eq!(entry.seq_num, 1);
    assert_eq!(entry.orig_trx_block_num, 10);
    assert_eq!(entry.action.to, user.to_string());
}

#[test]
fn test_cash_returning_releases_locked_token() {
    let mut suite = Suite::new();
    let user = suite.user.clone();
    let relay = suite.relay.clone();
    let start = suite.bank_balance(&user);

    suite.lock_luna(1_000, "bob").unwrap();
    suite
        .cash(1, &PeerTransfer::returning("luna-back", user.as_str(), 100, 10))
        .unwrap();

    assert_eq!(suite.bank_balance(&user), start - Uint128::new(1_000) + Uint128::new(99));
    assert_eq!(suite.bank_balance(&relay), Uint128::new(1));
    let token = suite.accepted(LUNA);
    assert_eq!(token.accept, Uint128::new(900));
    assert_eq!(token.total_cash, Uint128::new(100));
}

#[test]
fn test_cash_settles_inactive_tokens() {
    let mut suite = Suite::new();
    let user = suite.user.clone();
    let start = suite.bank_balance(&user);
    suite.lock_luna(1_000, "bob").unwrap();

    for symbol in [LUNA, EOS] {
        suite
            .admin_exec(&ExecuteMsg::SetTokenActive {
                symbol: symbol.to_string(),
                active: false,
            })
            .unwrap();
    }

    // Transfers already in flight still land
    suite
        .cash(1, &PeerTransfer::returning("luna-back", user.as_str(), 100, 10))
        .unwrap();
    assert_eq!(suite.bank_balance(&user), start - Uint128::new(1_000) + Uint128::new(99));
    assert_eq!(suite.accepted(LUNA).accept, Uint128::new(900));

    suite
        .cash(2, &PeerTransfer::pegged("eos-1", user.as_str(), 100, 11))
        .unwrap();
    assert_eq!(suite.balance(user.as_str(), EOS), Uint128::new(99));

    // New outbound transfers are refused
    let res = suite.lock_luna(100, "bob");
    assert!(err_string(res.unwrap_err()).contains("Token not active: LUNA"));
    let res = suite.withdraw_eos(&user, 50, "alice");
    assert!(err_string(res.unwrap_err()).contains("Token not active: EOS"));
}

#[test]
fn test_free_account_pays_no_fee() {
    let mut suite = Suite::new();
    let light_client = suite.light_client.to_string();
    suite
        .admin_exec(&ExecuteMsg::RegPeerChain {
            name: PEER.to_string(),
            info: "eos mainnet".to_string(),
            peer_token_contract: PEER_BRIDGE.to_string(),
            light_client,
            free_account: Some("alice".to_string()),
            max_original_trxs_per_block: 0,
            max_origtrxs_table_records: 0,
            cache_cashtrxs_table_records: 100,
            active: true,
        })
        .unwrap();

    let user = suite.user.clone();
    let res = suite
        .cash(1, &PeerTransfer::pegged("eos-1", user.as_str(), 100, 10))
        .unwrap();
    assert_eq!(attr(&res, "fee"), Some("0".to_string()));
    assert_eq!(suite.balance(user.as_str(), EOS), Uint128::new(100));
}

#[test]
fn test_cash_respects_max_supply_and_liquidity() {
    let mut suite = Suite::new();
    let user = suite.user.clone();

    let res = suite.cash(
        1,
        &PeerTransfer::pegged("eos-big", user.as_str(), 100_000_001, 10),
    );
    assert!(err_string(res.unwrap_err()).contains("Maximum supply"));

    // Nothing of ours was ever locked, so nothing can come back
    let res = suite.cash(1, &PeerTransfer::returning("luna-back", user.as_str(), 100, 10));
    assert!(err_string(res.unwrap_err()).contains("Insufficient bridge liquidity"));
}

// ============================================================================
// Ordering & Replay
// ============================================================================

#[test]
fn test_seq_num_must_be_next() {
    let mut suite = Suite::new();
    let user = suite.user.clone();

    suite
        .cash(1, &PeerTransfer::pegged("eos-1", user.as_str(), 100, 10))
        .unwrap();

    let res = suite.cash(3, &PeerTransfer::pegged("eos-3", user.as_str(), 100, 11));
    assert!(err_string(res.unwrap_err()).contains("Invalid seq_num: expected 2, got 3"));

    let res = suite.cash(1, &PeerTransfer::pegged("eos-1b", user.as_str(), 100, 11));
    assert!(err_string(res.unwrap_err()).contains("expected 2, got 1"));

    suite
        .cash(2, &PeerTransfer::pegged("eos-2", user.as_str(), 100, 11))
        .unwrap();
    assert_eq!(suite.peer_state(PEER).cash_seq_num, 2);
}

#[test]
fn test_duplicate_orig_trx_rejected() {
    let mut suite = Suite::new();
    let user = suite.user.clone();

    let transfer = PeerTransfer::pegged("eos-1", user.as_str(), 100, 10);
    suite.cash(1, &transfer).unwrap();

    let res = suite.cash(2, &transfer);
    assert!(err_string(res.unwrap_err()).contains("already settled"));
    assert_eq!(suite.balance(user.as_str(), EOS), Uint128::new(99));
}

#[test]
fn test_orig_trx_block_num_cannot_regress() {
    let mut suite = Suite::new();
    let user = suite.user.clone();

    suite
        .cash(1, &PeerTransfer::pegged("eos-1", user.as_str(), 100, 200))
        .unwrap();
    let res = suite.cash(2, &PeerTransfer::pegged("eos-2", user.as_str(), 100, 150));
    assert!(err_string(res.unwrap_err()).contains("lower than the latest settled block"));

    // Same block is fine
    suite
        .cash(2, &PeerTransfer::pegged("eos-2", user.as_str(), 100, 200))
        .unwrap();
}

// ============================================================================
// Authorization & Proofs
// ============================================================================

#[test]
fn test_sender_must_be_relay() {
    let mut suite = Suite::new();
    let user = suite.user.clone();

    let msg = suite.cash_msg(1, PEER, &PeerTransfer::pegged("eos-1", user.as_str(), 100, 10));
    let res = suite.app.execute_contract(
        Addr::unchecked("terra1mallory"),
        suite.bridge.clone(),
        &msg,
        &[],
    );
    assert!(err_string(res.unwrap_err()).contains("must sign its own submission"));
}

#[test]
fn test_claim_must_match_proven_transfer() {
    let mut suite = Suite::new();
    let user = suite.user.clone();
    let transfer = PeerTransfer::pegged("eos-1", user.as_str(), 100, 10);

    let mut msg = suite.cash_msg(1, PEER, &transfer);
    if let ExecuteMsg::Cash { quantity, .. } = &mut msg {
        quantity.amount = Uint128::new(1_000);
    }
    let res = suite.relay_exec(&msg);
    assert!(err_string(res.unwrap_err()).contains("quantity does not match"));

    let mut msg = suite.cash_msg(1, PEER, &transfer);
    if let ExecuteMsg::Cash { to, .. } = &mut msg {
        *to = "terra1mallory".to_string();
    }
    let res = suite.relay_exec(&msg);
    assert!(err_string(res.unwrap_err()).contains("memo receiver does not match"));

    let mut msg = suite.cash_msg(1, PEER, &transfer);
    if let ExecuteMsg::Cash { orig_trx_id, .. } = &mut msg {
        *orig_trx_id = Binary::from(peer_trx_id("other").to_vec());
    }
    let res = suite.relay_exec(&msg);
    assert!(err_string(res.unwrap_err()).contains("trx_id does not match"));

    let mut msg = suite.cash_msg(1, PEER, &transfer);
    if let ExecuteMsg::Cash {
        orig_trx_block_num, ..
    } = &mut msg
    {
        *orig_trx_block_num = 9;
    }
    let res = suite.relay_exec(&msg);
    assert!(err_string(res.unwrap_err()).contains("does not match claimed"));
}

#[test]
fn test_proof_against_unknown_anchor() {
    let mut suite = Suite::new();
    let user = suite.user.clone();

    let mut msg = suite.cash_msg(1, PEER, &PeerTransfer::pegged("eos-1", user.as_str(), 100, 10));
    if let ExecuteMsg::Cash {
        anchor_block_num, ..
    } = &mut msg
    {
        *anchor_block_num = 999;
    }
    let res = suite.relay_exec(&msg);
    assert!(err_string(res.unwrap_err()).contains("Anchor block 999 unavailable"));
}

#[test]
fn test_tampered_receipt_fails_merkle_check() {
    let mut suite = Suite::new();
    let user = suite.user.clone();
    let transfer = PeerTransfer::pegged("eos-1", user.as_str(), 100, 10);

    let mut msg = suite.cash_msg(1, PEER, &transfer);
    let mut forged = transfer.clone();
    forged.amount = 1_000_000;
    if let ExecuteMsg::Cash {
        proof, quantity, ..
    } = &mut msg
    {
        proof.receipt = cosmwasm_std::to_json_binary(&forged.receipt()).unwrap();
        quantity.amount = Uint128::new(1_000_000);
    }
    let res = suite.relay_exec(&msg);
    assert!(err_string(res.unwrap_err()).contains("Merkle verification failed: receipt"));
}

#[test]
fn test_notes_must_match_proven_memo() {
    let mut suite = Suite::new();
    let user = suite.user.clone();

    let mut transfer = PeerTransfer::pegged("eos-1", user.as_str(), 100, 10);
    transfer.notes = "hello".to_string();
    let mut msg = suite.cash_msg(1, PEER, &transfer);
    if let ExecuteMsg::Cash { memo, .. } = &mut msg {
        *memo = "goodbye".to_string();
    }
    let res = suite.relay_exec(&msg);
    assert!(err_string(res.unwrap_err()).contains("memo does not match"));

    suite.cash(1, &transfer).unwrap();
}

// ============================================================================
// Retention
// ============================================================================

fn cash_seqs(suite: &Suite) -> Vec<u64> {
    let res: CashTrxsResponse = suite
        .app
        .wrap()
        .query_wasm_smart(
            &suite.bridge,
            &QueryMsg::CashTrxs {
                peer_chain: PEER.to_string(),
                start_after: None,
                limit: Some(50),
            },
        )
        .unwrap();
    res.cash_trxs.iter().map(|c| c.seq_num).collect()
}

#[test]
fn test_retention_keeps_two_latest_block_groups() {
    let mut suite = Suite::with_cash_cache(3);
    let user = suite.user.clone();

    let blocks = [10u32, 11, 12, 12, 13, 13];
    for (i, block) in blocks.iter().enumerate() {
        let seq = i as u64 + 1;
        suite
            .cash(
                seq,
                &PeerTransfer::pegged(&format!("eos-{}", seq), user.as_str(), 10, *block),
            )
            .unwrap();
    }

    // Only the lowest seq_nums go, and blocks 12 and 13 stay whole even
    // though that leaves the log above its cap.
    assert_eq!(cash_seqs(&suite), vec![3, 4, 5, 6]);
    assert_eq!(suite.peer_state(PEER).cashtrxs_records, 4);

    suite
        .cash(7, &PeerTransfer::pegged("eos-7", user.as_str(), 10, 14))
        .unwrap();
    assert_eq!(cash_seqs(&suite), vec![5, 6, 7]);
}
