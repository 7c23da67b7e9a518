//! Shared cw-multi-test harness: the bridge, a mock light client holding
//! anchor roots of the peer chain, and builders for peer-chain proofs.

#![allow(dead_code)]

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    coins, to_json_binary, Addr, Binary, Deps, DepsMut, Empty, Env, MessageInfo, Response,
    StdResult, Uint128,
};
use cw_multi_test::{App, AppResponse, ContractWrapper, Executor};
use cw_storage_plus::Map;

use ibc_token::fee_manager::{FeeRule, FeeSchedule};
use ibc_token::hash::{compute_block_id, sha256, Digest};
use ibc_token::merkle::MerkleTree;
use ibc_token::msg::{
    AcceptedTokensResponse, BalanceResponse, ExecuteMsg, InstantiateMsg, OrigTrxResponse,
    OrigTrxsResponse, QueryMsg,
};
use ibc_token::proof::{
    AnchorBlockResponse, BlockHeader, LightClientQueryMsg, ReceiptAction, ReceiptQuantity,
    ReceiptStatus, TrxProof, TrxReceipt,
};
use ibc_token::state::{AcceptedToken, PeerChainState, PeggedToken, Quantity};

pub const THIS_CHAIN: &str = "terra";
pub const PEER: &str = "eos";
pub const THIRD: &str = "bos";
/// Bridge contract account on the peer chains
pub const PEER_BRIDGE: &str = "ibc2token555";
/// Token contract of the peer chain's native token
pub const PEER_TOKEN: &str = "eosio.token";
pub const DENOM: &str = "uluna";
pub const LUNA: &str = "LUNA";
pub const EOS: &str = "EOS";
pub const HUB: &str = "terra1hub";

pub const SUCCESS_FEE: u128 = 1;
pub const FAILED_FEE: u128 = 2;

// ============================================================================
// Mock Light Client
// ============================================================================

const ANCHORS: Map<u32, Binary> = Map::new("anchors");

#[cw_serde]
pub enum LightClientExecuteMsg {
    SetAnchor { block_num: u32, root: Binary },
}

fn light_client_instantiate(
    _deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    _msg: Empty,
) -> StdResult<Response> {
    Ok(Response::new())
}

fn light_client_execute(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: LightClientExecuteMsg,
) -> StdResult<Response> {
    match msg {
        LightClientExecuteMsg::SetAnchor { block_num, root } => {
            ANCHORS.save(deps.storage, block_num, &root)?;
            Ok(Response::new())
        }
    }
}

fn light_client_query(deps: Deps, _env: Env, msg: LightClientQueryMsg) -> StdResult<Binary> {
    match msg {
        LightClientQueryMsg::AnchorBlock { block_num } => {
            let root = ANCHORS.load(deps.storage, block_num)?;
            to_json_binary(&AnchorBlockResponse {
                block_num,
                block_id_merkle_root: root,
            })
        }
    }
}

// ============================================================================
// Contracts
// ============================================================================

pub fn contract_ibc_token() -> Box<dyn cw_multi_test::Contract<Empty>> {
    let contract = ContractWrapper::new(
        ibc_token::contract::execute,
        ibc_token::contract::instantiate,
        ibc_token::contract::query,
    );
    Box::new(contract)
}

pub fn contract_light_client() -> Box<dyn cw_multi_test::Contract<Empty>> {
    let contract = ContractWrapper::new(
        light_client_execute,
        light_client_instantiate,
        light_client_query,
    );
    Box::new(contract)
}

pub fn contract_cw20() -> Box<dyn cw_multi_test::Contract<Empty>> {
    let contract = ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    );
    Box::new(contract)
}

// ============================================================================
// Proof Builders
// ============================================================================

fn to_binaries(path: Vec<Digest>) -> Vec<Binary> {
    path.into_iter().map(|d| Binary::from(d.to_vec())).collect()
}

/// Place `receipt` in a block at `block_num` and that block under an anchor
/// root. Returns the proof and the anchor root.
pub fn build_proof(receipt: &TrxReceipt, block_num: u32) -> (TrxProof, Digest) {
    let receipt_bytes = to_json_binary(receipt).unwrap();
    let trx_tree = MerkleTree::from_leaves(vec![
        sha256(b"unrelated trx"),
        sha256(receipt_bytes.as_slice()),
    ]);
    let header = to_json_binary(&BlockHeader {
        block_num,
        timestamp: u64::from(block_num) * 500,
        producer: "producer1".to_string(),
        previous: Binary::from(vec![0u8; 32]),
        transaction_mroot: Binary::from(trx_tree.root().unwrap().to_vec()),
    })
    .unwrap();

    let id_tree = MerkleTree::from_leaves(vec![
        sha256(b"older block"),
        sha256(b"old block"),
        compute_block_id(header.as_slice(), block_num),
    ]);

    (
        TrxProof {
            receipt: receipt_bytes,
            receipt_path: to_binaries(trx_tree.path(1).unwrap()),
            block_header: header,
            block_id_path: to_binaries(id_tree.path(2).unwrap()),
        },
        id_tree.root().unwrap(),
    )
}

pub fn peer_trx_id(seed: &str) -> Digest {
    sha256(seed.as_bytes())
}

/// Transfer made on a peer chain into its bridge contract
#[derive(Clone, Debug)]
pub struct PeerTransfer {
    pub trx_id: Digest,
    /// Token contract that executed the transfer
    pub contract: String,
    pub from: String,
    /// Receiver on this chain
    pub to: String,
    pub symbol: String,
    pub amount: u128,
    pub notes: String,
    pub block_num: u32,
}

impl PeerTransfer {
    /// Peer native token locked on the peer chain, issued here as a peg
    pub fn pegged(seed: &str, to: &str, amount: u128, block_num: u32) -> Self {
        Self {
            trx_id: peer_trx_id(seed),
            contract: PEER_TOKEN.to_string(),
            from: "alice".to_string(),
            to: to.to_string(),
            symbol: EOS.to_string(),
            amount,
            notes: String::new(),
            block_num,
        }
    }

    /// Peg of our token burned on the peer chain, released here
    pub fn returning(seed: &str, to: &str, amount: u128, block_num: u32) -> Self {
        Self {
            trx_id: peer_trx_id(seed),
            contract: PEER_BRIDGE.to_string(),
            from: "alice".to_string(),
            to: to.to_string(),
            symbol: LUNA.to_string(),
            amount,
            notes: String::new(),
            block_num,
        }
    }

    pub fn memo(&self) -> String {
        if self.notes.is_empty() {
            format!("{}@{}", self.to, THIS_CHAIN)
        } else {
            format!("{}@{} {}", self.to, THIS_CHAIN, self.notes)
        }
    }

    pub fn receipt(&self) -> TrxReceipt {
        TrxReceipt {
            trx_id: Binary::from(self.trx_id.to_vec()),
            status: ReceiptStatus::Executed,
            contract: self.contract.clone(),
            action: ReceiptAction::Transfer {
                from: self.from.clone(),
                to: PEER_BRIDGE.to_string(),
                quantity: ReceiptQuantity {
                    symbol: self.symbol.clone(),
                    amount: Uint128::new(self.amount),
                },
                memo: self.memo(),
            },
        }
    }
}

// ============================================================================
// Suite
// ============================================================================

pub fn default_fees() -> FeeSchedule {
    FeeSchedule {
        success: FeeRule::fixed(SUCCESS_FEE),
        failed: FeeRule::fixed(FAILED_FEE),
    }
}

pub struct Suite {
    pub app: App,
    pub admin: Addr,
    pub relay: Addr,
    pub user: Addr,
    pub bridge: Addr,
    pub light_client: Addr,
}

impl Suite {
    /// Bridge on `terra` with peer `eos`, accepted LUNA and pegged EOS
    pub fn new() -> Self {
        Self::with_cash_cache(100)
    }

    pub fn with_cash_cache(cache_cashtrxs_table_records: u32) -> Self {
        let mut app = App::default();

        let admin = Addr::unchecked("terra1admin");
        let relay = Addr::unchecked("terra1relay");
        let user = Addr::unchecked("terra1user");

        app.init_modules(|router, _, storage| {
            router
                .bank
                .init_balance(storage, &user, coins(10_000_000_000, DENOM))
                .unwrap();
        });

        let bridge_code = app.store_code(contract_ibc_token());
        let light_client_code = app.store_code(contract_light_client());

        let light_client = app
            .instantiate_contract(
                light_client_code,
                admin.clone(),
                &Empty {},
                &[],
                "light-client",
                None,
            )
            .unwrap();

        let bridge = app
            .instantiate_contract(
                bridge_code,
                admin.clone(),
                &InstantiateMsg {
                    admin: admin.to_string(),
                    this_chain: THIS_CHAIN.to_string(),
                    hub_account: Some(HUB.to_string()),
                },
                &[],
                "ibc-token",
                Some(admin.to_string()),
            )
            .unwrap();

        let mut suite = Self {
            app,
            admin,
            relay,
            user,
            bridge,
            light_client,
        };
        suite.reg_peer_chain(PEER, cache_cashtrxs_table_records);

        suite
            .admin_exec(&ExecuteMsg::RegAcceptToken {
                symbol: LUNA.to_string(),
                asset: common::AssetInfo::Native {
                    denom: DENOM.to_string(),
                },
                max_accept: Uint128::new(100_000_000),
                min_once_transfer: Uint128::new(1),
                max_once_transfer: Uint128::new(1_000_000),
                max_daily_transfer: Uint128::new(10_000_000),
                max_tfs_per_minute: 0,
                fees: Some(default_fees()),
                active: true,
            })
            .unwrap();

        suite
            .admin_exec(&ExecuteMsg::RegPegToken {
                symbol: EOS.to_string(),
                peer_chain: PEER.to_string(),
                peer_contract: PEER_TOKEN.to_string(),
                max_supply: Uint128::new(100_000_000),
                min_once_withdraw: Uint128::new(1),
                max_once_withdraw: Uint128::new(1_000_000),
                max_daily_withdraw: Uint128::new(10_000_000),
                max_wds_per_minute: 0,
                fees: Some(default_fees()),
                active: true,
            })
            .unwrap();

        suite
    }

    pub fn reg_peer_chain(&mut self, name: &str, cache_cashtrxs_table_records: u32) {
        let light_client = self.light_client.to_string();
        self.admin_exec(&ExecuteMsg::RegPeerChain {
            name: name.to_string(),
            info: format!("{} mainnet", name),
            peer_token_contract: PEER_BRIDGE.to_string(),
            light_client,
            free_account: None,
            max_original_trxs_per_block: 0,
            max_origtrxs_table_records: 0,
            cache_cashtrxs_table_records,
            active: true,
        })
        .unwrap();
    }

    /// Move the chain forward by `seconds` and one block
    pub fn advance(&mut self, seconds: u64) {
        self.app.update_block(|block| {
            block.time = block.time.plus_seconds(seconds);
            block.height += 1;
        });
    }

    pub fn admin_exec(&mut self, msg: &ExecuteMsg) -> anyhow::Result<AppResponse> {
        self.app
            .execute_contract(self.admin.clone(), self.bridge.clone(), msg, &[])
    }

    pub fn relay_exec(&mut self, msg: &ExecuteMsg) -> anyhow::Result<AppResponse> {
        self.app
            .execute_contract(self.relay.clone(), self.bridge.clone(), msg, &[])
    }

    // ------------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------------

    /// Lock native LUNA for `receiver@eos`
    pub fn lock_luna(&mut self, amount: u128, receiver: &str) -> anyhow::Result<AppResponse> {
        self.lock_luna_to(amount, receiver, PEER)
    }

    pub fn lock_luna_to(
        &mut self,
        amount: u128,
        receiver: &str,
        peer_chain: &str,
    ) -> anyhow::Result<AppResponse> {
        self.app.execute_contract(
            self.user.clone(),
            self.bridge.clone(),
            &ExecuteMsg::TransferNative {
                memo: format!("{}@{}", receiver, peer_chain),
            },
            &coins(amount, DENOM),
        )
    }

    /// Withdraw pegged EOS back to `receiver@eos`
    pub fn withdraw_eos(
        &mut self,
        owner: &Addr,
        amount: u128,
        receiver: &str,
    ) -> anyhow::Result<AppResponse> {
        self.app.execute_contract(
            owner.clone(),
            self.bridge.clone(),
            &ExecuteMsg::Transfer {
                to: self.bridge.to_string(),
                symbol: EOS.to_string(),
                amount: Uint128::new(amount),
                memo: format!("{}@{}", receiver, PEER),
            },
            &[],
        )
    }

    // ------------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------------

    /// Publish the anchor root for `block_num` on the light client
    pub fn set_anchor(&mut self, block_num: u32, root: Digest) {
        self.app
            .execute_contract(
                self.admin.clone(),
                self.light_client.clone(),
                &LightClientExecuteMsg::SetAnchor {
                    block_num,
                    root: Binary::from(root.to_vec()),
                },
                &[],
            )
            .unwrap();
    }

    pub fn cash_msg(&mut self, seq_num: u64, from_chain: &str, transfer: &PeerTransfer) -> ExecuteMsg {
        let (proof, root) = build_proof(&transfer.receipt(), transfer.block_num);
        self.set_anchor(transfer.block_num, root);
        ExecuteMsg::Cash {
            seq_num,
            from_chain: from_chain.to_string(),
            orig_trx_id: Binary::from(transfer.trx_id.to_vec()),
            proof,
            orig_trx_block_num: u64::from(transfer.block_num),
            anchor_block_num: transfer.block_num,
            to: transfer.to.clone(),
            quantity: Quantity::new(transfer.symbol.clone(), Uint128::new(transfer.amount)),
            memo: transfer.notes.clone(),
            relay: self.relay.to_string(),
        }
    }

    pub fn cash(&mut self, seq_num: u64, transfer: &PeerTransfer) -> anyhow::Result<AppResponse> {
        self.cash_from(seq_num, PEER, transfer)
    }

    pub fn cash_from(
        &mut self,
        seq_num: u64,
        from_chain: &str,
        transfer: &PeerTransfer,
    ) -> anyhow::Result<AppResponse> {
        let msg = self.cash_msg(seq_num, from_chain, transfer);
        self.relay_exec(&msg)
    }

    /// Prove that `peer_chain` cashed `entry` with settlement `cash_seq_num`
    pub fn confirm(
        &mut self,
        peer_chain: &str,
        entry: &OrigTrxResponse,
        cash_seq_num: u64,
        block_num: u32,
    ) -> anyhow::Result<AppResponse> {
        let cash_trx_id = sha256(format!("{}-cash-{}", peer_chain, cash_seq_num).as_bytes());
        let receipt = TrxReceipt {
            trx_id: Binary::from(cash_trx_id.to_vec()),
            status: ReceiptStatus::Executed,
            contract: PEER_BRIDGE.to_string(),
            action: ReceiptAction::Cash {
                seq_num: cash_seq_num,
                from_chain: THIS_CHAIN.to_string(),
                orig_trx_id: entry.trx_id.clone(),
                to: entry.action.peer_receiver.clone(),
                quantity: ReceiptQuantity {
                    symbol: entry.action.quantity.symbol.clone(),
                    amount: entry.action.quantity.amount,
                },
            },
        };
        let (proof, root) = build_proof(&receipt, block_num);
        self.set_anchor(block_num, root);

        self.relay_exec(&ExecuteMsg::CashConfirm {
            from_chain: peer_chain.to_string(),
            cash_trx_id: Binary::from(cash_trx_id.to_vec()),
            proof,
            cash_trx_block_num: u64::from(block_num),
            anchor_block_num: block_num,
            orig_trx_id: entry.trx_id.clone(),
        })
    }

    pub fn rollback(&mut self, peer_chain: &str, trx_id: &Binary) -> anyhow::Result<AppResponse> {
        let relay = self.relay.to_string();
        self.relay_exec(&ExecuteMsg::Rollback {
            peer_chain: peer_chain.to_string(),
            trx_id: trx_id.clone(),
            relay,
        })
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn orig_trxs(&self, peer_chain: &str) -> Vec<OrigTrxResponse> {
        let res: OrigTrxsResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.bridge,
                &QueryMsg::OrigTrxs {
                    peer_chain: peer_chain.to_string(),
                    start_after: None,
                    limit: Some(50),
                },
            )
            .unwrap();
        res.orig_trxs
    }

    pub fn peer_state(&self, peer_chain: &str) -> PeerChainState {
        self.app
            .wrap()
            .query_wasm_smart(
                &self.bridge,
                &QueryMsg::PeerChainState {
                    name: peer_chain.to_string(),
                },
            )
            .unwrap()
    }

    pub fn accepted(&self, symbol: &str) -> AcceptedToken {
        self.app
            .wrap()
            .query_wasm_smart(
                &self.bridge,
                &QueryMsg::AcceptedToken {
                    symbol: symbol.to_string(),
                },
            )
            .unwrap()
    }

    pub fn accepted_tokens(&self) -> Vec<AcceptedToken> {
        let res: AcceptedTokensResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.bridge,
                &QueryMsg::AcceptedTokens {
                    start_after: None,
                    limit: None,
                },
            )
            .unwrap();
        res.tokens
    }

    pub fn pegged(&self, symbol: &str) -> PeggedToken {
        self.app
            .wrap()
            .query_wasm_smart(
                &self.bridge,
                &QueryMsg::PeggedToken {
                    symbol: symbol.to_string(),
                },
            )
            .unwrap()
    }

    pub fn balance(&self, owner: &str, symbol: &str) -> Uint128 {
        let res: BalanceResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                &self.bridge,
                &QueryMsg::Balance {
                    owner: owner.to_string(),
                    symbol: symbol.to_string(),
                },
            )
            .unwrap();
        res.balance
    }

    pub fn bank_balance(&self, addr: &Addr) -> Uint128 {
        self.app.wrap().query_balance(addr, DENOM).unwrap().amount
    }
}

/// Root cause of a failed execution, as text
pub fn err_string(err: anyhow::Error) -> String {
    err.root_cause().to_string()
}

/// Value of the first event attribute named `key`
pub fn attr(res: &AppResponse, key: &str) -> Option<String> {
    res.events
        .iter()
        .flat_map(|e| e.attributes.iter())
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
}
