//! Transfer memo format: `receiver@chain[ notes]`.

use crate::error::ContractError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferMemo {
    pub receiver: String,
    pub chain: String,
    pub notes: String,
}

pub fn parse_memo(memo: &str) -> Result<TransferMemo, ContractError> {
    let memo = memo.trim();
    let (head, notes) = match memo.split_once(' ') {
        Some((head, notes)) => (head, notes.trim()),
        None => (memo, ""),
    };

    let (receiver, chain) = head.split_once('@').ok_or_else(|| ContractError::InvalidMemo {
        reason: "expected receiver@chain".to_string(),
    })?;
    if receiver.is_empty() {
        return Err(ContractError::InvalidMemo {
            reason: "empty receiver".to_string(),
        });
    }
    if chain.is_empty() || chain.contains('@') {
        return Err(ContractError::InvalidMemo {
            reason: format!("bad chain name in {}", head),
        });
    }

    Ok(TransferMemo {
        receiver: receiver.to_string(),
        chain: chain.to_string(),
        notes: notes.to_string(),
    })
}
