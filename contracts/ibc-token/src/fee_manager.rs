//! Fee Manager Module
//!
//! Fees compensate the relay that submits proofs. Every token carries two
//! rules: one charged when a settlement succeeds (`Cash`) and one charged
//! when a pending transfer has to be reversed (`Rollback`).
//!
//! ## Fee Modes
//!
//! | Mode   | Fee                              |
//! |--------|----------------------------------|
//! | Fixed  | `fixed`                          |
//! | Ratio  | `gross * ratio_bps / 10000`      |
//!
//! The fee never exceeds the gross amount, so the net amount is never negative.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult, Uint128};

// ============================================================================
// Constants
// ============================================================================

/// Basis points denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10000;

/// Maximum ratio in basis points (100%)
pub const MAX_RATIO_BPS: u64 = 10000;

// ============================================================================
// Data Structures
// ============================================================================

#[cw_serde]
pub enum FeeMode {
    Fixed,
    Ratio,
}

impl FeeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeMode::Fixed => "fixed",
            FeeMode::Ratio => "ratio",
        }
    }
}

/// Which schedule a fee is taken from
#[cw_serde]
#[derive(Copy)]
pub enum FeeKind {
    Success,
    Failed,
}

impl FeeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeKind::Success => "success",
            FeeKind::Failed => "failed",
        }
    }
}

/// A single fee rule
#[cw_serde]
pub struct FeeRule {
    pub mode: FeeMode,
    /// Charged in `Fixed` mode (token smallest unit)
    pub fixed: Uint128,
    /// Charged in `Ratio` mode (basis points)
    pub ratio_bps: u64,
}

impl FeeRule {
    pub fn fixed(amount: impl Into<Uint128>) -> Self {
        Self {
            mode: FeeMode::Fixed,
            fixed: amount.into(),
            ratio_bps: 0,
        }
    }

    pub fn ratio(ratio_bps: u64) -> Self {
        Self {
            mode: FeeMode::Ratio,
            fixed: Uint128::zero(),
            ratio_bps,
        }
    }

    pub fn free() -> Self {
        Self::fixed(0u128)
    }

    pub fn validate(&self) -> StdResult<()> {
        if self.ratio_bps > MAX_RATIO_BPS {
            return Err(StdError::generic_err(format!(
                "Fee ratio {} bps exceeds max {}",
                self.ratio_bps, MAX_RATIO_BPS
            )));
        }
        Ok(())
    }
}

/// Success and failure fee rules of one token
#[cw_serde]
pub struct FeeSchedule {
    pub success: FeeRule,
    pub failed: FeeRule,
}

impl FeeSchedule {
    pub fn free() -> Self {
        Self {
            success: FeeRule::free(),
            failed: FeeRule::free(),
        }
    }

    pub fn rule(&self, kind: FeeKind) -> &FeeRule {
        match kind {
            FeeKind::Success => &self.success,
            FeeKind::Failed => &self.failed,
        }
    }

    pub fn set_rule(&mut self, kind: FeeKind, rule: FeeRule) {
        match kind {
            FeeKind::Success => self.success = rule,
            FeeKind::Failed => self.failed = rule,
        }
    }

    pub fn validate(&self) -> StdResult<()> {
        self.success.validate()?;
        self.failed.validate()
    }
}

// ============================================================================
// Fee Calculation Functions
// ============================================================================

/// Calculate fee amount from amount and bps
pub fn calculate_fee_from_bps(amount: Uint128, fee_bps: u64) -> Uint128 {
    amount.multiply_ratio(fee_bps as u128, BPS_DENOMINATOR)
}

/// Split `gross` into `(net, fee)` under `rule`.
pub fn calculate_fee(rule: &FeeRule, gross: Uint128) -> (Uint128, Uint128) {
    let fee = match rule.mode {
        FeeMode::Fixed => rule.fixed,
        FeeMode::Ratio => calculate_fee_from_bps(gross, rule.ratio_bps),
    };
    let fee = fee.min(gross);
    (gross - fee, fee)
}
