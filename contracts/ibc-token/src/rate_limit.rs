//! Per-token sliding quota windows.
//!
//! Each token tracks one direction: accepted tokens gate outbound transfers,
//! pegged tokens gate withdrawals. A window is reset the first time it is
//! touched after expiry, and its start snaps to the boundary containing now.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

use crate::error::ContractError;

pub const MINUTE_SECONDS: u64 = 60;

pub const DAY_SECONDS: u64 = 86_400;

/// Used when a token is registered with a per-minute cap of zero
pub const DEFAULT_MAX_TRXS_PER_MINUTE: u32 = 100;

/// Window tracking for a token
#[cw_serde]
#[derive(Default)]
pub struct RateWindow {
    pub minute_window_start: u64,
    pub minute_count: u32,
    pub daily_window_start: u64,
    pub daily_sum: Uint128,
}

/// Limits evaluated against a proposed amount
#[derive(Clone, Debug, PartialEq)]
pub struct QuotaLimits {
    pub min_once: Uint128,
    pub max_once: Uint128,
    pub max_daily: Uint128,
    /// 0 means `DEFAULT_MAX_TRXS_PER_MINUTE`
    pub max_per_minute: u32,
    /// Outstanding amount before this operation and its cap; `None` = uncapped
    pub outstanding: Option<(Uint128, Uint128)>,
}

impl QuotaLimits {
    pub fn effective_per_minute(&self) -> u32 {
        if self.max_per_minute == 0 {
            DEFAULT_MAX_TRXS_PER_MINUTE
        } else {
            self.max_per_minute
        }
    }
}

impl RateWindow {
    /// Reset expired windows as of `now` (seconds). Never moves a start backwards.
    pub fn roll(&mut self, now: u64) {
        if now >= self.minute_window_start + MINUTE_SECONDS {
            self.minute_window_start = now - now % MINUTE_SECONDS;
            self.minute_count = 0;
        }
        if now >= self.daily_window_start + DAY_SECONDS {
            self.daily_window_start = now - now % DAY_SECONDS;
            self.daily_sum = Uint128::zero();
        }
    }
}

/// Check `amount` against `limits` and return the window to persist.
///
/// The caller saves the returned window together with the rest of the
/// operation; on any error nothing is written.
pub fn check_and_update(
    window: &RateWindow,
    limits: &QuotaLimits,
    amount: Uint128,
    now: u64,
) -> Result<RateWindow, ContractError> {
    if amount < limits.min_once {
        return Err(ContractError::BelowMinimumAmount {
            min: limits.min_once,
        });
    }
    if amount > limits.max_once {
        return Err(ContractError::AboveMaximumAmount {
            max: limits.max_once,
        });
    }

    let mut next = window.clone();
    next.roll(now);

    let per_minute = limits.effective_per_minute();
    if next.minute_count + 1 > per_minute {
        return Err(ContractError::QuotaExceeded {
            limit_type: "per_minute".to_string(),
            limit: Uint128::from(per_minute),
            requested: Uint128::one(),
        });
    }

    let daily = next.daily_sum.checked_add(amount)?;
    if daily > limits.max_daily {
        return Err(ContractError::QuotaExceeded {
            limit_type: "daily".to_string(),
            limit: limits.max_daily,
            requested: amount,
        });
    }

    if let Some((outstanding, cap)) = limits.outstanding {
        if outstanding.checked_add(amount)? > cap {
            return Err(ContractError::QuotaExceeded {
                limit_type: "outstanding".to_string(),
                limit: cap,
                requested: amount,
            });
        }
    }

    next.minute_count += 1;
    next.daily_sum = daily;
    Ok(next)
}
