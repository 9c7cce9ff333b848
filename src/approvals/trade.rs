use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::approvals::models::CurrencyAmount;

const BIPS_BASE: u32 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

/// A priced swap between two currencies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_type: TradeType,
    pub input_amount: CurrencyAmount,
    pub output_amount: CurrencyAmount,
}

impl Trade {
    /// The most the trade may spend given a slippage tolerance in basis points.
    ///
    /// Exact-input trades spend exactly their input. Exact-output trades may spend up to the
    /// input plus the slippage, rounded down.
    pub fn maximum_amount_in(&self, allowed_slippage_bips: u32) -> CurrencyAmount {
        match self.trade_type {
            TradeType::ExactInput => self.input_amount.clone(),
            TradeType::ExactOutput => {
                let raw = &self.input_amount.raw * BigUint::from(BIPS_BASE + allowed_slippage_bips) /
                    BigUint::from(BIPS_BASE);
                CurrencyAmount { currency: self.input_amount.currency.clone(), raw }
            }
        }
    }
}
