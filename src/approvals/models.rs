use alloy_primitives::Address;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::serde_primitives::biguint_string;

/// An ERC-20 token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
}

/// The chain's native asset. It is never approved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub decimals: u8,
    pub symbol: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Native(NativeCurrency),
    Token(Token),
}

impl Currency {
    pub fn symbol(&self) -> &str {
        match self {
            Currency::Native(native) => &native.symbol,
            Currency::Token(token) => &token.symbol,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Currency::Native(_))
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Currency::Token(token) => Some(token),
            Currency::Native(_) => None,
        }
    }
}

/// An amount of a currency in its smallest unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: Currency,
    #[serde(with = "biguint_string")]
    pub raw: BigUint,
}

impl CurrencyAmount {
    pub fn new(currency: Currency, raw: impl Into<BigUint>) -> Self {
        Self { currency, raw: raw.into() }
    }

    pub fn token(&self) -> Option<&Token> {
        self.currency.token()
    }
}

/// Whether a spender may already move the requested amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Unknown,
    NotApproved,
    Pending,
    Approved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_amount_json() {
        let amount = CurrencyAmount::new(
            Currency::Token(Token {
                chain_id: 56,
                address: Address::repeat_byte(0x11),
                decimals: 18,
                symbol: "CAKE".to_string(),
            }),
            1_500_000_000_000_000_000u128,
        );
        let json = serde_json::to_value(&amount).unwrap();
        assert_eq!(json["raw"], "1500000000000000000");
        assert_eq!(json["currency"]["token"]["symbol"], "CAKE");
        assert_eq!(serde_json::from_value::<CurrencyAmount>(json).unwrap(), amount);
    }

    #[test]
    fn test_native_currency_has_no_token() {
        let native = Currency::Native(NativeCurrency { decimals: 18, symbol: "BNB".to_string() });
        assert!(native.is_native());
        assert_eq!(native.token(), None);
        assert_eq!(native.symbol(), "BNB");
    }
}
