use std::str::FromStr;

use num_bigint::BigUint;
use serde::{self, Deserialize, Deserializer, Serializer};

/// Amounts travel as decimal strings, token amounts routinely exceed what JSON numbers hold.
pub mod biguint_string {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BigUint::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Wrapper {
        #[serde(with = "super::biguint_string")]
        amount: BigUint,
    }

    #[test]
    fn test_amount_as_decimal_string() {
        let wrapper = Wrapper { amount: BigUint::from(10u64).pow(30) };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert_eq!(json, r#"{"amount":"1000000000000000000000000000000"}"#);
    }

    #[test]
    fn test_rejects_non_numeric_amount() {
        let result = serde_json::from_str::<Wrapper>(r#"{"amount":"0x10"}"#);
        assert!(result.is_err());
    }
}
