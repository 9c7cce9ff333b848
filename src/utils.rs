use alloy_primitives::U256;
use num_bigint::BigUint;

use crate::errors::InterfaceError;

/// Basis points added on top of a gas estimate before it is used as a gas limit.
pub const GAS_MARGIN_BIPS: u64 = 1_000;
const BIPS_BASE: u64 = 10_000;

/// Converts a `BigUint` into a `U256`.
///
/// Returns an `InterfaceError` if the value does not fit in 256 bits.
pub fn biguint_to_u256(value: &BigUint) -> Result<U256, InterfaceError> {
    let bytes = value.to_bytes_be();
    U256::try_from_be_slice(&bytes)
        .ok_or_else(|| InterfaceError::InvalidInput(format!("Amount {} exceeds uint256", value)))
}

pub fn u256_to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Adds a 10% safety margin to a gas estimate.
pub fn calculate_gas_margin(estimate: u64) -> u64 {
    let limit = (estimate as u128) * ((BIPS_BASE + GAS_MARGIN_BIPS) as u128) / (BIPS_BASE as u128);
    u64::try_from(limit).unwrap_or(u64::MAX)
}
