use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::{approvals::transactions::SubmittedTransaction, errors::InterfaceError};

/// The calls the approval flow makes on an ERC-20 token contract.
#[async_trait]
pub trait TokenContract: Send + Sync {
    fn address(&self) -> Address;

    async fn estimate_approve(&self, spender: Address, amount: U256) -> Result<u64, InterfaceError>;

    async fn approve(
        &self,
        spender: Address,
        amount: U256,
        gas_limit: u64,
    ) -> Result<SubmittedTransaction, InterfaceError>;
}

/// Hands out token contract handles. `None` when no handle can be built, for example without a
/// connected account.
pub trait TokenContracts: Send + Sync {
    fn token_contract(&self, token: Address) -> Option<Arc<dyn TokenContract>>;
}

/// Reads ERC-20 allowances.
#[async_trait]
pub trait AllowanceSource: Send + Sync {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, InterfaceError>;
}
