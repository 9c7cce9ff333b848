use std::sync::Arc;

use alloy::{
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{TransactionInput, TransactionRequest},
    transports::BoxTransport,
};
use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use async_trait::async_trait;
use tracing::debug;

use crate::{
    approvals::{
        contract::{AllowanceSource, TokenContract, TokenContracts},
        transactions::SubmittedTransaction,
    },
    errors::InterfaceError,
};

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

/// ERC-20 access through a JSON-RPC node.
///
/// Transactions are sent with `eth_sendTransaction` from `account`, so the node (or the wallet
/// behind it) signs them.
#[derive(Clone)]
pub struct Erc20Client {
    client: Arc<RootProvider<BoxTransport>>,
    account: Option<Address>,
}

impl Erc20Client {
    pub async fn connect(rpc_url: &str, account: Option<Address>) -> Result<Self, InterfaceError> {
        let client = ProviderBuilder::new()
            .on_builtin(rpc_url)
            .await
            .map_err(|e| {
                InterfaceError::FatalError(format!("Failed to connect to {}: {}", rpc_url, e))
            })?;
        Ok(Self { client: Arc::new(client), account })
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }
}

fn call_request(from: Option<Address>, to: Address, data: Vec<u8>) -> TransactionRequest {
    TransactionRequest {
        from,
        to: Some(TxKind::from(to)),
        input: TransactionInput { input: Some(Bytes::from(data)), data: None },
        ..Default::default()
    }
}

#[async_trait]
impl AllowanceSource for Erc20Client {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, InterfaceError> {
        let data = IERC20::allowanceCall { owner, spender }.abi_encode();
        let tx = call_request(None, token, data);

        let response = self
            .client
            .call(&tx)
            .await
            .map_err(|err| {
                InterfaceError::RecoverableError(format!(
                    "Allowance call failed with error: {:?}",
                    err
                ))
            })?;
        U256::abi_decode(&response, true).map_err(|_| {
            InterfaceError::FatalError("Failed to decode response for allowance".to_string())
        })
    }
}

impl TokenContracts for Erc20Client {
    fn token_contract(&self, token: Address) -> Option<Arc<dyn TokenContract>> {
        let owner = self.account?;
        Some(Arc::new(Erc20Contract { address: token, owner, client: Arc::clone(&self.client) }))
    }
}

/// A token contract bound to the account approving it.
pub struct Erc20Contract {
    address: Address,
    owner: Address,
    client: Arc<RootProvider<BoxTransport>>,
}

impl Erc20Contract {
    fn approve_request(&self, spender: Address, amount: U256) -> TransactionRequest {
        let data = IERC20::approveCall { spender, amount }.abi_encode();
        call_request(Some(self.owner), self.address, data)
    }
}

#[async_trait]
impl TokenContract for Erc20Contract {
    fn address(&self) -> Address {
        self.address
    }

    async fn estimate_approve(&self, spender: Address, amount: U256) -> Result<u64, InterfaceError> {
        let tx = self.approve_request(spender, amount);
        self.client
            .estimate_gas(&tx)
            .await
            .map_err(|err| {
                InterfaceError::RecoverableError(format!("Gas estimation failed: {}", err))
            })
    }

    async fn approve(
        &self,
        spender: Address,
        amount: U256,
        gas_limit: u64,
    ) -> Result<SubmittedTransaction, InterfaceError> {
        let mut tx = self.approve_request(spender, amount);
        tx.gas = Some(gas_limit);

        let pending = self
            .client
            .send_transaction(tx)
            .await
            .map_err(|err| {
                InterfaceError::RecoverableError(format!("Approve transaction failed: {}", err))
            })?;
        let hash = *pending.tx_hash();
        debug!(%hash, token = %self.address, %spender, "Approve transaction sent");
        Ok(SubmittedTransaction { hash, from: Some(self.owner) })
    }
}

#[cfg(test)]
mod tests {
    use std::{env, str::FromStr};

    use super::*;

    #[test]
    fn test_approve_calldata() {
        let spender = Address::from_str("0x05fF2B0DB69458A0750badebc4f9e13aDd608C7F").unwrap();
        let data = IERC20::approveCall { spender, amount: U256::MAX }.abi_encode();

        assert_eq!(
            hex::encode(data),
            "095ea7b3\
             00000000000000000000000005ff2b0db69458a0750badebc4f9e13add608c7f\
             ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
        );
    }

    #[test]
    fn test_allowance_calldata_selector() {
        let data = IERC20::allowanceCall { owner: Address::ZERO, spender: Address::ZERO }.abi_encode();
        assert_eq!(&data[..4], &[0xdd, 0x62, 0xed, 0x3e]);
        assert_eq!(data.len(), 4 + 64);
    }

    /// Reads a real allowance. Needs a node, run with RPC_URL set and the `fork-tests` feature.
    #[tokio::test]
    #[cfg_attr(not(feature = "fork-tests"), ignore)]
    async fn test_allowance_from_node() {
        let rpc_url = env::var("RPC_URL").expect("Missing RPC_URL in environment");
        let client = Erc20Client::connect(&rpc_url, None)
            .await
            .unwrap();
        let token = Address::from_str("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();

        let allowance = client
            .allowance(token, Address::repeat_byte(0x01), Address::repeat_byte(0x02))
            .await
            .unwrap();

        assert_eq!(allowance, U256::ZERO);
    }

    #[tokio::test]
    async fn test_no_contract_without_account() {
        let client = Erc20Client::connect("http://127.0.0.1:8545", None)
            .await
            .unwrap();
        assert!(client
            .token_contract(Address::repeat_byte(0x01))
            .is_none());
    }
}
