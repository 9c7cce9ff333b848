use std::sync::Arc;

use alloy_primitives::{Address, U256};
use num_bigint::BigUint;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::{
    approvals::{
        connector::WalletConnector,
        contract::{AllowanceSource, TokenContract, TokenContracts},
        models::{ApprovalState, CurrencyAmount, Token},
        trade::Trade,
        transactions::{ApprovalDetails, TransactionInfo, TransactionTracker},
    },
    errors::InterfaceError,
    utils::{biguint_to_u256, calculate_gas_margin, u256_to_biguint},
};

/// Derives the approval state of `amount` for `spender`.
///
/// `current_allowance` is `None` while the allowance is not known. `pending_approval` tells
/// whether an approval of this token for this spender is already in flight.
pub fn approval_state(
    amount: Option<&CurrencyAmount>,
    spender: Option<Address>,
    current_allowance: Option<&BigUint>,
    pending_approval: bool,
) -> ApprovalState {
    let (Some(amount), Some(_)) = (amount, spender) else {
        return ApprovalState::Unknown;
    };
    if amount.currency.is_native() {
        return ApprovalState::Approved;
    }
    let Some(current_allowance) = current_allowance else {
        return ApprovalState::Unknown;
    };

    if current_allowance < &amount.raw {
        if pending_approval {
            ApprovalState::Pending
        } else {
            ApprovalState::NotApproved
        }
    } else {
        ApprovalState::Approved
    }
}

/// JSON ABI fragment of `approve(address,uint256)`, as the QR wallet expects it.
pub fn approve_abi() -> String {
    json!({
        "constant": false,
        "inputs": [
            {"name": "spender", "type": "address"},
            {"name": "amount", "type": "uint256"}
        ],
        "name": "approve",
        "outputs": [{"name": "", "type": "bool"}],
        "payable": false,
        "stateMutability": "nonpayable",
        "type": "function"
    })
    .to_string()
}

/// Builds approve callbacks for the connected account.
pub struct ApprovalController {
    account: Option<Address>,
    connector: Arc<WalletConnector>,
    contracts: Arc<dyn TokenContracts>,
    allowances: Arc<dyn AllowanceSource>,
    tracker: Arc<dyn TransactionTracker>,
}

impl ApprovalController {
    pub fn new(
        account: Option<Address>,
        connector: Arc<WalletConnector>,
        contracts: Arc<dyn TokenContracts>,
        allowances: Arc<dyn AllowanceSource>,
        tracker: Arc<dyn TransactionTracker>,
    ) -> Self {
        Self { account, connector, contracts, allowances, tracker }
    }

    /// Reads the allowance and pending state for `amount` and `spender` and returns the derived
    /// state together with the action approving it.
    pub async fn approve_callback(
        &self,
        amount: Option<CurrencyAmount>,
        spender: Option<Address>,
    ) -> ApproveCallback {
        let token = amount
            .as_ref()
            .and_then(|amount| amount.token().cloned());
        let current_allowance = self
            .current_allowance(token.as_ref(), spender)
            .await;
        let pending_approval = match (&token, spender) {
            (Some(token), Some(spender)) => self
                .tracker
                .has_pending_approval(token.address, spender),
            _ => false,
        };
        let state =
            approval_state(amount.as_ref(), spender, current_allowance.as_ref(), pending_approval);
        let token_contract = token
            .as_ref()
            .and_then(|token| self.contracts.token_contract(token.address));

        ApproveCallback {
            state,
            token,
            token_contract,
            amount,
            spender,
            connector: Arc::clone(&self.connector),
            tracker: Arc::clone(&self.tracker),
        }
    }

    /// Approve callback for the input of `trade`, with `router` as spender.
    pub async fn approve_callback_from_trade(
        &self,
        trade: Option<&Trade>,
        allowed_slippage_bips: u32,
        router: Address,
    ) -> ApproveCallback {
        let amount = trade.map(|trade| trade.maximum_amount_in(allowed_slippage_bips));
        self.approve_callback(amount, Some(router))
            .await
    }

    async fn current_allowance(
        &self,
        token: Option<&Token>,
        spender: Option<Address>,
    ) -> Option<BigUint> {
        let (Some(token), Some(owner), Some(spender)) = (token, self.account, spender) else {
            return None;
        };
        match self
            .allowances
            .allowance(token.address, owner, spender)
            .await
        {
            Ok(allowance) => Some(u256_to_biguint(allowance)),
            Err(err) => {
                warn!(%err, token = %token.address, %spender, "Failed to read allowance");
                None
            }
        }
    }
}

/// The approval state of an amount and the action approving it.
pub struct ApproveCallback {
    state: ApprovalState,
    token: Option<Token>,
    token_contract: Option<Arc<dyn TokenContract>>,
    amount: Option<CurrencyAmount>,
    spender: Option<Address>,
    connector: Arc<WalletConnector>,
    tracker: Arc<dyn TransactionTracker>,
}

impl ApproveCallback {
    pub fn state(&self) -> ApprovalState {
        self.state
    }

    /// Approves the spender if the amount is not approved yet.
    ///
    /// Calling it in any other state, or without the data it needs, logs and returns `Ok(())`
    /// without touching the chain. Submission failures are logged and returned.
    pub async fn approve(&self) -> Result<(), InterfaceError> {
        if self.state != ApprovalState::NotApproved {
            error!(state = ?self.state, "approve was called unnecessarily");
            return Ok(());
        }
        let Some(token) = &self.token else {
            error!("no token");
            return Ok(());
        };
        let Some(token_contract) = &self.token_contract else {
            error!("token contract is not available");
            return Ok(());
        };
        let Some(amount) = &self.amount else {
            error!("missing amount to approve");
            return Ok(());
        };
        let Some(spender) = self.spender else {
            error!("no spender");
            return Ok(());
        };

        match self.connector.as_ref() {
            WalletConnector::Klip(session) => {
                let params = serde_json::to_string(&[spender.to_string(), U256::MAX.to_string()])?;
                session
                    .execute_contract(token_contract.address(), &approve_abi(), &params, "0")
                    .await?;
                Ok(())
            }
            WalletConnector::Injected | WalletConnector::WalletConnect => {
                self.approve_with_wallet(token, token_contract.as_ref(), amount, spender)
                    .await
            }
        }
    }

    async fn approve_with_wallet(
        &self,
        token: &Token,
        token_contract: &dyn TokenContract,
        amount: &CurrencyAmount,
        spender: Address,
    ) -> Result<(), InterfaceError> {
        let mut approve_amount = U256::MAX;
        let estimated_gas = match token_contract
            .estimate_approve(spender, U256::MAX)
            .await
        {
            Ok(gas) => gas,
            Err(err) => {
                // Some tokens refuse approvals above the exact amount.
                debug!(%err, "Estimating the max approval failed, falling back to the exact amount");
                approve_amount = biguint_to_u256(&amount.raw)?;
                token_contract
                    .estimate_approve(spender, approve_amount)
                    .await?
            }
        };

        match token_contract
            .approve(spender, approve_amount, calculate_gas_margin(estimated_gas))
            .await
        {
            Ok(response) => {
                self.tracker.add_transaction(
                    response,
                    TransactionInfo {
                        summary: Some(format!("Approve {}", amount.currency.symbol())),
                        approval: Some(ApprovalDetails { token_address: token.address, spender }),
                    },
                );
                Ok(())
            }
            Err(err) => {
                error!(%err, "Failed to approve token");
                Err(err)
            }
        }
    }
}
