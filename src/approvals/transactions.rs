use std::collections::HashMap;

use alloy_primitives::{Address, TxHash};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Transactions older than this no longer count as pending approvals.
const RECENT_WINDOW_HOURS: i64 = 24;

/// A transaction accepted by the wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    pub hash: TxHash,
    pub from: Option<Address>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalDetails {
    pub token_address: Address,
    pub spender: Address,
}

/// What the tracker records alongside a submitted transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub summary: Option<String>,
    pub approval: Option<ApprovalDetails>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub hash: TxHash,
    pub from: Option<Address>,
    pub summary: Option<String>,
    pub approval: Option<ApprovalDetails>,
    pub added_time: DateTime<Utc>,
    pub confirmed_time: Option<DateTime<Utc>>,
}

impl TransactionDetails {
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        now - self.added_time < Duration::hours(RECENT_WINDOW_HOURS)
    }
}

/// Shared record of the transactions the interface submitted.
pub trait TransactionTracker: Send + Sync {
    fn add_transaction(&self, response: SubmittedTransaction, info: TransactionInfo);

    /// Whether an approval of `token` for `spender` was submitted recently and is not yet
    /// confirmed.
    fn has_pending_approval(&self, token: Address, spender: Address) -> bool;
}

/// In-memory transaction tracker.
#[derive(Default)]
pub struct TransactionStore {
    transactions: RwLock<HashMap<TxHash, TransactionDetails>>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, details: TransactionDetails) {
        self.transactions
            .write()
            .insert(details.hash, details);
    }

    /// Marks a transaction as confirmed. Returns false for unknown hashes.
    pub fn finalize_transaction(&self, hash: TxHash) -> bool {
        match self.transactions.write().get_mut(&hash) {
            Some(details) => {
                details.confirmed_time = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn transaction(&self, hash: TxHash) -> Option<TransactionDetails> {
        self.transactions.read().get(&hash).cloned()
    }

    pub fn all_transactions(&self) -> Vec<TransactionDetails> {
        let mut all: Vec<TransactionDetails> = self
            .transactions
            .read()
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|details| details.added_time);
        all
    }
}

impl TransactionTracker for TransactionStore {
    fn add_transaction(&self, response: SubmittedTransaction, info: TransactionInfo) {
        debug!(hash = %response.hash, summary = ?info.summary, "Tracking transaction");
        self.insert(TransactionDetails {
            hash: response.hash,
            from: response.from,
            summary: info.summary,
            approval: info.approval,
            added_time: Utc::now(),
            confirmed_time: None,
        });
    }

    fn has_pending_approval(&self, token: Address, spender: Address) -> bool {
        let now = Utc::now();
        self.transactions
            .read()
            .values()
            .any(|details| {
                details.confirmed_time.is_none() &&
                    details.is_recent(now) &&
                    details.approval ==
                        Some(ApprovalDetails { token_address: token, spender })
            })
    }
}
