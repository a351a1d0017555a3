// ============================================================================
// Cash Ledger - TickClear Settlement Core
// ============================================================================
//
// Account balances on the value side of settlement, plus a journal of every
// credit. The settlement core only ever credits: proceeds to the
// shareholder, the creator fee to the market creator, the reporting fee to
// the designated reporter or the fee pool. Escrow release happens upstream.
//
// credit_batch is all-or-nothing. Every leg of a claim is validated before
// any balance moves, so a claim can never half-pay.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::settlement::{Payment, PaymentKind};

/// Kind of ledger credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    /// Shareholder proceeds from a claim
    Proceeds,
    /// Market creator fee
    CreatorFee,
    /// Reporting fee to the designated reporter or the fee pool
    ReportingFee,
}

impl From<PaymentKind> for TxType {
    fn from(kind: PaymentKind) -> Self {
        match kind {
            PaymentKind::Proceeds => TxType::Proceeds,
            PaymentKind::CreatorFee => TxType::CreatorFee,
            PaymentKind::ReportingFee => TxType::ReportingFee,
        }
    }
}

/// A single credit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub tx_type: TxType,
    pub account: String,
    #[serde(with = "crate::units::string")]
    pub amount: u128,
    pub market_id: String,
    pub timestamp: u64,
}

/// Account balances plus the credit journal
#[derive(Debug, Default)]
pub struct CashLedger {
    /// Balance per account
    pub accounts: HashMap<String, u128>,

    /// Every credit ever applied, oldest first
    pub transactions: Vec<Transaction>,
}

impl CashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &str) -> u128 {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    /// Apply a batch of credits atomically: every leg is checked against
    /// overflow first (legs may share a recipient), then all are applied
    /// and journaled. An error leaves the ledger untouched.
    pub fn credit_batch(
        &mut self,
        payments: &[Payment],
        market_id: &str,
        now: u64,
    ) -> Result<(), String> {
        let mut staged: HashMap<&str, u128> = HashMap::new();
        for payment in payments {
            let current = staged
                .get(payment.recipient.as_str())
                .copied()
                .unwrap_or_else(|| self.balance(&payment.recipient));
            let next = current
                .checked_add(payment.amount)
                .ok_or_else(|| format!("balance overflow for {}", payment.recipient))?;
            staged.insert(payment.recipient.as_str(), next);
        }

        for payment in payments {
            *self
                .accounts
                .entry(payment.recipient.clone())
                .or_insert(0) += payment.amount;

            self.transactions.push(Transaction {
                id: format!("tx_{}", &Uuid::new_v4().simple().to_string()[..12]),
                tx_type: payment.kind.into(),
                account: payment.recipient.clone(),
                amount: payment.amount,
                market_id: market_id.to_string(),
                timestamp: now,
            });
        }

        Ok(())
    }

    /// Most recent credits for one account, newest first
    pub fn transactions_for(&self, account: &str, limit: usize) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .rev()
            .filter(|tx| tx.account == account)
            .take(limit)
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
