// src/models/wallet.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Purchase,
    Sale,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    /// Signed change to the balance.
    pub amount: i64,
    pub listing_id: Option<i64>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Credit balance plus its history, newest transaction last.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub user_id: i64,
    pub balance: i64,
    pub transactions: Vec<WalletTransaction>,
}

impl Wallet {
    pub fn open(user_id: i64, starter_credits: i64, now: DateTime<Utc>) -> Self {
        let mut wallet = Wallet {
            user_id,
            balance: 0,
            transactions: Vec::new(),
        };
        if starter_credits > 0 {
            wallet.record(TransactionKind::Deposit, starter_credits, None, "Welcome credits", now);
        }
        wallet
    }

    pub fn can_afford(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    pub fn record(
        &mut self,
        kind: TransactionKind,
        amount: i64,
        listing_id: Option<i64>,
        description: &str,
        now: DateTime<Utc>,
    ) -> &WalletTransaction {
        self.balance += amount;
        self.transactions.push(WalletTransaction {
            id: Uuid::new_v4(),
            kind,
            amount,
            listing_id,
            description: description.to_string(),
            created_at: now,
        });
        // Just pushed.
        &self.transactions[self.transactions.len() - 1]
    }
}
