//! Ledger entries and the requests that create them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{category::CategoryKey, common::*};

/// A single dated ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: CategoryKey,
    pub account_id: Uuid,
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<Uuid>,
    pub date: NaiveDate,
    /// Set when the entry was materialized from a recurring series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Returns `true` when the entry is dated within `[start, end]` inclusive.
    pub fn falls_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Amounted for Transaction {
    fn amount(&self) -> f64 {
        self.amount
    }
}

/// The values needed to create a transaction; the store assigns nothing but persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionType,
    pub category: CategoryKey,
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub person_id: Option<Uuid>,
    pub date: NaiveDate,
    pub series_id: Option<Uuid>,
}

impl TransactionRequest {
    pub fn into_transaction(self, id: Uuid, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            description: self.description,
            amount: self.amount,
            kind: self.kind,
            category: self.category,
            account_id: self.account_id,
            user_id: self.user_id,
            person_id: self.person_id,
            date: self.date,
            series_id: self.series_id,
            created_at,
        }
    }
}
