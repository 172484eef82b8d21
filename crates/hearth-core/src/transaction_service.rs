use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use hearth_domain::{Transaction, TransactionRequest};

use crate::{storage::HouseholdStore, CoreError};

pub struct TransactionService;

impl TransactionService {
    /// Records a one-off transaction entered by hand.
    pub fn record(
        store: &dyn HouseholdStore,
        request: TransactionRequest,
    ) -> Result<Transaction, CoreError> {
        if request.description.trim().is_empty() {
            return Err(CoreError::Validation(
                "transaction description cannot be empty".into(),
            ));
        }
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(CoreError::Validation(format!(
                "transaction amount must be positive, got {}",
                request.amount
            )));
        }
        if let Some(person_id) = request.person_id {
            store.person(person_id)?;
        }
        let transaction = request.into_transaction(Uuid::new_v4(), Utc::now());
        store.insert_transaction(transaction.clone())?;
        info!(
            transaction = %transaction.id,
            date = %transaction.date,
            amount = transaction.amount,
            "transaction recorded"
        );
        Ok(transaction)
    }
}
