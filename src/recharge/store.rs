use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::types::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transaction store unavailable: {0}")]
    Unavailable(String),

    #[error("stored transaction could not be decoded: {0}")]
    Corrupt(String),
}

/// Durable home of recorded transactions, keyed by reference.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn get(&self, reference: &str) -> Result<Option<Transaction>, StoreError>;

    /// Insert if absent. When a record already exists under the reference it
    /// is left untouched and returned instead.
    async fn put(&self, transaction: Transaction) -> Result<Transaction, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str;
}

#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: RwLock<HashMap<String, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn get(&self, reference: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.records.read().await.get(reference).cloned())
    }

    async fn put(&self, transaction: Transaction) -> Result<Transaction, StoreError> {
        let mut records = self.records.write().await;
        let stored = records
            .entry(transaction.reference.clone())
            .or_insert(transaction);
        Ok(stored.clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recharge::types::{RechargeDetails, TransactionStatus};
    use chrono::Utc;

    fn transaction(reference: &str, provider: &str) -> Transaction {
        Transaction {
            reference: reference.to_string(),
            request: RechargeDetails::default(),
            status: TransactionStatus::Completed,
            provider: provider.to_string(),
            confirmation_code: "ABCD1234".to_string(),
            external_transaction_id: "ext".to_string(),
            processed_at: Utc::now(),
            manual_processing_required: false,
            message: String::new(),
            failure_reason: None,
        }
    }

    #[tokio::test]
    async fn put_is_insert_if_absent() {
        let store = InMemoryTransactionStore::new();
        let first = store.put(transaction("REF", "vtpass")).await.unwrap();
        let second = store.put(transaction("REF", "hustlesim")).await.unwrap();

        assert_eq!(first.provider, "vtpass");
        assert_eq!(second.provider, "vtpass");
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("REF").await.unwrap().unwrap().provider, "vtpass");
        assert!(store.get("OTHER").await.unwrap().is_none());
    }
}
