use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::database::error::{DatabaseError, DatabaseErrorKind};
use crate::recharge::store::{StoreError, TransactionStore};
use crate::recharge::types::Transaction;

/// Postgres home for recharge transactions. The primary key on `reference`
/// makes `put` insert-if-absent.
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, DatabaseError> {
        let row: Option<(Json<Transaction>,)> =
            sqlx::query_as("SELECT record FROM recharge_transactions WHERE reference = $1")
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::from_sqlx)?;

        Ok(row.map(|(Json(tx),)| tx))
    }

    /// Returns `None` when the reference already existed.
    pub async fn insert_if_absent(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<Transaction>, DatabaseError> {
        let row: Option<(Json<Transaction>,)> = sqlx::query_as(
            "INSERT INTO recharge_transactions
             (reference, status, provider, manual_processing_required, processed_at, record)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (reference) DO NOTHING
             RETURNING record",
        )
        .bind(&transaction.reference)
        .bind(transaction.status.as_str())
        .bind(&transaction.provider)
        .bind(transaction.manual_processing_required)
        .bind(transaction.processed_at)
        .bind(Json(transaction))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(row.map(|(Json(tx),)| tx))
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn get(&self, reference: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.find_by_reference(reference).await?)
    }

    async fn put(&self, transaction: Transaction) -> Result<Transaction, StoreError> {
        if let Some(inserted) = self.insert_if_absent(&transaction).await? {
            return Ok(inserted);
        }

        self.find_by_reference(&transaction.reference)
            .await?
            .ok_or_else(|| {
                DatabaseError::new(DatabaseErrorKind::QueryFailed {
                    message: format!(
                        "reference {} conflicted but could not be read",
                        transaction.reference
                    ),
                })
                .into()
            })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(super::health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
