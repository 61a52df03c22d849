//! Redis-backed transaction store. `SET NX` gives insert-if-absent without a
//! round trip through a lock.

use async_trait::async_trait;
use tracing::debug;

use super::error::{CacheError, CacheResult};
use super::keys::recharge::TransactionKey;
use super::{health_check, RedisPool};
use crate::recharge::store::{StoreError, TransactionStore};
use crate::recharge::types::Transaction;

pub struct RedisTransactionStore {
    pool: RedisPool,
}

impl RedisTransactionStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, reference: &str) -> CacheResult<Option<Transaction>> {
        let key = TransactionKey::new(reference).to_string();
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut *conn).await?;
        raw.map(|json| serde_json::from_str(&json).map_err(CacheError::from))
            .transpose()
    }

    async fn insert(&self, transaction: &Transaction) -> CacheResult<bool> {
        let key = TransactionKey::new(&transaction.reference).to_string();
        let json = serde_json::to_string(transaction)?;
        let mut conn = self.pool.get().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .arg("NX")
            .query_async(&mut *conn)
            .await?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl TransactionStore for RedisTransactionStore {
    async fn get(&self, reference: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.fetch(reference).await?)
    }

    async fn put(&self, transaction: Transaction) -> Result<Transaction, StoreError> {
        if self.insert(&transaction).await? {
            return Ok(transaction);
        }

        debug!(reference = %transaction.reference, "Reference already recorded in Redis");
        self.fetch(&transaction.reference)
            .await?
            .ok_or_else(|| {
                StoreError::Unavailable(format!(
                    "reference {} reported present but could not be read",
                    transaction.reference
                ))
            })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
