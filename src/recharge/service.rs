use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use super::orchestrator::FailoverOrchestrator;
use super::recorder::TransactionRecorder;
use super::store::{StoreError, TransactionStore};
use super::types::{RechargeRequest, RechargeSubmission, Transaction};
use super::validator::{RequestValidator, ValidationError};
use crate::services::notification::NotificationService;

#[derive(Debug, thiserror::Error)]
pub enum RechargeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type ReferenceLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Synchronous recharge entry point: validate, replay or orchestrate, record.
#[derive(Clone)]
pub struct RechargeService {
    validator: RequestValidator,
    orchestrator: FailoverOrchestrator,
    recorder: TransactionRecorder,
    store: Arc<dyn TransactionStore>,
    notifier: NotificationService,
    in_flight: Arc<ReferenceLocks>,
}

impl RechargeService {
    pub fn new(
        validator: RequestValidator,
        orchestrator: FailoverOrchestrator,
        store: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            validator,
            orchestrator,
            recorder: TransactionRecorder::new(),
            store,
            notifier: NotificationService::new(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    pub fn orchestrator(&self) -> &FailoverOrchestrator {
        &self.orchestrator
    }

    pub fn recorder(&self) -> &TransactionRecorder {
        &self.recorder
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    /// Validate untrusted input, then process it.
    pub async fn submit_recharge(
        &self,
        submission: &RechargeSubmission,
    ) -> Result<Transaction, RechargeError> {
        let request = self.validator.validate(submission)?;
        self.process(request).await
    }

    async fn process(&self, request: RechargeRequest) -> Result<Transaction, RechargeError> {
        let reference = self.recorder.resolve_reference(&request);

        // Same-reference submissions inside this process run one at a time,
        // so the second one sees the first one's record.
        let lock = self.reference_lock(&reference);
        let result = {
            let _guard = lock.lock().await;
            self.process_locked(&request, &reference).await
        };
        self.release_reference_lock(&reference, lock);
        result
    }

    async fn process_locked(
        &self,
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<Transaction, RechargeError> {
        if request.supplied_reference().is_some() {
            if let Some(existing) = self.store.get(reference).await? {
                info!(
                    reference = reference,
                    provider = %existing.provider,
                    status = %existing.status,
                    "Duplicate reference, returning recorded transaction"
                );
                return Ok(existing);
            }
        }

        let result = self.orchestrator.run(request, reference).await;
        let transaction = self.recorder.record(request, reference, &result.outcome);

        Ok(self.persist(transaction).await)
    }

    /// Store the record and alert staff when they must act. A write failure
    /// is logged but never hides a delivered recharge from the caller.
    pub async fn persist(&self, transaction: Transaction) -> Transaction {
        let stored = match self.store.put(transaction.clone()).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(
                    reference = %transaction.reference,
                    backend = self.store.backend(),
                    error = %e,
                    "Failed to persist recharge transaction"
                );
                transaction.clone()
            }
        };

        // an existing record was already alerted on when it was written
        if stored == transaction {
            self.notifier.notify_if_needed(&stored);
        }
        stored
    }

    fn reference_lock(&self, reference: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(reference.to_string()).or_default().clone()
    }

    fn release_reference_lock(&self, reference: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        // one count held by the map, one by us
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(reference);
        }
    }
}
