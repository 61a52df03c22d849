//! Failover, validation gate and idempotent replay through RechargeService.

use async_trait::async_trait;
use pay4me_backend::recharge::provider::RechargeProvider;
use pay4me_backend::recharge::store::{InMemoryTransactionStore, StoreError, TransactionStore};
use pay4me_backend::recharge::types::{
    FailureReason, ProviderOutcome, RechargeRequest, RechargeSubmission, Transaction,
    TransactionStatus,
};
use pay4me_backend::recharge::validator::RequestValidator;
use pay4me_backend::recharge::{
    FailoverOrchestrator, FailoverState, ProviderRegistry, RechargeError, RechargeService,
    ValidationError,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

enum Behaviour {
    Succeed,
    Fail,
    Unconfigured,
    SlowFail(Duration),
}

struct MockProvider {
    name: &'static str,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RechargeProvider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        !matches!(self.behaviour, Behaviour::Unconfigured)
    }

    async fn deliver(&self, _request: &RechargeRequest, reference: &str) -> ProviderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Succeed => {
                ProviderOutcome::success(self.name, format!("{}-{}", self.name, reference), "PIN123")
            }
            Behaviour::Fail => ProviderOutcome::failure(
                self.name,
                FailureReason::UpstreamError("insufficient float".to_string()),
            ),
            Behaviour::SlowFail(delay) => {
                tokio::time::sleep(*delay).await;
                ProviderOutcome::failure(self.name, FailureReason::Timeout("slow".to_string()))
            }
            Behaviour::Unconfigured => ProviderOutcome::failure(self.name, FailureReason::Unconfigured),
        }
    }
}

fn service_with(providers: &[Arc<MockProvider>]) -> (RechargeService, Arc<InMemoryTransactionStore>) {
    service_with_deadline(providers, None)
}

fn service_with_deadline(
    providers: &[Arc<MockProvider>],
    deadline: Option<Duration>,
) -> (RechargeService, Arc<InMemoryTransactionStore>) {
    let registry = ProviderRegistry::new(
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn RechargeProvider>)
            .collect(),
    );
    let orchestrator = FailoverOrchestrator::new(Arc::new(registry)).with_deadline(deadline);
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = RechargeService::new(
        RequestValidator::new(Decimal::from(50), Decimal::from(50_000)),
        orchestrator,
        store.clone(),
    );
    (service, store)
}

fn airtime(network: &str, phone: &str, amount: i64) -> RechargeSubmission {
    RechargeSubmission {
        service_type: Some("airtime".to_string()),
        network: Some(network.to_string()),
        phone_number: Some(phone.to_string()),
        amount: Some(Decimal::from(amount)),
        ..Default::default()
    }
}

fn total_calls(providers: &[Arc<MockProvider>]) -> usize {
    providers.iter().map(|p| p.calls()).sum()
}

#[tokio::test]
async fn invalid_requests_never_reach_a_provider() {
    let providers = [MockProvider::new("a", Behaviour::Succeed)];
    let (service, store) = service_with(&providers);

    let bad_network = service
        .submit_recharge(&airtime("unknownnet", "08031234567", 200))
        .await;
    assert!(matches!(
        bad_network,
        Err(RechargeError::Validation(ValidationError::UnsupportedNetwork(_)))
    ));

    let bad_phone = service
        .submit_recharge(&airtime("mtn", "0803123", 200))
        .await;
    assert!(matches!(
        bad_phone,
        Err(RechargeError::Validation(ValidationError::InvalidPhoneNumber(_)))
    ));

    assert_eq!(total_calls(&providers), 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn first_success_short_circuits() {
    let providers = [
        MockProvider::new("a", Behaviour::Fail),
        MockProvider::new("b", Behaviour::Succeed),
        MockProvider::new("c", Behaviour::Succeed),
    ];
    let (service, _) = service_with(&providers);

    let tx = service
        .submit_recharge(&airtime("mtn", "08031234567", 200))
        .await
        .unwrap();

    assert_eq!(tx.provider, "b");
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(providers[0].calls(), 1);
    assert_eq!(providers[1].calls(), 1);
    assert_eq!(providers[2].calls(), 0);
}

#[tokio::test]
async fn all_failures_resolve_to_manual() {
    let providers = [
        MockProvider::new("a", Behaviour::Fail),
        MockProvider::new("b", Behaviour::Fail),
    ];
    let (service, store) = service_with(&providers);

    let tx = service
        .submit_recharge(&airtime("airtel", "08021234567", 500))
        .await
        .unwrap();

    assert_eq!(tx.provider, "manual");
    assert_eq!(tx.status, TransactionStatus::ManualPending);
    assert!(tx.manual_processing_required);
    assert!(!tx.confirmation_code.is_empty());
    assert_eq!(tx.external_transaction_id, tx.reference);
    assert_eq!(total_calls(&providers), 2);
    assert_eq!(store.get(&tx.reference).await.unwrap(), Some(tx));
}

#[tokio::test]
async fn same_reference_replays_recorded_transaction() {
    let providers = [MockProvider::new("a", Behaviour::Succeed)];
    let (service, store) = service_with(&providers);

    let mut submission = airtime("glo", "08051234567", 1000);
    submission.reference = Some("client-ref-1".to_string());

    let first = service.submit_recharge(&submission).await.unwrap();
    let second = service.submit_recharge(&submission).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.reference, "client-ref-1");
    assert_eq!(providers[0].calls(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn concurrent_submissions_with_one_reference_deliver_once() {
    let providers = [MockProvider::new("a", Behaviour::Succeed)];
    let (service, _) = service_with(&providers);

    let mut submission = airtime("mtn", "08031234567", 200);
    submission.reference = Some("PSK_concurrent".to_string());

    let (left, right) = tokio::join!(
        service.submit_recharge(&submission),
        service.submit_recharge(&submission)
    );

    assert_eq!(left.unwrap(), right.unwrap());
    assert_eq!(providers[0].calls(), 1);
}

#[tokio::test]
async fn without_reference_each_submission_is_new() {
    let providers = [MockProvider::new("a", Behaviour::Succeed)];
    let (service, store) = service_with(&providers);
    let submission = airtime("mtn", "08031234567", 200);

    let first = service.submit_recharge(&submission).await.unwrap();
    let second = service.submit_recharge(&submission).await.unwrap();

    assert_ne!(first.reference, second.reference);
    assert!(first.reference.starts_with("AIRTIME_MTN_"));
    assert_eq!(providers[0].calls(), 2);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn data_requires_a_plan_airtime_ignores_it() {
    let providers = [MockProvider::new("a", Behaviour::Succeed)];
    let (service, _) = service_with(&providers);

    let data_without_plan = RechargeSubmission {
        service_type: Some("data".to_string()),
        data_plan_code: Some("  ".to_string()),
        ..airtime("mtn", "08031234567", 600)
    };
    assert!(matches!(
        service.submit_recharge(&data_without_plan).await,
        Err(RechargeError::Validation(ValidationError::MissingDataPlan))
    ));

    let airtime_with_empty_plan = RechargeSubmission {
        data_plan_code: Some(String::new()),
        ..airtime("mtn", "08031234567", 600)
    };
    assert!(service.submit_recharge(&airtime_with_empty_plan).await.is_ok());
    assert_eq!(providers[0].calls(), 1);
}

#[tokio::test]
async fn skips_unconfigured_provider() {
    let providers = [
        MockProvider::new("a", Behaviour::Unconfigured),
        MockProvider::new("b", Behaviour::Succeed),
    ];
    let (service, _) = service_with(&providers);

    let tx = service
        .submit_recharge(&airtime("mtn", "08031234567", 200))
        .await
        .unwrap();

    assert_eq!(tx.provider, "b");
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert!(!tx.manual_processing_required);
    assert_eq!(providers[0].calls(), 0);
}

#[tokio::test]
async fn no_configured_provider_means_manual_data_recharge() {
    let (service, _) = service_with(&[]);

    let submission = RechargeSubmission {
        service_type: Some("data".to_string()),
        network: Some("glo".to_string()),
        phone_number: Some("08051234567".to_string()),
        amount: Some(Decimal::from(1500)),
        data_plan_code: Some("2GB".to_string()),
        reference: None,
    };
    let tx = service.submit_recharge(&submission).await.unwrap();

    assert_eq!(tx.provider, "manual");
    assert_eq!(tx.status, TransactionStatus::ManualPending);
    assert!(tx.manual_processing_required);
    assert_eq!(tx.request.data_plan_code.as_deref(), Some("2GB"));
}

#[tokio::test]
async fn amount_below_minimum_is_rejected() {
    let providers = [MockProvider::new("a", Behaviour::Succeed)];
    let (service, _) = service_with(&providers);

    let err = service
        .submit_recharge(&airtime("mtn", "08031234567", 49))
        .await
        .unwrap_err();

    match err {
        RechargeError::Validation(e @ ValidationError::AmountOutOfRange { .. }) => {
            assert!(e.to_string().contains("50"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(providers[0].calls(), 0);
}

#[tokio::test]
async fn deadline_stops_further_attempts() {
    let providers = [
        MockProvider::new("slow", Behaviour::SlowFail(Duration::from_millis(150))),
        MockProvider::new("b", Behaviour::Succeed),
    ];
    let (service, _) = service_with_deadline(&providers, Some(Duration::from_millis(50)));

    let tx = service
        .submit_recharge(&airtime("mtn", "08031234567", 200))
        .await
        .unwrap();

    assert_eq!(tx.provider, "manual");
    assert_eq!(providers[0].calls(), 1);
    assert_eq!(providers[1].calls(), 0);
}

#[tokio::test]
async fn orchestrator_reports_attempts_and_state() {
    let providers = [
        MockProvider::new("a", Behaviour::Fail),
        MockProvider::new("b", Behaviour::Succeed),
    ];
    let registry = ProviderRegistry::new(
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn RechargeProvider>)
            .collect(),
    );
    let orchestrator = FailoverOrchestrator::new(Arc::new(registry));
    let request = RechargeRequest::airtime(
        "mtn".parse().unwrap(),
        "08031234567",
        Decimal::from(200),
    );

    let result = orchestrator.run(&request, "REF1").await;

    assert_eq!(result.state, FailoverState::Succeeded(1));
    assert_eq!(result.attempts.len(), 2);
    assert!(!result.attempts[0].succeeded);
    assert!(!result.is_manual());
}

struct BrokenStore;

#[async_trait]
impl TransactionStore for BrokenStore {
    async fn get(&self, _reference: &str) -> Result<Option<Transaction>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn put(&self, _transaction: Transaction) -> Result<Transaction, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn store_lookup_failure_blocks_delivery() {
    let provider = MockProvider::new("a", Behaviour::Succeed);
    let registry = ProviderRegistry::new(vec![provider.clone() as Arc<dyn RechargeProvider>]);
    let service = RechargeService::new(
        RequestValidator::new(Decimal::from(50), Decimal::from(50_000)),
        FailoverOrchestrator::new(Arc::new(registry)),
        Arc::new(BrokenStore),
    );

    let mut submission = airtime("mtn", "08031234567", 200);
    submission.reference = Some("ref-with-store-down".to_string());
    assert!(matches!(
        service.submit_recharge(&submission).await,
        Err(RechargeError::Store(_))
    ));
    assert_eq!(provider.calls(), 0);

    // Without a reference there is nothing to look up; the write failure is
    // logged and the delivered transaction still returned.
    let tx = service
        .submit_recharge(&airtime("mtn", "08031234567", 200))
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(provider.calls(), 1);
}
