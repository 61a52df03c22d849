use pay4me_backend::api::{self, AppState};
use pay4me_backend::config::{AppConfig, StorageBackend};
use pay4me_backend::health::HealthChecker;
use pay4me_backend::logging::init_tracing;
use pay4me_backend::payments::{PaymentHttpClient, PaymentVerifier, PaystackVerifier};
use pay4me_backend::recharge::store::{InMemoryTransactionStore, TransactionStore};
use pay4me_backend::recharge::validator::RequestValidator;
use pay4me_backend::recharge::{FailoverOrchestrator, ProviderRegistry, RechargeService};
use pay4me_backend::services::{PaymentBridge, WebhookProcessor};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

async fn build_store(backend: StorageBackend) -> anyhow::Result<Arc<dyn TransactionStore>> {
    match backend {
        #[cfg(feature = "database")]
        StorageBackend::Postgres(url) => {
            use pay4me_backend::database::{init_pool, PgTransactionStore, PoolConfig};

            info!("📊 Initializing Postgres transaction store...");
            let pool = init_pool(&url, Some(PoolConfig::default())).await?;
            info!(
                max_connections = pool.options().get_max_connections(),
                "✅ Postgres transaction store ready"
            );
            Ok(Arc::new(PgTransactionStore::new(pool)))
        }
        #[cfg(feature = "cache")]
        StorageBackend::Redis(url) => {
            use pay4me_backend::cache::{init_cache_pool, CacheConfig, RedisTransactionStore};

            info!("🔄 Initializing Redis transaction store...");
            let pool = init_cache_pool(CacheConfig::new(url)).await?;
            info!("✅ Redis transaction store ready");
            Ok(Arc::new(RedisTransactionStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("No DATABASE_URL or REDIS_URL set, transactions are kept in memory only");
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!(
            "storage backend {:?} requested but this build lacks the feature for it",
            other
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "🚀 Starting Pay4me recharge gateway"
    );

    let store = build_store(config.storage.backend()).await?;

    let policy = &config.recharge;
    let http = PaymentHttpClient::new(policy.provider_timeout, policy.provider_max_retries)?;
    let registry = Arc::new(ProviderRegistry::from_config(
        &policy.provider_order,
        &config.providers,
        &http,
    ));
    for status in registry.statuses() {
        info!(provider = %status.name, configured = status.configured, "Recharge provider");
    }
    if registry.configured_count() == 0 {
        warn!("No recharge provider configured, every recharge will be processed manually");
    }

    let orchestrator =
        FailoverOrchestrator::new(registry.clone()).with_deadline(policy.request_deadline);
    let validator = RequestValidator::new(policy.min_amount, policy.max_amount);
    let recharge = RechargeService::new(validator, orchestrator, store.clone());

    if !config.payments.is_configured() {
        warn!("PAYSTACK_SECRET_KEY not set, payment verification and webhooks will fail");
    } else if config.payments.is_test_mode() {
        warn!("Paystack is running with a test key");
    }
    let paystack_test_mode = config.payments.is_test_mode();
    let verifier: Arc<dyn PaymentVerifier> = Arc::new(PaystackVerifier::new(config.payments)?);
    let bridge = PaymentBridge::new(recharge.clone(), verifier.clone());
    let webhooks = Arc::new(WebhookProcessor::new(verifier, bridge.clone()));
    let health = HealthChecker::new(registry, store, paystack_test_mode);

    let app = api::router(AppState {
        recharge,
        bridge,
        webhooks,
        health,
    });

    let addr: SocketAddr = config.server.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}
