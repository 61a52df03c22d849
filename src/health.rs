//! Health check module
//! Reports provider configuration, payment mode and transaction store reachability

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::recharge::registry::{ProviderRegistry, ProviderStatus};
use crate::recharge::store::TransactionStore;

const STORE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub providers: Vec<ProviderStatus>,
    pub configured_providers: usize,
    pub paystack_test_mode: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Up,
    Down,
    Warning,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }

    pub fn warning(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Warning,
            response_time_ms: None,
            details,
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn TransactionStore>,
    paystack_test_mode: bool,
}

impl HealthChecker {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn TransactionStore>,
        paystack_test_mode: bool,
    ) -> Self {
        Self {
            registry,
            store,
            paystack_test_mode,
        }
    }

    /// Degraded when the store is unreachable or no provider is configured.
    /// Requests are still accepted while degraded; they fall back to manual
    /// processing.
    pub async fn check_health(&self) -> HealthStatus {
        let mut checks = HashMap::new();
        let mut overall_healthy = true;

        let store_health = match timeout(STORE_CHECK_TIMEOUT, check_store_health(&*self.store))
            .await
        {
            Ok(Ok(response_time)) => {
                info!(
                    backend = self.store.backend(),
                    "Store health check: OK ({}ms)", response_time
                );
                ComponentHealth::up(Some(response_time))
            }
            Ok(Err(e)) => {
                overall_healthy = false;
                error!(backend = self.store.backend(), "Store health check failed: {}", e);
                ComponentHealth::down(Some(e))
            }
            Err(_) => {
                overall_healthy = false;
                error!(backend = self.store.backend(), "Store health check timed out");
                ComponentHealth::down(Some("Timeout".to_string()))
            }
        };
        checks.insert("store".to_string(), store_health);

        let configured = self.registry.configured_count();
        let providers_health = if configured == 0 {
            overall_healthy = false;
            warn!("No recharge provider is configured, every request will need manual processing");
            ComponentHealth::warning(Some("no provider configured".to_string()))
        } else {
            ComponentHealth::up(None)
        };
        checks.insert("providers".to_string(), providers_health);

        HealthStatus {
            status: if overall_healthy {
                HealthState::Healthy
            } else {
                HealthState::Degraded
            },
            checks,
            providers: self.registry.statuses(),
            configured_providers: configured,
            paystack_test_mode: self.paystack_test_mode,
            timestamp: chrono::Utc::now(),
        }
    }
}

pub async fn check_store_health(store: &dyn TransactionStore) -> Result<u128, String> {
    let start = Instant::now();
    store
        .health_check()
        .await
        .map(|_| start.elapsed().as_millis())
        .map_err(|e| e.to_string())
}
