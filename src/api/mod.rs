//! HTTP surface of the gateway.

pub mod payments;
pub mod recharge;
pub mod webhooks;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::health::{HealthChecker, HealthStatus};
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::recharge::RechargeService;
use crate::services::payment_bridge::PaymentBridge;
use crate::services::webhook_processor::WebhookProcessor;

/// Shared handles for every route.
#[derive(Clone)]
pub struct AppState {
    pub recharge: RechargeService,
    pub bridge: PaymentBridge,
    pub webhooks: Arc<WebhookProcessor>,
    pub health: HealthChecker,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/recharge", post(recharge::submit_recharge))
        .route("/api/verify-payment", post(payments::verify_payment))
        .route("/api/webhook/paystack", post(webhooks::paystack_webhook))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// GET /health. Always 200 while the process serves; the body says whether
/// it is degraded.
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let status = state.health.check_health().await;
    if status.is_healthy() {
        info!("Health check passed");
    } else {
        warn!(configured_providers = status.configured_providers, "Service degraded");
    }
    Json(status)
}
