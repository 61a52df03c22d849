use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::recorder::mint_confirmation_code;
use super::registry::ProviderRegistry;
use super::types::{ProviderOutcome, RechargeRequest, MANUAL_PROVIDER};
use crate::logging::mask_phone;

// ============================================================================
// Failover State Machine
// ============================================================================

/// Position of one request in the provider fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "provider_index", rename_all = "snake_case")]
pub enum FailoverState {
    /// Nothing attempted yet
    Pending,
    /// Waiting on the configured provider at this index
    Trying(usize),
    /// Provider at this index delivered
    Succeeded(usize),
    /// No provider delivered, or the deadline passed
    Exhausted,
}

impl fmt::Display for FailoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailoverState::Pending => write!(f, "pending"),
            FailoverState::Trying(i) => write!(f, "trying({})", i),
            FailoverState::Succeeded(i) => write!(f, "succeeded({})", i),
            FailoverState::Exhausted => write!(f, "exhausted"),
        }
    }
}

impl FailoverState {
    pub fn can_transition_to(&self, next: &FailoverState) -> bool {
        match (self, next) {
            (FailoverState::Pending, FailoverState::Trying(0)) => true,
            (FailoverState::Pending, FailoverState::Exhausted) => true,
            (FailoverState::Trying(i), FailoverState::Trying(j)) => *j == i + 1,
            (FailoverState::Trying(i), FailoverState::Succeeded(j)) => i == j,
            (FailoverState::Trying(_), FailoverState::Exhausted) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FailoverState::Succeeded(_) | FailoverState::Exhausted)
    }
}

/// Final outcome of a failover run plus every attempt that led to it.
#[derive(Debug, Clone, Serialize)]
pub struct FailoverResult {
    pub outcome: ProviderOutcome,
    pub state: FailoverState,
    pub attempts: Vec<ProviderOutcome>,
}

impl FailoverResult {
    pub fn is_manual(&self) -> bool {
        self.state == FailoverState::Exhausted
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Tries configured providers strictly one after another in priority order
/// and stops at the first success. When none delivers, the result is a
/// synthesized manual outcome, so a validated request always resolves.
#[derive(Clone)]
pub struct FailoverOrchestrator {
    registry: Arc<ProviderRegistry>,
    deadline: Option<Duration>,
}

impl FailoverOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            deadline: None,
        }
    }

    /// Overall budget per request. Attempts are not started once it is spent.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub async fn run(&self, request: &RechargeRequest, reference: &str) -> FailoverResult {
        let deadline = self.deadline.map(|d| Instant::now() + d);
        self.run_until(request, reference, deadline).await
    }

    pub async fn run_until(
        &self,
        request: &RechargeRequest,
        reference: &str,
        deadline: Option<Instant>,
    ) -> FailoverResult {
        let mut state = FailoverState::Pending;
        let mut attempts = Vec::new();

        for (index, provider) in self.registry.configured_providers().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(
                    reference = reference,
                    attempted = attempts.len(),
                    "Recharge deadline reached, no further providers will be tried"
                );
                break;
            }

            state = transition(state, FailoverState::Trying(index));
            debug!(
                reference = reference,
                provider = provider.name(),
                network = %request.network,
                service_type = %request.service_type,
                phone = %mask_phone(&request.phone_number),
                "Attempting recharge"
            );

            let outcome = provider.deliver(request, reference).await;

            if outcome.succeeded {
                state = transition(state, FailoverState::Succeeded(index));
                info!(
                    reference = reference,
                    provider = %outcome.provider_name,
                    external_id = %outcome.external_transaction_id,
                    "Recharge delivered"
                );
                attempts.push(outcome.clone());
                return FailoverResult {
                    outcome,
                    state,
                    attempts,
                };
            }

            warn!(
                reference = reference,
                provider = %outcome.provider_name,
                reason = outcome
                    .failure_reason
                    .as_ref()
                    .map(|r| r.category())
                    .unwrap_or("unknown"),
                detail = %outcome
                    .failure_reason
                    .as_ref()
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
                "Provider failed, falling back"
            );
            attempts.push(outcome);
        }

        state = transition(state, FailoverState::Exhausted);
        warn!(
            reference = reference,
            attempted = attempts.len(),
            network = %request.network,
            service_type = %request.service_type,
            phone = %mask_phone(&request.phone_number),
            "All providers exhausted, manual recharge required"
        );

        FailoverResult {
            outcome: ProviderOutcome::success(MANUAL_PROVIDER, reference, mint_confirmation_code()),
            state,
            attempts,
        }
    }
}

fn transition(current: FailoverState, next: FailoverState) -> FailoverState {
    debug_assert!(
        current.can_transition_to(&next),
        "invalid failover transition {} -> {}",
        current,
        next
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        assert!(FailoverState::Pending.can_transition_to(&FailoverState::Trying(0)));
        assert!(FailoverState::Pending.can_transition_to(&FailoverState::Exhausted));
        assert!(FailoverState::Trying(0).can_transition_to(&FailoverState::Trying(1)));
        assert!(FailoverState::Trying(1).can_transition_to(&FailoverState::Succeeded(1)));
        assert!(FailoverState::Trying(2).can_transition_to(&FailoverState::Exhausted));
    }

    #[test]
    fn invalid_transitions() {
        assert!(!FailoverState::Pending.can_transition_to(&FailoverState::Trying(1)));
        assert!(!FailoverState::Pending.can_transition_to(&FailoverState::Succeeded(0)));
        assert!(!FailoverState::Trying(0).can_transition_to(&FailoverState::Trying(2)));
        assert!(!FailoverState::Trying(0).can_transition_to(&FailoverState::Succeeded(1)));
        assert!(!FailoverState::Exhausted.can_transition_to(&FailoverState::Trying(0)));
        assert!(!FailoverState::Succeeded(0).can_transition_to(&FailoverState::Exhausted));
    }

    #[test]
    fn terminal_states() {
        assert!(FailoverState::Exhausted.is_terminal());
        assert!(FailoverState::Succeeded(3).is_terminal());
        assert!(!FailoverState::Trying(0).is_terminal());
        assert!(!FailoverState::Pending.is_terminal());
    }

    #[tokio::test]
    async fn empty_registry_goes_straight_to_manual() {
        use crate::recharge::types::Network;
        use rust_decimal::Decimal;

        let orchestrator = FailoverOrchestrator::new(Arc::new(ProviderRegistry::default()));
        let request = RechargeRequest::airtime(Network::Mtn, "08031234567", Decimal::from(200));
        let result = orchestrator.run(&request, "REF-1").await;

        assert_eq!(result.state, FailoverState::Exhausted);
        assert!(result.attempts.is_empty());
        assert!(result.outcome.is_manual());
        assert!(result.outcome.succeeded);
        assert_eq!(result.outcome.external_transaction_id, "REF-1");
        assert_eq!(result.outcome.confirmation_code.len(), 8);
    }
}
