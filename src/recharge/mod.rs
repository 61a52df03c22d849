//! Recharge orchestration engine.
//!
//! Control flow for one request:
//! validator -> failover orchestrator -> provider adapters -> recorder -> store.

pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod recorder;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;
pub mod validator;

pub use orchestrator::{FailoverOrchestrator, FailoverResult, FailoverState};
pub use provider::{ProviderName, RechargeProvider};
pub use recorder::TransactionRecorder;
pub use registry::ProviderRegistry;
pub use service::{RechargeError, RechargeService};
pub use store::{InMemoryTransactionStore, StoreError, TransactionStore};
pub use types::{
    FailureReason, Network, ProviderOutcome, RechargeDetails, RechargeRequest,
    RechargeSubmission, ServiceType, Transaction, TransactionStatus, MANUAL_PROVIDER,
};
pub use validator::{RequestValidator, ValidationError};
