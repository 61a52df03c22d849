//! Unified error handling for the recharge gateway
//!
//! Every layer keeps its own error enum. At the HTTP edge they are folded into
//! [`AppError`], which carries the status code, a machine-readable
//! [`ErrorCode`], a user-facing message and a retryable flag.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;
use crate::recharge::{RechargeError, StoreError};
use crate::services::payment_bridge::BridgeError;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Domain errors (4xx)
    PaymentNotVerified,
    TransactionNotFound,

    // Infrastructure errors (5xx)
    StorageError,
    ConfigurationError,

    // External errors (502, 503, 504)
    PaymentProviderError,
    RateLimitError,
    ExternalServiceTimeout,

    // Generic
    InternalError,
    ValidationError,
}

/// Business rule failures
#[derive(Debug, Clone)]
pub enum DomainError {
    /// The gateway does not consider the payment settled
    PaymentNotVerified { reference: String, status: String },
    TransactionNotFound { reference: String },
}

/// Infrastructure-level errors (storage, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Transaction store unreachable or returned garbage
    Storage { message: String },
    Configuration { message: String },
}

/// Errors from third-party services
#[derive(Debug, Clone)]
pub enum ExternalError {
    PaymentProvider {
        provider: String,
        message: String,
        is_retryable: bool,
    },
    RateLimit {
        service: String,
        retry_after: Option<u64>,
    },
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Field present but unusable; `reason` is shown to the caller as-is
    InvalidField { field: String, reason: String },
    MissingField { field: String },
    OutOfRange {
        field: String,
        min: Option<String>,
        max: Option<String>,
    },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::InvalidField { field, .. }
            | ValidationError::MissingField { field }
            | ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PaymentNotVerified { .. } => 402, // Payment Required
                DomainError::TransactionNotFound { .. } => 404,
            },
            AppErrorKind::Infrastructure(_) => 500,
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { .. } => 502, // Bad Gateway
                ExternalError::RateLimit { .. } => 429,
                ExternalError::Timeout { .. } => 504,
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PaymentNotVerified { .. } => ErrorCode::PaymentNotVerified,
                DomainError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Storage { .. } => ErrorCode::StorageError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { .. } => ErrorCode::PaymentProviderError,
                ExternalError::RateLimit { .. } => ErrorCode::RateLimitError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PaymentNotVerified { reference, status } => format!(
                    "Payment '{}' has not been confirmed (status: {})",
                    reference, status
                ),
                DomainError::TransactionNotFound { reference } => {
                    format!("Transaction '{}' not found", reference)
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider {
                    provider,
                    is_retryable,
                    ..
                } => {
                    if *is_retryable {
                        format!(
                            "Payment provider ({}) is temporarily unavailable. Please try again",
                            provider
                        )
                    } else {
                        "Payment verification failed. Please contact support".to_string()
                    }
                }
                ExternalError::RateLimit {
                    service,
                    retry_after,
                } => match retry_after {
                    Some(secs) => format!(
                        "Rate limit exceeded for {}. Please try again in {} seconds",
                        service, secs
                    ),
                    None => format!("Rate limit exceeded for {}. Please try again later", service),
                },
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => format!(
                    "{} request timed out after {} seconds. Please try again",
                    service, timeout_secs
                ),
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::InvalidField { reason, .. } => reason.clone(),
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::OutOfRange { field, min, max } => match (min, max) {
                    (Some(min), Some(max)) => {
                        format!("Field '{}' must be between {} and {}", field, min, max)
                    }
                    (Some(min), None) => format!("Field '{}' must be at least {}", field, min),
                    (None, Some(max)) => format!("Field '{}' must be at most {}", field, max),
                    (None, None) => format!("Field '{}' is out of acceptable range", field),
                },
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(err) => matches!(err, DomainError::PaymentNotVerified { .. }),
            AppErrorKind::Infrastructure(err) => {
                matches!(err, InfrastructureError::Storage { .. })
            }
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { is_retryable, .. } => *is_retryable,
                ExternalError::RateLimit { .. } => true,
                ExternalError::Timeout { .. } => true,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

// Conversions from layer errors.
// From<PaymentError> lives in payments/error.rs.

impl From<crate::recharge::ValidationError> for AppError {
    fn from(err: crate::recharge::ValidationError) -> Self {
        use crate::recharge::ValidationError as RV;

        let kind = match &err {
            RV::MissingField(field) => ValidationError::MissingField {
                field: field.to_string(),
            },
            RV::AmountOutOfRange { min, max, .. } => ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: Some(min.to_string()),
                max: Some(max.to_string()),
            },
            _ => ValidationError::InvalidField {
                field: err.field().to_string(),
                reason: err.to_string(),
            },
        };

        AppError::new(AppErrorKind::Validation(kind))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::new(AppErrorKind::Infrastructure(InfrastructureError::Storage {
            message: err.to_string(),
        }))
    }
}

impl From<RechargeError> for AppError {
    fn from(err: RechargeError) -> Self {
        match err {
            RechargeError::Validation(e) => e.into(),
            RechargeError::Store(e) => e.into(),
        }
    }
}

impl From<BridgeError> for AppError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::PaymentNotVerified { reference, status } => {
                AppError::new(AppErrorKind::Domain(DomainError::PaymentNotVerified {
                    reference,
                    status: format!("{:?}", status).to_lowercase(),
                }))
            }
            BridgeError::Verification(e) => e.into(),
            BridgeError::Store(e) => e.into(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: err.to_string(),
            },
        ))
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
