//! Payment gateway integration: verification of collected payments, webhook
//! authentication and the shared provider HTTP client.

pub mod error;
pub mod provider;
pub mod providers;
pub mod types;
pub mod utils;

pub use error::{PaymentError, PaymentResult};
pub use provider::PaymentVerifier;
pub use providers::{PaystackConfig, PaystackVerifier};
pub use types::{PaymentState, VerifiedPayment, WebhookEvent, WebhookVerificationResult};
pub use utils::PaymentHttpClient;
