//! Services module for business logic and integrations

pub mod notification;
pub mod payment_bridge;
pub mod webhook_processor;

pub use notification::{NotificationService, NotificationType};
pub use payment_bridge::{
    BridgeError, BridgeExtractionError, PaymentBridge, PaymentMetadata, PaymentReceipt,
};
pub use webhook_processor::{WebhookOutcome, WebhookProcessor, WebhookProcessorError};
