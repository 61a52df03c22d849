use crate::logging::mask_phone;
use crate::recharge::types::{Transaction, TransactionStatus};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    RechargeCompleted,
    ManualRechargeRequired,
    RechargeFailed,
}

impl NotificationType {
    pub fn for_transaction(tx: &Transaction) -> Self {
        match tx.status {
            TransactionStatus::Completed => NotificationType::RechargeCompleted,
            TransactionStatus::ManualPending => NotificationType::ManualRechargeRequired,
            TransactionStatus::Failed => NotificationType::RechargeFailed,
        }
    }
}

/// Operations alerts. Delivered as structured log events for now.
#[derive(Debug, Clone, Default)]
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }

    /// Alert staff when a transaction needs a human.
    pub fn notify_if_needed(&self, tx: &Transaction) {
        if tx.needs_attention() {
            self.send_notification(tx, NotificationType::for_transaction(tx));
        }
    }

    pub fn send_notification(&self, tx: &Transaction, notification_type: NotificationType) {
        match notification_type {
            NotificationType::RechargeCompleted => {
                info!(
                    reference = %tx.reference,
                    provider = %tx.provider,
                    "🔔 NOTIFICATION: Recharge Completed - {}", tx.message
                );
            }
            NotificationType::ManualRechargeRequired => {
                warn!(
                    reference = %tx.reference,
                    service_type = %tx.request.service_type,
                    network = %tx.request.network,
                    phone = %mask_phone(&tx.request.phone_number),
                    amount = ?tx.request.amount,
                    data_plan = ?tx.request.data_plan_code,
                    confirmation_code = %tx.confirmation_code,
                    "🔔 NOTIFICATION: Manual recharge required"
                );
            }
            NotificationType::RechargeFailed => {
                error!(
                    reference = %tx.reference,
                    phone = %mask_phone(&tx.request.phone_number),
                    reason = tx.failure_reason.as_deref().unwrap_or_default(),
                    "🔔 NOTIFICATION: Paid recharge not delivered - {}", tx.message
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recharge::types::RechargeDetails;
    use chrono::Utc;

    fn transaction(status: TransactionStatus) -> Transaction {
        Transaction {
            reference: "REF".to_string(),
            request: RechargeDetails::default(),
            status,
            provider: "manual".to_string(),
            confirmation_code: "ABCD1234".to_string(),
            external_transaction_id: "REF".to_string(),
            processed_at: Utc::now(),
            manual_processing_required: status == TransactionStatus::ManualPending,
            message: String::new(),
            failure_reason: None,
        }
    }

    #[test]
    fn notification_type_follows_status() {
        assert_eq!(
            NotificationType::for_transaction(&transaction(TransactionStatus::ManualPending)),
            NotificationType::ManualRechargeRequired
        );
        assert_eq!(
            NotificationType::for_transaction(&transaction(TransactionStatus::Failed)),
            NotificationType::RechargeFailed
        );
        assert_eq!(
            NotificationType::for_transaction(&transaction(TransactionStatus::Completed)),
            NotificationType::RechargeCompleted
        );
    }
}
