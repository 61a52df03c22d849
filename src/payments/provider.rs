use crate::payments::error::PaymentResult;
use crate::payments::types::{VerifiedPayment, WebhookEvent, WebhookVerificationResult};
use async_trait::async_trait;

/// Payment gateway as seen by the recharge bridge: it confirms charges and
/// authenticates their webhooks. Collecting payments is the frontend's job.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, reference: &str) -> PaymentResult<VerifiedPayment>;

    fn name(&self) -> &'static str;

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookVerificationResult>;

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent>;
}
