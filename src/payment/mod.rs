//! Payment concerns: the time-of-day window policy and the external
//! payment-provider seam.

pub mod window;
pub mod yookassa;

pub use window::PaymentWindow;
pub use yookassa::YookassaClient;

use crate::error::BotResult;
use crate::types::UserId;
use async_trait::async_trait;

/// Result of a successful external payment handoff.
#[derive(Debug, Clone)]
pub struct PaymentHandoff {
    /// URL the user is sent to in order to complete the payment.
    pub redirect_url: String,
    /// Provider-side payment identifier.
    pub payment_id: String,
}

/// Opaque "create external payment" call. Failures (network, provider
/// rejection) surface as a generic payment error to the caller.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment(&self, amount: u64, user: UserId) -> BotResult<PaymentHandoff>;
}
