//! Payment gateway boundary.
//!
//! No real gateway is integrated: production uses [`SimulatedGateway`], which
//! only waits a fixed delay. The wait is a suspension point on the runtime, so
//! other requests keep being served while a payment is "processing".

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use orderdesk_orders::Order;

/// Default simulated processing time.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
#[error("payment gateway error: {0}")]
pub struct PaymentError(pub String);

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the order. Returning `Ok` means the payment went through.
    async fn charge(&self, order: &Order) -> Result<(), PaymentError>;
}

/// Accepts every payment after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_DELAY)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, order: &Order) -> Result<(), PaymentError> {
        tracing::debug!(order_id = %order.id, delay_ms = self.delay.as_millis() as u64, "processing payment");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Accepts every payment immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantGateway;

#[async_trait]
impl PaymentGateway for InstantGateway {
    async fn charge(&self, _order: &Order) -> Result<(), PaymentError> {
        Ok(())
    }
}
