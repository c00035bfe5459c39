//! # Embedded Flow
//!
//! Checkout via a provider-supplied in-page widget. The widget owns order
//! creation and approval; this module models the narrow capability surface
//! the orchestrator needs from the provider SDK and adapts it to
//! [`PaymentFlow`].

use async_trait::async_trait;
use shop_core::{
    CaptureDetails, CheckoutResult, CheckoutSession, FlowKind, LineItem, OrderHandle,
    OrderHandoff, PaymentFlow, Price,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The provider SDK capability the embedded flow consumes.
///
/// The widget is opaque; all the orchestrator supplies is line items and the
/// authoritative total, and all it consumes is the order handle and the
/// capture result.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create a provider-side order for the given line items and total
    async fn create_order(
        &self,
        line_items: &[LineItem],
        total: &Price,
    ) -> CheckoutResult<OrderHandle>;

    /// Capture an order the customer has approved
    async fn capture(&self, order: &OrderHandle) -> CheckoutResult<CaptureDetails>;

    /// Gateway name for logging
    fn gateway_name(&self) -> &'static str;
}

/// Type alias for a shared order gateway (dynamic dispatch)
pub type SharedOrderGateway = Arc<dyn OrderGateway>;

/// Embedded-widget checkout flow over an [`OrderGateway`]
pub struct EmbeddedFlow {
    gateway: SharedOrderGateway,
}

impl EmbeddedFlow {
    /// Wrap a provider gateway
    pub fn new(gateway: SharedOrderGateway) -> Self {
        Self { gateway }
    }

    /// Access the underlying gateway (used by the orchestrator to capture
    /// approved orders)
    pub fn gateway(&self) -> &SharedOrderGateway {
        &self.gateway
    }
}

#[async_trait]
impl PaymentFlow for EmbeddedFlow {
    #[instrument(skip(self, session), fields(session_id = %session.id, gateway = self.gateway.gateway_name()))]
    async fn create_order(&self, session: &CheckoutSession) -> CheckoutResult<OrderHandoff> {
        debug!(
            "Creating provider order: {} line items, total={}",
            session.line_items.len(),
            session.total.display()
        );

        let order = self
            .gateway
            .create_order(&session.line_items, &session.total)
            .await?;

        info!("Provider order created: {}", order.id);

        Ok(OrderHandoff::Approval { order })
    }

    fn flow_name(&self) -> &'static str {
        "embedded"
    }

    fn kind(&self) -> FlowKind {
        FlowKind::Embedded
    }
}
