//! # Checkout Orchestrator
//!
//! Reads a snapshot of the cart, turns it into a one-shot checkout session,
//! submits it through the configured payment flow, and resolves the attempt's
//! terminal outcome.
//!
//! The cart is cleared only on confirmed success; failure and cancellation
//! leave it intact and return the attempt to `Idle` so the user can retry.

use crate::embedded::{EmbeddedFlow, SharedOrderGateway};
use crate::redirect::RedirectFlow;
use shop_core::{
    CartStore, CheckoutError, CheckoutOutcome, CheckoutPhase, CheckoutResult, CheckoutSession,
    FlowKind, OrderHandle, OrderHandoff, SharedPaymentFlow,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// The attempt currently being driven through the state machine
#[derive(Debug, Clone)]
struct PendingAttempt {
    session_id: String,
    /// Provider order handle (embedded flow only)
    order: Option<OrderHandle>,
}

/// Orchestrates one checkout attempt at a time over a shared cart.
///
/// Construct per session with the cart store and the configured flow; share
/// via `Arc` with whatever UI surface triggers checkout.
pub struct CheckoutOrchestrator {
    cart: Arc<CartStore>,
    flow: SharedPaymentFlow,
    /// Capture capability, present for the embedded flow
    gateway: Option<SharedOrderGateway>,
    /// Guards against double submission while a backend call is pending
    in_flight: AtomicBool,
    phase: Mutex<CheckoutPhase>,
    pending: Mutex<Option<PendingAttempt>>,
    outcome_tx: mpsc::UnboundedSender<CheckoutOutcome>,
    outcome_rx: Mutex<Option<mpsc::UnboundedReceiver<CheckoutOutcome>>>,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator").finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    /// Create an orchestrator over the given flow
    pub fn new(cart: Arc<CartStore>, flow: SharedPaymentFlow) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            cart,
            flow,
            gateway: None,
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(CheckoutPhase::Idle),
            pending: Mutex::new(None),
            outcome_tx,
            outcome_rx: Mutex::new(Some(outcome_rx)),
        }
    }

    /// Create an orchestrator for the embedded-widget flow, retaining the
    /// gateway so approved orders can be captured.
    pub fn embedded(cart: Arc<CartStore>, gateway: SharedOrderGateway) -> Self {
        let flow = Arc::new(EmbeddedFlow::new(gateway.clone()));
        let mut orchestrator = Self::new(cart, flow);
        orchestrator.gateway = Some(gateway);
        orchestrator
    }

    /// Build the orchestrator for the configured flow variant.
    ///
    /// `Redirect` reads the backend config from the environment; `Embedded`
    /// requires the provider gateway.
    pub fn for_kind(
        cart: Arc<CartStore>,
        kind: FlowKind,
        gateway: Option<SharedOrderGateway>,
    ) -> CheckoutResult<Self> {
        match kind {
            FlowKind::Redirect => Ok(Self::new(cart, Arc::new(RedirectFlow::from_env()?))),
            FlowKind::Embedded => {
                let gateway = gateway.ok_or_else(|| {
                    CheckoutError::Configuration(
                        "embedded flow requires an order gateway".to_string(),
                    )
                })?;
                Ok(Self::embedded(cart, gateway))
            }
        }
    }

    /// Current phase of the attempt state machine
    pub fn phase(&self) -> CheckoutPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    /// Take the terminal-outcome receiver. Yields each attempt's
    /// `Succeeded`/`Cancelled`/`Failed` message; can be taken once.
    pub fn outcomes(&self) -> Option<mpsc::UnboundedReceiver<CheckoutOutcome>> {
        self.outcome_rx.lock().expect("outcome lock poisoned").take()
    }

    /// Submit the current cart for checkout.
    ///
    /// Exactly one order-creation request is issued per accepted call; a
    /// second submit while one is pending fails with `SubmissionInFlight`
    /// and performs no network activity. Validation failures (`EmptyCart`,
    /// `InvalidLineItem`) are rejected before any network call. On backend
    /// failure the cart is untouched and the guard resets so the caller can
    /// offer a retry.
    #[instrument(skip(self), fields(flow = self.flow.flow_name()))]
    pub async fn submit(&self) -> CheckoutResult<OrderHandoff> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Submission rejected: already in flight");
            return Err(CheckoutError::SubmissionInFlight);
        }

        let result = self.submit_inner().await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn submit_inner(&self) -> CheckoutResult<OrderHandoff> {
        if !self.phase().can_submit() {
            debug!("Submission rejected: attempt already in progress");
            return Err(CheckoutError::SubmissionInFlight);
        }
        self.advance(CheckoutPhase::Submitting);

        // Validate and snapshot before any network activity
        let session = match CheckoutSession::from_snapshot(&self.cart.snapshot()) {
            Ok(session) => session,
            Err(e) => {
                self.advance(CheckoutPhase::Failed);
                self.advance(CheckoutPhase::Idle);
                return Err(e);
            }
        };

        info!(
            "Submitting checkout: session={}, {} items, total={}",
            session.id,
            session.item_count(),
            session.total.display()
        );

        let handoff = match self.flow.create_order(&session).await {
            Ok(handoff) => handoff,
            Err(e) => {
                error!("Checkout session creation failed: {}", e);
                self.emit(CheckoutOutcome::Failed {
                    session_id: session.id.clone(),
                    reason: e.to_string(),
                });
                self.advance(CheckoutPhase::Failed);
                self.advance(CheckoutPhase::Idle);
                return Err(e);
            }
        };

        self.advance(CheckoutPhase::SessionCreated);

        let mut pending = PendingAttempt {
            session_id: session.id.clone(),
            order: None,
        };

        match &handoff {
            OrderHandoff::Redirect { url } => {
                info!("Session {} created, redirect to {}", session.id, url);
                self.advance(CheckoutPhase::Redirected);
            }
            OrderHandoff::Approval { order } => {
                info!(
                    "Session {} created, awaiting approval of order {}",
                    session.id, order.id
                );
                pending.order = Some(order.clone());
                self.advance(CheckoutPhase::ApprovalPending);
            }
        }

        *self.pending.lock().expect("pending lock poisoned") = Some(pending);
        Ok(handoff)
    }

    /// Resolve an embedded-flow approval: capture the order, clear the cart,
    /// and emit the success outcome.
    ///
    /// A capture failure is logged and returns the attempt to `Idle` with
    /// the cart intact; it never panics.
    #[instrument(skip(self))]
    pub async fn handle_approval(&self) -> CheckoutResult<()> {
        let Some(gateway) = &self.gateway else {
            return Err(CheckoutError::Configuration(
                "approval received but no order gateway is configured".to_string(),
            ));
        };

        let pending = self.pending.lock().expect("pending lock poisoned").clone();
        let (session_id, order) = match pending {
            Some(PendingAttempt {
                session_id,
                order: Some(order),
            }) => (session_id, order),
            _ => {
                warn!("Approval received with no pending order, ignoring");
                return Ok(());
            }
        };

        match gateway.capture(&order).await {
            Ok(capture) => {
                info!(
                    "Capture {} completed for session {}, clearing cart",
                    capture.capture_id, session_id
                );
                self.cart.clear();
                self.advance(CheckoutPhase::Succeeded);
                self.take_pending();
                self.emit(CheckoutOutcome::Succeeded {
                    session_id,
                    capture: Some(capture),
                });
                // the attempt is done; the session may check out again
                self.advance(CheckoutPhase::Idle);
                Ok(())
            }
            Err(e) => {
                // surfaced via logging, non-fatal to the page
                error!("Provider approval error: {}", e);
                self.emit(CheckoutOutcome::Failed {
                    session_id,
                    reason: e.to_string(),
                });
                self.advance(CheckoutPhase::Failed);
                self.advance(CheckoutPhase::Idle);
                self.take_pending();
                Err(e)
            }
        }
    }

    /// Resolve the attempt as succeeded (redirect flow: the success landing
    /// route was reached). Clears the cart.
    pub fn resolve_success(&self) {
        let session_id = self.take_pending().map(|a| a.session_id);
        let Some(session_id) = session_id else {
            warn!("Success resolution with no pending attempt, ignoring");
            return;
        };

        info!("Checkout {} succeeded, clearing cart", session_id);
        self.cart.clear();
        self.advance(CheckoutPhase::Succeeded);
        self.emit(CheckoutOutcome::Succeeded {
            session_id,
            capture: None,
        });
        // the attempt is done; the session may check out again
        self.advance(CheckoutPhase::Idle);
    }

    /// Record an approval error reported by the provider widget before
    /// capture (its error callback). Logs the diagnostic, returns the
    /// attempt to `Idle`, and leaves the cart intact so the customer can
    /// retry.
    #[instrument(skip(self))]
    pub fn handle_approval_error(&self, message: &str) {
        let Some(attempt) = self.take_pending() else {
            warn!("Approval error with no pending attempt, ignoring: {}", message);
            return;
        };

        error!(
            "Provider approval error for session {}: {}",
            attempt.session_id, message
        );
        self.emit(CheckoutOutcome::Failed {
            session_id: attempt.session_id,
            reason: message.to_string(),
        });
        self.advance(CheckoutPhase::Failed);
        self.advance(CheckoutPhase::Idle);
    }

    /// Resolve the attempt as cancelled. The cart stays intact and the
    /// attempt returns to `Idle` so a new submission is possible.
    pub fn resolve_cancel(&self) {
        let session_id = self.take_pending().map(|a| a.session_id);
        let Some(session_id) = session_id else {
            warn!("Cancel resolution with no pending attempt, ignoring");
            return;
        };

        info!("Checkout {} cancelled, cart intact", session_id);
        self.advance(CheckoutPhase::Cancelled);
        self.advance(CheckoutPhase::Idle);
        self.emit(CheckoutOutcome::Cancelled { session_id });
    }

    fn advance(&self, next: CheckoutPhase) {
        let mut phase = self.phase.lock().expect("phase lock poisoned");
        if !phase.can_transition_to(next) {
            warn!("Unexpected phase transition {:?} -> {:?}", *phase, next);
        }
        *phase = next;
    }

    fn take_pending(&self) -> Option<PendingAttempt> {
        self.pending.lock().expect("pending lock poisoned").take()
    }

    fn emit(&self, outcome: CheckoutOutcome) {
        if self.outcome_tx.send(outcome).is_err() {
            debug!("Outcome receiver dropped, outcome discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shop_core::{
        CaptureDetails, CheckoutSession, Currency, FlowKind, LineItem, PaymentFlow, Price,
        Product,
    };
    use std::sync::atomic::AtomicU32;
    use tokio::sync::Notify;

    fn cart_with_items() -> Arc<CartStore> {
        let cart = Arc::new(CartStore::new(Currency::GBP));
        let food = Product::new("1", "Emergency Food Package", 25.0);
        cart.add(&food);
        cart.add(&food);
        cart.add(&Product::new("2", "Medical Supplies Kit", 50.0));
        cart
    }

    /// Flow that counts calls and optionally blocks or fails
    struct TestFlow {
        calls: AtomicU32,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    impl TestFlow {
        fn ok() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: false,
                gate: None,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: true,
                gate: None,
            }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: false,
                gate: Some(gate),
            }
        }
    }

    #[async_trait]
    impl PaymentFlow for TestFlow {
        async fn create_order(&self, _session: &CheckoutSession) -> CheckoutResult<OrderHandoff> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(CheckoutError::SessionCreationFailed("HTTP 502".to_string()));
            }
            Ok(OrderHandoff::Redirect {
                url: "https://pay.example.com/cs_1".to_string(),
            })
        }

        fn flow_name(&self) -> &'static str {
            "test"
        }

        fn kind(&self) -> FlowKind {
            FlowKind::Redirect
        }
    }

    struct TestGateway {
        fail_capture: bool,
    }

    #[async_trait]
    impl crate::embedded::OrderGateway for TestGateway {
        async fn create_order(
            &self,
            _line_items: &[LineItem],
            _total: &Price,
        ) -> CheckoutResult<OrderHandle> {
            Ok(OrderHandle {
                id: "order-1".to_string(),
            })
        }

        async fn capture(&self, order: &OrderHandle) -> CheckoutResult<CaptureDetails> {
            if self.fail_capture {
                return Err(CheckoutError::ProviderApproval(
                    "INSTRUMENT_DECLINED".to_string(),
                ));
            }
            Ok(CaptureDetails {
                capture_id: format!("cap-{}", order.id),
                status: "COMPLETED".to_string(),
                payer_email: Some("buyer@example.com".to_string()),
            })
        }

        fn gateway_name(&self) -> &'static str {
            "test"
        }
    }

    #[tokio::test]
    async fn test_empty_cart_submit_makes_no_network_call() {
        let cart = Arc::new(CartStore::new(Currency::GBP));
        let flow = Arc::new(TestFlow::ok());
        let orchestrator = CheckoutOrchestrator::new(cart, flow.clone());

        let err = orchestrator.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(flow.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_submit_redirects_and_keeps_cart() {
        let cart = cart_with_items();
        let flow = Arc::new(TestFlow::ok());
        let orchestrator = CheckoutOrchestrator::new(cart.clone(), flow.clone());

        let handoff = orchestrator.submit().await.unwrap();
        match handoff {
            OrderHandoff::Redirect { url } => assert_eq!(url, "https://pay.example.com/cs_1"),
            other => panic!("expected redirect, got {:?}", other),
        }

        assert_eq!(orchestrator.phase(), CheckoutPhase::Redirected);
        // cart is cleared only on confirmed success
        assert_eq!(cart.item_count(), 3);
        assert_eq!(flow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_cart_and_allows_retry() {
        let cart = cart_with_items();
        let flow = Arc::new(TestFlow::failing());
        let orchestrator = CheckoutOrchestrator::new(cart.clone(), flow.clone());

        let err = orchestrator.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::SessionCreationFailed(_)));

        // cart unchanged, guard reset, retry reaches the backend again
        assert_eq!(cart.item_count(), 3);
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);

        let err = orchestrator.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::SessionCreationFailed(_)));
        assert_eq!(flow.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_double_submit_issues_one_network_call() {
        let cart = cart_with_items();
        let gate = Arc::new(Notify::new());
        let flow = Arc::new(TestFlow::gated(gate.clone()));
        let orchestrator = Arc::new(CheckoutOrchestrator::new(cart, flow.clone()));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit().await })
        };

        // let the first submission reach the gated backend call
        while flow.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let err = orchestrator.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::SubmissionInFlight));

        gate.notify_one();
        let handoff = first.await.unwrap().unwrap();
        assert!(matches!(handoff, OrderHandoff::Redirect { .. }));

        assert_eq!(flow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_redirect_success_clears_cart_and_emits_outcome() {
        let cart = cart_with_items();
        let orchestrator = CheckoutOrchestrator::new(cart.clone(), Arc::new(TestFlow::ok()));
        let mut outcomes = orchestrator.outcomes().unwrap();

        orchestrator.submit().await.unwrap();
        orchestrator.resolve_success();

        assert!(cart.is_empty());
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
        assert!(matches!(
            outcomes.recv().await,
            Some(CheckoutOutcome::Succeeded { capture: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_second_purchase_after_success() {
        let cart = cart_with_items();
        let flow = Arc::new(TestFlow::ok());
        let orchestrator = CheckoutOrchestrator::new(cart.clone(), flow.clone());

        orchestrator.submit().await.unwrap();
        orchestrator.resolve_success();
        assert!(cart.is_empty());

        // the customer shops again in the same session
        cart.add(&Product::new("2", "Medical Supplies Kit", 50.0));
        let handoff = orchestrator.submit().await.unwrap();

        assert!(matches!(handoff, OrderHandoff::Redirect { .. }));
        assert_eq!(flow.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_keeps_cart_and_returns_to_idle() {
        let cart = cart_with_items();
        let orchestrator = CheckoutOrchestrator::new(cart.clone(), Arc::new(TestFlow::ok()));
        let mut outcomes = orchestrator.outcomes().unwrap();

        orchestrator.submit().await.unwrap();
        orchestrator.resolve_cancel();

        assert_eq!(cart.item_count(), 3);
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
        assert!(matches!(
            outcomes.recv().await,
            Some(CheckoutOutcome::Cancelled { .. })
        ));

        // a new attempt may start
        assert!(orchestrator.submit().await.is_ok());
    }

    #[tokio::test]
    async fn test_embedded_approval_captures_and_clears_cart() {
        let cart = cart_with_items();
        let orchestrator = CheckoutOrchestrator::embedded(
            cart.clone(),
            Arc::new(TestGateway { fail_capture: false }),
        );
        let mut outcomes = orchestrator.outcomes().unwrap();

        let handoff = orchestrator.submit().await.unwrap();
        assert!(matches!(handoff, OrderHandoff::Approval { .. }));
        assert_eq!(orchestrator.phase(), CheckoutPhase::ApprovalPending);

        orchestrator.handle_approval().await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
        match outcomes.recv().await {
            Some(CheckoutOutcome::Succeeded { capture, .. }) => {
                assert_eq!(capture.unwrap().capture_id, "cap-order-1");
            }
            other => panic!("expected success outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embedded_capture_failure_keeps_cart() {
        let cart = cart_with_items();
        let orchestrator = CheckoutOrchestrator::embedded(
            cart.clone(),
            Arc::new(TestGateway { fail_capture: true }),
        );
        let mut outcomes = orchestrator.outcomes().unwrap();

        orchestrator.submit().await.unwrap();
        let err = orchestrator.handle_approval().await.unwrap_err();

        assert!(matches!(err, CheckoutError::ProviderApproval(_)));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
        assert!(matches!(
            outcomes.recv().await,
            Some(CheckoutOutcome::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn test_stray_approval_is_ignored() {
        let cart = cart_with_items();
        let orchestrator = CheckoutOrchestrator::embedded(
            cart.clone(),
            Arc::new(TestGateway { fail_capture: false }),
        );

        // no submission happened; approval must be a logged no-op
        orchestrator.handle_approval().await.unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_widget_error_before_approval_keeps_cart_and_allows_retry() {
        let cart = cart_with_items();
        let orchestrator = CheckoutOrchestrator::embedded(
            cart.clone(),
            Arc::new(TestGateway { fail_capture: false }),
        );
        let mut outcomes = orchestrator.outcomes().unwrap();

        orchestrator.submit().await.unwrap();
        assert_eq!(orchestrator.phase(), CheckoutPhase::ApprovalPending);

        // the widget's error callback fires instead of approval
        orchestrator.handle_approval_error("WINDOW_CLOSED");

        assert_eq!(cart.item_count(), 3);
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
        match outcomes.recv().await {
            Some(CheckoutOutcome::Failed { reason, .. }) => {
                assert_eq!(reason, "WINDOW_CLOSED");
            }
            other => panic!("expected failed outcome, got {:?}", other),
        }

        // retry reaches the provider again
        assert!(orchestrator.submit().await.is_ok());
    }

    #[tokio::test]
    async fn test_stray_approval_error_is_ignored() {
        let cart = cart_with_items();
        let orchestrator = CheckoutOrchestrator::embedded(
            cart.clone(),
            Arc::new(TestGateway { fail_capture: false }),
        );

        orchestrator.handle_approval_error("WINDOW_CLOSED");
        assert_eq!(cart.item_count(), 3);
        assert_eq!(orchestrator.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_for_kind_embedded_requires_gateway() {
        let err =
            CheckoutOrchestrator::for_kind(cart_with_items(), FlowKind::Embedded, None)
                .unwrap_err();
        assert!(matches!(err, CheckoutError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_for_kind_embedded_builds_widget_flow() {
        let orchestrator = CheckoutOrchestrator::for_kind(
            cart_with_items(),
            FlowKind::Embedded,
            Some(Arc::new(TestGateway { fail_capture: false })),
        )
        .unwrap();

        let handoff = orchestrator.submit().await.unwrap();
        assert!(matches!(handoff, OrderHandoff::Approval { .. }));
    }
}
