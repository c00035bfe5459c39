//! # Payment Flow Contract
//!
//! One capability, two variants: every provider integration boils down to
//! "create an order and resolve a completion outcome". The redirect variant
//! hands back a URL for the browser; the embedded variant hands back an
//! order handle that the provider widget drives to approval.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              PaymentFlow (trait)             │
//! │  └── create_order(session) -> OrderHandoff   │
//! └──────────────────────────────────────────────┘
//!                       ▲
//!            ┌──────────┴──────────┐
//!            │                     │
//!    ┌───────┴───────┐    ┌────────┴────────┐
//!    │ RedirectFlow  │    │  EmbeddedFlow   │
//!    │ (hosted page) │    │ (in-page widget)│
//!    └───────────────┘    └─────────────────┘
//! ```

use crate::error::CheckoutResult;
use crate::session::CheckoutSession;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which checkout variant the orchestrator should use.
///
/// Selected by configuration, not by duplicated code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Backend creates the order; the browser is navigated to a
    /// provider-hosted payment page
    Redirect,
    /// A provider-supplied widget creates the order and reports approval
    /// in-page
    Embedded,
}

impl Default for FlowKind {
    fn default() -> Self {
        FlowKind::Redirect
    }
}

/// Opaque handle for a provider-side order (embedded flow)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHandle {
    /// Provider-assigned order identifier
    pub id: String,
}

/// Result of capturing an approved order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDetails {
    /// Provider-assigned capture identifier
    pub capture_id: String,

    /// Provider-reported capture status (e.g., "COMPLETED")
    pub status: String,

    /// Payer email if the provider shares it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
}

/// What the provider handed back after order creation
#[derive(Debug, Clone)]
pub enum OrderHandoff {
    /// Navigate the browser to this provider-hosted URL
    Redirect { url: String },

    /// The widget owns the rest of the flow; approval arrives later
    Approval { order: OrderHandle },
}

/// Terminal outcome of a checkout attempt, delivered on the orchestrator's
/// outcome channel rather than as a fire-and-forget side effect.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Payment confirmed; the cart has been cleared
    Succeeded {
        session_id: String,
        capture: Option<CaptureDetails>,
    },
    /// The customer backed out; the cart is intact
    Cancelled { session_id: String },
    /// Session creation or approval failed; the cart is intact and retry
    /// is allowed
    Failed { session_id: String, reason: String },
}

/// State of a single checkout attempt.
///
/// `Failed` and `Cancelled` return control to `Idle` with the cart intact;
/// `Succeeded` clears the cart and ends the attempt. All three return to
/// `Idle` so the next attempt in the same session can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    Idle,
    Submitting,
    SessionCreated,
    Redirected,
    ApprovalPending,
    Succeeded,
    Cancelled,
    Failed,
}

impl CheckoutPhase {
    /// True if a new submission may start from this phase
    pub fn can_submit(&self) -> bool {
        matches!(self, CheckoutPhase::Idle)
    }

    /// True if the attempt has reached its terminal success state
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutPhase::Succeeded)
    }

    /// Whether the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: CheckoutPhase) -> bool {
        use CheckoutPhase::*;
        matches!(
            (self, next),
            (Idle, Submitting)
                | (Submitting, SessionCreated)
                | (Submitting, Failed)
                | (SessionCreated, Redirected)
                | (SessionCreated, ApprovalPending)
                | (Redirected, Succeeded)
                | (Redirected, Cancelled)
                | (ApprovalPending, Succeeded)
                | (ApprovalPending, Cancelled)
                | (ApprovalPending, Failed)
                | (Succeeded, Idle)
                | (Failed, Idle)
                | (Cancelled, Idle)
        )
    }
}

impl Default for CheckoutPhase {
    fn default() -> Self {
        CheckoutPhase::Idle
    }
}

/// Core trait for provider checkout variants.
///
/// Implementations issue exactly one order-creation request per call; the
/// orchestrator guards re-entry so duplicate provider-side orders cannot be
/// created by a double submit.
#[async_trait]
pub trait PaymentFlow: Send + Sync {
    /// Create a provider-side order for this session and hand back either a
    /// redirect URL or an order handle.
    async fn create_order(&self, session: &CheckoutSession) -> CheckoutResult<OrderHandoff>;

    /// Flow name for logging
    fn flow_name(&self) -> &'static str;

    /// Which variant this flow implements
    fn kind(&self) -> FlowKind;
}

/// Type alias for a shared payment flow (dynamic dispatch)
pub type SharedPaymentFlow = Arc<dyn PaymentFlow>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_only_from_idle() {
        assert!(CheckoutPhase::Idle.can_submit());
        assert!(!CheckoutPhase::Submitting.can_submit());
        assert!(!CheckoutPhase::Redirected.can_submit());
    }

    #[test]
    fn test_every_terminal_phase_returns_to_idle() {
        // the next attempt in the same session must always be able to start
        assert!(CheckoutPhase::Failed.can_transition_to(CheckoutPhase::Idle));
        assert!(CheckoutPhase::Cancelled.can_transition_to(CheckoutPhase::Idle));
        assert!(CheckoutPhase::Succeeded.can_transition_to(CheckoutPhase::Idle));
    }

    #[test]
    fn test_happy_paths() {
        use CheckoutPhase::*;
        // redirect flow
        for (from, to) in [
            (Idle, Submitting),
            (Submitting, SessionCreated),
            (SessionCreated, Redirected),
            (Redirected, Succeeded),
        ] {
            assert!(from.can_transition_to(to), "{:?} -> {:?}", from, to);
        }
        // embedded flow
        assert!(SessionCreated.can_transition_to(ApprovalPending));
        assert!(ApprovalPending.can_transition_to(Succeeded));
    }

    #[test]
    fn test_no_skipping_submission() {
        assert!(!CheckoutPhase::Idle.can_transition_to(CheckoutPhase::Redirected));
        assert!(!CheckoutPhase::Idle.can_transition_to(CheckoutPhase::Succeeded));
    }
}
