use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Actor, AnalysisRequest, RequestStatus};

/// External events that can move a request through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LifecycleEvent {
    /// Payment confirmed by the external processor.
    ConfirmPayment { processor_reference: String },
    /// Reviewer override for payments settled outside the processor.
    ApprovePaymentManually,
    StartReview,
    Complete,
    Cancel,
}

impl LifecycleEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            LifecycleEvent::ConfirmPayment { .. } => "confirm-payment",
            LifecycleEvent::ApprovePaymentManually => "approve-payment-manually",
            LifecycleEvent::StartReview => "start-review",
            LifecycleEvent::Complete => "complete",
            LifecycleEvent::Cancel => "cancel",
        }
    }
}

/// Guard failures. `InvalidTransition` always names the status the request
/// was actually in; neither variant is ever silently swallowed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("event {event} is not legal while the request is {current}")]
    InvalidTransition {
        event: &'static str,
        current: RequestStatus,
    },
    #[error("precondition failed: {reason}")]
    PreconditionFailed { reason: &'static str },
}

fn invalid(event: &LifecycleEvent, current: RequestStatus) -> LifecycleError {
    LifecycleError::InvalidTransition {
        event: event.label(),
        current,
    }
}

/// Apply one event against the request as currently persisted. The caller
/// passes a mutable copy of the aggregate and persists it in a single
/// repository write afterwards, so guard evaluation and the applied side
/// effects commit together or not at all.
pub(crate) fn apply_event(
    request: &mut AnalysisRequest,
    event: &LifecycleEvent,
    actor: &Actor,
    result_exists: bool,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    match event {
        LifecycleEvent::ConfirmPayment {
            processor_reference,
        } => {
            if request.status != RequestStatus::AwaitingPayment {
                return Err(invalid(event, request.status));
            }
            request.payment_reference = Some(processor_reference.clone());
            request.status = RequestStatus::AwaitingReview;
        }
        LifecycleEvent::ApprovePaymentManually => {
            if request.status != RequestStatus::AwaitingPayment {
                return Err(invalid(event, request.status));
            }
            request.status = RequestStatus::AwaitingReview;
        }
        LifecycleEvent::StartReview => {
            if request.status != RequestStatus::AwaitingReview {
                return Err(invalid(event, request.status));
            }
            // Audit only; concurrent reviewers are not locked out.
            request.reviewed_by = actor.reviewer().cloned();
            request.status = RequestStatus::InReview;
        }
        LifecycleEvent::Complete => {
            if request.status != RequestStatus::InReview {
                return Err(invalid(event, request.status));
            }
            if !result_exists {
                return Err(LifecycleError::PreconditionFailed {
                    reason: "cannot complete without a result",
                });
            }
            request.status = RequestStatus::Completed;
            request.has_result = true;
            request.completed_at = Some(now);
        }
        LifecycleEvent::Cancel => {
            if request.status.is_terminal() {
                return Err(invalid(event, request.status));
            }
            // Soft delete: dependent matrix/result records are retained and
            // physical erasure waits for the retention job's grace period.
            request.status = RequestStatus::Cancelled;
            request.cancelled_at = Some(now);
        }
    }

    Ok(())
}

/// Show/hide a completed result independently of status transitions.
/// Showing a result that does not exist is a data-dependency failure.
pub(crate) fn set_result_visibility(
    request: &mut AnalysisRequest,
    visible: bool,
    result_exists: bool,
) -> Result<(), LifecycleError> {
    if visible && !result_exists {
        return Err(LifecycleError::PreconditionFailed {
            reason: "no result exists to show",
        });
    }

    request.has_result = visible;
    Ok(())
}
