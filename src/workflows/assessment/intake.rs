use chrono::Utc;

use super::domain::{
    AnalysisRequest, HealthHistory, HistoryEntry, HistoryTopic, IntakeSubmission, PhotoAngle,
    RequestId, RequestStatus, ShareToken, StatedComplaints,
};

/// Validation errors raised while turning a wizard submission into a
/// request aggregate.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("the primary complaint is mandatory and must not be blank")]
    MissingPrimaryComplaint,
    #[error("photo reference for the {angle} view is missing")]
    MissingPhoto { angle: PhotoAngle },
    #[error("history reports {topic} but carries no detail")]
    MissingHistoryDetail { topic: HistoryTopic },
    #[error("the billed amount must be greater than zero")]
    ZeroAmount,
}

/// Guard responsible for producing `AnalysisRequest` aggregates from raw
/// submissions. Requests always start in `awaiting-payment` with a freshly
/// generated share token; the service assigns the sequential id.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn request_from_submission(
        &self,
        submission: IntakeSubmission,
    ) -> Result<AnalysisRequest, IntakeError> {
        let IntakeSubmission {
            owner,
            priority,
            complaints,
            photos,
            history,
            amount_cents,
        } = submission;

        let primary = complaints.primary.trim();
        if primary.is_empty() {
            return Err(IntakeError::MissingPrimaryComplaint);
        }

        for (angle, reference) in photos.references() {
            if reference.trim().is_empty() {
                return Err(IntakeError::MissingPhoto { angle });
            }
        }

        for (topic, entry) in history.entries() {
            if entry.reported && trimmed(entry.detail.as_deref()).is_none() {
                return Err(IntakeError::MissingHistoryDetail { topic });
            }
        }

        if amount_cents == 0 {
            return Err(IntakeError::ZeroAmount);
        }

        let complaints = StatedComplaints {
            primary: primary.to_string(),
            secondary: normalized(complaints.secondary),
            tertiary: normalized(complaints.tertiary),
        };

        let history = HealthHistory {
            surgeries: normalized_entry(history.surgeries),
            traumas: normalized_entry(history.traumas),
            implants: normalized_entry(history.implants),
        };

        Ok(AnalysisRequest {
            id: RequestId(0),
            share_token: ShareToken::generate(),
            owner,
            priority,
            complaints,
            photos,
            history,
            amount_cents,
            payment_reference: None,
            has_result: false,
            status: RequestStatus::AwaitingPayment,
            reviewed_by: None,
            created_at: Utc::now(),
            completed_at: None,
            cancelled_at: None,
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

/// Blank optional complaints collapse to `None` so storage never carries
/// whitespace-only entries.
fn normalized(value: Option<String>) -> Option<String> {
    trimmed(value.as_deref()).map(str::to_string)
}

fn normalized_entry(entry: HistoryEntry) -> HistoryEntry {
    HistoryEntry {
        reported: entry.reported,
        detail: normalized(entry.detail),
    }
}
