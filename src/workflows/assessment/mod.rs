//! Reviewer-scored body-pattern assessments: intake, payment-gated
//! lifecycle, constrained point scoring, and narrative composition.
//!
//! One request's aggregate (request + score matrix + result) is the unit of
//! consistency; every mutation loads the aggregate, applies the change, and
//! persists it in a single repository write.

pub mod domain;
pub(crate) mod intake;
pub(crate) mod lifecycle;
pub mod narrative;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, AnalysisRequest, HealthHistory, HistoryEntry, HistoryTopic, IntakeSubmission,
    NarrativeAxis, OwnerId, Pattern, PhotoAngle, PhotoSet, Polarity, PriorityDomain, Region,
    RequestId, RequestStatus, ReviewerId, ShareToken, StatedComplaints,
};
pub use intake::IntakeError;
pub use lifecycle::{LifecycleError, LifecycleEvent};
pub use narrative::{
    AxisBundle, CommittedAction, ComplaintResponses, Composition, FragmentLibrary,
    NarrativeComposer, NarrativeError, NarrativeOverride, RankSlot, ResultEdits, ResultRecord,
};
pub use repository::{
    AssessmentNotice, AssessmentRecord, AssessmentRepository, NoticeError, NoticePublisher,
    RepositoryError,
};
pub use router::assessment_router;
pub use scoring::{
    DerivedTotals, MatrixRecord, PointAdjustment, PointAssignment, RankTier, RankedPattern,
    ScoringError, REGION_BUDGET,
};
pub use service::{AssessmentService, AssessmentServiceError};
pub use views::{AssessmentView, DerivedView, DisplayPolicy, MatrixView, ResultView};
