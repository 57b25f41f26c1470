use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    Actor, IntakeSubmission, Pattern, Region, RequestId, RequestStatus, ReviewerId, ShareToken,
};
use super::intake::{IntakeError, IntakeGuard};
use super::lifecycle::{self, LifecycleError, LifecycleEvent};
use super::narrative::{
    FragmentLibrary, NarrativeComposer, NarrativeError, ResultEdits, ResultRecord,
};
use super::repository::{
    AssessmentNotice, AssessmentRecord, AssessmentRepository, NoticeError, NoticePublisher,
    RepositoryError,
};
use super::scoring::{
    DerivedTotals, MatrixRecord, PointAdjustment, PointAssignment, ScoringError,
};

/// Service facade composing the intake guard, lifecycle state machine,
/// scoring engine, and narrative composer over one repository seam.
pub struct AssessmentService<R, N> {
    intake: IntakeGuard,
    repository: Arc<R>,
    notices: Arc<N>,
    composer: Arc<NarrativeComposer>,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    RequestId(REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

impl<R, N> AssessmentService<R, N>
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    pub fn new(repository: Arc<R>, notices: Arc<N>) -> Self {
        Self::with_library(repository, notices, FragmentLibrary::builtin())
    }

    pub fn with_library(repository: Arc<R>, notices: Arc<N>, library: FragmentLibrary) -> Self {
        Self {
            intake: IntakeGuard,
            repository,
            notices,
            composer: Arc::new(NarrativeComposer::with_library(library)),
        }
    }

    /// Create a request from a wizard submission. The request starts in
    /// awaiting-payment with a fresh share token and the next sequential id.
    pub fn submit_intake(
        &self,
        submission: IntakeSubmission,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let mut request = self.intake.request_from_submission(submission)?;
        request.id = next_request_id();

        let stored = self.repository.insert(AssessmentRecord::new(request))?;
        Ok(stored)
    }

    pub fn get(&self, id: RequestId) -> Result<AssessmentRecord, AssessmentServiceError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Public lookup used by shared links.
    pub fn find_by_token(
        &self,
        token: &ShareToken,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let record = self
            .repository
            .find_by_token(token)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Apply a lifecycle event. Guards run against the persisted status and
    /// the whole aggregate commits in one repository write; completion
    /// additionally emits a result-ready notice.
    pub fn transition_status(
        &self,
        id: RequestId,
        event: LifecycleEvent,
        actor: &Actor,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let mut record = self.load(id)?;

        lifecycle::apply_event(
            &mut record.request,
            &event,
            actor,
            record.result.is_some(),
            Utc::now(),
        )?;
        self.repository.update(record.clone())?;

        if matches!(event, LifecycleEvent::Complete) {
            let mut details = BTreeMap::new();
            details.insert(
                "status".to_string(),
                record.request.status.label().to_string(),
            );
            details.insert(
                "share_token".to_string(),
                record.request.share_token.0.clone(),
            );
            self.notices.publish(AssessmentNotice {
                template: "result_ready".to_string(),
                request_id: record.request.id,
                details,
            })?;
        }

        Ok(record)
    }

    /// Show or hide a completed result without touching the status.
    pub fn set_result_visibility(
        &self,
        id: RequestId,
        visible: bool,
        _actor: &Actor,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let mut record = self.load(id)?;

        lifecycle::set_result_visibility(&mut record.request, visible, record.result.is_some())?;
        self.repository.update(record.clone())?;
        Ok(record)
    }

    /// First entry into the scoring step: creates the matrix, empty or
    /// seeded from an initial point set. Reopening returns the stored
    /// matrix unchanged.
    pub fn open_scoring(
        &self,
        id: RequestId,
        reviewer: ReviewerId,
        initial: &[PointAssignment],
    ) -> Result<(MatrixRecord, Vec<PointAdjustment>), AssessmentServiceError> {
        let mut record = self.load(id)?;
        Self::review_gate(&record)?;

        if let Some(existing) = &record.matrix {
            return Ok((existing.clone(), Vec::new()));
        }

        let (matrix, adjustments) = MatrixRecord::with_initial(initial, reviewer)?;
        record.matrix = Some(matrix.clone());
        self.repository.update(record)?;

        Ok((matrix, adjustments))
    }

    /// One cell write, clamp-and-report semantics. The accepted write and
    /// the cleared derived snapshot persist together.
    pub fn set_matrix_point(
        &self,
        id: RequestId,
        reviewer: ReviewerId,
        pattern: Pattern,
        region: Region,
        value: u8,
    ) -> Result<PointAdjustment, AssessmentServiceError> {
        let mut record = self.load(id)?;
        Self::review_gate(&record)?;

        let matrix = Self::opened_matrix(&mut record)?;
        let adjustment = matrix.set_point(pattern, region, value, reviewer)?;
        self.repository.update(record)?;

        Ok(adjustment)
    }

    pub fn set_matrix_notes(
        &self,
        id: RequestId,
        reviewer: ReviewerId,
        notes: impl Into<String>,
    ) -> Result<MatrixRecord, AssessmentServiceError> {
        let mut record = self.load(id)?;
        Self::review_gate(&record)?;

        let matrix = Self::opened_matrix(&mut record)?;
        matrix.set_notes(notes, reviewer);
        let stored = matrix.clone();
        self.repository.update(record)?;

        Ok(stored)
    }

    /// Explicit recompute of totals, shares, and ranks.
    pub fn recompute_matrix(
        &self,
        id: RequestId,
    ) -> Result<DerivedTotals, AssessmentServiceError> {
        let mut record = self.load(id)?;
        Self::review_gate(&record)?;

        let matrix = Self::opened_matrix(&mut record)?;
        let derived = matrix.recompute();
        self.repository.update(record)?;

        Ok(derived)
    }

    /// Compose the narrative from the current derived ranking, creating the
    /// result or regenerating it wholesale. Requires an explicit recompute
    /// since the last point write.
    pub fn compose_narrative(
        &self,
        id: RequestId,
        reviewer: ReviewerId,
    ) -> Result<ResultRecord, AssessmentServiceError> {
        let mut record = self.load(id)?;
        Self::review_gate(&record)?;

        let priority = record.request.priority;
        let matrix = Self::opened_matrix(&mut record)?;
        let derived = matrix
            .derived()
            .ok_or(NarrativeError::MatrixNotRecomputed)?;
        let composition = self.composer.compose(derived, priority)?;

        let now = Utc::now();
        let result = match record.result.take() {
            Some(mut existing) => {
                existing.regenerate(composition, reviewer, now);
                existing
            }
            None => ResultRecord::from_composition(composition, reviewer, now),
        };

        record.result = Some(result.clone());
        self.repository.update(record)?;

        Ok(result)
    }

    /// Reviewer edits to the result, at field-group granularity.
    pub fn edit_result(
        &self,
        id: RequestId,
        reviewer: ReviewerId,
        edits: ResultEdits,
    ) -> Result<ResultRecord, AssessmentServiceError> {
        let mut record = self.load(id)?;
        Self::review_gate(&record)?;

        let result = record
            .result
            .as_mut()
            .ok_or(AssessmentServiceError::ResultNotComposed)?;
        result.apply_edits(edits, reviewer, Utc::now());
        let stored = result.clone();
        self.repository.update(record)?;

        Ok(stored)
    }

    fn load(&self, id: RequestId) -> Result<AssessmentRecord, AssessmentServiceError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Scoring and narrative work only while a reviewer holds the request
    /// in review; afterwards the aggregate is read-only apart from the
    /// visibility toggle.
    fn review_gate(record: &AssessmentRecord) -> Result<(), AssessmentServiceError> {
        if record.request.status != RequestStatus::InReview {
            return Err(AssessmentServiceError::ReviewNotActive {
                status: record.request.status,
            });
        }
        Ok(())
    }

    fn opened_matrix(
        record: &mut AssessmentRecord,
    ) -> Result<&mut MatrixRecord, AssessmentServiceError> {
        record
            .matrix
            .as_mut()
            .ok_or(AssessmentServiceError::ScoringNotOpened)
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notice(#[from] NoticeError),
    #[error("scoring requires an in-review request (status is {status})")]
    ReviewNotActive { status: RequestStatus },
    #[error("scoring has not been opened for this request")]
    ScoringNotOpened,
    #[error("no result has been composed for this request")]
    ResultNotComposed,
}
