use std::sync::Arc;

use super::common::*;
use crate::workflows::assessment::domain::{
    HistoryEntry, HistoryTopic, Pattern, PhotoAngle, PriorityDomain, Region, RequestId,
    RequestStatus,
};
use crate::workflows::assessment::intake::IntakeError;
use crate::workflows::assessment::lifecycle::LifecycleEvent;
use crate::workflows::assessment::repository::{AssessmentRepository, RepositoryError};
use crate::workflows::assessment::service::{AssessmentService, AssessmentServiceError};

#[test]
fn intake_creates_an_awaiting_payment_request_with_a_share_token() {
    let (service, repository, _) = build_service();

    let record = service
        .submit_intake(submission(PriorityDomain::Relationships))
        .expect("intake accepted");

    assert_eq!(record.request.status, RequestStatus::AwaitingPayment);
    assert!(record.request.id.0 > 0);
    assert!(!record.request.share_token.0.is_empty());
    assert!(record.matrix.is_none());
    assert!(record.result.is_none());

    let stored = repository
        .fetch(record.request.id)
        .expect("fetch works")
        .expect("record persisted");
    assert_eq!(stored.request.share_token, record.request.share_token);
}

#[test]
fn intake_assigns_distinct_sequential_ids_and_tokens() {
    let (service, _, _) = build_service();

    let first = service
        .submit_intake(submission(PriorityDomain::Health))
        .expect("intake accepted");
    let second = service
        .submit_intake(submission(PriorityDomain::Health))
        .expect("intake accepted");

    assert!(second.request.id.0 > first.request.id.0);
    assert_ne!(first.request.share_token, second.request.share_token);
}

#[test]
fn intake_rejects_blank_primary_complaints() {
    let (service, _, _) = build_service();
    let mut payload = submission(PriorityDomain::Health);
    payload.complaints.primary = "   ".to_string();

    match service.submit_intake(payload) {
        Err(AssessmentServiceError::Intake(IntakeError::MissingPrimaryComplaint)) => {}
        other => panic!("expected intake rejection, got {other:?}"),
    }
}

#[test]
fn intake_rejects_incomplete_photo_sets() {
    let (service, _, _) = build_service();
    let mut payload = submission(PriorityDomain::Health);
    payload.photos.left_profile = String::new();

    match service.submit_intake(payload) {
        Err(AssessmentServiceError::Intake(IntakeError::MissingPhoto {
            angle: PhotoAngle::LeftProfile,
        })) => {}
        other => panic!("expected intake rejection, got {other:?}"),
    }
}

#[test]
fn intake_requires_detail_for_affirmed_history_flags() {
    let (service, _, _) = build_service();
    let mut payload = submission(PriorityDomain::Health);
    payload.history.traumas = HistoryEntry {
        reported: true,
        detail: None,
    };

    match service.submit_intake(payload) {
        Err(AssessmentServiceError::Intake(IntakeError::MissingHistoryDetail {
            topic: HistoryTopic::Traumas,
        })) => {}
        other => panic!("expected intake rejection, got {other:?}"),
    }
}

#[test]
fn intake_rejects_zero_amounts() {
    let (service, _, _) = build_service();
    let mut payload = submission(PriorityDomain::Health);
    payload.amount_cents = 0;

    match service.submit_intake(payload) {
        Err(AssessmentServiceError::Intake(IntakeError::ZeroAmount)) => {}
        other => panic!("expected intake rejection, got {other:?}"),
    }
}

#[test]
fn share_token_lookup_finds_the_aggregate() {
    let (service, _, _) = build_service();
    let record = service
        .submit_intake(submission(PriorityDomain::Health))
        .expect("intake accepted");

    let found = service
        .find_by_token(&record.request.share_token)
        .expect("lookup succeeds");
    assert_eq!(found.request.id, record.request.id);
}

#[test]
fn missing_requests_surface_not_found() {
    let (service, _, _) = build_service();

    match service.get(RequestId(u64::MAX)) {
        Err(AssessmentServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not-found, got {other:?}"),
    }
}

#[test]
fn full_review_runs_end_to_end() {
    let (service, _, notices) = build_service();
    let id = in_review_request(&service, PriorityDomain::Professional);

    let (_, adjustments) = service
        .open_scoring(id, reviewer(), &tie_break_points())
        .expect("scoring opened");
    assert!(adjustments.iter().all(|adjustment| !adjustment.clamped));

    service
        .set_matrix_notes(id, reviewer(), "Pronounced trunk and leg holding")
        .expect("notes stored");
    let derived = service.recompute_matrix(id).expect("recompute runs");
    assert_eq!(derived.grand_total(), 50);

    let result = service
        .compose_narrative(id, reviewer())
        .expect("narrative composed");
    assert!(!result.pain_state.is_empty());
    assert!(!result.resource_state.is_empty());

    let completed = service
        .transition_status(
            id,
            LifecycleEvent::Complete,
            &reviewer_actor(),
        )
        .expect("completion accepted");
    assert_eq!(completed.request.status, RequestStatus::Completed);
    assert!(completed.request.has_result);
    assert_eq!(notices.events().len(), 1);

    let matrix = completed.matrix.expect("matrix persisted");
    assert_eq!(matrix.notes(), "Pronounced trunk and leg holding");
    assert_eq!(matrix.scored_by(), Some(&reviewer()));
}

#[test]
fn scoring_is_read_only_after_completion() {
    let (service, _, _) = build_service();
    let id = in_review_request(&service, PriorityDomain::Health);
    service
        .open_scoring(id, reviewer(), &tie_break_points())
        .expect("scoring opened");
    service.recompute_matrix(id).expect("recompute runs");
    service
        .compose_narrative(id, reviewer())
        .expect("narrative composed");
    service
        .transition_status(id, LifecycleEvent::Complete, &reviewer_actor())
        .expect("completion accepted");

    match service.set_matrix_point(id, reviewer(), Pattern::Forte, Region::Feet, 2) {
        Err(AssessmentServiceError::ReviewNotActive { status }) => {
            assert_eq!(status, RequestStatus::Completed);
        }
        other => panic!("expected review gate, got {other:?}"),
    }
}

#[test]
fn editing_an_uncomposed_result_fails() {
    let (service, _, _) = build_service();
    let id = in_review_request(&service, PriorityDomain::Health);
    service
        .open_scoring(id, reviewer(), &tie_break_points())
        .expect("scoring opened");

    match service.edit_result(id, reviewer(), Default::default()) {
        Err(AssessmentServiceError::ResultNotComposed) => {}
        other => panic!("expected missing-result rejection, got {other:?}"),
    }
}

#[test]
fn insert_conflicts_propagate_from_the_repository() {
    let service = AssessmentService::new(
        Arc::new(ConflictRepository),
        Arc::new(MemoryNotices::default()),
    );

    match service.submit_intake(submission(PriorityDomain::Health)) {
        Err(AssessmentServiceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}
