use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::assessment::domain::{
    Actor, HealthHistory, HistoryEntry, IntakeSubmission, OwnerId, Pattern, PhotoSet,
    PriorityDomain, Region, RequestId, ReviewerId, ShareToken, StatedComplaints,
};
use crate::workflows::assessment::lifecycle::LifecycleEvent;
use crate::workflows::assessment::repository::{
    AssessmentNotice, AssessmentRecord, AssessmentRepository, NoticeError, NoticePublisher,
    RepositoryError,
};
use crate::workflows::assessment::scoring::PointAssignment;
use crate::workflows::assessment::AssessmentService;

pub(super) fn submission(priority: PriorityDomain) -> IntakeSubmission {
    IntakeSubmission {
        owner: OwnerId("subject-17".to_string()),
        priority,
        complaints: StatedComplaints {
            primary: "Persistent neck tension".to_string(),
            secondary: Some("Trouble saying no at work".to_string()),
            tertiary: None,
        },
        photos: PhotoSet {
            front: "photos/17/front.jpg".to_string(),
            back: "photos/17/back.jpg".to_string(),
            left_profile: "photos/17/left.jpg".to_string(),
            right_profile: "photos/17/right.jpg".to_string(),
        },
        history: HealthHistory {
            surgeries: HistoryEntry {
                reported: true,
                detail: Some("Knee arthroscopy, 2019".to_string()),
            },
            traumas: HistoryEntry::default(),
            implants: HistoryEntry::default(),
        },
        amount_cents: 24_900,
    }
}

pub(super) fn reviewer() -> ReviewerId {
    ReviewerId("reviewer-ana".to_string())
}

pub(super) fn reviewer_actor() -> Actor {
    Actor::Reviewer(reviewer())
}

/// Initial point set whose totals come out 15/10/10/10/5 over a grand
/// total of 50, yielding shares of 30/20/20/20/10: the canonical tie-break
/// fixture where CONECTIVO, FORTE, and LIDER all land on 20%.
pub(super) fn tie_break_points() -> Vec<PointAssignment> {
    let spread: [(Pattern, [u8; 6]); 5] = [
        (Pattern::Criativo, [3, 3, 3, 3, 3, 0]),
        (Pattern::Conectivo, [2, 2, 2, 2, 2, 0]),
        (Pattern::Forte, [2, 2, 2, 2, 2, 0]),
        (Pattern::Lider, [2, 2, 2, 2, 2, 0]),
        (Pattern::Competitivo, [1, 1, 1, 1, 1, 0]),
    ];

    let mut points = Vec::new();
    for (pattern, row) in spread {
        for (region, value) in Region::ordered().into_iter().zip(row) {
            if value > 0 {
                points.push(PointAssignment {
                    pattern,
                    region,
                    value,
                });
            }
        }
    }
    points
}

/// Drive a fresh submission through payment and into review.
pub(super) fn in_review_request(
    service: &AssessmentService<MemoryRepository, MemoryNotices>,
    priority: PriorityDomain,
) -> RequestId {
    let record = service
        .submit_intake(submission(priority))
        .expect("intake accepted");
    let id = record.request.id;

    service
        .transition_status(
            id,
            LifecycleEvent::ConfirmPayment {
                processor_reference: "pay-001".to_string(),
            },
            &Actor::PaymentProcessor,
        )
        .expect("payment confirmed");
    service
        .transition_status(id, LifecycleEvent::StartReview, &reviewer_actor())
        .expect("review started");

    id
}

pub(super) fn build_service() -> (
    AssessmentService<MemoryRepository, MemoryNotices>,
    Arc<MemoryRepository>,
    Arc<MemoryNotices>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notices = Arc::new(MemoryNotices::default());
    let service = AssessmentService::new(repository.clone(), notices.clone());
    (service, repository, notices)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<RequestId, AssessmentRecord>>>,
}

impl AssessmentRepository for MemoryRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.request.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.request.id) {
            guard.insert(record.request.id, record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: RequestId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn find_by_token(
        &self,
        token: &ShareToken,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| &record.request.share_token == token)
            .cloned())
    }

    fn pending_review(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        use crate::workflows::assessment::domain::RequestStatus;
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut pending: Vec<AssessmentRecord> = guard
            .values()
            .filter(|record| record.request.status == RequestStatus::AwaitingReview)
            .cloned()
            .collect();
        pending.sort_by_key(|record| record.request.id);
        pending.truncate(limit);
        Ok(pending)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotices {
    events: Arc<Mutex<Vec<AssessmentNotice>>>,
}

impl MemoryNotices {
    pub(super) fn events(&self) -> Vec<AssessmentNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NoticePublisher for MemoryNotices {
    fn publish(&self, notice: AssessmentNotice) -> Result<(), NoticeError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct ConflictRepository;

impl AssessmentRepository for ConflictRepository {
    fn insert(&self, _record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: AssessmentRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: RequestId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(None)
    }

    fn find_by_token(
        &self,
        _token: &ShareToken,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(None)
    }

    fn pending_review(&self, _limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
