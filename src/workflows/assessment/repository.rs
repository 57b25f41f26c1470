use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{AnalysisRequest, RequestId, ShareToken};
use super::narrative::ResultRecord;
use super::scoring::MatrixRecord;

/// One request's consistency unit: the request plus its optional matrix and
/// result. Repositories persist the whole aggregate in one write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub request: AnalysisRequest,
    pub matrix: Option<MatrixRecord>,
    pub result: Option<ResultRecord>,
}

impl AssessmentRecord {
    pub fn new(request: AnalysisRequest) -> Self {
        Self {
            request,
            matrix: None,
            result: None,
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
/// Writes are atomic per aggregate.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError>;
    fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: RequestId) -> Result<Option<AssessmentRecord>, RepositoryError>;
    fn find_by_token(&self, token: &ShareToken)
        -> Result<Option<AssessmentRecord>, RepositoryError>;
    /// Work queue seam for the (external) reviewer dashboard: requests
    /// sitting in awaiting-review, oldest first.
    fn pending_review(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("assessment already recorded")]
    Conflict,
    #[error("assessment not found")]
    NotFound,
    #[error("assessment store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (e-mail, messaging adapters); exercised at
/// the seam in tests.
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: AssessmentNotice) -> Result<(), NoticeError>;
}

/// Notification payload emitted on lifecycle milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentNotice {
    pub template: String,
    pub request_id: RequestId,
    pub details: BTreeMap<String, String>,
}

/// Notice dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}
