use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal sequential identifier; owner-visible ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Opaque identifier embedded in links shared with the subject; never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareToken(pub String);

impl ShareToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

/// Reference to the user who requested the assessment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

/// Reference to a reviewer working a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewerId(pub String);

/// Authenticated party attempting a lifecycle operation. Threaded explicitly
/// through every mutation so audit fields never fall back to a global
/// reviewer constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Owner(OwnerId),
    Reviewer(ReviewerId),
    PaymentProcessor,
}

impl Actor {
    pub fn reviewer(&self) -> Option<&ReviewerId> {
        match self {
            Actor::Reviewer(id) => Some(id),
            _ => None,
        }
    }
}

/// The five archetype patterns scored against body regions. Declaration
/// order is the system-wide tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pattern {
    Criativo,
    Conectivo,
    Forte,
    Lider,
    Competitivo,
}

impl Pattern {
    pub const COUNT: usize = 5;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Pattern::Criativo,
            Pattern::Conectivo,
            Pattern::Forte,
            Pattern::Lider,
            Pattern::Competitivo,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Pattern::Criativo => "CRIATIVO",
            Pattern::Conectivo => "CONECTIVO",
            Pattern::Forte => "FORTE",
            Pattern::Lider => "LIDER",
            Pattern::Competitivo => "COMPETITIVO",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// The six photo-visible body areas used as point-allocation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Head,
    Eyes,
    Mouth,
    Trunk,
    Legs,
    Feet,
}

impl Region {
    pub const COUNT: usize = 6;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Region::Head,
            Region::Eyes,
            Region::Mouth,
            Region::Trunk,
            Region::Legs,
            Region::Feet,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Region::Head => "head",
            Region::Eyes => "eyes",
            Region::Mouth => "mouth",
            Region::Trunk => "trunk",
            Region::Legs => "legs",
            Region::Feet => "feet",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Life area the subject declared as their current focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityDomain {
    Health,
    Relationships,
    Professional,
}

impl PriorityDomain {
    pub const fn label(self) -> &'static str {
        match self {
            PriorityDomain::Health => "health",
            PriorityDomain::Relationships => "relationships",
            PriorityDomain::Professional => "professional",
        }
    }

    /// Fixed lookup from declared priority to the narrative axis that gets
    /// expanded; health maps onto the personal axis.
    pub const fn axis(self) -> NarrativeAxis {
        match self {
            PriorityDomain::Health => NarrativeAxis::Personal,
            PriorityDomain::Relationships => NarrativeAxis::Relationships,
            PriorityDomain::Professional => NarrativeAxis::Professional,
        }
    }
}

/// One of the three domain-scoped text fields carried by every narrative
/// bundle; exactly one axis is expanded per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeAxis {
    Personal,
    Relationships,
    Professional,
}

impl NarrativeAxis {
    pub const COUNT: usize = 3;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            NarrativeAxis::Personal,
            NarrativeAxis::Relationships,
            NarrativeAxis::Professional,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            NarrativeAxis::Personal => "personal",
            NarrativeAxis::Relationships => "relationships",
            NarrativeAxis::Professional => "professional",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// The two authored polarities per pattern per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Pain,
    Resource,
}

impl Polarity {
    pub const COUNT: usize = 2;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [Polarity::Pain, Polarity::Resource]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Polarity::Pain => "pain",
            Polarity::Resource => "resource",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Request lifecycle status. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    AwaitingPayment,
    AwaitingReview,
    InReview,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            RequestStatus::AwaitingPayment,
            RequestStatus::AwaitingReview,
            RequestStatus::InReview,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::AwaitingPayment => "awaiting-payment",
            RequestStatus::AwaitingReview => "awaiting-review",
            RequestStatus::InReview => "in-review",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Up to three free-text complaints; the first is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatedComplaints {
    pub primary: String,
    pub secondary: Option<String>,
    pub tertiary: Option<String>,
}

/// The four photographic views collected at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoAngle {
    Front,
    Back,
    LeftProfile,
    RightProfile,
}

impl PhotoAngle {
    pub const fn label(self) -> &'static str {
        match self {
            PhotoAngle::Front => "front",
            PhotoAngle::Back => "back",
            PhotoAngle::LeftProfile => "left-profile",
            PhotoAngle::RightProfile => "right-profile",
        }
    }
}

impl fmt::Display for PhotoAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Storage keys for the four photographs; the store itself is external.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSet {
    pub front: String,
    pub back: String,
    pub left_profile: String,
    pub right_profile: String,
}

impl PhotoSet {
    pub fn references(&self) -> [(PhotoAngle, &str); 4] {
        [
            (PhotoAngle::Front, self.front.as_str()),
            (PhotoAngle::Back, self.back.as_str()),
            (PhotoAngle::LeftProfile, self.left_profile.as_str()),
            (PhotoAngle::RightProfile, self.right_profile.as_str()),
        ]
    }
}

/// Topics covered by the boolean+detail history questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryTopic {
    Surgeries,
    Traumas,
    Implants,
}

impl HistoryTopic {
    pub const fn label(self) -> &'static str {
        match self {
            HistoryTopic::Surgeries => "surgeries",
            HistoryTopic::Traumas => "traumas",
            HistoryTopic::Implants => "implants",
        }
    }
}

impl fmt::Display for HistoryTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Answer to one history question; detail is required once reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub reported: bool,
    pub detail: Option<String>,
}

/// Self-reported surgery/trauma/implanted-device history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthHistory {
    pub surgeries: HistoryEntry,
    pub traumas: HistoryEntry,
    pub implants: HistoryEntry,
}

impl HealthHistory {
    pub fn entries(&self) -> [(HistoryTopic, &HistoryEntry); 3] {
        [
            (HistoryTopic::Surgeries, &self.surgeries),
            (HistoryTopic::Traumas, &self.traumas),
            (HistoryTopic::Implants, &self.implants),
        ]
    }
}

/// Raw intake payload collected by the (external) wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeSubmission {
    pub owner: OwnerId,
    pub priority: PriorityDomain,
    pub complaints: StatedComplaints,
    pub photos: PhotoSet,
    pub history: HealthHistory,
    pub amount_cents: u32,
}

/// One subject's analysis job. Requests are never hard-deleted by user
/// action; cancellation records a grace-period timestamp and leaves erasure
/// to an out-of-band retention job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub id: RequestId,
    pub share_token: ShareToken,
    pub owner: OwnerId,
    pub priority: PriorityDomain,
    pub complaints: StatedComplaints,
    pub photos: PhotoSet,
    pub history: HealthHistory,
    pub amount_cents: u32,
    pub payment_reference: Option<String>,
    pub has_result: bool,
    pub status: RequestStatus,
    pub reviewed_by: Option<ReviewerId>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl AnalysisRequest {
    pub const PURGE_GRACE_DAYS: i64 = 30;

    /// Earliest instant the retention job may physically erase a cancelled
    /// request; `None` while the request is not cancelled.
    pub fn purge_eligible_after(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
            .map(|at| at + Duration::days(Self::PURGE_GRACE_DAYS))
    }
}
