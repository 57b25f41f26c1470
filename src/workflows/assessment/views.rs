use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Pattern, Region, RequestId};
use super::narrative::{CommittedAction, ComplaintResponses, ResultRecord};
use super::repository::AssessmentRecord;
use super::scoring::{DerivedTotals, MatrixRecord, RankTier};

/// Presentation dial for narrative rendering. The composition engine
/// includes every filled rank; boundaries use the floor to decide which
/// slots deserve the reader's attention.
#[derive(Debug, Clone, Copy)]
pub struct DisplayPolicy {
    pub floor_pct: u8,
}

impl DisplayPolicy {
    pub fn below_floor(&self, percentage: u8) -> bool {
        percentage < self.floor_pct
    }
}

impl Default for DisplayPolicy {
    fn default() -> Self {
        Self { floor_pct: 10 }
    }
}

/// Sanitized aggregate view returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentView {
    pub request_id: RequestId,
    pub share_token: String,
    pub status: &'static str,
    pub priority: &'static str,
    pub amount_cents: u32,
    pub has_result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_eligible_after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
}

impl AssessmentView {
    pub fn from_record(record: &AssessmentRecord, display: DisplayPolicy) -> Self {
        let request = &record.request;

        Self {
            request_id: request.id,
            share_token: request.share_token.0.clone(),
            status: request.status.label(),
            priority: request.priority.label(),
            amount_cents: request.amount_cents,
            has_result: request.has_result,
            payment_reference: request.payment_reference.clone(),
            reviewed_by: request.reviewed_by.as_ref().map(|id| id.0.clone()),
            created_at: request.created_at,
            completed_at: request.completed_at,
            cancelled_at: request.cancelled_at,
            purge_eligible_after: request.purge_eligible_after(),
            matrix: record.matrix.as_ref().map(MatrixView::from_record),
            result: record
                .result
                .as_ref()
                .map(|result| ResultView::from_result(result, display)),
        }
    }
}

/// Raw matrix rows plus the derived snapshot when one is current.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixView {
    pub regions: [&'static str; Region::COUNT],
    pub rows: Vec<MatrixRowView>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scored_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixRowView {
    pub pattern: &'static str,
    pub points: [u8; Region::COUNT],
}

impl MatrixView {
    pub fn from_record(matrix: &MatrixRecord) -> Self {
        let regions = Region::ordered().map(Region::label);
        let rows = Pattern::ordered()
            .iter()
            .map(|&pattern| MatrixRowView {
                pattern: pattern.label(),
                points: Region::ordered().map(|region| matrix.point(pattern, region)),
            })
            .collect();

        Self {
            regions,
            rows,
            notes: matrix.notes().to_string(),
            scored_by: matrix.scored_by().map(|id| id.0.clone()),
            derived: matrix.derived().map(DerivedView::from_derived),
        }
    }
}

/// Derived totals and ranking; unfilled rank labels render as empty
/// strings.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedView {
    pub grand_total: u16,
    pub shares: Vec<PatternShareView>,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub tertiary: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternShareView {
    pub pattern: &'static str,
    pub total: u16,
    pub percentage: u8,
}

impl DerivedView {
    pub fn from_derived(derived: &DerivedTotals) -> Self {
        let shares = Pattern::ordered()
            .iter()
            .map(|&pattern| PatternShareView {
                pattern: pattern.label(),
                total: derived.total(pattern),
                percentage: derived.percentage(pattern),
            })
            .collect();

        Self {
            grand_total: derived.grand_total(),
            shares,
            primary: derived.rank_label(RankTier::Primary),
            secondary: derived.rank_label(RankTier::Secondary),
            tertiary: derived.rank_label(RankTier::Tertiary),
        }
    }
}

/// Result snapshot scoped to the expanded axis, with display-floor flags
/// computed for the boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub axis: &'static str,
    pub pain_state: String,
    pub resource_state: String,
    pub slots: Vec<RankSlotView>,
    pub complaint_responses: ComplaintResponses,
    pub committed_actions: [Option<CommittedAction>; 2],
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankSlotView {
    pub tier: &'static str,
    pub pattern: String,
    pub percentage: u8,
    pub below_display_floor: bool,
    pub pain: String,
    pub resource: String,
}

impl ResultView {
    pub fn from_result(result: &ResultRecord, display: DisplayPolicy) -> Self {
        let axis = result.axis;
        let slots = RankTier::ordered()
            .iter()
            .map(|&tier| {
                let slot = &result.slots[tier.index()];
                RankSlotView {
                    tier: tier.label(),
                    pattern: slot.pattern_label.clone(),
                    percentage: slot.percentage,
                    below_display_floor: display.below_floor(slot.percentage),
                    pain: slot.pain.for_axis(axis).to_string(),
                    resource: slot.resource.for_axis(axis).to_string(),
                }
            })
            .collect();

        Self {
            axis: axis.label(),
            pain_state: result.pain_state.clone(),
            resource_state: result.resource_state.clone(),
            slots,
            complaint_responses: result.complaint_responses.clone(),
            committed_actions: result.committed_actions.clone(),
            generated_at: result.generated_at,
            generated_by: result.generated_by.0.clone(),
            edited_by: result.edited_by.as_ref().map(|id| id.0.clone()),
        }
    }
}
