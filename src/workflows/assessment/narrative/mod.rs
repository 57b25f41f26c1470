//! Narrative composition engine: selects pre-authored fragments for the
//! ranked dominant patterns and concatenates them, scoped to the single
//! narrative axis matching the subject's declared priority domain.
//!
//! The engine applies no percentage cutoff beyond "rank is filled". The
//! ">50% cumulative significance" heuristic from the product documentation
//! and any per-slot display floor are presentation policy, owned by the
//! boundary layer (see `views::DisplayPolicy`).

pub(crate) mod library;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use library::FragmentLibrary;

use super::domain::{NarrativeAxis, Polarity, PriorityDomain, ReviewerId};
use super::scoring::{DerivedTotals, RankTier};

/// Composition preconditions surfaced to callers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NarrativeError {
    #[error("matrix has pending point changes; recompute before composing")]
    MatrixNotRecomputed,
    #[error("no ranked patterns available; score the matrix before composing")]
    NoRankedPatterns,
}

/// One narrative text per axis. Composition populates exactly one of the
/// three fields; the other two stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBundle {
    pub personal: String,
    pub relationships: String,
    pub professional: String,
}

impl AxisBundle {
    pub fn for_axis(&self, axis: NarrativeAxis) -> &str {
        match axis {
            NarrativeAxis::Personal => &self.personal,
            NarrativeAxis::Relationships => &self.relationships,
            NarrativeAxis::Professional => &self.professional,
        }
    }

    pub fn set_axis(&mut self, axis: NarrativeAxis, text: impl Into<String>) {
        let slot = match axis {
            NarrativeAxis::Personal => &mut self.personal,
            NarrativeAxis::Relationships => &mut self.relationships,
            NarrativeAxis::Professional => &mut self.professional,
        };
        *slot = text.into();
    }
}

/// Snapshot of one ranked pattern inside a result: label, share, and the
/// two polarity bundles. An unfilled rank keeps an empty label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSlot {
    pub pattern_label: String,
    pub percentage: u8,
    pub pain: AxisBundle,
    pub resource: AxisBundle,
}

impl RankSlot {
    pub fn is_filled(&self) -> bool {
        !self.pattern_label.is_empty()
    }

    fn bundle(&self, polarity: Polarity) -> &AxisBundle {
        match polarity {
            Polarity::Pain => &self.pain,
            Polarity::Resource => &self.resource,
        }
    }
}

/// Output of one composition run, before reviewer-owned fields join it in
/// the persisted result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub axis: NarrativeAxis,
    pub pain_state: String,
    pub resource_state: String,
    pub slots: [RankSlot; RankTier::COUNT],
}

/// Concatenate the slot fragments for one polarity in rank order, blank
/// line between fragments. Used both by composition and by the rebuild
/// after narrative overrides so the two can never disagree.
fn combined_state(
    slots: &[RankSlot; RankTier::COUNT],
    axis: NarrativeAxis,
    polarity: Polarity,
) -> String {
    let fragments: Vec<&str> = slots
        .iter()
        .filter(|slot| slot.is_filled())
        .map(|slot| slot.bundle(polarity).for_axis(axis))
        .filter(|text| !text.is_empty())
        .collect();

    fragments.join("\n\n")
}

/// Deterministic fragment selection over a derived ranking.
#[derive(Debug, Clone, Default)]
pub struct NarrativeComposer {
    library: FragmentLibrary,
}

impl NarrativeComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(library: FragmentLibrary) -> Self {
        Self { library }
    }

    /// Walk the ranks in order and collect each filled rank's fragments for
    /// the axis selected by the priority domain. Every filled rank
    /// contributes, regardless of its share.
    pub fn compose(
        &self,
        derived: &DerivedTotals,
        priority: PriorityDomain,
    ) -> Result<Composition, NarrativeError> {
        let ranking = derived.ranking();
        if ranking[0].is_none() {
            return Err(NarrativeError::NoRankedPatterns);
        }

        let axis = priority.axis();
        let mut slots: [RankSlot; RankTier::COUNT] = Default::default();

        for (slot, entry) in slots.iter_mut().zip(ranking) {
            if let Some(ranked) = entry {
                slot.pattern_label = ranked.pattern.label().to_string();
                slot.percentage = ranked.percentage;
                slot.pain.set_axis(
                    axis,
                    self.library.fragment(ranked.pattern, axis, Polarity::Pain),
                );
                slot.resource.set_axis(
                    axis,
                    self.library
                        .fragment(ranked.pattern, axis, Polarity::Resource),
                );
            }
        }

        let pain_state = combined_state(&slots, axis, Polarity::Pain);
        let resource_state = combined_state(&slots, axis, Polarity::Resource);

        Ok(Composition {
            axis,
            pain_state,
            resource_state,
            slots,
        })
    }
}

/// Reviewer-authored answers to the subject's stated complaints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintResponses {
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
}

/// Free-text commitment with a target date, authored during review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedAction {
    pub description: String,
    pub target_date: NaiveDate,
}

/// Hand-edit to one composed narrative, at (rank, polarity) granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeOverride {
    pub tier: RankTier,
    pub polarity: Polarity,
    pub text: String,
}

/// Reviewer edits, applied at field-group granularity: a group that is
/// absent from the edit leaves the stored group untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEdits {
    #[serde(default)]
    pub complaint_responses: Option<ComplaintResponses>,
    #[serde(default)]
    pub committed_actions: Option<[Option<CommittedAction>; 2]>,
    #[serde(default)]
    pub narrative_overrides: Vec<NarrativeOverride>,
}

/// The persisted result: composed narrative plus reviewer-owned fields.
///
/// Slot labels and percentages mirror the matrix ranking at the time of the
/// last (re)generation; the record is a snapshot, not a live view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub complaint_responses: ComplaintResponses,
    pub axis: NarrativeAxis,
    pub pain_state: String,
    pub resource_state: String,
    pub slots: [RankSlot; RankTier::COUNT],
    pub committed_actions: [Option<CommittedAction>; 2],
    pub generated_at: DateTime<Utc>,
    pub generated_by: ReviewerId,
    pub edited_at: Option<DateTime<Utc>>,
    pub edited_by: Option<ReviewerId>,
}

impl ResultRecord {
    pub fn from_composition(
        composition: Composition,
        reviewer: ReviewerId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            complaint_responses: ComplaintResponses::default(),
            axis: composition.axis,
            pain_state: composition.pain_state,
            resource_state: composition.resource_state,
            slots: composition.slots,
            committed_actions: [None, None],
            generated_at: now,
            generated_by: reviewer,
            edited_at: None,
            edited_by: None,
        }
    }

    /// Regeneration is total for the composed fields: narrative, axis, and
    /// rank snapshot are overwritten wholesale, discarding any hand-edits.
    /// Reviewer-owned fields (complaint responses, committed actions)
    /// survive.
    pub fn regenerate(
        &mut self,
        composition: Composition,
        reviewer: ReviewerId,
        now: DateTime<Utc>,
    ) {
        self.axis = composition.axis;
        self.pain_state = composition.pain_state;
        self.resource_state = composition.resource_state;
        self.slots = composition.slots;
        self.generated_at = now;
        self.generated_by = reviewer;
        self.edited_at = None;
        self.edited_by = None;
    }

    /// Apply reviewer edits. Narrative overrides rewrite the targeted slot
    /// fragment and rebuild the combined states from the slots, so the
    /// concatenations always reflect the stored fragments. Overrides
    /// against an unfilled rank are ignored.
    pub fn apply_edits(&mut self, edits: ResultEdits, reviewer: ReviewerId, now: DateTime<Utc>) {
        let ResultEdits {
            complaint_responses,
            committed_actions,
            narrative_overrides,
        } = edits;

        if let Some(responses) = complaint_responses {
            self.complaint_responses = responses;
        }
        if let Some(actions) = committed_actions {
            self.committed_actions = actions;
        }

        let axis = self.axis;
        for patch in narrative_overrides {
            let slot = &mut self.slots[patch.tier.index()];
            if !slot.is_filled() {
                continue;
            }
            match patch.polarity {
                Polarity::Pain => slot.pain.set_axis(axis, patch.text),
                Polarity::Resource => slot.resource.set_axis(axis, patch.text),
            }
        }

        self.pain_state = combined_state(&self.slots, axis, Polarity::Pain);
        self.resource_state = combined_state(&self.slots, axis, Polarity::Resource);
        self.edited_at = Some(now);
        self.edited_by = Some(reviewer);
    }
}
