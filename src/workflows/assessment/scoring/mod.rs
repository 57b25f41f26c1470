//! Constrained scoring engine: bounded point allocation per region and
//! explicit, pure recomputation of totals, shares, and dominant-pattern
//! ranks. Recomputation is never triggered implicitly, so a reviewer's raw
//! entries are never reshuffled by a background process.

pub(crate) mod matrix;
pub(crate) mod ranking;

use serde::{Deserialize, Serialize};

pub use matrix::{PointAdjustment, PointAssignment, ScoreMatrix, ScoringError, REGION_BUDGET};
pub use ranking::{DerivedTotals, RankTier, RankedPattern};

use crate::workflows::assessment::domain::{Pattern, Region, ReviewerId};

/// The scoring aggregate attached to a request once a reviewer opens the
/// scoring step: raw points, optional derived fields, and reviewer notes.
///
/// Derived fields are a snapshot of the last explicit recompute; any
/// accepted point write clears them so they can never be observed out of
/// sync with the raw matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRecord {
    matrix: ScoreMatrix,
    derived: Option<DerivedTotals>,
    notes: String,
    scored_by: Option<ReviewerId>,
}

impl MatrixRecord {
    /// Empty matrix, the "not yet scored" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matrix seeded from an initial point set, applying the same
    /// validation and clamping as interactive writes, in submission order.
    pub fn with_initial(
        initial: &[PointAssignment],
        reviewer: ReviewerId,
    ) -> Result<(Self, Vec<PointAdjustment>), ScoringError> {
        let mut record = Self::new();
        let mut adjustments = Vec::with_capacity(initial.len());

        for assignment in initial {
            let adjustment =
                record
                    .matrix
                    .apply(assignment.pattern, assignment.region, assignment.value)?;
            adjustments.push(adjustment);
        }

        record.scored_by = Some(reviewer);
        Ok((record, adjustments))
    }

    /// Accepted writes invalidate the derived snapshot until the next
    /// explicit recompute.
    pub fn set_point(
        &mut self,
        pattern: Pattern,
        region: Region,
        value: u8,
        reviewer: ReviewerId,
    ) -> Result<PointAdjustment, ScoringError> {
        let adjustment = self.matrix.apply(pattern, region, value)?;
        self.derived = None;
        self.scored_by = Some(reviewer);
        Ok(adjustment)
    }

    /// Notes are not part of the raw point matrix and leave the derived
    /// snapshot intact.
    pub fn set_notes(&mut self, notes: impl Into<String>, reviewer: ReviewerId) {
        self.notes = notes.into();
        self.scored_by = Some(reviewer);
    }

    /// Explicit recompute; stores and returns the derived snapshot.
    pub fn recompute(&mut self) -> DerivedTotals {
        let derived = ranking::derive(&self.matrix);
        self.derived = Some(derived.clone());
        derived
    }

    pub fn derived(&self) -> Option<&DerivedTotals> {
        self.derived.as_ref()
    }

    pub fn point(&self, pattern: Pattern, region: Region) -> u8 {
        self.matrix.point(pattern, region)
    }

    pub fn region_sum(&self, region: Region) -> u8 {
        self.matrix.region_sum(region)
    }

    pub fn pattern_total(&self, pattern: Pattern) -> u16 {
        self.matrix.pattern_total(pattern)
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn scored_by(&self) -> Option<&ReviewerId> {
        self.scored_by.as_ref()
    }
}
