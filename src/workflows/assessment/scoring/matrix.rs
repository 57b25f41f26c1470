use serde::{Deserialize, Serialize};

use crate::workflows::assessment::domain::{Pattern, Region};

/// Maximum number of points a single region can distribute across the five
/// patterns; also the upper bound for any single cell.
pub const REGION_BUDGET: u8 = 10;

/// Rejection for raw values outside the cell range. Clamping never raises
/// this: a value inside the range that exceeds the region's remaining
/// headroom is reduced, not refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("point value {value} is outside the 0..={REGION_BUDGET} cell range")]
    ValueOutOfRange { value: u8 },
}

/// One requested cell write, used for initial point sets and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAssignment {
    pub pattern: Pattern,
    pub region: Region,
    pub value: u8,
}

/// Outcome of an accepted cell write, reporting any downward clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAdjustment {
    pub pattern: Pattern,
    pub region: Region,
    pub requested: u8,
    pub applied: u8,
    pub clamped: bool,
}

/// Explicit finite 5x6 point map. Every cell is addressed through the
/// `Pattern`/`Region` enums; there is no string-keyed field access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreMatrix {
    points: [[u8; Region::COUNT]; Pattern::COUNT],
}

impl ScoreMatrix {
    pub fn point(&self, pattern: Pattern, region: Region) -> u8 {
        self.points[pattern.index()][region.index()]
    }

    /// Sum of one region's points across all five patterns; bounded by the
    /// region budget after every accepted write.
    pub fn region_sum(&self, region: Region) -> u8 {
        Pattern::ordered()
            .iter()
            .map(|pattern| self.points[pattern.index()][region.index()])
            .sum()
    }

    /// Raw total for one pattern across all six regions.
    pub fn pattern_total(&self, pattern: Pattern) -> u16 {
        self.points[pattern.index()]
            .iter()
            .copied()
            .map(u16::from)
            .sum()
    }

    /// Apply one cell write. Values above the cell range are rejected;
    /// values that overflow the region budget are clamped down to the
    /// remaining headroom and the adjustment is reported to the caller.
    pub(crate) fn apply(
        &mut self,
        pattern: Pattern,
        region: Region,
        value: u8,
    ) -> Result<PointAdjustment, ScoringError> {
        if value > REGION_BUDGET {
            return Err(ScoringError::ValueOutOfRange { value });
        }

        let other_patterns = self.region_sum(region) - self.point(pattern, region);
        let headroom = REGION_BUDGET - other_patterns;
        let applied = value.min(headroom);
        self.points[pattern.index()][region.index()] = applied;

        Ok(PointAdjustment {
            pattern,
            region,
            requested: value,
            applied,
            clamped: applied != value,
        })
    }
}
