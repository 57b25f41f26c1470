use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::matrix::ScoreMatrix;
use crate::workflows::assessment::domain::Pattern;

/// The three rank positions a dominant pattern can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
    Primary,
    Secondary,
    Tertiary,
}

impl RankTier {
    pub const COUNT: usize = 3;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [RankTier::Primary, RankTier::Secondary, RankTier::Tertiary]
    }

    pub const fn label(self) -> &'static str {
        match self {
            RankTier::Primary => "primary",
            RankTier::Secondary => "secondary",
            RankTier::Tertiary => "tertiary",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// One filled rank position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPattern {
    pub tier: RankTier,
    pub pattern: Pattern,
    pub percentage: u8,
}

/// Totals, percentage shares, and rank assignments derived from a raw point
/// matrix. Instances are produced only by [`derive`], so persisted derived
/// state can never drift from the points it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedTotals {
    totals: [u16; Pattern::COUNT],
    grand_total: u16,
    percentages: [u8; Pattern::COUNT],
    primary: Option<Pattern>,
    secondary: Option<Pattern>,
    tertiary: Option<Pattern>,
}

impl DerivedTotals {
    pub fn total(&self, pattern: Pattern) -> u16 {
        self.totals[pattern.index()]
    }

    pub fn grand_total(&self) -> u16 {
        self.grand_total
    }

    pub fn percentage(&self, pattern: Pattern) -> u8 {
        self.percentages[pattern.index()]
    }

    pub fn rank(&self, tier: RankTier) -> Option<Pattern> {
        match tier {
            RankTier::Primary => self.primary,
            RankTier::Secondary => self.secondary,
            RankTier::Tertiary => self.tertiary,
        }
    }

    /// Rank label for display; unfilled ranks render as the empty string.
    pub fn rank_label(&self, tier: RankTier) -> &'static str {
        self.rank(tier).map(Pattern::label).unwrap_or("")
    }

    pub fn ranking(&self) -> [Option<RankedPattern>; RankTier::COUNT] {
        RankTier::ordered().map(|tier| {
            self.rank(tier).map(|pattern| RankedPattern {
                tier,
                pattern,
                percentage: self.percentage(pattern),
            })
        })
    }
}

/// Pure recomputation of derived fields from the raw matrix. Calling it
/// twice without intervening writes yields identical output.
pub(crate) fn derive(matrix: &ScoreMatrix) -> DerivedTotals {
    let ordered = Pattern::ordered();
    let totals = ordered.map(|pattern| matrix.pattern_total(pattern));
    let grand_total: u16 = totals.iter().sum();

    let percentages = if grand_total == 0 {
        [0; Pattern::COUNT]
    } else {
        share_percentages(&totals, grand_total)
    };

    // Stable sort: equal percentages keep the fixed enumeration order, which
    // is the documented tie-break.
    let mut by_share = ordered;
    by_share.sort_by_key(|pattern| Reverse(percentages[pattern.index()]));

    let mut filled = by_share
        .into_iter()
        .filter(|pattern| percentages[pattern.index()] > 0);

    DerivedTotals {
        totals,
        grand_total,
        percentages,
        primary: filled.next(),
        secondary: filled.next(),
        tertiary: filled.next(),
    }
}

/// Largest-remainder allocation: floor each share, then hand the leftover
/// points to the largest fractional remainders, ties again resolved by
/// enumeration order. Guarantees the shares sum to exactly 100 whenever the
/// grand total is positive.
fn share_percentages(totals: &[u16; Pattern::COUNT], grand_total: u16) -> [u8; Pattern::COUNT] {
    let grand = u32::from(grand_total);
    let mut shares = [0u8; Pattern::COUNT];
    let mut remainders = [(0u32, 0usize); Pattern::COUNT];
    let mut allocated: u32 = 0;

    for (index, total) in totals.iter().enumerate() {
        let scaled = u32::from(*total) * 100;
        shares[index] = (scaled / grand) as u8;
        remainders[index] = (scaled % grand, index);
        allocated += u32::from(shares[index]);
    }

    remainders.sort_by_key(|&(remainder, _)| Reverse(remainder));

    let mut leftover = 100 - allocated;
    for &(_, index) in remainders.iter() {
        if leftover == 0 {
            break;
        }
        shares[index] += 1;
        leftover -= 1;
    }

    shares
}
