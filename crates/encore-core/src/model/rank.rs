use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// A playlist year, e.g. `2023`.
pub type Year = i32;

/// Points for a rank are `RANK_POINTS_CEILING - rank`, floored at zero.
const RANK_POINTS_CEILING: u32 = 101;

/// A 1-based position within a year's playlist.
///
/// Absence from a playlist is never a `Rank`; it is modelled as
/// `Option<Rank>::None` or a missing map entry. Only the tabular snapshots
/// encode absence as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(NonZeroU32);

impl Rank {
    /// Returns `None` for position `0`.
    #[must_use]
    pub const fn new(position: u32) -> Option<Self> {
        match NonZeroU32::new(position) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Score contribution of this rank: 100 for rank 1 down to 1 for rank
    /// 100. Ranks past 100 contribute nothing.
    #[must_use]
    pub const fn points(self) -> u32 {
        RANK_POINTS_CEILING.saturating_sub(self.0.get())
    }

    /// Whether this rank falls in the top `threshold` positions.
    #[must_use]
    pub const fn is_within(self, threshold: u32) -> bool {
        self.0.get() <= threshold
    }

    /// Whether this rank is numerically smaller (better) than `other`.
    #[must_use]
    pub const fn beats(self, other: Self) -> bool {
        self.0.get() < other.0.get()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_zero_is_absent() {
        assert!(Rank::new(0).is_none());
        assert_eq!(Rank::new(7).map(Rank::get), Some(7));
    }

    #[test]
    fn test_rank_points() {
        assert_eq!(Rank::new(1).unwrap().points(), 100);
        assert_eq!(Rank::new(7).unwrap().points(), 94);
        assert_eq!(Rank::new(100).unwrap().points(), 1);
        assert_eq!(Rank::new(101).unwrap().points(), 0);
        assert_eq!(Rank::new(250).unwrap().points(), 0);
    }

    #[test]
    fn test_rank_is_within() {
        let rank = Rank::new(10).unwrap();
        assert!(rank.is_within(10));
        assert!(!rank.is_within(9));
    }

    #[test]
    fn test_rank_beats_is_numeric_less_than() {
        let third = Rank::new(3).unwrap();
        let fifth = Rank::new(5).unwrap();
        assert!(third.beats(fifth));
        assert!(!fifth.beats(third));
        assert!(!third.beats(third));
    }

    #[test]
    fn test_rank_serializes_as_number() {
        let rank = Rank::new(42).unwrap();
        assert_eq!(serde_json::to_string(&rank).unwrap(), "42");
        assert!(serde_json::from_str::<Rank>("0").is_err());
    }
}
