//! Last-write-wins conflict resolution over optional modification timestamps.
//!
//! Everything here is pure: no I/O, no clock reads. Timestamps are Unix ms.

use serde::{Deserialize, Serialize};

use crate::util::format_timestamp_ms;

/// Which copy of a record a sync pass should keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The source copy is newer; overwrite the destination
    UseSource,
    /// The destination copy is newer (or the source is unstamped); leave it
    UseDest,
    /// Nothing to reconcile
    NoConflict,
}

impl Resolution {
    /// The resolution seen from the other side of the pass
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::UseSource => Self::UseDest,
            Self::UseDest => Self::UseSource,
            Self::NoConflict => Self::NoConflict,
        }
    }
}

/// Decide between a source and a destination copy of the same record.
///
/// A stamped record is never overwritten by an unstamped one, and equal
/// timestamps mean both copies are already in sync.
#[must_use]
pub fn resolve(source_updated_at: Option<i64>, dest_updated_at: Option<i64>) -> Resolution {
    match (source_updated_at, dest_updated_at) {
        (None, None) => Resolution::NoConflict,
        (None, Some(_)) => Resolution::UseDest,
        (Some(_), None) => Resolution::UseSource,
        (Some(source), Some(dest)) => match source.cmp(&dest) {
            std::cmp::Ordering::Greater => Resolution::UseSource,
            std::cmp::Ordering::Less => Resolution::UseDest,
            std::cmp::Ordering::Equal => Resolution::NoConflict,
        },
    }
}

/// True when both copies are stamped and the stamps differ.
///
/// Used for reporting only; it says nothing about which side won.
#[must_use]
pub fn has_conflict(a: Option<i64>, b: Option<i64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

/// Human-readable explanation of what [`resolve`] decides for the pair
#[must_use]
pub fn describe(source_updated_at: Option<i64>, dest_updated_at: Option<i64>) -> String {
    match resolve(source_updated_at, dest_updated_at) {
        Resolution::UseSource => format!(
            "using source copy (newer: {})",
            format_stamp(source_updated_at)
        ),
        Resolution::UseDest => format!(
            "keeping destination copy (newer: {})",
            format_stamp(dest_updated_at)
        ),
        Resolution::NoConflict if source_updated_at.is_none() => {
            "no conflict (neither copy has an update time)".to_string()
        }
        Resolution::NoConflict => "no conflict (same update time)".to_string(),
    }
}

fn format_stamp(stamp: Option<i64>) -> String {
    stamp.map_or_else(|| "never".to_string(), format_timestamp_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [Option<i64>; 5] = [None, Some(0), Some(1_000), Some(1_001), Some(i64::MAX)];

    #[test]
    fn test_both_absent_is_no_conflict() {
        assert_eq!(resolve(None, None), Resolution::NoConflict);
    }

    #[test]
    fn test_unstamped_source_never_overwrites() {
        assert_eq!(resolve(None, Some(5)), Resolution::UseDest);
        assert_eq!(resolve(Some(5), None), Resolution::UseSource);
    }

    #[test]
    fn test_later_timestamp_wins() {
        assert_eq!(resolve(Some(2_000), Some(1_000)), Resolution::UseSource);
        assert_eq!(resolve(Some(1_000), Some(2_000)), Resolution::UseDest);
        assert_eq!(resolve(Some(1_000), Some(1_000)), Resolution::NoConflict);
    }

    #[test]
    fn test_resolve_is_antisymmetric() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(resolve(a, b), resolve(b, a).swapped(), "a={a:?} b={b:?}");
                assert_eq!(resolve(a, b), resolve(a, b));
            }
        }
    }

    #[test]
    fn test_has_conflict_requires_two_distinct_stamps() {
        assert!(!has_conflict(None, None));
        assert!(!has_conflict(Some(1), None));
        assert!(!has_conflict(None, Some(1)));
        assert!(!has_conflict(Some(1), Some(1)));
        assert!(has_conflict(Some(1), Some(2)));
        assert!(has_conflict(Some(2), Some(1)));
    }

    #[test]
    fn test_describe_names_the_winner() {
        assert!(describe(Some(0), None).starts_with("using source copy"));
        assert!(describe(Some(0), None).contains("1970-01-01 00:00:00.000 UTC"));
        assert!(describe(None, Some(0)).starts_with("keeping destination copy"));
        assert_eq!(describe(Some(3), Some(3)), "no conflict (same update time)");
        assert_eq!(
            describe(None, None),
            "no conflict (neither copy has an update time)"
        );
    }
}
