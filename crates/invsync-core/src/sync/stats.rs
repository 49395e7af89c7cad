//! Per-entity operation counters for a sync pass

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::policy::EntityKind;

/// Insert/update/delete counters for one entity kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl EntityCounts {
    /// Sum of all three counters
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.inserted + self.updated + self.deleted
    }

    /// Check if nothing was counted
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Counters for every entity kind plus resolved conflicts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "StatsReport")]
pub struct SyncStats {
    counts: [EntityCounts; EntityKind::ALL.len()],
    conflicts_resolved: u64,
}

impl SyncStats {
    /// Create an empty set of counters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_inserted(&mut self, kind: EntityKind) {
        self.counts[kind.index()].inserted += 1;
    }

    pub fn record_updated(&mut self, kind: EntityKind) {
        self.counts[kind.index()].updated += 1;
    }

    pub fn record_deleted(&mut self, kind: EntityKind) {
        self.counts[kind.index()].deleted += 1;
    }

    pub fn record_conflict(&mut self) {
        self.conflicts_resolved += 1;
    }

    /// Fold the counters of one finished phase into the pass totals
    pub fn merge(&mut self, kind: EntityKind, counts: EntityCounts, conflicts: u64) {
        let slot = &mut self.counts[kind.index()];
        slot.inserted += counts.inserted;
        slot.updated += counts.updated;
        slot.deleted += counts.deleted;
        self.conflicts_resolved += conflicts;
    }

    /// Counters for a single kind
    #[must_use]
    pub const fn counts(&self, kind: EntityKind) -> EntityCounts {
        self.counts[kind.index()]
    }

    #[must_use]
    pub const fn inserted(&self, kind: EntityKind) -> u64 {
        self.counts[kind.index()].inserted
    }

    #[must_use]
    pub const fn updated(&self, kind: EntityKind) -> u64 {
        self.counts[kind.index()].updated
    }

    #[must_use]
    pub const fn deleted(&self, kind: EntityKind) -> u64 {
        self.counts[kind.index()].deleted
    }

    #[must_use]
    pub const fn conflicts_resolved(&self) -> u64 {
        self.conflicts_resolved
    }

    /// Inserts, updates, and deletes across every kind.
    ///
    /// Resolved conflicts are not operations of their own; each one is
    /// already counted as an update.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        self.counts.iter().map(EntityCounts::total).sum()
    }
}

/// Serialized shape of [`SyncStats`]: non-empty kinds keyed by name
#[derive(Serialize)]
struct StatsReport {
    entities: BTreeMap<EntityKind, EntityCounts>,
    conflicts_resolved: u64,
    total_operations: u64,
}

impl From<SyncStats> for StatsReport {
    fn from(stats: SyncStats) -> Self {
        let entities = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, stats.counts(kind)))
            .filter(|(_, counts)| !counts.is_empty())
            .collect();
        Self {
            entities,
            conflicts_resolved: stats.conflicts_resolved,
            total_operations: stats.total_operations(),
        }
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_any = false;
        for kind in EntityKind::ALL {
            let counts = self.counts(kind);
            if counts.is_empty() {
                continue;
            }
            if wrote_any {
                writeln!(f)?;
            }
            write!(
                f,
                "{kind}: {} new, {} updated",
                counts.inserted, counts.updated
            )?;
            if counts.deleted > 0 {
                write!(f, ", {} deleted", counts.deleted)?;
            }
            wrote_any = true;
        }
        if self.conflicts_resolved > 0 {
            if wrote_any {
                writeln!(f)?;
            }
            write!(f, "conflicts resolved: {}", self.conflicts_resolved)?;
            wrote_any = true;
        }
        if !wrote_any {
            f.write_str("no changes")?;
        }
        Ok(())
    }
}
