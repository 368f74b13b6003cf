//! Graph mutation counters reported by the database

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// The eleven mutation counters, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterKind {
    NodesCreated,
    NodesDeleted,
    RelationshipsCreated,
    RelationshipsDeleted,
    PropertiesSet,
    LabelsAdded,
    LabelsRemoved,
    IndexesAdded,
    IndexesRemoved,
    ConstraintsAdded,
    ConstraintsRemoved,
}

impl CounterKind {
    /// Every counter in the order summaries list them
    pub const ALL: [CounterKind; 11] = [
        CounterKind::NodesCreated,
        CounterKind::NodesDeleted,
        CounterKind::RelationshipsCreated,
        CounterKind::RelationshipsDeleted,
        CounterKind::PropertiesSet,
        CounterKind::LabelsAdded,
        CounterKind::LabelsRemoved,
        CounterKind::IndexesAdded,
        CounterKind::IndexesRemoved,
        CounterKind::ConstraintsAdded,
        CounterKind::ConstraintsRemoved,
    ];

    /// Pluralizable noun used in summaries, e.g. "node(s)"
    pub fn noun(&self) -> &'static str {
        match self {
            Self::NodesCreated | Self::NodesDeleted => "node(s)",
            Self::RelationshipsCreated | Self::RelationshipsDeleted => "relationship(s)",
            Self::PropertiesSet => "property(ies)",
            Self::LabelsAdded | Self::LabelsRemoved => "label(s)",
            Self::IndexesAdded | Self::IndexesRemoved => "index(es)",
            Self::ConstraintsAdded | Self::ConstraintsRemoved => "constraint(s)",
        }
    }

    /// Past-tense verb used in summaries, e.g. "created"
    pub fn verb(&self) -> &'static str {
        match self {
            Self::NodesCreated | Self::RelationshipsCreated => "created",
            Self::NodesDeleted | Self::RelationshipsDeleted => "deleted",
            Self::PropertiesSet => "set",
            Self::LabelsAdded | Self::IndexesAdded | Self::ConstraintsAdded => "added",
            Self::LabelsRemoved | Self::IndexesRemoved | Self::ConstraintsRemoved => "removed",
        }
    }
}

/// Additive record of graph mutation counts.
///
/// Drivers report one of these per executed statement; the engine folds
/// them into a run-level total. Missing fields deserialize as zero so a
/// partial update from a driver is a valid value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryCounters {
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_created: u64,
    pub relationships_deleted: u64,
    pub properties_set: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
    pub indexes_added: u64,
    pub indexes_removed: u64,
    pub constraints_added: u64,
    pub constraints_removed: u64,
}

impl QueryCounters {
    /// All counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a single counter
    pub fn get(&self, kind: CounterKind) -> u64 {
        match kind {
            CounterKind::NodesCreated => self.nodes_created,
            CounterKind::NodesDeleted => self.nodes_deleted,
            CounterKind::RelationshipsCreated => self.relationships_created,
            CounterKind::RelationshipsDeleted => self.relationships_deleted,
            CounterKind::PropertiesSet => self.properties_set,
            CounterKind::LabelsAdded => self.labels_added,
            CounterKind::LabelsRemoved => self.labels_removed,
            CounterKind::IndexesAdded => self.indexes_added,
            CounterKind::IndexesRemoved => self.indexes_removed,
            CounterKind::ConstraintsAdded => self.constraints_added,
            CounterKind::ConstraintsRemoved => self.constraints_removed,
        }
    }

    /// Builder-style setter, mostly useful for drivers and tests
    pub fn with(mut self, kind: CounterKind, value: u64) -> Self {
        *self.slot_mut(kind) = value;
        self
    }

    /// Element-wise saturating addition
    pub fn add(&mut self, other: &QueryCounters) {
        for kind in CounterKind::ALL {
            let slot = self.slot_mut(kind);
            *slot = slot.saturating_add(other.get(kind));
        }
    }

    /// True when every counter is zero
    pub fn is_empty(&self) -> bool {
        CounterKind::ALL.iter().all(|kind| self.get(*kind) == 0)
    }

    /// Non-zero counters in reporting order
    pub fn non_zero(&self) -> impl Iterator<Item = (CounterKind, u64)> + '_ {
        CounterKind::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .filter(|(_, value)| *value > 0)
    }

    fn slot_mut(&mut self, kind: CounterKind) -> &mut u64 {
        match kind {
            CounterKind::NodesCreated => &mut self.nodes_created,
            CounterKind::NodesDeleted => &mut self.nodes_deleted,
            CounterKind::RelationshipsCreated => &mut self.relationships_created,
            CounterKind::RelationshipsDeleted => &mut self.relationships_deleted,
            CounterKind::PropertiesSet => &mut self.properties_set,
            CounterKind::LabelsAdded => &mut self.labels_added,
            CounterKind::LabelsRemoved => &mut self.labels_removed,
            CounterKind::IndexesAdded => &mut self.indexes_added,
            CounterKind::IndexesRemoved => &mut self.indexes_removed,
            CounterKind::ConstraintsAdded => &mut self.constraints_added,
            CounterKind::ConstraintsRemoved => &mut self.constraints_removed,
        }
    }
}

impl AddAssign<&QueryCounters> for QueryCounters {
    fn add_assign(&mut self, rhs: &QueryCounters) {
        self.add(rhs);
    }
}

/// Summary the database returns after running a statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Mutation counters for this statement
    pub counters: QueryCounters,
}

impl RunSummary {
    /// Summary with the given counters
    pub fn with_counters(counters: QueryCounters) -> Self {
        Self { counters }
    }
}
