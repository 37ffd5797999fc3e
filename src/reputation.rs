//! Reputation scoring over a user's recorded activity in the target
//! repository.

/// Result of a single sub-metric fetch. A failed lookup degrades to zero
/// instead of aborting the whole record, but stays distinguishable from a
/// true zero so callers and logs can see which fields were degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Value(T),
    Degraded(String),
}

impl<T> Fetched<T> {
    pub fn degraded(reason: impl std::fmt::Display) -> Self {
        Fetched::Degraded(reason.to_string())
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded(_))
    }
}

impl<T: Copy + Default> Fetched<T> {
    pub fn value(&self) -> T {
        match self {
            Fetched::Value(value) => *value,
            Fetched::Degraded(_) => T::default(),
        }
    }
}

/// Partition of a user's pull requests by their one current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrCounts {
    pub merged: u32,
    pub open: u32,
    pub closed: u32,
}

impl PrCounts {
    pub fn record(&mut self, merged: bool, open: bool) {
        if merged {
            self.merged += 1;
        } else if open {
            self.open += 1;
        } else {
            self.closed += 1;
        }
    }
}

/// `+1` / `-1` reactions left by core-team members on the user's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreReactions {
    pub thumbs_up: u32,
    pub thumbs_down: u32,
}

impl CoreReactions {
    pub fn is_empty(&self) -> bool {
        self.thumbs_up == 0 && self.thumbs_down == 0
    }
}

/// A user's activity in the target repository, rebuilt from the live
/// platform on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub prs: Fetched<PrCounts>,
    pub issues_created: Fetched<u32>,
    /// Approximate upper bound (threads the user commented in), not an
    /// exact comment tally.
    pub comments: Fetched<u32>,
    pub reactions: Fetched<CoreReactions>,
    /// Open issues currently assigned to the user; `None` when untracked.
    pub assigned_open: Option<u32>,
}

impl Default for ActivityRecord {
    fn default() -> Self {
        Self {
            prs: Fetched::Value(PrCounts::default()),
            issues_created: Fetched::Value(0),
            comments: Fetched::Value(0),
            reactions: Fetched::Value(CoreReactions::default()),
            assigned_open: None,
        }
    }
}

/// The fixed point formula. Comments are informational only and negative
/// totals are meaningful.
pub fn score(record: &ActivityRecord) -> i64 {
    let prs = record.prs.value();
    let reactions = record.reactions.value();

    i64::from(prs.merged) * 20 + i64::from(prs.open) * 3 - i64::from(prs.closed) * 10
        + i64::from(record.issues_created.value()) * 5
        + i64::from(reactions.thumbs_up) * 15
        - i64::from(reactions.thumbs_down) * 50
}

/// One ranked entry of a thread summary.
#[derive(Debug, Clone)]
pub struct ParticipantScore {
    pub login: String,
    pub score: i64,
    pub record: ActivityRecord,
}
