//! Reconciled game state.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative state folded from a journal.
///
/// Owned by the dispatch task; every other component only ever sees a
/// [`StateSnapshot`] copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledState {
    /// Missions currently held. Not clamped at zero.
    pub active_missions: i64,
    /// Mission id to "already resolved" marker, used for deduplication.
    pub logged_missions: HashMap<u64, bool>,
    /// Missions redirected or completed since the last `Missions` snapshot.
    ///
    /// Outlives the `logged_missions` entry so a repeated completion is
    /// still recognised after the id has been dropped.
    pub resolved_missions: HashSet<u64>,
    /// Sum of bounty rewards, in credits.
    pub total_pirate_reward: u64,
    /// Number of bounties collected.
    pub killed_pirates: u64,
    /// Sum of mission rewards, in credits.
    pub total_mission_reward: u64,
    /// Timestamp of the last `Missions` snapshot seen.
    pub last_missions_snapshot: Option<DateTime<Utc>>,
}

impl ReconciledState {
    /// Create a zeroed state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a mission has already been redirected or completed.
    #[must_use]
    pub fn is_resolved(&self, mission_id: u64) -> bool {
        self.resolved_missions.contains(&mission_id)
            || self.logged_missions.get(&mission_id).copied().unwrap_or(false)
    }

    /// Record that a mission's redirect or completion has been applied.
    pub fn mark_resolved(&mut self, mission_id: u64) {
        self.resolved_missions.insert(mission_id);
    }

    /// Whether an event predates the last missions snapshot.
    ///
    /// Events at the watermark itself are not stale: the journal uses
    /// one-second resolution and login activity shares the snapshot's second.
    #[must_use]
    pub fn is_stale(&self, timestamp: DateTime<Utc>) -> bool {
        self.last_missions_snapshot
            .is_some_and(|watermark| timestamp < watermark)
    }

    /// Copy the counters for an external observer.
    #[must_use]
    pub fn snapshot(&self, journal: Option<&Path>) -> StateSnapshot {
        StateSnapshot {
            journal: journal.map(|p| p.display().to_string()),
            active_missions: self.active_missions,
            tracked_missions: self.logged_missions.len(),
            total_pirate_reward: self.total_pirate_reward,
            killed_pirates: self.killed_pirates,
            total_mission_reward: self.total_mission_reward,
            last_missions_snapshot: self.last_missions_snapshot,
            updated_at: Utc::now(),
        }
    }
}

/// Read-only copy of the reconciled counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Journal the state was derived from.
    pub journal: Option<String>,
    pub active_missions: i64,
    /// Missions currently tracked for deduplication.
    pub tracked_missions: usize,
    pub total_pirate_reward: u64,
    pub killed_pirates: u64,
    pub total_mission_reward: u64,
    pub last_missions_snapshot: Option<DateTime<Utc>>,
    /// When the snapshot was taken.
    pub updated_at: DateTime<Utc>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        ReconciledState::default().snapshot(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_state_is_zeroed() {
        let state = ReconciledState::new();
        assert_eq!(state.active_missions, 0);
        assert!(state.logged_missions.is_empty());
        assert_eq!(state.total_pirate_reward, 0);
        assert_eq!(state.killed_pirates, 0);
        assert_eq!(state.total_mission_reward, 0);
        assert!(state.last_missions_snapshot.is_none());
    }

    #[test]
    fn test_is_resolved() {
        let mut state = ReconciledState::new();
        assert!(!state.is_resolved(1));
        state.logged_missions.insert(1, false);
        assert!(!state.is_resolved(1));
        state.logged_missions.insert(1, true);
        assert!(state.is_resolved(1));
    }

    #[test]
    fn test_resolved_survives_logged_removal() {
        let mut state = ReconciledState::new();
        state.logged_missions.insert(4, false);
        state.mark_resolved(4);
        state.logged_missions.remove(&4);

        assert!(state.is_resolved(4));
        assert!(!state.is_resolved(5));
    }

    #[test]
    fn test_is_stale_without_watermark() {
        let state = ReconciledState::new();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert!(!state.is_stale(ts));
    }

    #[test]
    fn test_is_stale_relative_to_watermark() {
        let watermark = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let state = ReconciledState {
            last_missions_snapshot: Some(watermark),
            ..ReconciledState::default()
        };

        assert!(state.is_stale(watermark - chrono::Duration::seconds(1)));
        assert!(!state.is_stale(watermark));
        assert!(!state.is_stale(watermark + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_snapshot_copies_counters() {
        let mut state = ReconciledState::new();
        state.active_missions = 3;
        state.logged_missions.insert(7, false);
        state.total_pirate_reward = 100_000;
        state.killed_pirates = 4;
        state.total_mission_reward = 5_000_000;

        let snapshot = state.snapshot(Some(Path::new("/tmp/Journal.01.log")));
        assert_eq!(snapshot.journal.as_deref(), Some("/tmp/Journal.01.log"));
        assert_eq!(snapshot.active_missions, 3);
        assert_eq!(snapshot.tracked_missions, 1);
        assert_eq!(snapshot.total_pirate_reward, 100_000);
        assert_eq!(snapshot.killed_pirates, 4);
        assert_eq!(snapshot.total_mission_reward, 5_000_000);

        // Mutating the state afterwards does not affect the copy
        state.killed_pirates = 10;
        assert_eq!(snapshot.killed_pirates, 4);
    }
}
