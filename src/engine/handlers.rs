//! Per-kind event handlers.
//!
//! Handlers mutate the [`ReconciledState`] and describe the notification the
//! event should produce. They never send anything themselves: suppression and
//! delivery are up to the caller.

use chrono::{DateTime, Utc};

use super::state::ReconciledState;
use crate::config::NotifySettings;
use crate::journal::{
    Bounty, EventKind, HullDamage, JournalEvent, MissionCompleted, MissionRef, MissionsSnapshot,
    ShieldState,
};

/// Sent when the last active mission is resolved.
pub const NO_MORE_MISSIONS: &str = "No more active missions, go collect new ones!";

/// Sent when the ship is destroyed.
pub const SHIP_DESTROYED: &str = "Your ship has been destroyed";

/// Kill cadence used when silent kills are enabled.
pub const SILENT_KILLS_EVERY: u64 = 10;

/// What a handler asks the caller to do after mutating state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Text to send, unless suppressed.
    pub notification: Option<String>,
    /// The event carries an authoritative baseline and the journal should be
    /// reconstructed.
    pub reconcile: bool,
}

impl HandlerOutcome {
    fn silent() -> Self {
        Self::default()
    }

    fn notify(text: impl Into<String>) -> Self {
        Self {
            notification: Some(text.into()),
            reconcile: false,
        }
    }
}

/// Route an event to its handler.
pub fn apply(
    state: &mut ReconciledState,
    event: &JournalEvent,
    settings: &NotifySettings,
) -> HandlerOutcome {
    match &event.kind {
        EventKind::HullDamage(damage) => hull_damage(damage, settings),
        EventKind::Died => died(),
        EventKind::ShieldState(shields) => shield_state(shields, settings),
        EventKind::Bounty(bounty) => bounty_awarded(state, bounty, settings),
        EventKind::MissionAccepted(mission) => mission_accepted(state, mission),
        EventKind::MissionRedirected(mission) => mission_redirected(state, mission),
        EventKind::MissionCompleted(mission) => mission_completed(state, mission),
        EventKind::MissionAbandoned(mission) => mission_abandoned(state, mission),
        EventKind::MissionsSnapshot(snapshot) => missions_snapshot(state, event.timestamp, snapshot),
    }
}

/// Hull integrity report.
#[must_use]
pub fn hull_damage(damage: &HullDamage, settings: &NotifySettings) -> HandlerOutcome {
    if damage.fighter && !settings.fighter {
        return HandlerOutcome::silent();
    }

    let prefix = if damage.fighter { "Fighter" } else { "Ship" };
    HandlerOutcome::notify(format!(
        "{prefix} hull damage detected, integrity is {}%",
        hull_percentage(damage.health)
    ))
}

/// Hull health fraction as a rounded percentage.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hull_percentage(health: f64) -> i64 {
    (health * 100.0).round() as i64
}

#[must_use]
pub fn died() -> HandlerOutcome {
    HandlerOutcome::notify(SHIP_DESTROYED)
}

#[must_use]
pub fn shield_state(shields: &ShieldState, settings: &NotifySettings) -> HandlerOutcome {
    if !settings.shields {
        return HandlerOutcome::silent();
    }

    if shields.shields_up {
        HandlerOutcome::notify("Shields are up again")
    } else {
        HandlerOutcome::notify("Shields are down!")
    }
}

/// Bounty collected: counters always move, the message depends on settings.
pub fn bounty_awarded(
    state: &mut ReconciledState,
    bounty: &Bounty,
    settings: &NotifySettings,
) -> HandlerOutcome {
    state.total_pirate_reward = state.total_pirate_reward.saturating_add(bounty.total_reward);
    state.killed_pirates = state.killed_pirates.saturating_add(1);

    let credits = format_credits(state.total_pirate_reward);
    tracing::debug!(
        killed = state.killed_pirates,
        total_reward = %credits,
        "Bounty collected"
    );

    if !settings.kills {
        return HandlerOutcome::silent();
    }

    if !settings.silent_kills || state.killed_pirates % SILENT_KILLS_EVERY == 0 {
        return HandlerOutcome::notify(format!(
            "Total rewards: {credits} credits\nPirates killed: {}",
            state.killed_pirates
        ));
    }

    HandlerOutcome::silent()
}

pub fn mission_accepted(state: &mut ReconciledState, mission: &MissionRef) -> HandlerOutcome {
    state.active_missions += 1;
    state.logged_missions.insert(mission.mission_id, false);

    tracing::debug!(
        mission_id = mission.mission_id,
        active = state.active_missions,
        "Mission accepted"
    );
    HandlerOutcome::silent()
}

pub fn mission_redirected(state: &mut ReconciledState, mission: &MissionRef) -> HandlerOutcome {
    if state.is_resolved(mission.mission_id) {
        return HandlerOutcome::silent();
    }

    state.active_missions -= 1;
    state.logged_missions.insert(mission.mission_id, true);
    state.mark_resolved(mission.mission_id);

    tracing::debug!(
        mission_id = mission.mission_id,
        active = state.active_missions,
        "Mission redirected"
    );
    missions_exhausted(state)
}

pub fn mission_completed(
    state: &mut ReconciledState,
    mission: &MissionCompleted,
) -> HandlerOutcome {
    if state.is_resolved(mission.mission_id) {
        return HandlerOutcome::silent();
    }

    state.active_missions -= 1;
    state.logged_missions.remove(&mission.mission_id);
    state.mark_resolved(mission.mission_id);
    state.total_mission_reward = state.total_mission_reward.saturating_add(mission.reward);

    tracing::debug!(
        mission_id = mission.mission_id,
        active = state.active_missions,
        total_reward = %format_credits(state.total_mission_reward),
        "Mission completed"
    );
    missions_exhausted(state)
}

/// Abandoning has no resolved-marker guard.
pub fn mission_abandoned(state: &mut ReconciledState, mission: &MissionRef) -> HandlerOutcome {
    state.active_missions -= 1;
    state.logged_missions.remove(&mission.mission_id);

    tracing::debug!(
        mission_id = mission.mission_id,
        active = state.active_missions,
        "Mission abandoned"
    );
    HandlerOutcome::silent()
}

/// Rebaseline mission tracking from the login snapshot.
pub fn missions_snapshot(
    state: &mut ReconciledState,
    timestamp: DateTime<Utc>,
    snapshot: &MissionsSnapshot,
) -> HandlerOutcome {
    state.last_missions_snapshot = Some(timestamp);
    state.active_missions = i64::try_from(snapshot.active_count()).unwrap_or(i64::MAX);
    state.logged_missions = snapshot
        .active
        .iter()
        .map(|m| (m.mission_id, false))
        .collect();
    state.resolved_missions.clear();

    tracing::debug!(active = state.active_missions, "Missions snapshot");
    HandlerOutcome {
        notification: None,
        reconcile: true,
    }
}

fn missions_exhausted(state: &ReconciledState) -> HandlerOutcome {
    if state.active_missions == 0 {
        HandlerOutcome::notify(NO_MORE_MISSIONS)
    } else {
        HandlerOutcome::silent()
    }
}

/// Format credits with `,` thousands separators.
///
/// # Examples
///
/// ```
/// use ed_afk_notifier::engine::format_credits;
///
/// assert_eq!(format_credits(0), "0");
/// assert_eq!(format_credits(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_credits(credits: u64) -> String {
    let digits = credits.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
