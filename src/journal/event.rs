//! Journal event decoding.
//!
//! Each journal line is a standalone JSON object carrying a `timestamp` and an
//! `event` discriminator. Lines are decoded discriminator-first: the envelope
//! is read, then the payload of the recognised kind is decoded from the same
//! object with every payload field optional.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Errors produced while decoding a single journal line.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The line is not JSON or lacks a valid `timestamp` / `event` envelope.
    #[error("Malformed journal line: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The event kind is not one the engine reacts to.
    #[error("Unrecognised journal event kind: {0}")]
    UnknownKind(String),
}

/// A decoded journal event.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEvent {
    /// When the game wrote the event.
    pub timestamp: DateTime<Utc>,
    /// Kind-specific payload.
    pub kind: EventKind,
}

/// The event kinds the engine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A pirate was killed and a bounty awarded.
    Bounty(Bounty),
    /// Login-time list of the missions currently held (`Missions`).
    MissionsSnapshot(MissionsSnapshot),
    /// A mission was accepted.
    MissionAccepted(MissionRef),
    /// A mission objective was met and it was redirected for turn-in.
    MissionRedirected(MissionRef),
    /// A mission was turned in.
    MissionCompleted(MissionCompleted),
    /// A mission was abandoned.
    MissionAbandoned(MissionRef),
    /// Ship or fighter hull took damage.
    HullDamage(HullDamage),
    /// The ship was destroyed.
    Died,
    /// Shields went up or down.
    ShieldState(ShieldState),
}

/// Bounty payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Bounty {
    pub total_reward: u64,
}

/// Payload of the `Missions` snapshot event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MissionsSnapshot {
    pub active: Vec<ActiveMission>,
}

/// One entry of a missions snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ActiveMission {
    #[serde(rename = "MissionID")]
    pub mission_id: u64,
    pub name: String,
    /// Seconds until expiry; zero means the mission no longer counts.
    pub expires: i64,
}

impl ActiveMission {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.expires != 0
    }
}

impl MissionsSnapshot {
    /// Number of listed missions that still count as active.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|m| m.is_active()).count()
    }
}

/// Payload carrying only a mission identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MissionRef {
    #[serde(rename = "MissionID")]
    pub mission_id: u64,
}

/// `MissionCompleted` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MissionCompleted {
    #[serde(rename = "MissionID")]
    pub mission_id: u64,
    pub reward: u64,
}

/// `HullDamage` payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct HullDamage {
    /// Remaining hull integrity, 0.0 to 1.0.
    pub health: f64,
    /// Whether the damage was taken by a ship-launched fighter.
    pub fighter: bool,
}

/// `ShieldState` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ShieldState {
    pub shields_up: bool,
}

#[derive(Deserialize)]
struct Envelope {
    timestamp: DateTime<Utc>,
    event: String,
}

impl JournalEvent {
    /// Decode one journal line.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] when the line is not a JSON object
    /// with a valid envelope or a payload field has the wrong type, and
    /// [`DecodeError::UnknownKind`] for event kinds the engine ignores.
    pub fn from_line(line: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        let envelope = Envelope::deserialize(&value)?;

        let kind = match envelope.event.as_str() {
            "Bounty" => EventKind::Bounty(payload(&value)?),
            "Missions" => EventKind::MissionsSnapshot(payload(&value)?),
            "MissionAccepted" => EventKind::MissionAccepted(payload(&value)?),
            "MissionRedirected" => EventKind::MissionRedirected(payload(&value)?),
            "MissionCompleted" => EventKind::MissionCompleted(payload(&value)?),
            "MissionAbandoned" => EventKind::MissionAbandoned(payload(&value)?),
            "HullDamage" => EventKind::HullDamage(payload(&value)?),
            "Died" => EventKind::Died,
            "ShieldState" => EventKind::ShieldState(payload(&value)?),
            _ => return Err(DecodeError::UnknownKind(envelope.event)),
        };

        Ok(Self {
            timestamp: envelope.timestamp,
            kind,
        })
    }

    /// Whether this event changes the mission lifecycle counters.
    #[must_use]
    pub fn is_mission_lifecycle(&self) -> bool {
        matches!(
            self.kind,
            EventKind::MissionAccepted(_)
                | EventKind::MissionRedirected(_)
                | EventKind::MissionCompleted(_)
                | EventKind::MissionAbandoned(_)
        )
    }
}

impl EventKind {
    /// The journal `event` name of this kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bounty(_) => "Bounty",
            Self::MissionsSnapshot(_) => "Missions",
            Self::MissionAccepted(_) => "MissionAccepted",
            Self::MissionRedirected(_) => "MissionRedirected",
            Self::MissionCompleted(_) => "MissionCompleted",
            Self::MissionAbandoned(_) => "MissionAbandoned",
            Self::HullDamage(_) => "HullDamage",
            Self::Died => "Died",
            Self::ShieldState(_) => "ShieldState",
        }
    }
}

/// Decode a line, logging and discarding anything that is not a known event.
///
/// Blank lines and unknown kinds are expected and only traced; malformed
/// lines are logged at warn level.
#[must_use]
pub fn decode_line(line: &str) -> Option<JournalEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match JournalEvent::from_line(trimmed) {
        Ok(event) => Some(event),
        Err(DecodeError::UnknownKind(kind)) => {
            tracing::trace!(kind = %kind, "Ignoring journal event");
            None
        }
        Err(e) => {
            tracing::warn!(line = %trimmed, error = %e, "Skipping malformed journal line");
            None
        }
    }
}

fn payload<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, DecodeError> {
    T::deserialize(value).map_err(DecodeError::Malformed)
}
