//! Presence classification state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Externally visible judgment of user attentiveness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenceState {
    #[default]
    Present,
    Away,
    FakePresence,
}

impl PresenceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Away => "away",
            Self::FakePresence => "fake-presence",
        }
    }

    /// Human-facing status line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Present => "Actively Present",
            Self::Away => "Away",
            Self::FakePresence => "Fake Presence Detected",
        }
    }
}

/// Whether samples and ticks are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerMode {
    #[default]
    Inactive,
    Calibrating,
    Active,
}

impl TrackerMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inactive => "Inactive",
            Self::Calibrating => "Calibrating...",
            Self::Active => "Active",
        }
    }
}

/// Coarse band of the attention score, used for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttentionLevel {
    High,
    Medium,
    Low,
}

impl AttentionLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 70.0 {
            Self::High
        } else if score > 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

/// Head-pose offsets. `x`/`y` are lateral/vertical, `z` is distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl HeadPose {
    /// L1 magnitude of the planar offsets.
    pub fn planar_offset(&self) -> f64 {
        self.x.abs() + self.y.abs()
    }
}

/// One gaze/head observation. Consumed immediately by the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub gaze: GazePoint,
    pub head: HeadPose,
    #[serde(with = "crate::state::millis")]
    pub occurred_at: Duration,
}

/// Mutable classifier state. Exists only while tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttentionState {
    pub attention_score: f64,
    pub presence_state: PresenceState,
    pub blink_rate: u32,
    pub screen_focus_ratio: f64,
    pub consecutive_low_attention_ticks: u32,
    pub pattern_score: f64,
    #[serde(with = "crate::state::opt_millis")]
    pub last_sample_at: Option<Duration>,
    pub gaze: GazePoint,
    pub head: HeadPose,
}

impl Default for AttentionState {
    fn default() -> Self {
        Self {
            attention_score: 100.0,
            presence_state: PresenceState::Present,
            blink_rate: 0,
            screen_focus_ratio: 0.0,
            consecutive_low_attention_ticks: 0,
            pattern_score: 0.0,
            last_sample_at: None,
            gaze: GazePoint::default(),
            head: HeadPose::default(),
        }
    }
}

impl AttentionState {
    pub fn attention_level(&self) -> AttentionLevel {
        AttentionLevel::from_score(self.attention_score)
    }

    /// "N seconds ago" / "N minutes ago" relative to `now`, or "N/A".
    pub fn since_last_sample(&self, now: Duration) -> String {
        let Some(last) = self.last_sample_at else {
            return "N/A".to_string();
        };
        let secs = now.saturating_sub(last).as_secs();
        if secs < 60 {
            format!("{} seconds ago", secs)
        } else {
            format!("{} minutes ago", secs / 60)
        }
    }
}

/// Read-only view handed to hosts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub mode: TrackerMode,
    #[serde(with = "crate::state::millis")]
    pub now: Duration,
    pub attention: Option<AttentionState>,
}

impl TrackerSnapshot {
    pub fn presence_state(&self) -> Option<PresenceState> {
        self.attention.as_ref().map(|a| a.presence_state)
    }

    pub fn attention_score(&self) -> Option<f64> {
        self.attention.as_ref().map(|a| a.attention_score)
    }
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

pub(crate) mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attention_bands_match_display_thresholds() {
        assert_eq!(AttentionLevel::from_score(71.0), AttentionLevel::High);
        assert_eq!(AttentionLevel::from_score(70.0), AttentionLevel::Medium);
        assert_eq!(AttentionLevel::from_score(40.1), AttentionLevel::Medium);
        assert_eq!(AttentionLevel::from_score(40.0), AttentionLevel::Low);
    }

    #[test]
    fn since_last_sample_formats_seconds_and_minutes() {
        let mut state = AttentionState::default();
        assert_eq!(state.since_last_sample(Duration::from_secs(5)), "N/A");

        state.last_sample_at = Some(Duration::from_secs(10));
        assert_eq!(
            state.since_last_sample(Duration::from_secs(52)),
            "42 seconds ago"
        );
        assert_eq!(
            state.since_last_sample(Duration::from_secs(200)),
            "3 minutes ago"
        );
    }

    #[test]
    fn fresh_state_is_present_at_full_score() {
        let state = AttentionState::default();
        assert_eq!(state.presence_state, PresenceState::Present);
        assert_eq!(state.attention_score, 100.0);
        assert_eq!(state.consecutive_low_attention_ticks, 0);
        assert_eq!(state.pattern_score, 0.0);
    }

    #[test]
    fn labels_follow_status_text() {
        assert_eq!(PresenceState::FakePresence.label(), "Fake Presence Detected");
        assert_eq!(PresenceState::Present.label(), "Actively Present");
        assert_eq!(TrackerMode::Calibrating.label(), "Calibrating...");
    }
}
