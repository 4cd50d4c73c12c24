//! Per-tick attention scoring and fake-presence detection.
//!
//! Pure functions over `AttentionState`; the classifier decides when they
//! run and turns the returned verdict into a state transition.
//!
//! Random draws per tick, in order: blink rate, focus-ratio delta, score
//! delta, pattern check. Scripted random sources rely on this order.

use crate::config::{DetectionConfig, ScoringConfig};
use crate::random::RandomSource;
use crate::state::{AttentionState, PresenceState};

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub focused: bool,
    pub head_penalized: bool,
    /// Presence state the detector wants to move to, if any.
    pub verdict: Option<PresenceState>,
}

/// Run one scoring tick. Does not change `presence_state`.
pub fn score_tick(
    state: &mut AttentionState,
    focused: bool,
    scoring: &ScoringConfig,
    detection: &DetectionConfig,
    rng: &mut dyn RandomSource,
) -> TickReport {
    state.blink_rate = blink_rate(scoring, rng);

    let focus_delta = rng.uniform(scoring.focus_ratio_delta_min, scoring.focus_ratio_delta_max);
    state.screen_focus_ratio = (state.screen_focus_ratio + focus_delta).clamp(0.0, 100.0);

    let mut score = state.attention_score;
    if focused {
        score += rng.uniform(0.0, scoring.focus_gain_max);
    } else {
        score -= rng.uniform(0.0, scoring.unfocus_loss_max);
    }

    let head_penalized = state.head.planar_offset() > scoring.head_movement_limit;
    if head_penalized {
        score -= scoring.head_movement_penalty;
    }

    state.attention_score = score.clamp(0.0, 100.0);
    let verdict = detect_fake_presence(state, detection, rng);
    state.attention_score = round_tenths(state.attention_score);

    TickReport {
        focused,
        head_penalized,
        verdict,
    }
}

/// Update the detection counters and return the state they call for.
///
/// Only `Present` can flip to `FakePresence`; `Away` must clear through a
/// sample first.
pub fn detect_fake_presence(
    state: &mut AttentionState,
    detection: &DetectionConfig,
    rng: &mut dyn RandomSource,
) -> Option<PresenceState> {
    if state.attention_score < detection.low_attention_score {
        state.consecutive_low_attention_ticks =
            state.consecutive_low_attention_ticks.saturating_add(1);
    } else {
        state.consecutive_low_attention_ticks = 0;
    }

    if rng.chance(detection.pattern_probability) {
        state.pattern_score += 1.0;
    } else {
        state.pattern_score = (state.pattern_score - detection.pattern_decay).max(0.0);
    }

    let suspicious = state.consecutive_low_attention_ticks > detection.low_attention_ticks
        || state.pattern_score > detection.pattern_threshold;
    let recovered = state.consecutive_low_attention_ticks == 0
        && state.pattern_score == 0.0
        && state.attention_score > detection.recovery_score;

    match state.presence_state {
        PresenceState::Present if suspicious => Some(PresenceState::FakePresence),
        PresenceState::FakePresence if recovered => Some(PresenceState::Present),
        _ => None,
    }
}

fn blink_rate(scoring: &ScoringConfig, rng: &mut dyn RandomSource) -> u32 {
    let span = scoring.blink_rate_max.saturating_sub(scoring.blink_rate_min);
    let offset = (rng.next_unit() * span as f64).floor() as u32;
    scoring.blink_rate_min + offset.min(span.saturating_sub(1))
}

pub(crate) fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use crate::state::HeadPose;

    fn run(state: &mut AttentionState, focused: bool, unit: f64) -> TickReport {
        let mut rng = ScriptedRandom::constant(unit);
        score_tick(
            state,
            focused,
            &ScoringConfig::default(),
            &DetectionConfig::default(),
            &mut rng,
        )
    }

    #[test]
    fn focused_tick_raises_score_and_unfocused_lowers_it() {
        let mut state = AttentionState {
            attention_score: 60.0,
            ..AttentionState::default()
        };
        run(&mut state, true, 0.5);
        assert_eq!(state.attention_score, 60.5);

        run(&mut state, false, 0.5);
        assert_eq!(state.attention_score, 59.5);
    }

    #[test]
    fn blink_rate_and_focus_ratio_stay_bounded() {
        let mut state = AttentionState::default();
        for unit in [0.0, 0.25, 0.5, 0.999] {
            run(&mut state, true, unit);
            assert!((12..22).contains(&state.blink_rate));
            assert!((0.0..=100.0).contains(&state.screen_focus_ratio));
        }

        // 0.0 draws a -0.5 delta; the ratio must not go negative.
        let mut state = AttentionState::default();
        run(&mut state, true, 0.0);
        assert_eq!(state.screen_focus_ratio, 0.0);
    }

    #[test]
    fn rapid_head_movement_costs_a_point() {
        let mut state = AttentionState {
            attention_score: 60.0,
            head: HeadPose {
                x: 9.0,
                y: -8.0,
                z: 50.0,
            },
            ..AttentionState::default()
        };
        let report = run(&mut state, true, 0.5);
        assert!(report.head_penalized);
        assert_eq!(state.attention_score, 59.5);
    }

    #[test]
    fn score_is_clamped_then_rounded() {
        let mut state = AttentionState {
            attention_score: 99.96,
            ..AttentionState::default()
        };
        run(&mut state, true, 0.9);
        assert_eq!(state.attention_score, 100.0);

        let mut state = AttentionState {
            attention_score: 0.4,
            ..AttentionState::default()
        };
        run(&mut state, false, 0.9);
        assert_eq!(state.attention_score, 0.0);
    }

    #[test]
    fn low_streak_resets_when_score_recovers() {
        let mut state = AttentionState {
            attention_score: 20.0,
            ..AttentionState::default()
        };
        run(&mut state, false, 0.5);
        run(&mut state, false, 0.5);
        assert_eq!(state.consecutive_low_attention_ticks, 2);

        state.attention_score = 45.0;
        run(&mut state, true, 0.5);
        assert_eq!(state.consecutive_low_attention_ticks, 0);
    }

    #[test]
    fn sixth_low_tick_calls_for_fake_presence() {
        let mut state = AttentionState {
            attention_score: 20.0,
            ..AttentionState::default()
        };
        for _ in 0..5 {
            assert_eq!(run(&mut state, false, 0.5).verdict, None);
        }
        assert_eq!(
            run(&mut state, false, 0.5).verdict,
            Some(PresenceState::FakePresence)
        );
    }

    #[test]
    fn pattern_score_accumulates_and_decays() {
        let detection = DetectionConfig::default();
        let mut state = AttentionState::default();

        let mut hit = ScriptedRandom::constant(0.05);
        for _ in 0..4 {
            detect_fake_presence(&mut state, &detection, &mut hit);
        }
        assert_eq!(state.pattern_score, 4.0);

        let mut miss = ScriptedRandom::constant(0.5);
        let verdict = detect_fake_presence(&mut state, &detection, &mut miss);
        assert_eq!(state.pattern_score, 3.5);
        assert_eq!(verdict, Some(PresenceState::FakePresence));

        for _ in 0..10 {
            detect_fake_presence(&mut state, &detection, &mut miss);
        }
        assert_eq!(state.pattern_score, 0.0);
    }

    #[test]
    fn away_never_jumps_to_fake_presence() {
        let mut state = AttentionState {
            attention_score: 5.0,
            consecutive_low_attention_ticks: 10,
            presence_state: PresenceState::Away,
            ..AttentionState::default()
        };
        assert_eq!(run(&mut state, false, 0.5).verdict, None);
    }

    #[test]
    fn fake_presence_recovers_once_counters_clear() {
        let mut state = AttentionState {
            attention_score: 80.0,
            presence_state: PresenceState::FakePresence,
            pattern_score: 0.5,
            ..AttentionState::default()
        };
        // Pattern decays 0.5 -> 0.0 on this tick, streak is already 0.
        assert_eq!(
            run(&mut state, true, 0.5).verdict,
            Some(PresenceState::Present)
        );

        let mut state = AttentionState {
            attention_score: 45.0,
            presence_state: PresenceState::FakePresence,
            ..AttentionState::default()
        };
        assert_eq!(run(&mut state, true, 0.5).verdict, None);
    }
}
