//! Presence classifier.
//!
//! Owns the attention state, its virtual-time scheduler, the random source
//! and the observer list. Three triggers mutate the state: the repeating
//! tick timer, the inactivity watchdog, and samples pushed by an input
//! adapter. All of them run through `&mut self`, so there is exactly one
//! writer.
//!
//! Mode lifecycle: `Inactive -> Calibrating -> Active`, back to `Inactive`
//! on `stop()`. `stop()` cancels every timer it armed.

use std::time::Duration;

use crate::config::ClassifierConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::observer::{StatusChange, StatusObserver};
use crate::random::{RandomSource, SeededRandom};
use crate::scheduler::{Scheduler, TimerId};
use crate::scoring::score_tick;
use crate::state::{AttentionState, PresenceState, Sample, TrackerMode, TrackerSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerKind {
    Warmup,
    Tick,
    Watchdog,
}

/// Counters since construction. Survive `stop()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassifierStats {
    pub ticks: u64,
    pub samples: u64,
    pub transitions: u64,
}

pub struct PresenceClassifier {
    config: ClassifierConfig,
    mode: TrackerMode,
    state: Option<AttentionState>,
    scheduler: Scheduler<TimerKind>,
    warmup_timer: Option<TimerId>,
    tick_timer: Option<TimerId>,
    watchdog_timer: Option<TimerId>,
    rng: Box<dyn RandomSource>,
    observers: Vec<Box<dyn StatusObserver>>,
    focus_override: Option<bool>,
    stats: ClassifierStats,
}

impl PresenceClassifier {
    pub fn new(config: ClassifierConfig, rng: Box<dyn RandomSource>) -> TrackerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mode: TrackerMode::Inactive,
            state: None,
            scheduler: Scheduler::new(),
            warmup_timer: None,
            tick_timer: None,
            watchdog_timer: None,
            rng,
            observers: Vec::new(),
            focus_override: None,
            stats: ClassifierStats::default(),
        })
    }

    pub fn with_seed(config: ClassifierConfig, seed: u64) -> TrackerResult<Self> {
        Self::new(config, Box::new(SeededRandom::from_seed(seed)))
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn mode(&self) -> TrackerMode {
        self.mode
    }

    /// Current scheduler time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }

    /// Timers still armed. Zero whenever the classifier is `Inactive`.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn subscribe(&mut self, observer: Box<dyn StatusObserver>) {
        self.observers.push(observer);
    }

    /// Pin the per-tick focus indicator, or `None` to derive it from gaze.
    pub fn set_focus_override(&mut self, focused: Option<bool>) {
        self.focus_override = focused;
    }

    /// Begin calibration. No-op unless `Inactive`.
    pub fn start(&mut self) {
        if self.mode != TrackerMode::Inactive {
            log::debug!("classifier: start ignored in mode {:?}", self.mode);
            return;
        }
        self.state = Some(AttentionState::default());
        self.mode = TrackerMode::Calibrating;
        self.warmup_timer = Some(
            self.scheduler
                .schedule_once(self.config.timing.warmup, TimerKind::Warmup),
        );
        log::info!(
            "classifier: calibrating for {}ms",
            self.config.timing.warmup.as_millis()
        );
    }

    /// Cancel all timers and discard state. Idempotent.
    pub fn stop(&mut self) {
        for id in [
            self.warmup_timer.take(),
            self.tick_timer.take(),
            self.watchdog_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(id);
        }
        if self.mode != TrackerMode::Inactive {
            log::info!("classifier: stopped in mode {:?}", self.mode);
        }
        self.mode = TrackerMode::Inactive;
        self.state = None;
    }

    /// Advance virtual time by `dt`, firing every timer that falls due.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.scheduler.now() + dt;
        while let Some((id, kind)) = self.scheduler.pop_due(target) {
            self.fire(id, kind);
        }
        self.scheduler.advance_to(target);
    }

    /// Record one observation. Ignored unless `Active`.
    pub fn on_sample(&mut self, sample: Sample) {
        if self.mode != TrackerMode::Active {
            return;
        }
        let now = self.scheduler.now();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.gaze = sample.gaze;
        state.head = sample.head;
        state.last_sample_at = Some(now);
        self.stats.samples += 1;

        if state.presence_state == PresenceState::Away {
            self.transition(PresenceState::Present);
        }
        self.arm_watchdog();
    }

    /// One scoring update. Ignored unless `Active`.
    pub fn tick(&mut self) {
        if self.mode != TrackerMode::Active {
            return;
        }
        let focus_override = self.focus_override;
        let viewport = self.config.viewport;
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let focused = focus_override.unwrap_or_else(|| {
            state.presence_state != PresenceState::Away
                && viewport.contains(state.gaze.x, state.gaze.y)
        });
        let report = score_tick(
            state,
            focused,
            &self.config.scoring,
            &self.config.detection,
            &mut *self.rng,
        );
        self.stats.ticks += 1;
        log::debug!(
            "classifier: tick score={:.1} low_ticks={} pattern={:.1} focused={}",
            state.attention_score,
            state.consecutive_low_attention_ticks,
            state.pattern_score,
            report.focused
        );

        if let Some(next) = report.verdict {
            self.transition(next);
        }
    }

    /// Clear a fake-presence alert.
    pub fn reset_alert(&mut self) -> TrackerResult<()> {
        let current = self.state.as_ref().map(|s| s.presence_state);
        match current {
            Some(PresenceState::FakePresence) => {}
            Some(other) => {
                return Err(TrackerError::precondition(
                    "reset_alert",
                    format!("presence state is {}", other.as_str()),
                ))
            }
            None => {
                return Err(TrackerError::precondition(
                    "reset_alert",
                    "tracking is not running",
                ))
            }
        }
        if let Some(state) = self.state.as_mut() {
            state.attention_score = 100.0;
            state.consecutive_low_attention_ticks = 0;
            state.pattern_score = 0.0;
        }
        self.transition(PresenceState::Present);
        Ok(())
    }

    pub fn get_state(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            mode: self.mode,
            now: self.scheduler.now(),
            attention: self.state.clone(),
        }
    }

    fn fire(&mut self, id: TimerId, kind: TimerKind) {
        match kind {
            TimerKind::Warmup => {
                if self.warmup_timer == Some(id) {
                    self.warmup_timer = None;
                    self.activate();
                }
            }
            TimerKind::Tick => self.tick(),
            TimerKind::Watchdog => {
                if self.watchdog_timer == Some(id) {
                    self.watchdog_timer = None;
                    self.on_inactivity();
                }
            }
        }
    }

    fn activate(&mut self) {
        if self.mode != TrackerMode::Calibrating {
            return;
        }
        self.mode = TrackerMode::Active;
        let now = self.scheduler.now();
        if let Some(state) = self.state.as_mut() {
            state.last_sample_at = Some(now);
        }
        self.tick_timer = Some(
            self.scheduler
                .schedule_repeating(self.config.timing.tick_period, TimerKind::Tick),
        );
        self.arm_watchdog();
        log::info!("classifier: active at {}ms", now.as_millis());
    }

    fn arm_watchdog(&mut self) {
        if let Some(id) = self.watchdog_timer.take() {
            self.scheduler.cancel(id);
        }
        self.watchdog_timer = Some(self.scheduler.schedule_once(
            self.config.timing.inactivity_timeout,
            TimerKind::Watchdog,
        ));
    }

    fn on_inactivity(&mut self) {
        if self.mode != TrackerMode::Active {
            return;
        }
        log::debug!(
            "classifier: no sample for {}ms",
            self.config.timing.inactivity_timeout.as_millis()
        );
        self.transition(PresenceState::Away);
    }

    fn transition(&mut self, next: PresenceState) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let previous = state.presence_state;
        if previous == next {
            return;
        }
        state.presence_state = next;
        self.stats.transitions += 1;

        let change = StatusChange {
            previous,
            state: next,
            at: self.scheduler.now(),
        };
        for observer in self.observers.iter_mut() {
            observer.on_status_change(&change);
        }
    }
}

impl std::fmt::Debug for PresenceClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceClassifier")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("now", &self.scheduler.now())
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use crate::state::{GazePoint, HeadPose};
    use std::sync::{Arc, Mutex};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn classifier(unit: f64) -> (PresenceClassifier, Arc<Mutex<Vec<PresenceState>>>) {
        let mut classifier = PresenceClassifier::new(
            ClassifierConfig::default(),
            Box::new(ScriptedRandom::constant(unit)),
        )
        .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        classifier.subscribe(Box::new(move |change: &StatusChange| {
            sink.lock().unwrap().push(change.state);
        }));
        (classifier, seen)
    }

    fn sample_at(classifier: &PresenceClassifier) -> Sample {
        Sample {
            gaze: GazePoint { x: 640.0, y: 360.0 },
            head: HeadPose {
                x: 1.0,
                y: 1.0,
                z: 50.0,
            },
            occurred_at: classifier.now(),
        }
    }

    fn active(unit: f64) -> (PresenceClassifier, Arc<Mutex<Vec<PresenceState>>>) {
        let (mut classifier, seen) = classifier(unit);
        classifier.start();
        classifier.advance(secs(3));
        assert_eq!(classifier.mode(), TrackerMode::Active);
        (classifier, seen)
    }

    #[test]
    fn calibrates_before_becoming_active() {
        let (mut classifier, _) = classifier(0.5);
        classifier.start();
        assert_eq!(classifier.mode(), TrackerMode::Calibrating);

        classifier.advance(Duration::from_millis(2_999));
        assert_eq!(classifier.mode(), TrackerMode::Calibrating);

        classifier.advance(Duration::from_millis(1));
        assert_eq!(classifier.mode(), TrackerMode::Active);
        let snapshot = classifier.get_state();
        assert_eq!(
            snapshot.attention.unwrap().last_sample_at,
            Some(secs(3))
        );
    }

    #[test]
    fn ticks_run_every_period_once_active() {
        let (mut classifier, _) = active(0.5);
        classifier.advance(secs(10));
        assert_eq!(classifier.stats().ticks, 5);
    }

    #[test]
    fn six_low_ticks_raise_fake_presence_once() {
        let (mut classifier, seen) = active(0.5);
        classifier.set_focus_override(Some(false));
        classifier.state.as_mut().unwrap().attention_score = 20.0;

        for _ in 0..6 {
            classifier.tick();
        }
        assert_eq!(
            classifier.get_state().presence_state(),
            Some(PresenceState::FakePresence)
        );

        for _ in 0..4 {
            classifier.tick();
        }
        assert_eq!(*seen.lock().unwrap(), vec![PresenceState::FakePresence]);
    }

    #[test]
    fn reset_alert_clears_fake_presence() {
        let (mut classifier, seen) = active(0.5);
        classifier.set_focus_override(Some(false));
        classifier.state.as_mut().unwrap().attention_score = 10.0;
        for _ in 0..6 {
            classifier.tick();
        }

        classifier.reset_alert().unwrap();
        let state = classifier.get_state().attention.unwrap();
        assert_eq!(state.presence_state, PresenceState::Present);
        assert_eq!(state.attention_score, 100.0);
        assert_eq!(state.consecutive_low_attention_ticks, 0);
        assert_eq!(state.pattern_score, 0.0);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![PresenceState::FakePresence, PresenceState::Present]
        );
    }

    #[test]
    fn reset_alert_outside_fake_presence_is_a_precondition_failure() {
        let (mut classifier, seen) = active(0.5);
        let before = classifier.get_state();

        let err = classifier.reset_alert().unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(classifier.get_state(), before);
        assert!(seen.lock().unwrap().is_empty());

        classifier.stop();
        assert!(classifier.reset_alert().unwrap_err().is_precondition());
    }

    #[test]
    fn sample_rearms_watchdog() {
        let (mut classifier, seen) = active(0.5);
        classifier.advance(secs(14));
        let sample = sample_at(&classifier);
        classifier.on_sample(sample);
        classifier.advance(secs(14));
        assert!(seen.lock().unwrap().is_empty());

        classifier.advance(secs(1));
        assert_eq!(*seen.lock().unwrap(), vec![PresenceState::Away]);
    }

    #[test]
    fn samples_before_activation_are_ignored() {
        let (mut classifier, _) = classifier(0.5);
        classifier.start();
        let sample = sample_at(&classifier);
        classifier.on_sample(sample);
        assert_eq!(classifier.stats().samples, 0);
        assert_eq!(
            classifier.get_state().attention.unwrap().last_sample_at,
            None
        );
    }

    #[test]
    fn stop_cancels_every_timer() {
        let (mut classifier, _) = active(0.5);
        assert_eq!(classifier.pending_timers(), 2);

        classifier.stop();
        classifier.stop();
        assert_eq!(classifier.pending_timers(), 0);
        assert_eq!(classifier.mode(), TrackerMode::Inactive);
        assert!(classifier.get_state().attention.is_none());
    }

    #[test]
    fn start_while_running_is_ignored() {
        let (mut classifier, _) = active(0.5);
        classifier.advance(secs(4));
        let before = classifier.get_state();
        classifier.start();
        assert_eq!(classifier.get_state(), before);
    }
}
