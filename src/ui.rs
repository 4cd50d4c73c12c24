use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::observer::StatusChange;
use crate::state::{AttentionLevel, TrackerSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

/// Terminal status line for the demo binary.
///
/// Pretty mode keeps one spinner line updated in place; plain mode prints
/// only transitions and the final summary.
pub struct StatusReporter {
    spinner: Option<ProgressBar>,
}

impl StatusReporter {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        let use_pretty = match mode {
            UiMode::Pretty => true,
            UiMode::Auto => is_tty,
            UiMode::Plain => false,
        };
        let spinner = use_pretty.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner
        });
        Self { spinner }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty)
    }

    pub fn update(&self, snapshot: &TrackerSnapshot) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(status_line(snapshot));
        }
    }

    pub fn transition(&self, change: &StatusChange) {
        let line = format!(
            "[{:>7.1}s] {} -> {}",
            change.at.as_secs_f64(),
            change.previous.label(),
            change.state.label()
        );
        match &self.spinner {
            Some(spinner) => spinner.println(line),
            None => eprintln!("{}", line),
        }
    }

    pub fn finish(&self, snapshot: &TrackerSnapshot) {
        let line = status_line(snapshot);
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(line),
            None => eprintln!("{}", line),
        }
    }
}

/// One-line summary of a snapshot.
pub fn status_line(snapshot: &TrackerSnapshot) -> String {
    let Some(attention) = &snapshot.attention else {
        return format!("[{}]", snapshot.mode.label());
    };
    let level = match attention.attention_level() {
        AttentionLevel::High => "high",
        AttentionLevel::Medium => "medium",
        AttentionLevel::Low => "low",
    };
    format!(
        "[{}] {} | attention {}% ({}) | last movement: {}",
        snapshot.mode.label(),
        attention.presence_state.label(),
        attention.attention_score,
        level,
        attention.since_last_sample(snapshot.now)
    )
}

/// Multi-line readout of the raw metrics.
pub fn debug_readout(snapshot: &TrackerSnapshot) -> String {
    let Some(a) = &snapshot.attention else {
        return "no tracking data".to_string();
    };
    format!(
        "eye gaze position: X: {:.2}, Y: {:.2}\n\
         head position: X: {:.2}, Y: {:.2}, Z: {:.2}\n\
         blink rate: {} blinks/minute\n\
         screen focus: {:.1}% on-screen time",
        a.gaze.x, a.gaze.y, a.head.x, a.head.y, a.head.z, a.blink_rate, a.screen_focus_ratio
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AttentionState, TrackerMode};

    #[test]
    fn status_line_for_inactive_tracker() {
        let snapshot = TrackerSnapshot {
            mode: TrackerMode::Inactive,
            now: Duration::ZERO,
            attention: None,
        };
        assert_eq!(status_line(&snapshot), "[Inactive]");
        assert_eq!(debug_readout(&snapshot), "no tracking data");
    }

    #[test]
    fn status_line_shows_presence_and_level() {
        let snapshot = TrackerSnapshot {
            mode: TrackerMode::Active,
            now: Duration::from_secs(12),
            attention: Some(AttentionState {
                attention_score: 55.5,
                last_sample_at: Some(Duration::from_secs(10)),
                ..AttentionState::default()
            }),
        };
        assert_eq!(
            status_line(&snapshot),
            "[Active] Actively Present | attention 55.5% (medium) | last movement: 2 seconds ago"
        );
        assert!(debug_readout(&snapshot).contains("blink rate: 0 blinks/minute"));
    }
}
