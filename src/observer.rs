//! Status-change observers.
//!
//! The classifier keeps a list of observers and notifies each of them once
//! per actual presence-state change. Hosts register as many as they need
//! (badge, toast, log sink).

use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::PresenceState;

/// One presence-state transition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous: PresenceState,
    pub state: PresenceState,
    /// Scheduler time of the transition.
    #[serde(with = "crate::state::millis")]
    pub at: Duration,
}

pub trait StatusObserver: Send {
    fn on_status_change(&mut self, change: &StatusChange);
}

impl<F> StatusObserver for F
where
    F: FnMut(&StatusChange) + Send,
{
    fn on_status_change(&mut self, change: &StatusChange) {
        self(change)
    }
}

/// Forwards transitions into an mpsc channel. A dropped receiver is ignored.
pub struct ChannelObserver {
    tx: Sender<StatusChange>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<StatusChange>) -> Self {
        Self { tx }
    }
}

impl StatusObserver for ChannelObserver {
    fn on_status_change(&mut self, change: &StatusChange) {
        let _ = self.tx.send(*change);
    }
}

/// Writes transitions to the `log` facade.
#[derive(Default)]
pub struct LogObserver;

impl StatusObserver for LogObserver {
    fn on_status_change(&mut self, change: &StatusChange) {
        match change.state {
            PresenceState::FakePresence => log::warn!(
                "presence: {} -> {} at {}ms",
                change.previous.as_str(),
                change.state.as_str(),
                change.at.as_millis()
            ),
            _ => log::info!(
                "presence: {} -> {} at {}ms",
                change.previous.as_str(),
                change.state.as_str(),
                change.at.as_millis()
            ),
        }
    }
}
