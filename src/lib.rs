//! Presence Tracker
//!
//! Classifies user presence from a stream of gaze/head samples and periodic
//! ticks, and notifies observers of every presence-state change.
//!
//! # Architecture
//!
//! The tracker holds a few invariants by construction:
//!
//! 1. **Bounded score**: the attention score never leaves `[0, 100]`.
//! 2. **Single writer**: every mutation goes through `&mut PresenceClassifier`.
//! 3. **No orphaned timers**: timers live in a scheduler the classifier owns;
//!    `stop()` cancels them all.
//! 4. **No half-open media**: a session releases its camera on stop, on drop,
//!    and on failed start.
//! 5. **Reproducible runs**: all randomness comes from an injected source.
//!
//! # Module Structure
//!
//! - `classifier`: mode lifecycle, timers, transitions, observers
//! - `scoring`: per-tick score update and fake-presence detection
//! - `scheduler`: virtual-time timer queue
//! - `input`: pointer, random-walk and camera sample adapters
//! - `session`: classifier + camera lifetime
//! - `config`: tunables, file and env loading

pub mod classifier;
pub mod config;
pub mod error;
pub mod input;
pub mod observer;
pub mod random;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod state;
pub mod ui;

pub use classifier::{ClassifierStats, PresenceClassifier};
pub use config::{
    ClassifierConfig, DetectionConfig, ScoringConfig, TimingConfig, TrackerConfig, Viewport,
};
pub use error::{TrackerError, TrackerResult};
pub use input::{
    CameraAdapter, CameraConfig, CameraFrame, CameraSource, FaceObservation, PointerAdapter,
    RandomWalkAdapter, RandomWalkConfig, SyntheticCamera, VideoCapability,
};
pub use observer::{ChannelObserver, LogObserver, StatusChange, StatusObserver};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use scheduler::{Scheduler, TimerId};
pub use session::PresenceSession;
pub use state::{
    AttentionLevel, AttentionState, GazePoint, HeadPose, PresenceState, Sample, TrackerMode,
    TrackerSnapshot,
};
