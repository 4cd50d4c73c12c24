//! Sample sources.
//!
//! Adapters turn raw input into `Sample`s for the classifier:
//! - pointer movement (direct mapping)
//! - simulated gaze (bounded random walk)
//! - camera frames (behind the `VideoCapability` trait)
//!
//! Adapters never touch classifier state. They only produce samples; the
//! host decides when to push them.

pub mod camera;
pub mod pointer;
pub mod simulated;

pub use camera::{
    CameraAdapter, CameraConfig, CameraFrame, CameraSource, FaceObservation, SyntheticCamera,
    VideoCapability,
};
pub use pointer::PointerAdapter;
pub use simulated::{RandomWalkAdapter, RandomWalkConfig};
