//! Camera-derived samples.
//!
//! Hardware video sits behind `VideoCapability` (`acquire` / `release` /
//! `frame`). Real camera bindings live with the host; this crate ships a
//! synthetic source for `stub://` URLs:
//!
//! - `stub://denied` fails acquisition, like a refused permission prompt
//! - `stub://empty` streams frames in which no face is ever found
//! - `stub://away?after=N` shows a face for N frames, then none
//! - any other `stub://` path shows a gently drifting face
//!
//! Frames carry face observations, not pixels. A frame without a face
//! yields no sample, so the inactivity watchdog decides presence.

use std::time::Duration;

use crate::config::Viewport;
use crate::error::{TrackerError, TrackerResult};
use crate::state::{GazePoint, HeadPose, Sample};

/// Degrees of yaw/pitch per unit of head offset.
const DEGREES_PER_HEAD_UNIT: f64 = 3.0;

/// Face landmarks summarised for presence scoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceObservation {
    /// Face centre, normalised to `[0, 1]` across the frame.
    pub center_x: f64,
    pub center_y: f64,
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub distance_cm: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub face: Option<FaceObservation>,
}

/// Capability boundary around a hardware video stream.
///
/// Implementations must stop every track in `release()` and tolerate
/// repeated calls.
pub trait VideoCapability: Send {
    fn name(&self) -> &str;

    /// Open the stream. On error nothing may remain open.
    fn acquire(&mut self) -> TrackerResult<()>;

    fn release(&mut self);

    fn is_acquired(&self) -> bool;

    /// Next frame, `None` when no frame is ready yet.
    fn frame(&mut self) -> TrackerResult<Option<CameraFrame>>;
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Source URL, e.g. `stub://desk`.
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: "stub://desk".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// Opens a capture source by URL.
pub struct CameraSource;

impl CameraSource {
    pub fn open(config: CameraConfig) -> TrackerResult<Box<dyn VideoCapability>> {
        if config.url.starts_with("stub://") {
            Ok(Box::new(SyntheticCamera::new(config)))
        } else {
            Err(TrackerError::acquisition(
                config.url,
                "no capture backend for this URL; hosts bind real cameras via VideoCapability",
            ))
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://)
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scene {
    Desk,
    Empty,
    Denied,
    LeavesAfter(u64),
}

pub struct SyntheticCamera {
    config: CameraConfig,
    scene: Scene,
    acquired: bool,
    frame_count: u64,
}

impl SyntheticCamera {
    pub fn new(config: CameraConfig) -> Self {
        let scene = parse_scene(&config.url);
        Self {
            config,
            scene,
            acquired: false,
            frame_count: 0,
        }
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn face_at(&self, n: u64) -> Option<FaceObservation> {
        let visible = match self.scene {
            Scene::Desk => true,
            Scene::Empty | Scene::Denied => false,
            Scene::LeavesAfter(limit) => n <= limit,
        };
        if !visible {
            return None;
        }
        let t = n as f64;
        Some(FaceObservation {
            center_x: 0.5 + 0.1 * (t / 20.0).sin(),
            center_y: 0.45 + 0.05 * (t / 30.0).cos(),
            yaw_deg: 8.0 * (t / 15.0).sin(),
            pitch_deg: 4.0 * (t / 25.0).cos(),
            distance_cm: 55.0,
        })
    }
}

impl VideoCapability for SyntheticCamera {
    fn name(&self) -> &str {
        &self.config.url
    }

    fn acquire(&mut self) -> TrackerResult<()> {
        if self.scene == Scene::Denied {
            return Err(TrackerError::acquisition(
                self.config.url.clone(),
                "permission denied",
            ));
        }
        self.acquired = true;
        log::info!("camera: acquired {} (synthetic)", self.config.url);
        Ok(())
    }

    fn release(&mut self) {
        if self.acquired {
            log::info!(
                "camera: released {} after {} frames",
                self.config.url,
                self.frame_count
            );
        }
        self.acquired = false;
    }

    fn is_acquired(&self) -> bool {
        self.acquired
    }

    fn frame(&mut self) -> TrackerResult<Option<CameraFrame>> {
        if !self.acquired {
            return Err(TrackerError::acquisition(
                self.config.url.clone(),
                "stream is not acquired",
            ));
        }
        self.frame_count += 1;
        Ok(Some(CameraFrame {
            width: self.config.width,
            height: self.config.height,
            face: self.face_at(self.frame_count),
        }))
    }
}

fn parse_scene(url: &str) -> Scene {
    let path = url.trim_start_matches("stub://");
    let (name, query) = path.split_once('?').unwrap_or((path, ""));
    match name {
        "denied" => Scene::Denied,
        "empty" => Scene::Empty,
        "away" => {
            let after = query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "after")
                .and_then(|(_, value)| value.parse().ok())
                .unwrap_or(30);
            Scene::LeavesAfter(after)
        }
        _ => Scene::Desk,
    }
}

// ----------------------------------------------------------------------------
// Frame -> sample mapping
// ----------------------------------------------------------------------------

/// Maps face observations into viewport gaze and head offsets.
#[derive(Clone, Debug)]
pub struct CameraAdapter {
    viewport: Viewport,
    frames_seen: u64,
    faces_seen: u64,
}

impl CameraAdapter {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            frames_seen: 0,
            faces_seen: 0,
        }
    }

    pub fn sample(&mut self, frame: &CameraFrame, at: Duration) -> Option<Sample> {
        self.frames_seen += 1;
        let face = frame.face?;
        self.faces_seen += 1;
        Some(Sample {
            gaze: GazePoint {
                x: face.center_x.clamp(0.0, 1.0) * self.viewport.width,
                y: face.center_y.clamp(0.0, 1.0) * self.viewport.height,
            },
            head: HeadPose {
                x: face.yaw_deg / DEGREES_PER_HEAD_UNIT,
                y: face.pitch_deg / DEGREES_PER_HEAD_UNIT,
                z: face.distance_cm,
            },
            occurred_at: at,
        })
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn faces_seen(&self) -> u64 {
        self.faces_seen
    }
}
