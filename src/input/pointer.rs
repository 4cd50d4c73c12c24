//! Pointer-driven samples.
//!
//! Gaze follows the pointer. Head offsets are a smooth function of where
//! the pointer sits in the viewport, peaking at ±10 mid-screen on each axis.

use std::f64::consts::PI;
use std::time::Duration;

use crate::config::Viewport;
use crate::state::{GazePoint, HeadPose, Sample};

const HEAD_SWING: f64 = 10.0;
const HEAD_DEPTH: f64 = 50.0;
const HEAD_DEPTH_SWAY: f64 = 5.0;
const HEAD_DEPTH_PERIOD_MS: f64 = 5_000.0;

#[derive(Clone, Debug)]
pub struct PointerAdapter {
    viewport: Viewport,
    moves: u64,
}

impl PointerAdapter {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport, moves: 0 }
    }

    /// Map a pointer position at scheduler time `at` to a sample.
    pub fn sample(&mut self, x: f64, y: f64, at: Duration) -> Sample {
        self.moves += 1;
        let t_ms = at.as_millis() as f64;
        Sample {
            gaze: GazePoint { x, y },
            head: HeadPose {
                x: (x / self.viewport.width * PI).sin() * HEAD_SWING,
                y: (y / self.viewport.height * PI).sin() * HEAD_SWING,
                z: HEAD_DEPTH + (t_ms / HEAD_DEPTH_PERIOD_MS).sin() * HEAD_DEPTH_SWAY,
            },
            occurred_at: at,
        }
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }
}
