//! Simulated gaze: a bounded random walk.
//!
//! Each step nudges gaze and head by a uniform delta, then clamps gaze to the
//! viewport and head offsets to `±head_limit`. Starts mid-screen, head level.

use std::time::Duration;

use crate::config::Viewport;
use crate::random::RandomSource;
use crate::state::{GazePoint, HeadPose, Sample};

#[derive(Clone, Debug, PartialEq)]
pub struct RandomWalkConfig {
    pub viewport: Viewport,
    /// Max gaze displacement per step, in viewport units.
    pub gaze_step: f64,
    pub head_step: f64,
    pub head_limit: f64,
    pub head_depth: f64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            gaze_step: 40.0,
            head_step: 1.5,
            head_limit: 12.0,
            head_depth: 50.0,
        }
    }
}

pub struct RandomWalkAdapter {
    config: RandomWalkConfig,
    rng: Box<dyn RandomSource>,
    gaze: GazePoint,
    head: HeadPose,
    steps: u64,
}

impl RandomWalkAdapter {
    pub fn new(config: RandomWalkConfig, rng: Box<dyn RandomSource>) -> Self {
        let gaze = GazePoint {
            x: config.viewport.width / 2.0,
            y: config.viewport.height / 2.0,
        };
        let head = HeadPose {
            x: 0.0,
            y: 0.0,
            z: config.head_depth,
        };
        Self {
            config,
            rng,
            gaze,
            head,
            steps: 0,
        }
    }

    pub fn next_sample(&mut self, at: Duration) -> Sample {
        let c = &self.config;
        let rng = &mut self.rng;

        self.gaze.x = (self.gaze.x + rng.uniform(-c.gaze_step, c.gaze_step))
            .clamp(0.0, c.viewport.width);
        self.gaze.y = (self.gaze.y + rng.uniform(-c.gaze_step, c.gaze_step))
            .clamp(0.0, c.viewport.height);
        self.head.x =
            (self.head.x + rng.uniform(-c.head_step, c.head_step)).clamp(-c.head_limit, c.head_limit);
        self.head.y =
            (self.head.y + rng.uniform(-c.head_step, c.head_step)).clamp(-c.head_limit, c.head_limit);
        self.head.z = c.head_depth + rng.uniform(-c.head_step, c.head_step);
        self.steps += 1;

        Sample {
            gaze: self.gaze,
            head: self.head,
            occurred_at: at,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}
