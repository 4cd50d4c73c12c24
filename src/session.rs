//! Tracking session: a classifier bound to an optional camera.
//!
//! The session owns the media-release invariant. The camera is acquired
//! before the classifier starts, released whenever the classifier stops,
//! and released on drop if the host forgets to stop.

use std::time::Duration;

use crate::classifier::PresenceClassifier;
use crate::error::TrackerResult;
use crate::input::{CameraAdapter, VideoCapability};
use crate::state::{TrackerMode, TrackerSnapshot};

pub struct PresenceSession {
    classifier: PresenceClassifier,
    camera: Option<Box<dyn VideoCapability>>,
    adapter: CameraAdapter,
}

impl PresenceSession {
    pub fn new(classifier: PresenceClassifier) -> Self {
        let adapter = CameraAdapter::new(classifier.config().viewport);
        Self {
            classifier,
            camera: None,
            adapter,
        }
    }

    pub fn with_camera(classifier: PresenceClassifier, camera: Box<dyn VideoCapability>) -> Self {
        let mut session = Self::new(classifier);
        session.camera = Some(camera);
        session
    }

    pub fn classifier(&self) -> &PresenceClassifier {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut PresenceClassifier {
        &mut self.classifier
    }

    pub fn camera_acquired(&self) -> bool {
        self.camera
            .as_ref()
            .map(|camera| camera.is_acquired())
            .unwrap_or(false)
    }

    /// Acquire the camera (if any), then start calibration.
    ///
    /// On acquisition failure the camera is released, the classifier stays
    /// `Inactive`, and the error is returned once. Calling `start` again
    /// retries.
    pub fn start(&mut self) -> TrackerResult<()> {
        if self.classifier.mode() != TrackerMode::Inactive {
            return Ok(());
        }
        if let Some(camera) = self.camera.as_mut() {
            if let Err(err) = camera.acquire() {
                log::warn!("session: {}", err);
                camera.release();
                return Err(err);
            }
        }
        self.classifier.start();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.classifier.stop();
        if let Some(camera) = self.camera.as_mut() {
            camera.release();
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.classifier.advance(dt);
    }

    /// Pull one camera frame and feed it to the classifier.
    ///
    /// Returns whether a sample was delivered. Frames are only pulled while
    /// `Active`. A read error stops the session before it is returned.
    pub fn pump_frame(&mut self) -> TrackerResult<bool> {
        if self.classifier.mode() != TrackerMode::Active {
            return Ok(false);
        }
        let Some(camera) = self.camera.as_mut() else {
            return Ok(false);
        };
        let frame = match camera.frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("session: frame read failed: {}", err);
                self.stop();
                return Err(err);
            }
        };
        let Some(frame) = frame else {
            return Ok(false);
        };
        let now = self.classifier.now();
        match self.adapter.sample(&frame, now) {
            Some(sample) => {
                self.classifier.on_sample(sample);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn reset_alert(&mut self) -> TrackerResult<()> {
        self.classifier.reset_alert()
    }

    pub fn get_state(&self) -> TrackerSnapshot {
        self.classifier.get_state()
    }
}

impl Drop for PresenceSession {
    fn drop(&mut self) {
        self.stop();
    }
}
