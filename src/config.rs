use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{TrackerError, TrackerResult};

const DEFAULT_WARMUP_MS: u64 = 3_000;
const DEFAULT_TICK_MS: u64 = 2_000;
const DEFAULT_WATCHDOG_MS: u64 = 15_000;
const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;
const DEFAULT_VIEWPORT_HEIGHT: f64 = 720.0;

// -------------------- Runtime settings --------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// Calibration delay between `start()` and `Active`.
    pub warmup: Duration,
    pub tick_period: Duration,
    /// No sample for this long forces `Away`.
    pub inactivity_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_millis(DEFAULT_WARMUP_MS),
            tick_period: Duration::from_millis(DEFAULT_TICK_MS),
            inactivity_timeout: Duration::from_millis(DEFAULT_WATCHDOG_MS),
        }
    }
}

/// Per-tick perturbation bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub focus_gain_max: f64,
    pub unfocus_loss_max: f64,
    pub head_movement_limit: f64,
    pub head_movement_penalty: f64,
    pub blink_rate_min: u32,
    /// Exclusive.
    pub blink_rate_max: u32,
    pub focus_ratio_delta_min: f64,
    pub focus_ratio_delta_max: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            focus_gain_max: 1.0,
            unfocus_loss_max: 2.0,
            head_movement_limit: 15.0,
            head_movement_penalty: 1.0,
            blink_rate_min: 12,
            blink_rate_max: 22,
            focus_ratio_delta_min: -0.5,
            focus_ratio_delta_max: 1.5,
        }
    }
}

/// Fake-presence thresholds. These are demo constants, kept tunable.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub low_attention_score: f64,
    /// Trigger when the low-attention streak exceeds this.
    pub low_attention_ticks: u32,
    /// Trigger when the pattern score exceeds this.
    pub pattern_threshold: f64,
    pub pattern_probability: f64,
    pub pattern_decay: f64,
    /// Recovery needs a score strictly above this.
    pub recovery_score: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            low_attention_score: 30.0,
            low_attention_ticks: 5,
            pattern_threshold: 3.0,
            pattern_probability: 0.1,
            pattern_decay: 0.5,
            recovery_score: 50.0,
        }
    }
}

/// Screen area that counts as "on screen" for gaze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierConfig {
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub detection: DetectionConfig,
    pub viewport: Viewport,
}

impl ClassifierConfig {
    pub fn validate(&self) -> TrackerResult<()> {
        let invalid = |msg: &str| Err(TrackerError::InvalidConfig(msg.to_string()));
        let tunables = [
            ("scoring.focus_gain_max", self.scoring.focus_gain_max),
            ("scoring.unfocus_loss_max", self.scoring.unfocus_loss_max),
            ("scoring.head_movement_limit", self.scoring.head_movement_limit),
            ("scoring.head_movement_penalty", self.scoring.head_movement_penalty),
            ("scoring.focus_ratio_delta_min", self.scoring.focus_ratio_delta_min),
            ("scoring.focus_ratio_delta_max", self.scoring.focus_ratio_delta_max),
            ("detection.low_attention_score", self.detection.low_attention_score),
            ("detection.pattern_threshold", self.detection.pattern_threshold),
            ("detection.pattern_probability", self.detection.pattern_probability),
            ("detection.pattern_decay", self.detection.pattern_decay),
            ("detection.recovery_score", self.detection.recovery_score),
            ("viewport.width", self.viewport.width),
            ("viewport.height", self.viewport.height),
        ];
        if let Some((name, _)) = tunables.iter().find(|(_, value)| !value.is_finite()) {
            return Err(TrackerError::InvalidConfig(format!(
                "{} must be a finite number",
                name
            )));
        }
        if self.timing.tick_period.is_zero() {
            return invalid("tick period must be greater than zero");
        }
        if self.timing.inactivity_timeout.is_zero() {
            return invalid("inactivity timeout must be greater than zero");
        }
        if self.scoring.blink_rate_min >= self.scoring.blink_rate_max {
            return invalid("blink rate range is empty");
        }
        if self.scoring.focus_ratio_delta_min > self.scoring.focus_ratio_delta_max {
            return invalid("focus ratio delta range is inverted");
        }
        if self.scoring.focus_gain_max < 0.0 || self.scoring.unfocus_loss_max < 0.0 {
            return invalid("score deltas must be non-negative");
        }
        if !(0.0..=1.0).contains(&self.detection.pattern_probability) {
            return invalid("pattern probability must be within [0, 1]");
        }
        if self.detection.pattern_decay < 0.0 {
            return invalid("pattern decay must be non-negative");
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return invalid("viewport must have a positive size");
        }
        Ok(())
    }
}

/// Everything a host needs to wire up tracking.
#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    pub classifier: ClassifierConfig,
    pub seed: Option<u64>,
    pub camera_url: Option<String>,
}

// -------------------- File format --------------------

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TrackerConfigFile {
    seed: Option<u64>,
    camera_url: Option<String>,
    timing: Option<TimingConfigFile>,
    scoring: Option<ScoringConfigFile>,
    detection: Option<DetectionConfigFile>,
    viewport: Option<ViewportConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TimingConfigFile {
    warmup_ms: Option<u64>,
    tick_ms: Option<u64>,
    inactivity_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ScoringConfigFile {
    focus_gain_max: Option<f64>,
    unfocus_loss_max: Option<f64>,
    head_movement_limit: Option<f64>,
    head_movement_penalty: Option<f64>,
    blink_rate_min: Option<u32>,
    blink_rate_max: Option<u32>,
    focus_ratio_delta_min: Option<f64>,
    focus_ratio_delta_max: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectionConfigFile {
    low_attention_score: Option<f64>,
    low_attention_ticks: Option<u32>,
    pattern_threshold: Option<f64>,
    pattern_probability: Option<f64>,
    pattern_decay: Option<f64>,
    recovery_score: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ViewportConfigFile {
    width: Option<f64>,
    height: Option<f64>,
}

impl TrackerConfig {
    /// Defaults, then `PRESENCE_CONFIG` (TOML or JSON), then env overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("PRESENCE_CONFIG").ok();
        Self::load_from(path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => TrackerConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.classifier.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TrackerConfigFile) -> Self {
        let mut classifier = ClassifierConfig::default();

        if let Some(timing) = file.timing {
            let t = &mut classifier.timing;
            if let Some(ms) = timing.warmup_ms {
                t.warmup = Duration::from_millis(ms);
            }
            if let Some(ms) = timing.tick_ms {
                t.tick_period = Duration::from_millis(ms);
            }
            if let Some(ms) = timing.inactivity_timeout_ms {
                t.inactivity_timeout = Duration::from_millis(ms);
            }
        }

        if let Some(scoring) = file.scoring {
            let s = &mut classifier.scoring;
            s.focus_gain_max = scoring.focus_gain_max.unwrap_or(s.focus_gain_max);
            s.unfocus_loss_max = scoring.unfocus_loss_max.unwrap_or(s.unfocus_loss_max);
            s.head_movement_limit = scoring.head_movement_limit.unwrap_or(s.head_movement_limit);
            s.head_movement_penalty = scoring
                .head_movement_penalty
                .unwrap_or(s.head_movement_penalty);
            s.blink_rate_min = scoring.blink_rate_min.unwrap_or(s.blink_rate_min);
            s.blink_rate_max = scoring.blink_rate_max.unwrap_or(s.blink_rate_max);
            s.focus_ratio_delta_min = scoring
                .focus_ratio_delta_min
                .unwrap_or(s.focus_ratio_delta_min);
            s.focus_ratio_delta_max = scoring
                .focus_ratio_delta_max
                .unwrap_or(s.focus_ratio_delta_max);
        }

        if let Some(detection) = file.detection {
            let d = &mut classifier.detection;
            d.low_attention_score = detection
                .low_attention_score
                .unwrap_or(d.low_attention_score);
            d.low_attention_ticks = detection
                .low_attention_ticks
                .unwrap_or(d.low_attention_ticks);
            d.pattern_threshold = detection.pattern_threshold.unwrap_or(d.pattern_threshold);
            d.pattern_probability = detection
                .pattern_probability
                .unwrap_or(d.pattern_probability);
            d.pattern_decay = detection.pattern_decay.unwrap_or(d.pattern_decay);
            d.recovery_score = detection.recovery_score.unwrap_or(d.recovery_score);
        }

        if let Some(viewport) = file.viewport {
            let v = &mut classifier.viewport;
            v.width = viewport.width.unwrap_or(v.width);
            v.height = viewport.height.unwrap_or(v.height);
        }

        Self {
            classifier,
            seed: file.seed,
            camera_url: file.camera_url.filter(|url| !url.trim().is_empty()),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(ms) = env_millis("PRESENCE_WARMUP_MS")? {
            self.classifier.timing.warmup = ms;
        }
        if let Some(ms) = env_millis("PRESENCE_TICK_MS")? {
            self.classifier.timing.tick_period = ms;
        }
        if let Some(ms) = env_millis("PRESENCE_WATCHDOG_MS")? {
            self.classifier.timing.inactivity_timeout = ms;
        }
        if let Ok(seed) = std::env::var("PRESENCE_SEED") {
            if !seed.trim().is_empty() {
                let seed: u64 = seed
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("PRESENCE_SEED must be an unsigned integer"))?;
                self.seed = Some(seed);
            }
        }
        if let Ok(url) = std::env::var("PRESENCE_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera_url = Some(url);
            }
        }
        Ok(())
    }
}

fn env_millis(key: &str) -> Result<Option<Duration>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be an integer number of milliseconds", key))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<TrackerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let cfg: TrackerConfigFile = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
