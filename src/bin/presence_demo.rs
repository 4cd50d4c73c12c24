//! presence_demo - drive the presence tracker end to end
//!
//! Feeds pointer, simulated or camera samples into a tracking session in
//! virtual time (default) or wall-clock time (`--realtime`, Ctrl-C stops),
//! printing every presence transition and a final summary.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::f64::consts::PI;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use presence_tracker::ui::{debug_readout, StatusReporter};
use presence_tracker::{
    CameraConfig, CameraSource, ChannelObserver, LogObserver, PointerAdapter, PresenceClassifier,
    PresenceSession, RandomWalkAdapter, RandomWalkConfig, SeededRandom, TrackerConfig,
};

const DEFAULT_CAMERA_URL: &str = "stub://desk";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AdapterKind {
    Pointer,
    Simulated,
    Camera,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Tracking duration in seconds.
    #[arg(long, default_value_t = 60)]
    seconds: u64,
    /// Sample source.
    #[arg(long, value_enum, default_value_t = AdapterKind::Simulated)]
    adapter: AdapterKind,
    /// Camera URL for the camera adapter (e.g. stub://desk, stub://denied).
    #[arg(long, env = "PRESENCE_CAMERA_URL")]
    camera: Option<String>,
    /// Deterministic seed for scoring and simulation.
    #[arg(long)]
    seed: Option<u64>,
    /// Stop feeding samples after this many seconds, to exercise the watchdog.
    #[arg(long)]
    idle_after: Option<u64>,
    /// Interval between samples, in milliseconds.
    #[arg(long, default_value_t = 500)]
    sample_every_ms: u64,
    /// Run against the wall clock instead of virtual time.
    #[arg(long)]
    realtime: bool,
    /// Emit transitions and the final snapshot as JSON lines on stdout.
    #[arg(long)]
    json: bool,
    /// Print the raw metric readout with the summary.
    #[arg(long)]
    debug_info: bool,
    /// UI mode: auto, plain or pretty.
    #[arg(long)]
    ui: Option<String>,
    /// Config file (TOML or JSON). Defaults to $PRESENCE_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.sample_every_ms == 0 {
        return Err(anyhow!("sample-every-ms must be >= 1"));
    }

    let cfg = match &args.config {
        Some(path) => TrackerConfig::load_from(Some(path.as_path()))?,
        None => TrackerConfig::load()?,
    };
    let seed = args.seed.or(cfg.seed);
    let viewport = cfg.classifier.viewport;

    let mut classifier = PresenceClassifier::new(
        cfg.classifier.clone(),
        Box::new(SeededRandom::from_optional_seed(seed)),
    )?;
    let (tx, rx) = mpsc::channel();
    classifier.subscribe(Box::new(LogObserver));
    classifier.subscribe(Box::new(ChannelObserver::new(tx)));

    let mut session = match args.adapter {
        AdapterKind::Camera => {
            let url = args
                .camera
                .clone()
                .or(cfg.camera_url.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string());
            let camera = CameraSource::open(CameraConfig {
                url,
                ..CameraConfig::default()
            })?;
            PresenceSession::with_camera(classifier, camera)
        }
        _ => PresenceSession::new(classifier),
    };

    let running = Arc::new(AtomicBool::new(true));
    if args.realtime {
        let flag = Arc::clone(&running);
        ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let reporter = StatusReporter::from_args(args.ui.as_deref(), std::io::stderr().is_terminal());
    let mut pointer = PointerAdapter::new(viewport);
    let mut walk = RandomWalkAdapter::new(
        RandomWalkConfig {
            viewport,
            ..RandomWalkConfig::default()
        },
        Box::new(SeededRandom::from_optional_seed(
            seed.map(|s| s.wrapping_add(1)),
        )),
    );

    session
        .start()
        .with_context(|| format!("starting {:?} tracking", args.adapter))?;

    let step = Duration::from_millis(args.sample_every_ms);
    let total = Duration::from_secs(args.seconds);
    let idle_after = args.idle_after.map(Duration::from_secs);
    let mut elapsed = Duration::ZERO;
    let mut samples_offered = 0u64;

    while elapsed < total && running.load(Ordering::SeqCst) {
        session.advance(step);
        elapsed += step;
        if args.realtime {
            std::thread::sleep(step);
        }

        let feeding = idle_after.map(|limit| elapsed < limit).unwrap_or(true);
        if feeding {
            let now = session.classifier().now();
            match args.adapter {
                AdapterKind::Pointer => {
                    let (x, y) = pointer_path(now, viewport.width, viewport.height);
                    let sample = pointer.sample(x, y, now);
                    session.classifier_mut().on_sample(sample);
                }
                AdapterKind::Simulated => {
                    let sample = walk.next_sample(now);
                    session.classifier_mut().on_sample(sample);
                }
                AdapterKind::Camera => {
                    session.pump_frame()?;
                }
            }
            samples_offered += 1;
        }

        for change in rx.try_iter() {
            reporter.transition(&change);
            if args.json {
                println!("{}", serde_json::to_string(&change)?);
            }
        }
        reporter.update(&session.get_state());
    }

    let snapshot = session.get_state();
    let stats = session.classifier().stats();
    reporter.finish(&snapshot);
    if args.json {
        println!("{}", serde_json::to_string(&snapshot)?);
    }
    session.stop();

    println!("presence_demo summary:");
    println!("  adapter: {:?}", args.adapter);
    println!("  tracked: {:.1}s", elapsed.as_secs_f64());
    println!("  samples offered: {}", samples_offered);
    println!("  samples accepted: {}", stats.samples);
    println!("  ticks: {}", stats.ticks);
    println!("  transitions: {}", stats.transitions);
    if let Some(attention) = &snapshot.attention {
        println!("  final state: {}", attention.presence_state.label());
        println!("  final attention: {}%", attention.attention_score);
    }
    if args.debug_info {
        println!("{}", debug_readout(&snapshot));
    }
    Ok(())
}

/// Smooth figure-eight pointer path across the viewport.
fn pointer_path(now: Duration, width: f64, height: f64) -> (f64, f64) {
    let t = now.as_secs_f64();
    let x = width / 2.0 + width / 3.0 * (t / 1.7).sin();
    let y = height / 2.0 + height / 3.0 * (2.0 * t / 1.7 + PI / 4.0).sin();
    (x, y)
}
