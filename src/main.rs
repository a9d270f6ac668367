//! Landing Tracker CLI
//!
//! Replay recorded page sessions, run a live session from stdin, and analyze
//! tracked button events.

use anyhow::{bail, Context};
use chrono::{Duration as ChronoDuration, Utc};
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use landing_tracker::{
    config::Config,
    core::{AnalyticsSink, Emitter, InteractionTracker, JsonLinesSink, SharedVariant, UiEffect},
    insights::{compute_button_metrics, read_tracked_events, InsightsReport},
    page::{
        load_script, replay, spawn_line_source, LiveDriver, PageEvent, PageLayout, TimedEvent,
    },
    transparency::{create_shared_log_with_persistence, SharedTransparencyLog},
    EVENT_CATALOG, VERSION,
};

/// Longest time timers may keep running after a replayed script (one week).
const MAX_LINGER_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Parser)]
#[command(name = "landing-tracker")]
#[command(version = VERSION)]
#[command(about = "Interaction analytics for landing pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded page session through the tracker
    Replay {
        /// Page layout (JSON)
        #[arg(long)]
        layout: PathBuf,

        /// Recorded session script (JSON lines of timed page events)
        #[arg(long)]
        script: PathBuf,

        /// Page variant label (overrides the configured one)
        #[arg(long)]
        variant: Option<String>,

        /// Run without an analytics sink
        #[arg(long)]
        no_sink: bool,

        /// Where to write tracked events (JSON lines)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Keep timers running this many seconds after the last event
        #[arg(long, default_value = "0")]
        linger_secs: i64,
    },

    /// Track a live session, reading one page event per line from stdin
    Live {
        /// Page layout (JSON)
        #[arg(long)]
        layout: PathBuf,

        /// Page variant label (overrides the configured one)
        #[arg(long)]
        variant: Option<String>,

        /// Run without an analytics sink
        #[arg(long)]
        no_sink: bool,

        /// Where to write tracked events (JSON lines)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Analyze tracked events into button insights
    Analyze {
        /// Tracked events (JSON lines, as written by replay/live)
        events: PathBuf,

        /// Where to save the insights report
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show tracking statistics
    Status,

    /// List the events the tracker emits
    Events,

    /// Show configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            layout,
            script,
            variant,
            no_sink,
            output,
            linger_secs,
        } => cmd_replay(&layout, &script, variant, no_sink, output, linger_secs),
        Commands::Live {
            layout,
            variant,
            no_sink,
            output,
        } => cmd_live(&layout, variant, no_sink, output),
        Commands::Analyze { events, output } => cmd_analyze(&events, output),
        Commands::Status => cmd_status(),
        Commands::Events => {
            cmd_events();
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

/// Initializes the logging subsystem.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config and make sure its directories exist.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().with_context(|| {
        format!("loading configuration {}", Config::config_path().display())
    })?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "could not create data directories");
    }
    Ok(config)
}

/// Build the emitter for a session and report where events go.
fn build_emitter(
    config: &Config,
    variant: Option<String>,
    no_sink: bool,
    output: Option<PathBuf>,
    log: SharedTransparencyLog,
) -> anyhow::Result<Emitter> {
    let variant = SharedVariant::new(variant.or_else(|| config.page_variant.clone()));

    let sink: Option<Box<dyn AnalyticsSink>> = if no_sink {
        println!("  Analytics sink: disabled");
        None
    } else {
        let path = output.unwrap_or_else(|| {
            config.export_path.join(format!(
                "session_{}.jsonl",
                Utc::now().format("%Y%m%d_%H%M%S")
            ))
        });
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        println!("  Tracked events: {}", path.display());
        Some(Box::new(JsonLinesSink::new(BufWriter::new(file))))
    };

    println!("  Page variant: {}", variant.current());
    Ok(Emitter::new(sink, variant).with_transparency_log(log))
}

fn print_effect(at: chrono::DateTime<Utc>, effect: &UiEffect) {
    let description = match effect {
        UiEffect::PreventDefault { target } => format!("prevent default on {target:?}"),
        UiEffect::SetTransform { target, transform } => {
            format!("{target:?} transform: {transform}")
        }
        UiEffect::SetTransition { target, value } => format!("{target:?} transition: {value}"),
        UiEffect::ShowMessage(message) => format!("message: {message}"),
    };
    println!("[{}] {}", at.format("%H:%M:%S%.3f"), description);
}

fn cmd_replay(
    layout_path: &Path,
    script_path: &Path,
    variant: Option<String>,
    no_sink: bool,
    output: Option<PathBuf>,
    linger_secs: i64,
) -> anyhow::Result<()> {
    println!("Landing Tracker v{VERSION}");
    println!();

    let layout = PageLayout::load(layout_path)
        .with_context(|| format!("loading layout {}", layout_path.display()))?;
    let events = load_script(script_path)
        .with_context(|| format!("loading script {}", script_path.display()))?;
    let Some(first) = events.first() else {
        bail!("script {} contains no events", script_path.display());
    };
    let started_at = first.at;
    let linger = ChronoDuration::seconds(linger_secs.clamp(0, MAX_LINGER_SECS));
    let until = events.last().and_then(|last| last.at.checked_add_signed(linger));

    let config = load_config()?;
    let log = create_shared_log_with_persistence(config.transparency_path());
    println!("Replaying {} page events...", events.len());
    let emitter = build_emitter(&config, variant, no_sink, output, log.clone())?;
    println!();

    let mut tracker =
        InteractionTracker::start(layout, emitter, config.tracker.clone(), started_at);
    let effects = replay(&mut tracker, &events, until);
    for effect in &effects {
        print_effect(effect.at, &effect.effect);
    }

    println!();
    println!(
        "Replay finished: {} page events, {} UI effects, max scroll depth {}%",
        events.len(),
        effects.len(),
        tracker.scroll_depth().max_depth_reported()
    );

    if let Err(e) = log.save() {
        tracing::warn!(error = %e, "could not save transparency log");
    }
    Ok(())
}

fn cmd_live(
    layout_path: &Path,
    variant: Option<String>,
    no_sink: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("Landing Tracker v{VERSION}");
    println!();

    let layout = PageLayout::load(layout_path)
        .with_context(|| format!("loading layout {}", layout_path.display()))?;
    let config = load_config()?;
    let log = create_shared_log_with_persistence(config.transparency_path());
    println!("Starting live session...");
    let emitter = build_emitter(&config, variant, no_sink, output, log.clone())?;
    println!();
    println!("Reading page events from stdin. Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    let stdin = BufReader::new(std::io::stdin());
    let (receiver, _reader) = spawn_line_source(stdin);
    let tracker = InteractionTracker::start(layout, emitter, config.tracker.clone(), Utc::now());
    let mut driver = LiveDriver::new(tracker);

    while running.load(Ordering::SeqCst) && !driver.tracker().is_torn_down() {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                for effect in driver.dispatch(&event) {
                    print_effect(effect.at, &effect.effect);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("end of input");
                break;
            }
        }

        for effect in driver.advance(Utc::now()) {
            print_effect(effect.at, &effect.effect);
        }
    }

    if !driver.tracker().is_torn_down() {
        driver.dispatch(&TimedEvent::now(PageEvent::Unload));
    }

    println!();
    println!("{}", log.summary());
    if let Err(e) = log.save() {
        tracing::warn!(error = %e, "could not save transparency log");
    }
    Ok(())
}

fn cmd_analyze(events_path: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let file =
        File::open(events_path).with_context(|| format!("opening {}", events_path.display()))?;
    let events = read_tracked_events(BufReader::new(file))
        .with_context(|| format!("reading {}", events_path.display()))?;

    let metrics = compute_button_metrics(&events);
    println!("Analyzed {} events into {} button groups", events.len(), metrics.len());
    for metric in &metrics {
        println!("  {} on {}:", metric.button_type, metric.page_variant);
        println!("    - Clicks: {}", metric.total_clicks);
        println!("    - Hovers: {}", metric.total_hovers);
        println!("    - Avg hover duration: {:.0}ms", metric.avg_hover_duration);
        println!("    - Click-through rate: {:.2}%", metric.click_through_rate * 100.0);
        println!("    - Engagement score: {:.2}", metric.engagement_score);
    }
    println!();

    let report = InsightsReport::new(events.len(), metrics);
    println!("{}", report.notification_text());

    let path = match output {
        Some(path) => path,
        None => load_config()?.export_path.join("button_insights.json"),
    };
    report
        .save(&path)
        .with_context(|| format!("saving report to {}", path.display()))?;
    println!();
    println!("Insights saved to {}", path.display());
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    let log = create_shared_log_with_persistence(config.transparency_path());

    println!("Landing Tracker v{VERSION}");
    println!();
    println!("{}", log.summary());
    Ok(())
}

fn cmd_events() {
    println!("Tracked events:");
    for (name, trigger) in EVENT_CATALOG {
        println!("  {name:<28} {trigger}");
    }
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    let json = serde_json::to_string_pretty(&config).context("serializing configuration")?;

    println!("Configuration file: {}", Config::config_path().display());
    println!();
    println!("{json}");
    Ok(())
}
