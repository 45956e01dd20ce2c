use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use heartwatch::aggregator::{summarize, AggregatedPoint, SessionStats};
use heartwatch::alerts::{Alert, AlertManager, LogDispatcher};
use heartwatch::config::Config;
use heartwatch::error::ConfigError;
use heartwatch::publish::{HttpSink, ReadingSink};
use heartwatch::range::Range;
use heartwatch::samples::{load_samples, Sample, Timestamp};
use heartwatch::simulator::HeartRateSimulator;
use heartwatch::store::{history, MemoryStore, SampleStore};
use heartwatch::triggers::TriggerEngine;
use heartwatch::zones::{HeartRateZone, ZoneBreakdown};
use log::{error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Command-line arguments for the heart-rate monitor
#[derive(Parser)]
#[command(
    name = "heartwatch",
    about = "Heart-rate history, insights and live monitoring",
    long_about = "Aggregates heart-rate readings into day, week, month and year charts, \
                  summarizes them in plain language, and watches a live stream of readings \
                  for high, low and spiking heart rates."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        global = true,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Aggregate recorded readings into chart points
    History {
        /// JSON array of `{ "timestamp", "heartRate" }` records
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// One of day, week, month, year
        #[arg(short, long)]
        range: Range,

        /// Also print the plain-language summary
        #[arg(long)]
        insights: bool,

        /// Evaluate the window as of this RFC 3339 time instead of now
        #[arg(long, value_name = "RFC3339")]
        now: Option<String>,
    },

    /// Show the training zone for a reading
    Zone {
        /// Heart rate in bpm
        bpm: u32,
    },

    /// Print simulated readings as JSON
    Simulate {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate live readings and raise alerts until interrupted
    Monitor,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        if let Command::History { ref input, .. } = self.command {
            if !input.is_file() {
                return Err(format!("Input file not found: {}", input.display()));
            }
        }

        Ok(())
    }
}

/// Load configuration from file or use defaults
///
/// Unreadable or invalid files are reported and replaced by the defaults.
fn load_config(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => config,
                Err(ConfigError::ReadError(_)) => {
                    warn!(
                        "Configuration file '{}' not found or unreadable, using defaults",
                        path.display()
                    );
                    Config::default()
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path.display(), e);
                    warn!("Using default configuration due to invalid config file");
                    Config::default()
                }
            }
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    }
}

/// Live monitoring loop
///
/// Each tick produces one simulated reading, stores it, optionally posts it
/// to the sensor endpoint, and runs the alert rules over the recent window.
struct HeartMonitor {
    config: Config,
    simulator: HeartRateSimulator,
    store: MemoryStore,
    trigger_engine: TriggerEngine,
    alert_manager: AlertManager,
    sink: Option<Box<dyn ReadingSink>>,
    runtime: tokio::runtime::Runtime,
    stats: SessionStats,
    shutdown_sender: Sender<()>,
    shutdown_receiver: Receiver<()>,
}

impl HeartMonitor {
    fn new(config: Config) -> Result<Self> {
        info!("Initializing heart monitor");

        let sink: Option<Box<dyn ReadingSink>> = match &config.sensor.endpoint {
            Some(endpoint) => {
                let sink = HttpSink::new(
                    endpoint.clone(),
                    Duration::from_secs(config.sensor.timeout_seconds),
                )
                .context("Failed to create sensor client")?;
                info!("Publishing readings to {}", sink.endpoint());
                Some(Box::new(sink))
            }
            None => None,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let dispatcher = LogDispatcher::new(config.alerts.recipient.clone());
        let (shutdown_sender, shutdown_receiver) = mpsc::channel();

        Ok(Self {
            simulator: HeartRateSimulator::new(config.simulator.clone()),
            store: MemoryStore::new(config.store.capacity),
            trigger_engine: TriggerEngine::from_thresholds(&config.thresholds),
            alert_manager: AlertManager::from_config(Box::new(dispatcher), &config.alerts),
            sink,
            runtime,
            stats: SessionStats::new(),
            shutdown_sender,
            shutdown_receiver,
            config,
        })
    }

    #[cfg(test)]
    fn with_sink(mut self, sink: Box<dyn ReadingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Process one reading taken at `now`
    fn tick(&mut self, now: Timestamp) -> Sample {
        let sample = self.simulator.next_sample(now);
        self.store.insert(sample);
        self.stats.record(sample.heart_rate);
        info!("Heart rate: {} bpm", sample.heart_rate);

        if let Some(sink) = &self.sink {
            if let Err(e) = self.runtime.block_on(sink.publish(&sample)) {
                warn!("Failed to publish reading: {}", e);
            }
        }

        let window =
            ChronoDuration::seconds(self.config.thresholds.spike_window_seconds as i64);
        let recent = self.store.recent(now, window);

        for context in self.trigger_engine.evaluate(&recent, now) {
            info!("Trigger activated: {}", context.triggered_by);
            if let Err(e) = self.alert_manager.send_alert(Alert::from_context(&context)) {
                error!("Failed to send alert: {}", e);
            }
        }

        if let Err(e) = self.alert_manager.tick() {
            error!("Failed to process queued alerts: {}", e);
        }

        sample
    }

    /// Run until a shutdown signal arrives
    fn run(&mut self) {
        let interval = Duration::from_secs(self.config.simulator.interval_seconds);
        info!("Monitoring every {} seconds", interval.as_secs());

        loop {
            self.tick(Utc::now());

            match self.shutdown_receiver.recv_timeout(interval) {
                Ok(()) => {
                    info!("Shutdown signal received");
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Shutdown channel disconnected");
                    break;
                }
            }
        }

        self.log_summary();
    }

    fn log_summary(&self) {
        let points = history(&self.store, Range::Day, &Local::now());
        match summarize(&points, "day") {
            Some(text) => info!("{}", text),
            None => info!("No readings recorded"),
        }

        if let (Some(mean), Some(max), Some(min)) =
            (self.stats.mean(), self.stats.max(), self.stats.min())
        {
            info!(
                "Session: {} readings, average {} bpm, max {} bpm, min {} bpm, ~{:.1} kcal",
                self.stats.count(),
                mean,
                max,
                min,
                self.stats.calories_burned()
            );
        }
    }
}

fn run_history(
    config: &Config,
    input: &Path,
    range: Range,
    insights: bool,
    now: Option<&str>,
) -> Result<()> {
    let samples = load_samples(input)
        .with_context(|| format!("Failed to load readings from {}", input.display()))?;
    info!("Loaded {} readings", samples.len());

    let (points, zones) = match now {
        Some(text) => {
            let now = DateTime::parse_from_rfc3339(text)
                .with_context(|| format!("Invalid --now value: {}", text))?;
            build_history(samples, config.store.capacity, range, &now)
        }
        None => build_history(samples, config.store.capacity, range, &Local::now()),
    };

    println!("{}", serde_json::to_string_pretty(&points)?);

    if insights {
        match summarize(&points, range.as_str()) {
            Some(text) => {
                println!("{}", text);
                println!("{}", format_zones(&zones));
            }
            None => info!("No readings in the selected {}", range),
        }
    }
    Ok(())
}

/// Chart points and zone shares for the `range` window ending at `now`
///
/// The store grows to hold the whole input so no sample inside the window
/// is evicted.
fn build_history<Tz>(
    samples: Vec<Sample>,
    capacity: usize,
    range: Range,
    now: &DateTime<Tz>,
) -> (Vec<AggregatedPoint>, ZoneBreakdown)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let store = MemoryStore::with_samples(capacity.max(samples.len()), samples);

    let (start, end) = range.window(now);
    let in_window = store.query(start.with_timezone(&Utc), end.with_timezone(&Utc));

    (history(&store, range, now), ZoneBreakdown::from_samples(&in_window))
}

/// One line of zone shares, e.g. `Zone time: Rest 25%, Fat Burn 50%, ...`
fn format_zones(zones: &ZoneBreakdown) -> String {
    let shares: Vec<String> = HeartRateZone::ALL
        .iter()
        .map(|&zone| format!("{} {:.0}%", zone, zones.percentage(zone)))
        .collect();
    format!("Zone time: {}", shares.join(", "))
}

fn run_simulate(config: &Config, count: usize, seed: Option<u64>) -> Result<()> {
    let mut simulator = match seed {
        Some(seed) => HeartRateSimulator::seeded(config.simulator.clone(), seed),
        None => HeartRateSimulator::new(config.simulator.clone()),
    };

    let step = ChronoDuration::seconds(config.simulator.interval_seconds as i64);
    let start = Utc::now();
    let samples: Vec<Sample> = (0..count)
        .map(|i| simulator.next_sample(start + step * i as i32))
        .collect();

    println!("{}", serde_json::to_string_pretty(&samples)?);
    Ok(())
}

fn run_monitor(config: Config) -> Result<()> {
    let mut monitor = HeartMonitor::new(config)?;

    let shutdown_sender = monitor.shutdown_sender.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), shutting down gracefully...");
        if let Err(e) = shutdown_sender.send(()) {
            error!("Failed to send shutdown signal: {}", e);
        }
    })
    .context("Error setting SIGINT handler for graceful shutdown")?;

    info!("Heart monitor is running. Press Ctrl+C to stop.");
    monitor.run();
    info!("Heart monitor stopped");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Command::History {
            input,
            range,
            insights,
            now,
        } => run_history(&config, &input, range, insights, now.as_deref()),
        Command::Zone { bpm } => {
            println!("{} bpm: {}", bpm, HeartRateZone::classify(bpm));
            Ok(())
        }
        Command::Simulate { count, seed } => run_simulate(&config, count, seed),
        Command::Monitor => run_monitor(config),
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
