//! recoil-playback - recoil pattern playback
//!
//! Entry point for the command-line binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recoil_playback::config::Config;
use recoil_playback::hotkeys::HotkeyRegistry;
use recoil_playback::pattern::{DirectoryPatternStore, PatternRecord, PatternStore};
use recoil_playback::playback::PlaybackEngine;
use recoil_playback::pointer::{PointerSink, RecordingSink};
use recoil_playback::utils::format_user_error;

/// Command-line arguments for recoil-playback
#[derive(Parser, Debug)]
#[command(name = "recoil-playback")]
#[command(version, about = "Recoil pattern playback engine", long_about = None)]
pub struct Args {
    /// Configuration file path (defaults to the platform config directory)
    #[arg(short, long, env = "RECOIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pattern directory (overrides config)
    #[arg(long, env = "RECOIL_PATTERNS_DIR")]
    pub patterns_dir: Option<PathBuf>,

    /// In-game sensitivity (overrides config)
    #[arg(long)]
    pub sensitivity: Option<f32>,

    /// Do not ease the pointer back after a stop
    #[arg(long)]
    pub no_return: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available patterns
    List,

    /// Show a pattern scaled with the configured settings
    Show {
        /// Pattern name
        name: String,
    },

    /// Play a pattern until it completes, Ctrl-C, or the time limit
    Play {
        /// Pattern name
        name: String,

        /// Record movements instead of moving the pointer
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many milliseconds
        #[arg(long)]
        max_ms: Option<u64>,
    },

    /// Show hotkey bindings (config plus pattern defaults)
    Bindings,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let explicit_config = args.config.is_some();
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let loaded = if explicit_config || config_path.exists() {
        Some(Config::load(&config_path))
    } else {
        None
    };

    let base_config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => Config::default_config(),
    };
    init_logging(&args, &base_config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  recoil-playback v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    match loaded {
        Some(Ok(_)) => info!("Configuration loaded from {}", config_path.display()),
        Some(Err(e)) if explicit_config => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
        Some(Err(e)) => warn!("Failed to load config: {:#}, using defaults", e),
        None => debug!("No config at {}, using defaults", config_path.display()),
    }

    let config =
        base_config.with_overrides(args.patterns_dir.clone(), args.sensitivity, args.no_return);
    debug!("Config: {:?}", config);

    if let Err(e) = run(args.command, config, &config_path).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Command::List => list_patterns(&config),
        Command::Show { name } => show_pattern(&config, &name),
        Command::Play {
            name,
            dry_run,
            max_ms,
        } => play_pattern(&config, &name, dry_run, max_ms).await,
        Command::Bindings => show_bindings(&config),
        Command::InitConfig { force } => init_config(config_path, force),
    }
}

fn open_store(config: &Config) -> Result<Arc<DirectoryPatternStore>> {
    let store = DirectoryPatternStore::open(&config.patterns.directory).with_context(|| {
        format!(
            "Failed to open pattern directory: {}",
            config.patterns.directory.display()
        )
    })?;
    Ok(Arc::new(store))
}

fn records(store: &DirectoryPatternStore) -> Vec<PatternRecord> {
    store
        .names()
        .iter()
        .filter_map(|name| store.record(name))
        .collect()
}

fn list_patterns(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let records = records(&store);

    if records.is_empty() {
        println!("No patterns in {}", store.directory().display());
        return Ok(());
    }

    for record in records {
        println!(
            "{:<16} {:>4} points {:>6} ms  {:<6} {}",
            record.name,
            record.pattern.len(),
            record.pattern.total_duration_ms(),
            record.default_hotkey.as_deref().unwrap_or("-"),
            record.description
        );
    }
    Ok(())
}

fn build_engine(
    config: &Config,
    store: Arc<dyn PatternStore>,
    sink: Arc<dyn PointerSink>,
) -> Result<PlaybackEngine> {
    PlaybackEngine::with_settings(store, sink, config.engine).context("Invalid engine settings")
}

fn show_pattern(config: &Config, name: &str) -> Result<()> {
    let store = open_store(config)?;
    let engine = build_engine(config, store, Arc::new(RecordingSink::new()))?;
    engine.try_load_pattern(name)?;

    let factors = engine.scaling_factors();
    let Some(scaled) = engine.scaled_pattern() else {
        anyhow::bail!("Pattern not found: {}", name);
    };
    let (net_x, net_y) = scaled.net_displacement();

    println!("Pattern:      {}", name);
    println!("Points:       {}", scaled.len());
    println!("Duration:     {} ms", scaled.total_duration_ms());
    println!("Displacement: ({}, {})", net_x, net_y);
    println!(
        "Multipliers:  x={:.4} y={:.4}",
        factors.x_multiplier(),
        factors.y_multiplier()
    );
    Ok(())
}

fn create_sink(dry_run: bool) -> Result<(Arc<dyn PointerSink>, Option<Arc<RecordingSink>>)> {
    if dry_run {
        let recorder = Arc::new(RecordingSink::new());
        return Ok((recorder.clone(), Some(recorder)));
    }
    Ok((backend_sink()?, None))
}

#[cfg(feature = "enigo")]
fn backend_sink() -> Result<Arc<dyn PointerSink>> {
    let sink = recoil_playback::pointer::EnigoSink::new()
        .context("Failed to initialize pointer backend")?;
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "enigo"))]
fn backend_sink() -> Result<Arc<dyn PointerSink>> {
    warn!("Built without the enigo feature; movements are only logged");
    Ok(Arc::new(recoil_playback::pointer::TracingSink))
}

async fn play_pattern(config: &Config, name: &str, dry_run: bool, max_ms: Option<u64>) -> Result<()> {
    let store = open_store(config)?;
    let (sink, recorder) = create_sink(dry_run)?;
    let engine = build_engine(config, store, sink)?;

    let points = engine.try_load_pattern(name)?;
    engine.try_start()?;
    info!("Playing {} ({} points), Ctrl-C to stop", name, points);

    let limit = async {
        match max_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = engine.wait_idle() => info!("Pattern finished"),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        _ = limit => info!("Time limit reached"),
    }

    match engine.stop().await {
        Some(report) => println!(
            "Stopped after {}/{} points ({} sink failures, max lag {:?})",
            report.points_issued, report.total_points, report.sink_failures, report.max_lag
        ),
        None => {
            let snapshot = engine.snapshot();
            println!(
                "Completed {} points, displacement ({}, {})",
                snapshot.cursor_index, snapshot.accumulated_dx, snapshot.accumulated_dy
            );
        }
    }

    if let Some(recorder) = recorder {
        let start = recorder.moves().first().map(|m| m.at);
        for m in recorder.moves() {
            let offset = start.map(|s| m.at - s).unwrap_or_default();
            println!("{:>6} ms  ({:>4}, {:>4})", offset.as_millis(), m.dx, m.dy);
        }
    }
    Ok(())
}

fn show_bindings(config: &Config) -> Result<()> {
    let registry = HotkeyRegistry::from_config(&config.hotkeys);
    let store = open_store(config)?;
    let added = registry.register_defaults(records(&store).iter());
    debug!("{} default hotkeys added", added);

    if registry.is_empty() {
        println!("No hotkeys bound");
    }
    for (key, pattern) in registry.bindings() {
        println!("{:<8} {}", key, pattern);
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Refusing to overwrite existing config: {} (use --force)",
            path.display()
        );
    }
    Config::default_config().save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn init_logging(args: &Args, config: &Config) -> Result<()> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => config.logging.level.to_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "recoil_playback={level},warn",
            level = log_level
        ))
    });

    let log_file = args.log_file.as_ref().or(config.logging.log_file.as_ref());

    // If log file is specified, write to both stderr and file
    if let Some(log_file_path) = log_file {
        let file = File::create(log_file_path)
            .with_context(|| format!("Failed to create log file: {}", log_file_path.display()))?;

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path.display());
    } else {
        // Stdout is reserved for command output
        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
        }
    }

    Ok(())
}
