//! Twistor CLI
//!
//! Command-line interface for Twistor:
//! - Generate a stream with injected events
//! - Inspect a distribution archive
//! - Print an event manifest
//! - Write the default configuration

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use twistor::config::{generate_default_config, Config, LoggingConfig};
use twistor::{DistributionArchive, EventManifest, StreamGenerator};

#[derive(Parser)]
#[command(name = "twistor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synthetic tweet stream generator with event injection")]
#[command(long_about = "Twistor synthesizes a timestamped term stream from a distribution archive\nand injects events whose terms follow prescribed IDF trajectories.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/twistor/config.toml, /etc/twistor/config.toml, ./twistor.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a stream and its event manifest
    Generate {
        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Distribution archive
        #[arg(long)]
        archive: Option<String>,
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<String>,
        /// Stream length in minutes
        #[arg(short, long)]
        limit_minutes: Option<u32>,
        /// Sampling percentage
        #[arg(short, long)]
        scale: Option<u32>,
    },

    /// Show archive metadata and chunk layout
    Inspect {
        /// Distribution archive (default: from config)
        archive: Option<PathBuf>,
    },

    /// Print an event manifest
    Manifest {
        /// Path to the manifest XML
        path: PathBuf,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_with_env(path).with_context(|| format!("loading {:?}", path)),
        None => Ok(Config::load_default()),
    }
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("twistor={}", config.level)));

    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {:?}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content).with_context(|| format!("writing {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = load_config(cli.config.as_ref())?;
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Generate {
            seed,
            archive,
            output_dir,
            limit_minutes,
            scale,
        } => {
            if seed.is_some() {
                config.stream.seed = seed;
            }
            if let Some(archive) = archive {
                config.stream.archive = archive;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if limit_minutes.is_some() {
                config.stream.limit_minutes = limit_minutes;
            }
            if let Some(scale) = scale {
                config.stream.scale_percent = scale;
            }

            tracing::info!("Twistor v{}", env!("CARGO_PKG_VERSION"));
            let summary = StreamGenerator::new(config)?.run()?;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Table => print!("{}", summary),
            }
        }

        Commands::Inspect { archive } => {
            let path = archive.unwrap_or_else(|| PathBuf::from(&config.stream.archive));
            let archive = DistributionArchive::open(&path).with_context(|| format!("opening {:?}", path))?;
            let info = archive.info();

            match cli.format {
                OutputFormat::Json => {
                    let chunks: Vec<String> = archive.chunk_ranges().iter().map(|c| c.to_string()).collect();
                    let value = serde_json::json!({
                        "path": path,
                        "info": info,
                        "chunks": chunks,
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Table => {
                    println!("Archive:        {}", path.display());
                    println!("Chunk window:   {} min", info.chunk_window_minutes);
                    println!("Total length:   {} min", info.total_minutes);
                    println!("Vocabulary:     {} terms", info.vocabulary_size);
                    println!();
                    println!("{:<8} {:<16} {}", "Chunk", "Minutes", "Length");
                    println!("{}", "-".repeat(34));
                    for (i, chunk) in archive.chunk_ranges().iter().enumerate() {
                        println!("{:<8} {:<16} {}", i, chunk.to_string(), chunk.minutes());
                    }
                }
            }
        }

        Commands::Manifest { path } => {
            let manifest = EventManifest::read(&path).with_context(|| format!("reading {:?}", path))?;

            match cli.format {
                OutputFormat::Json => {
                    let value = serde_json::json!({
                        "minutes_before_event_start": manifest.minutes_before_event_start,
                        "event_duration": manifest.event_duration,
                        "events": manifest.events,
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Table => {
                    println!(
                        "Lead: {} min, duration: {} min",
                        manifest.minutes_before_event_start, manifest.event_duration
                    );
                    println!();
                    println!("{:<16} {:>6} {:<30} {}", "Event", "Delay", "Start", "Terms");
                    println!("{}", "-".repeat(80));
                    for event in &manifest.events {
                        println!(
                            "{:<16} {:>6} {:<30} {}",
                            event.id, event.delay_to_pre_event, event.start_string, event.terms
                        );
                    }
                }
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
