//! geoe: geoelectric field derivation from ground magnetometer data.
//!
//! This is the main entry point for the command line tool.

mod config;
mod input;
mod orchestrator;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_dsp::fft::rfft_frequencies;
use lib_dsp::{impedance_for_model, DEFAULT_DT};
use lib_profile::ProfileStore;
use lib_types::earth::EarthModel;
use lib_types::series::FieldSeries;
use lib_types::units::{OhmMeters, Seconds};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "geoe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive electric fields for the stations of a run configuration
    Derive {
        /// Path to the run configuration file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory, overriding the configured one
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Tabulate the surface impedance on the FFT frequency grid
    Impedance {
        /// Station code to look up in the profile directories
        #[arg(short, long, conflicts_with = "profile", required_unless_present = "profile")]
        station: Option<String>,

        /// Resistivity profile file
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Series length the grid is built for
        #[arg(short = 'n', long, default_value = "1440")]
        samples: usize,

        /// Sample interval (s)
        #[arg(long, default_value_t = DEFAULT_DT.0)]
        dt: f64,

        /// Extra profile directory, searched first
        #[arg(long = "profile-dir")]
        profile_dirs: Vec<PathBuf>,
    },

    /// Parse and show a resistivity profile
    Profile {
        /// Station code or path to a profile file
        #[arg(required_unless_present = "list")]
        target: Option<String>,

        /// List the stations that have a profile
        #[arg(long)]
        list: bool,

        /// Extra profile directory, searched first
        #[arg(long = "profile-dir")]
        profile_dirs: Vec<PathBuf>,
    },

    /// Generate a synthetic sinusoidal magnetic series
    Synth {
        /// Period of the variation (s)
        #[arg(long, default_value = "3600")]
        period: f64,

        /// Amplitude (nT)
        #[arg(short, long, default_value = "100")]
        amplitude: f64,

        /// Number of samples
        #[arg(short = 'n', long, default_value = "1440")]
        samples: usize,

        /// Sample interval (s)
        #[arg(long, default_value_t = DEFAULT_DT.0)]
        dt: f64,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Derive { config, output } => {
            run_derivation(&config, output, cli.format)?;
        }
        Commands::Impedance { station, profile, samples, dt, profile_dirs } => {
            let model = resolve_model(station.as_deref(), profile.as_deref(), profile_dirs)?;
            show_impedance(&model, samples, dt, cli.format)?;
        }
        Commands::Profile { target, list, profile_dirs } => {
            show_profile(target.as_deref(), list, profile_dirs, cli.format)?;
        }
        Commands::Synth { period, amplitude, samples, dt, output } => {
            synthesize(period, amplitude, samples, dt, output)?;
        }
    }

    Ok(())
}

fn run_derivation(
    config_path: &Path,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = config::load_config(config_path)?;
    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let orchestrator = orchestrator::Orchestrator::new(config)?;

    let results = orchestrator.run()?;

    output::write_results(&results, &output_dir, format)?;
    if let OutputFormat::Text = format {
        output::print_results(&results);
    }

    if results.stations.is_empty() {
        anyhow::bail!("No station could be derived ({} failed)", results.failures.len());
    }

    tracing::info!("Derivation complete. Results written to {:?}", output_dir);
    Ok(())
}

fn resolve_model(
    station: Option<&str>,
    profile: Option<&Path>,
    profile_dirs: Vec<PathBuf>,
) -> Result<EarthModel> {
    if let Some(path) = profile {
        return lib_profile::parse_profile_file(path)
            .with_context(|| format!("Failed to load profile {:?}", path));
    }

    let station = station.context("Either --station or --profile is required")?;
    load_station(&ProfileStore::with_default_dirs(profile_dirs), station)
}

fn load_station(store: &ProfileStore, station: &str) -> Result<EarthModel> {
    store.load(station)?.with_context(|| {
        format!("No resistivity profile for station {} in {:?}", station, store.dirs())
    })
}

fn show_impedance(model: &EarthModel, samples: usize, dt: f64, format: OutputFormat) -> Result<()> {
    if samples == 0 {
        anyhow::bail!("--samples must be at least 1");
    }
    if !(dt.is_finite() && dt > 0.0) {
        anyhow::bail!("--dt must be positive, got {}", dt);
    }

    let grid = rfft_frequencies(samples, Seconds(dt));
    let freqs: Vec<f64> = grid.iter().map(|f| f.0).collect();
    let impedance = impedance_for_model(model, &freqs)?;

    if let OutputFormat::Text = format {
        // Depth range the grid resolves in the top layer
        let top = OhmMeters(model.resistivities()[0]);
        if let (Some(lowest), Some(highest)) = (grid.get(1), grid.last()) {
            println!(
                "Top-layer skin depth: {:.2} km at {:.3e} Hz, {:.2} km at {:.3e} Hz",
                top.skin_depth(*lowest).as_km(),
                lowest.0,
                top.skin_depth(*highest).as_km(),
                highest.0
            );
        }
    }

    let stdout = std::io::stdout();
    output::write_impedance(&mut stdout.lock(), &impedance, format)
}

fn show_profile(
    target: Option<&str>,
    list: bool,
    profile_dirs: Vec<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let store = ProfileStore::with_default_dirs(profile_dirs);

    if list {
        for code in store.list() {
            println!("{}", code);
        }
        return Ok(());
    }

    let Some(target) = target else {
        anyhow::bail!("A station code or profile file is required");
    };

    let path = Path::new(target);
    let model = if path.is_file() {
        resolve_model(None, Some(path), Vec::new())?
    } else {
        load_station(&store, target)?
    };

    if let OutputFormat::Text = format {
        println!("Layers: {}", model.num_layers());
        println!("Depth to basement: {:.3} km", model.depth_to_basement().as_km());
        println!("Basement resistivity: {} Ohm-m", model.basement().0);
    }
    let stdout = std::io::stdout();
    output::write_model(&mut stdout.lock(), &model, format)
}

fn synthesize(
    period: f64,
    amplitude: f64,
    samples: usize,
    dt: f64,
    output: Option<PathBuf>,
) -> Result<()> {
    if !(period > 0.0 && dt > 0.0) {
        anyhow::bail!("--period and --dt must be positive");
    }
    tracing::info!("Synthesizing {} samples at period {} s", samples, period);

    let dt = Seconds(dt);
    let period = Seconds(period);
    let north = FieldSeries::sinusoid(amplitude, period, 0.0, samples, dt);
    let east = FieldSeries::sinusoid(amplitude, period, std::f64::consts::FRAC_PI_2, samples, dt);

    println!("Generated synthetic magnetic series:");
    println!("  Samples: {}", north.len());
    println!("  Frequency: {:.3e} Hz", period.to_frequency().0);
    println!("  Duration: {:.2} h", north.duration().as_hours());
    println!("  Peak-to-peak: {:.3} nT", north.peak_to_peak());

    if let Some(output_path) = output {
        let mut writer = std::fs::File::create(&output_path)
            .with_context(|| format!("Failed to create {:?}", output_path))?;
        output::write_magnetic_csv(&mut writer, &north, &east)?;
        println!("  Written to: {:?}", output_path);
    }

    Ok(())
}
