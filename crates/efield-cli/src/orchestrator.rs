//! Multi-station derivation orchestration.

use crate::config::{DerivationConfig, StationConfig};
use crate::input::read_magnetic_csv;
use anyhow::{Context, Result};
use lib_dsp::FieldConvolver;
use lib_profile::ProfileStore;
use lib_types::earth::EarthModel;
use lib_types::series::FieldSeries;
use lib_types::units::Seconds;
use rayon::prelude::*;
use std::path::PathBuf;

/// Derivation orchestrator.
pub struct Orchestrator {
    config: DerivationConfig,
    store: ProfileStore,
}

impl Orchestrator {
    /// Create an orchestrator searching the configured profile directories
    /// ahead of the per-user defaults.
    pub fn new(config: DerivationConfig) -> Result<Self> {
        let store = ProfileStore::with_default_dirs(config.profile_dirs.iter().cloned());
        Ok(Self::with_store(config, store))
    }

    /// Create an orchestrator with an explicit profile store.
    pub fn with_store(config: DerivationConfig, store: ProfileStore) -> Self {
        Self { config, store }
    }

    /// Derive every configured station.
    ///
    /// Stations run in parallel, each rayon worker reusing one
    /// [`FieldConvolver`]. A station that fails is logged and reported in
    /// [`DerivationResults::failures`]; the others still run.
    pub fn run(&self) -> Result<DerivationResults> {
        tracing::info!(
            "Starting derivation: {} ({} stations)",
            self.config.name,
            self.config.stations.len()
        );

        let outcomes: Vec<(String, Result<StationResult>)> = self
            .config
            .stations
            .par_iter()
            .map_init(
                || FieldConvolver::new(self.config.zero_padding()),
                |convolver, station| {
                    (station.code.clone(), self.derive_station(convolver, station))
                },
            )
            .collect();

        let mut stations = Vec::new();
        let mut failures = Vec::new();
        for (code, outcome) in outcomes {
            match outcome {
                Ok(result) => stations.push(result),
                Err(e) => {
                    tracing::warn!("Skipping station {}: {:#}", code, e);
                    failures.push(StationFailure {
                        code,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        tracing::info!(
            "Derivation complete: {} succeeded, {} failed",
            stations.len(),
            failures.len()
        );

        Ok(DerivationResults {
            name: self.config.name.clone(),
            stations,
            failures,
        })
    }

    fn derive_station(
        &self,
        convolver: &mut FieldConvolver,
        station: &StationConfig,
    ) -> Result<StationResult> {
        let (model, profile) = self.resolve_model(station)?;
        let input = read_magnetic_csv(&station.input, Seconds(self.config.dt))?;

        tracing::debug!(
            "Station {}: {} samples, {} layers",
            station.code,
            input.north.len(),
            model.num_layers()
        );

        let (e_north, e_east) = convolver
            .derive_series(&input.north, &input.east, &model)
            .with_context(|| format!("Failed to derive electric field for {}", station.code))?;

        let stats = FieldStats::compute(&e_north, &e_east);
        tracing::info!(
            "Station {}: max |E| = {:.3} mV/km over {} samples",
            station.code,
            stats.max_horizontal,
            stats.samples
        );

        Ok(StationResult {
            code: station.code.clone(),
            model,
            profile,
            mag_north: input.north,
            mag_east: input.east,
            e_north,
            e_east,
            stats,
        })
    }

    fn resolve_model(&self, station: &StationConfig) -> Result<(EarthModel, ProfileSource)> {
        if let Some(model) = station.inline_model()? {
            return Ok((model, ProfileSource::Inline));
        }

        let path = self
            .store
            .find(&station.code)
            .with_context(|| format!("No resistivity profile for station {}", station.code))?;
        let model = lib_profile::parse_profile_file(&path)
            .with_context(|| format!("Failed to load profile {:?}", path))?;

        Ok((model, ProfileSource::File(path)))
    }
}

/// Where a station's earth model came from.
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileSource {
    Inline,
    File(PathBuf),
}

impl std::fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileSource::Inline => write!(f, "inline"),
            ProfileSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Summary statistics of a derived field (mV/km).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldStats {
    pub samples: usize,
    pub max_abs_north: f64,
    pub max_abs_east: f64,
    pub rms_north: f64,
    pub rms_east: f64,
    /// Largest `sqrt(Ex^2 + Ey^2)` over the series.
    pub max_horizontal: f64,
}

impl FieldStats {
    pub fn compute(e_north: &FieldSeries, e_east: &FieldSeries) -> Self {
        let max_horizontal = e_north
            .samples
            .iter()
            .zip(e_east.samples.iter())
            .map(|(x, y)| x.hypot(*y))
            .fold(0.0, f64::max);

        Self {
            samples: e_north.len(),
            max_abs_north: e_north.max_abs(),
            max_abs_east: e_east.max_abs(),
            rms_north: e_north.rms(),
            rms_east: e_east.rms(),
            max_horizontal,
        }
    }
}

/// One successfully derived station.
#[derive(Debug)]
pub struct StationResult {
    pub code: String,
    pub model: EarthModel,
    pub profile: ProfileSource,
    pub mag_north: FieldSeries,
    pub mag_east: FieldSeries,
    pub e_north: FieldSeries,
    pub e_east: FieldSeries,
    pub stats: FieldStats,
}

/// A station that could not be derived.
#[derive(Clone, Debug)]
pub struct StationFailure {
    pub code: String,
    pub error: String,
}

/// Results of a derivation run.
#[derive(Debug)]
pub struct DerivationResults {
    pub name: String,
    /// Derived stations, in configuration order.
    pub stations: Vec<StationResult>,
    pub failures: Vec<StationFailure>,
}
