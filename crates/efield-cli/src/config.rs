//! Derivation run configuration loading and validation.

use anyhow::{Context, Result};
use lib_dsp::{ZeroPadding, DEFAULT_DT};
use lib_types::earth::EarthModel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level configuration of a multi-station derivation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DerivationConfig {
    /// Run name, used in the summary.
    pub name: String,

    /// Sample interval of every input series (seconds).
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Transform length policy.
    #[serde(default)]
    pub padding: PaddingMode,

    /// Fixed transform length; overrides `padding` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fft_size: Option<usize>,

    /// Directories searched for `res_model_<STATION>.txt` before the
    /// per-user defaults.
    #[serde(default)]
    pub profile_dirs: Vec<PathBuf>,

    /// Where results are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Stations to derive.
    pub stations: Vec<StationConfig>,
}

/// Padding selection as written in the config file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    #[default]
    None,
    PowerOfTwo,
}

impl From<PaddingMode> for ZeroPadding {
    fn from(mode: PaddingMode) -> Self {
        match mode {
            PaddingMode::None => ZeroPadding::None,
            PaddingMode::PowerOfTwo => ZeroPadding::PowerOfTwo,
        }
    }
}

/// One station of the run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StationConfig {
    /// Station code, e.g. `GILL`.
    pub code: String,

    /// CSV file with `bx,by` columns (nT), optionally preceded by time.
    pub input: PathBuf,

    /// Inline layer resistivities (Ohm-m); skips the profile lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistivities: Option<Vec<f64>>,

    /// Inline layer thicknesses (m), one fewer than `resistivities`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thicknesses: Option<Vec<f64>>,
}

impl StationConfig {
    /// The inline model, if the station carries one.
    pub fn inline_model(&self) -> Result<Option<EarthModel>> {
        let Some(resistivities) = &self.resistivities else {
            return Ok(None);
        };
        let thicknesses = self.thicknesses.clone().unwrap_or_default();
        let model = EarthModel::new(resistivities.clone(), thicknesses)
            .with_context(|| format!("Invalid inline profile for station {}", self.code))?;
        Ok(Some(model))
    }
}

fn default_dt() -> f64 {
    DEFAULT_DT.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl DerivationConfig {
    /// Padding policy for the convolver.
    pub fn zero_padding(&self) -> ZeroPadding {
        match self.fft_size {
            Some(size) => ZeroPadding::Fixed { size },
            None => self.padding.into(),
        }
    }
}

/// Load configuration from a file.
///
/// `.json` files are read as JSON, everything else as TOML.
pub fn load_config(path: &Path) -> Result<DerivationConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: DerivationConfig = if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| "Failed to parse config as JSON")?
    } else {
        toml::from_str(&content)
            .with_context(|| "Failed to parse config as TOML")?
    };

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration.
fn validate_config(config: &DerivationConfig) -> Result<()> {
    if !(config.dt.is_finite() && config.dt > 0.0) {
        anyhow::bail!("Sample interval must be positive, got dt={}", config.dt);
    }

    if config.fft_size == Some(0) {
        anyhow::bail!("fft_size must be positive");
    }

    if config.stations.is_empty() {
        anyhow::bail!("No stations configured");
    }

    let mut seen = HashSet::new();
    for station in &config.stations {
        let code = station.code.trim();
        if code.is_empty() {
            anyhow::bail!("Station with input {:?} has an empty code", station.input);
        }
        if !seen.insert(code.to_ascii_uppercase()) {
            anyhow::bail!("Station {} is configured more than once", code);
        }

        if !station.input.exists() {
            anyhow::bail!("Input file for station {} not found: {:?}", code, station.input);
        }

        if station.resistivities.is_none() && station.thicknesses.is_some() {
            anyhow::bail!(
                "Station {} sets thicknesses without resistivities",
                code
            );
        }
        station.inline_model()?;
    }

    Ok(())
}
