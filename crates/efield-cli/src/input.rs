//! Reading two-component magnetic series from CSV.
//!
//! Accepted layouts, one sample per row:
//!
//! ```text
//! bx,by              # header optional
//! time,bx,by         # leading time column (seconds)
//! ```
//!
//! With a header, the `bx`/`by` columns (also `x`/`y`, `north`/`east`) are
//! picked by name and any other column is ignored. Without one, two columns
//! are `bx, by` and three are `time, bx, by`.

use anyhow::{Context, Result};
use lib_types::series::FieldSeries;
use lib_types::units::Seconds;
use std::path::Path;

/// North and east magnetic components of one station.
#[derive(Clone, Debug)]
pub struct MagneticInput {
    pub north: FieldSeries,
    pub east: FieldSeries,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    time: Option<usize>,
    north: usize,
    east: usize,
}

/// Read a magnetic CSV sampled every `dt`.
pub fn read_magnetic_csv(path: &Path, dt: Seconds) -> Result<MagneticInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read magnetic data: {:?}", path))?;
    parse_magnetic_csv(&content, dt)
        .with_context(|| format!("Invalid magnetic data in {:?}", path))
}

/// Parse magnetic CSV text sampled every `dt`.
///
/// A numeric time column must step by `dt`; it also sets the series start.
pub fn parse_magnetic_csv(content: &str, dt: Seconds) -> Result<MagneticInput> {
    let mut layout: Option<Layout> = None;
    let mut times: Vec<(usize, Option<f64>)> = Vec::new();
    let mut north = Vec::new();
    let mut east = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        if layout.is_none() && fields[0].parse::<f64>().is_err() {
            layout = Some(header_layout(&fields).with_context(|| format!("Line {}", line_no))?);
            continue;
        }

        let cols = match layout {
            Some(cols) => cols,
            None => {
                let cols = default_layout(fields.len())
                    .with_context(|| format!("Line {}", line_no))?;
                *layout.insert(cols)
            }
        };

        let value = |col: usize, name: &str| -> Result<f64> {
            let field = fields
                .get(col)
                .with_context(|| format!("Line {}: missing {} column", line_no, name))?;
            field
                .parse::<f64>()
                .with_context(|| format!("Line {}: invalid {} value '{}'", line_no, name, field))
        };

        if let Some(col) = cols.time {
            times.push((line_no, fields.get(col).and_then(|f| f.parse::<f64>().ok())));
        }
        north.push(value(cols.north, "bx")?);
        east.push(value(cols.east, "by")?);
    }

    if north.is_empty() {
        anyhow::bail!("No samples found");
    }

    let t_start = Seconds(check_time_column(&times, dt)?.unwrap_or(0.0));
    Ok(MagneticInput {
        north: FieldSeries::new(north, dt, t_start),
        east: FieldSeries::new(east, dt, t_start),
    })
}

/// Start time of a fully numeric time column after checking its spacing
/// against `dt`. Columns with any non-numeric entry (timestamps) are skipped.
fn check_time_column(times: &[(usize, Option<f64>)], dt: Seconds) -> Result<Option<f64>> {
    let Some(numeric) = times
        .iter()
        .map(|(line_no, t)| t.map(|t| (*line_no, t)))
        .collect::<Option<Vec<_>>>()
    else {
        return Ok(None);
    };

    let tolerance = 1e-6 * dt.0.abs();
    for pair in numeric.windows(2) {
        let (_, previous) = pair[0];
        let (line_no, t) = pair[1];
        let step = t - previous;
        if step.is_nan() || (step - dt.0).abs() > tolerance {
            anyhow::bail!(
                "Line {}: time column steps by {} s, expected dt = {} s",
                line_no,
                step,
                dt.0
            );
        }
    }

    Ok(numeric.first().map(|(_, t)| *t))
}

fn default_layout(columns: usize) -> Result<Layout> {
    match columns {
        2 => Ok(Layout { time: None, north: 0, east: 1 }),
        3 => Ok(Layout { time: Some(0), north: 1, east: 2 }),
        n => anyhow::bail!("Expected 2 or 3 columns without a header, got {}", n),
    }
}

fn header_layout(names: &[&str]) -> Result<Layout> {
    let position = |candidates: &[&str]| {
        names
            .iter()
            .position(|n| candidates.iter().any(|c| n.eq_ignore_ascii_case(c)))
    };

    let north = position(&["bx", "x", "north", "bn"]).context("Header has no bx column")?;
    let east = position(&["by", "y", "east", "be"]).context("Header has no by column")?;
    let time = position(&["time", "t", "seconds"]);

    Ok(Layout { time, north, east })
}
