//! Resistivity profile table parser.
//!
//! A profile lists one layer per row, surface first:
//!
//! ```text
//! # Gillam, Superior craton
//! resistivity,thickness
//! 300,15000
//! 5000,25000
//! 1000,
//! ```
//!
//! - `#` starts a comment that runs to the end of the line
//! - The header is optional; without it columns are `resistivity, thickness`
//! - Fields are separated by commas and/or whitespace
//! - The last row is the basement and may leave its thickness empty

use crate::error::{describe_nom_error, ProfileError};
use lib_types::earth::EarthModel;
use nom::{
    branch::alt,
    character::complete::{char, space0, space1},
    combinator::{opt, value},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};
use std::path::Path;

/// Column positions of the two quantities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Columns {
    resistivity: usize,
    thickness: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            resistivity: 0,
            thickness: 1,
        }
    }
}

/// One data row after column selection.
#[derive(Clone, Copy, Debug)]
struct LayerRow {
    line: usize,
    resistivity: f64,
    thickness: Option<f64>,
}

/// Parse a resistivity profile from a string.
pub fn parse_profile(content: &str) -> Result<EarthModel, ProfileError> {
    let mut columns: Option<Columns> = None;
    let mut rows: Vec<LayerRow> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }

        if columns.is_none() && rows.is_empty() && looks_like_header(line) {
            columns = Some(parse_header(line, line_no)?);
            continue;
        }

        let cols = *columns.get_or_insert_with(Columns::default);
        let fields = parse_fields(line, line_no)?;

        // A lone value is the basement resistivity whatever the column order
        let (resistivity, thickness) = match fields.as_slice() {
            [only] => (*only, None),
            _ => (
                fields.get(cols.resistivity).copied().flatten(),
                fields.get(cols.thickness).copied().flatten(),
            ),
        };
        let resistivity =
            resistivity.ok_or_else(|| ProfileError::syntax(line_no, "missing resistivity"))?;

        rows.push(LayerRow {
            line: line_no,
            resistivity,
            thickness,
        });
    }

    build_model(&rows)
}

/// Parse a resistivity profile from a path.
pub fn parse_profile_file(path: &Path) -> Result<EarthModel, ProfileError> {
    let content = std::fs::read_to_string(path)?;
    tracing::debug!("Parsing resistivity profile {:?}", path);
    parse_profile(&content)
}

fn build_model(rows: &[LayerRow]) -> Result<EarthModel, ProfileError> {
    let mut resistivities = Vec::with_capacity(rows.len());
    let mut thicknesses = Vec::with_capacity(rows.len().saturating_sub(1));

    for (i, row) in rows.iter().enumerate() {
        resistivities.push(row.resistivity);

        let is_basement = i + 1 == rows.len();
        match (row.thickness, is_basement) {
            (Some(h), false) => thicknesses.push(h),
            (None, false) => {
                return Err(ProfileError::syntax(
                    row.line,
                    "only the basement (last) row may omit its thickness",
                ));
            }
            (Some(h), true) => {
                tracing::warn!(
                    "Line {}: basement thickness {} ignored (half-space)",
                    row.line,
                    h
                );
            }
            (None, true) => {}
        }
    }

    Ok(EarthModel::new(resistivities, thicknesses)?)
}

/// Drop everything from `#` on, plus surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    let body = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    body.trim()
}

fn looks_like_header(line: &str) -> bool {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .find(|t| !t.is_empty())
        .map_or(false, |t| t.parse::<f64>().is_err())
}

/// Header names are split on commas when present, otherwise on whitespace,
/// so names with units like `thickness (m)` stay one column.
fn parse_header(line: &str, line_no: usize) -> Result<Columns, ProfileError> {
    let names: Vec<&str> = if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    let mut resistivity = None;
    let mut thickness = None;
    for (i, name) in names.iter().enumerate() {
        match column_kind(name) {
            Some(ColumnKind::Resistivity) => resistivity = resistivity.or(Some(i)),
            Some(ColumnKind::Thickness) => thickness = thickness.or(Some(i)),
            None => tracing::debug!("Line {}: ignoring profile column '{}'", line_no, name),
        }
    }

    Ok(Columns {
        resistivity: resistivity.ok_or(ProfileError::MissingColumn("resistivity"))?,
        thickness: thickness.ok_or(ProfileError::MissingColumn("thickness"))?,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ColumnKind {
    Resistivity,
    Thickness,
}

/// Classify a header name, ignoring a trailing unit such as `(ohm-m)`.
fn column_kind(name: &str) -> Option<ColumnKind> {
    let base = name
        .split(|c: char| c == '(' || c == '[')
        .next()
        .unwrap_or(name)
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '_')
        .to_ascii_lowercase();

    if base.starts_with("resistiv") || base == "res" || base == "rho" {
        Some(ColumnKind::Resistivity)
    } else if base.starts_with("thick") || base == "h" {
        Some(ColumnKind::Thickness)
    } else {
        None
    }
}

fn parse_fields(line: &str, line_no: usize) -> Result<Vec<Option<f64>>, ProfileError> {
    let (rest, fields) =
        data_row(line).map_err(|e| ProfileError::syntax(line_no, describe_nom_error(e)))?;
    if !rest.is_empty() {
        return Err(ProfileError::syntax(
            line_no,
            format!("expected a number at '{}'", rest),
        ));
    }
    Ok(fields)
}

// ============================================================================
// Nom Parsers
// ============================================================================

fn separator(input: &str) -> IResult<&str, ()> {
    alt((
        value((), delimited(space0, char(','), space0)),
        value((), space1),
    ))
    .parse(input)
}

/// Numeric fields; an empty field between commas is `None`.
fn data_row(input: &str) -> IResult<&str, Vec<Option<f64>>> {
    preceded(space0, separated_list1(separator, opt(double))).parse(input)
}
