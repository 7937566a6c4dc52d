//! Result output formatting and writing.

use crate::orchestrator::{DerivationResults, StationResult};
use crate::OutputFormat;
use anyhow::{Context, Result};
use lib_types::earth::EarthModel;
use lib_types::impedance::SurfaceImpedance;
use lib_types::series::FieldSeries;
use std::io::Write;
use std::path::Path;

/// Write derivation results to the output directory.
///
/// Each station gets `<CODE>_efield.csv` (or `.json`), and the run gets a
/// `summary` in the requested format plus a plain-text `summary.txt`.
pub fn write_results(
    results: &DerivationResults,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    for station in &results.stations {
        let path = match format {
            OutputFormat::Json => {
                let path = output_dir.join(format!("{}_efield.json", station.code));
                let json = serde_json::json!({
                    "code": station.code,
                    "profile": station.profile.to_string(),
                    "model": station.model,
                    "e_north": station.e_north,
                    "e_east": station.e_east,
                });
                std::fs::write(&path, serde_json::to_string_pretty(&json)?)?;
                path
            }
            OutputFormat::Text | OutputFormat::Csv => {
                let path = output_dir.join(format!("{}_efield.csv", station.code));
                let mut f = std::fs::File::create(&path)?;
                write_station_csv(&mut f, station)?;
                path
            }
        };
        tracing::info!("Wrote station {} to {:?}", station.code, path);
    }

    match format {
        OutputFormat::Json => {
            let path = output_dir.join("summary.json");
            std::fs::write(&path, serde_json::to_string_pretty(&summary_json(results))?)?;
        }
        OutputFormat::Csv => {
            let mut f = std::fs::File::create(output_dir.join("summary.csv"))?;
            write_summary_csv(&mut f, results)?;
        }
        OutputFormat::Text => {}
    }

    let summary_path = output_dir.join("summary.txt");
    let mut f = std::fs::File::create(&summary_path)?;
    write_summary_text(&mut f, results)?;
    tracing::info!("Wrote summary to {:?}", summary_path);

    Ok(())
}

/// `time,bx,by,ex,ey` rows for one station.
fn write_station_csv<W: Write>(w: &mut W, station: &StationResult) -> Result<()> {
    writeln!(w, "time,bx,by,ex,ey")?;
    for i in 0..station.e_north.len() {
        writeln!(
            w,
            "{},{},{},{},{}",
            station.e_north.time_at(i).0,
            station.mag_north.samples[i],
            station.mag_east.samples[i],
            station.e_north.samples[i],
            station.e_east.samples[i]
        )?;
    }
    Ok(())
}

fn summary_json(results: &DerivationResults) -> serde_json::Value {
    let stations: Vec<_> = results
        .stations
        .iter()
        .map(|s| {
            serde_json::json!({
                "code": s.code,
                "profile": s.profile.to_string(),
                "layers": s.model.num_layers(),
                "samples": s.stats.samples,
                "max_abs_ex": s.stats.max_abs_north,
                "max_abs_ey": s.stats.max_abs_east,
                "rms_ex": s.stats.rms_north,
                "rms_ey": s.stats.rms_east,
                "max_horizontal": s.stats.max_horizontal,
            })
        })
        .collect();
    let failures: Vec<_> = results
        .failures
        .iter()
        .map(|f| serde_json::json!({ "code": f.code, "error": f.error }))
        .collect();

    serde_json::json!({
        "name": results.name,
        "stations": stations,
        "failures": failures,
    })
}

fn write_summary_csv<W: Write>(w: &mut W, results: &DerivationResults) -> Result<()> {
    writeln!(w, "code,samples,max_abs_ex,max_abs_ey,rms_ex,rms_ey,max_horizontal")?;
    for s in &results.stations {
        writeln!(
            w,
            "{},{},{},{},{},{},{}",
            s.code,
            s.stats.samples,
            s.stats.max_abs_north,
            s.stats.max_abs_east,
            s.stats.rms_north,
            s.stats.rms_east,
            s.stats.max_horizontal
        )?;
    }
    Ok(())
}

fn write_summary_text<W: Write>(w: &mut W, results: &DerivationResults) -> Result<()> {
    writeln!(w, "Geoelectric Field Derivation: {}", results.name)?;
    writeln!(w, "==================================")?;
    writeln!(w)?;

    for s in &results.stations {
        writeln!(w, "Station {}", s.code)?;
        writeln!(w, "  Profile:      {} ({} layers)", s.profile, s.model.num_layers())?;
        writeln!(w, "  Samples:      {}", s.stats.samples)?;
        writeln!(w, "  max |Ex|:     {:.4} mV/km", s.stats.max_abs_north)?;
        writeln!(w, "  max |Ey|:     {:.4} mV/km", s.stats.max_abs_east)?;
        writeln!(w, "  max |E|:      {:.4} mV/km", s.stats.max_horizontal)?;
    }

    if !results.failures.is_empty() {
        writeln!(w)?;
        writeln!(w, "Skipped:")?;
        for f in &results.failures {
            writeln!(w, "  {}: {}", f.code, f.error)?;
        }
    }

    Ok(())
}

/// Print results to stdout.
pub fn print_results(results: &DerivationResults) {
    println!("\n=== {} ===\n", results.name);
    for s in &results.stations {
        println!(
            "  {:<6} max |E| {:>10.4} mV/km   rms Ex {:>9.4}   rms Ey {:>9.4}",
            s.code, s.stats.max_horizontal, s.stats.rms_north, s.stats.rms_east
        );
    }
    for f in &results.failures {
        println!("  {:<6} FAILED: {}", f.code, f.error);
    }
    println!();
}

/// Impedance table: frequency, Zxy, apparent resistivity and phase.
pub fn write_impedance<W: Write>(
    w: &mut W,
    impedance: &SurfaceImpedance,
    format: OutputFormat,
) -> Result<()> {
    let rho_a = impedance.apparent_resistivity();
    let phase = impedance.phase_degrees();
    let zxy = impedance.zxy();
    let rows = impedance
        .frequencies()
        .iter()
        .zip(zxy.iter())
        .zip(rho_a.iter().zip(phase.iter()))
        .map(|((f, z), (rho, ph))| (f.0, *z, *rho, *ph));

    match format {
        OutputFormat::Text => {
            writeln!(
                w,
                "{:>14} {:>14} {:>14} {:>12} {:>14} {:>8}",
                "freq (Hz)", "Re Zxy", "Im Zxy", "|Zxy|", "rho_a (Ohm-m)", "phase"
            )?;
            for (f, z, rho, ph) in rows {
                writeln!(
                    w,
                    "{:>14.6e} {:>14.6e} {:>14.6e} {:>12.6e} {:>14.4} {:>8.3}",
                    f, z.re, z.im, z.norm(), rho, ph
                )?;
            }
        }
        OutputFormat::Csv => {
            writeln!(w, "frequency_hz,zxy_re,zxy_im,zxy_abs,apparent_resistivity,phase_deg")?;
            for (f, z, rho, ph) in rows {
                writeln!(w, "{},{},{},{},{},{}", f, z.re, z.im, z.norm(), rho, ph)?;
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = rows
                .map(|(f, z, rho, ph)| {
                    serde_json::json!({
                        "frequency_hz": f,
                        "zxy": [z.re, z.im],
                        "apparent_resistivity": rho,
                        "phase_deg": ph,
                    })
                })
                .collect();
            writeln!(w, "{}", serde_json::to_string_pretty(&json)?)?;
        }
    }
    Ok(())
}

/// Layer table of an earth model.
pub fn write_model<W: Write>(w: &mut W, model: &EarthModel, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(
                w,
                "{:>5} {:>16} {:>14} {:>12}",
                "layer", "rho (Ohm-m)", "thickness (m)", "top (km)"
            )?;
            let mut top = 0.0;
            for (i, layer) in model.layers().enumerate() {
                let thickness = match layer.thickness {
                    Some(h) => format!("{}", h.0),
                    None => "basement".to_string(),
                };
                writeln!(
                    w,
                    "{:>5} {:>16} {:>14} {:>12.3}",
                    i,
                    layer.resistivity.0,
                    thickness,
                    top / 1000.0
                )?;
                top += layer.thickness.map_or(0.0, |h| h.0);
            }
        }
        OutputFormat::Csv => {
            writeln!(w, "resistivity,thickness")?;
            for layer in model.layers() {
                match layer.thickness {
                    Some(h) => writeln!(w, "{},{}", layer.resistivity.0, h.0)?,
                    None => writeln!(w, "{},", layer.resistivity.0)?,
                }
            }
        }
        OutputFormat::Json => {
            writeln!(w, "{}", serde_json::to_string_pretty(model)?)?;
        }
    }
    Ok(())
}

/// Two-component magnetic series as `time,bx,by`.
pub fn write_magnetic_csv<W: Write>(
    w: &mut W,
    north: &FieldSeries,
    east: &FieldSeries,
) -> Result<()> {
    writeln!(w, "time,bx,by")?;
    for (i, (bx, by)) in north.samples.iter().zip(east.samples.iter()).enumerate() {
        writeln!(w, "{},{},{}", north.time_at(i).0, bx, by)?;
    }
    Ok(())
}
