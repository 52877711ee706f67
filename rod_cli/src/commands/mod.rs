//! Subcommands and the input plumbing they share.

pub mod query;
pub mod report;
pub mod sample;
pub mod validate;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use rod_core::results::SolverOutput;
use rod_core::solver::PrecomputedSolver;
use rod_core::structure::{StructureInput, StructureModel};
use rod_core::{CalculationSession, Settings};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

/// Where the solved coefficients come from.
///
/// Either a complete solver output, or a structure plus its nodal
/// displacement vector from which the coefficients are derived.
#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Solver output file (JSON: displacements + rods)
    #[arg(short, long, conflicts_with_all = ["structure", "displacements"])]
    pub results: Option<PathBuf>,

    /// Structure file (JSON: rods + nodes)
    #[arg(short, long, requires = "displacements")]
    pub structure: Option<PathBuf>,

    /// Nodal displacement file (JSON array, one value per node)
    #[arg(short, long, requires = "structure")]
    pub displacements: Option<PathBuf>,
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading settings {}", path.display()))?;
    let settings = Settings::from_json(&text).with_context(|| format!("parsing settings {}", path.display()))?;
    info!(path = %path.display(), "settings loaded");
    Ok(settings)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Build a session holding the results named by `args`.
pub fn open_session(args: &ResultsArgs, settings: Settings) -> Result<CalculationSession> {
    let mut session = CalculationSession::new(settings);

    match (&args.results, &args.structure, &args.displacements) {
        (Some(path), _, _) => {
            let output: SolverOutput = read_json(path)?;
            session.load_results(output)?;
        }
        (None, Some(structure), Some(displacements)) => {
            let input: StructureInput = read_json(structure)?;
            let values: Vec<f64> = read_json(displacements)?;
            let model = StructureModel::from_input(input);
            session.calculate(&PrecomputedSolver::new(values), &model)?;
        }
        _ => bail!("pass --results, or --structure together with --displacements"),
    }

    Ok(session)
}

/// Parse a `ROD:X` section reference.
pub fn parse_section(value: &str) -> Result<(u32, f64), String> {
    let (rod, x) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ROD:X, got '{}'", value))?;
    let rod = rod.trim().parse::<u32>().map_err(|e| format!("bad rod id '{}': {}", rod, e))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad position '{}': {}", x, e))?;
    Ok((rod, x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section() {
        assert_eq!(parse_section("3:1.25"), Ok((3, 1.25)));
        assert_eq!(parse_section(" 1 : 0 "), Ok((1, 0.0)));
        assert!(parse_section("1").is_err());
        assert!(parse_section("-1:0.5").is_err());
        assert!(parse_section("1:abc").is_err());
    }

    #[test]
    fn test_default_settings_without_path() {
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }
}
