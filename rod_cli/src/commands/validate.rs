//! Structure validation command.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use rod_core::structure::{validate, StructureInput};
use tracing::{error, info, warn};

use super::{print_json, read_json};

#[derive(Args)]
pub struct ValidateArgs {
    /// Structure file (JSON: rods + nodes)
    pub structure: PathBuf,

    /// Treat advisories as errors
    #[arg(long)]
    pub strict: bool,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let input: StructureInput = read_json(&args.structure)?;
    let report = validate(&input);

    for violation in report.errors() {
        error!("{}", violation.message);
    }
    for violation in report.advisories() {
        warn!("{}", violation.message);
    }

    print_json(&report)?;

    let errors = report.errors().count();
    let advisories = report.advisories().count();
    if errors > 0 || (args.strict && advisories > 0) {
        bail!("validation failed: {} error(s), {} advisory(ies)", errors, advisories);
    }

    info!(rods = input.rods.len(), nodes = input.nodes.len(), "structure is valid");
    Ok(())
}
