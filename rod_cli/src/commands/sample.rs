//! Uniform-step table command.

use anyhow::Result;
use clap::Args;
use rod_core::Settings;
use tracing::info;

use super::{open_session, print_json, ResultsArgs};

#[derive(Args)]
pub struct SampleArgs {
    #[command(flatten)]
    pub source: ResultsArgs,

    /// Step in meters (settings default when omitted)
    #[arg(long)]
    pub step: Option<f64>,
}

pub fn execute(args: SampleArgs, settings: Settings) -> Result<()> {
    let step = args.step.unwrap_or(settings.default_step);
    let mut session = open_session(&args.source, settings)?;

    let rows = session.sample(step)?;
    info!(step, rows = rows.len(), "table sampled");
    print_json(&rows)
}
