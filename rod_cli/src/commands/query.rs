//! Section query command.

use anyhow::Result;
use clap::Args;
use rod_core::Settings;
use tracing::warn;

use super::{open_session, parse_section, print_json, ResultsArgs};

#[derive(Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub source: ResultsArgs,

    /// Section as ROD:X (repeatable)
    #[arg(short, long = "at", value_parser = parse_section, required = true)]
    pub at: Vec<(u32, f64)>,

    /// Stop at the first failed query instead of skipping it
    #[arg(long)]
    pub fail_fast: bool,
}

pub fn execute(args: QueryArgs, settings: Settings) -> Result<()> {
    let mut session = open_session(&args.source, settings)?;

    for &(rod_id, x) in &args.at {
        if let Err(e) = session.query(rod_id, x) {
            if args.fail_fast {
                return Err(e.into());
            }
            warn!(rod_id, x, error = %e, "query skipped");
        }
    }

    // oldest first, in the order the sections were given
    let mut records = session.history();
    records.reverse();
    print_json(&records)
}
