//! Report assembly command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rod_core::postprocess::ReportConfig;
use rod_core::Settings;
use tracing::{info, warn};

use super::{open_session, parse_section, print_json, ResultsArgs};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Construction,
    Table,
    EpureN,
    EpureSigma,
    EpureU,
    Displacements,
    SectionCalc,
    UniformStep,
}

#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: ResultsArgs,

    /// Sections to include (settings selection when omitted)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub sections: Vec<Section>,

    /// Include every section
    #[arg(long, conflicts_with = "sections")]
    pub all: bool,

    /// Section queries to record before assembling, as ROD:X
    #[arg(short, long = "at", value_parser = parse_section)]
    pub at: Vec<(u32, f64)>,

    /// Step for the uniform-step section (settings default when omitted)
    #[arg(long)]
    pub step: Option<f64>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn selection(args: &ReportArgs, defaults: ReportConfig) -> ReportConfig {
    if args.all {
        return ReportConfig::all();
    }
    if args.sections.is_empty() {
        return defaults;
    }

    let mut config = ReportConfig::none();
    for section in &args.sections {
        match section {
            Section::Construction => config.construction = true,
            Section::Table => config.table = true,
            Section::EpureN => config.epure_n = true,
            Section::EpureSigma => config.epure_sigma = true,
            Section::EpureU => config.epure_u = true,
            Section::Displacements => config.displacements = true,
            Section::SectionCalc => config.section_calc = true,
            Section::UniformStep => config.uniform_step = true,
        }
    }
    config
}

pub fn execute(args: ReportArgs, settings: Settings) -> Result<()> {
    let config = selection(&args, settings.report);
    let step = args.step.unwrap_or(settings.default_step);
    let mut session = open_session(&args.source, settings)?;

    for &(rod_id, x) in &args.at {
        if let Err(e) = session.query(rod_id, x) {
            warn!(rod_id, x, error = %e, "query skipped");
        }
    }
    if config.uniform_step {
        session.sample(step)?;
    }

    let report = session.assemble_report(&config)?;
    info!(sections = ?report.section_names(), "report assembled");

    match &args.output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&report)?;
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "report written");
            Ok(())
        }
        None => print_json(&report),
    }
}
