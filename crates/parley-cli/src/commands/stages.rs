//! Implementation of the `parley stages` command.

use clap::Args;
use parley::STAGES;

use crate::output::table::{format_stages_table, stage_rows};

/// Arguments for the stages command.
#[derive(Debug, Args)]
pub struct StagesArgs {
    /// Only show this stage
    #[arg(long)]
    pub stage: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the stages command.
pub fn run_stages(args: &StagesArgs) -> miette::Result<i32> {
    let mut rows = stage_rows(&STAGES);
    if let Some(stage) = &args.stage {
        rows.retain(|row| row.stage == stage.as_str());
        if rows.is_empty() {
            eprintln!("Unknown stage '{stage}'");
            return Ok(exitcode::USAGE);
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| miette::miette!("Failed to serialize stages: {}", e))?;
        println!("{json}");
    } else {
        println!("{}", format_stages_table(&rows));
    }
    Ok(exitcode::OK)
}
