//! Table formatting utilities for CLI output.

use comfy_table::{presets, ContentArrangement, Table};
use parley::{Stage, StageBody};
use serde::Serialize;

/// One placeholder row of the stages table.
#[derive(Debug, Serialize)]
pub struct StageRow {
    pub stage: &'static str,
    pub pattern: String,
    pub wildcard: String,
    pub on_empty: String,
}

/// Flatten stages into one row per placeholder.
pub fn stage_rows(stages: &[Stage]) -> Vec<StageRow> {
    let mut rows = Vec::new();
    for stage in stages {
        match stage.body {
            StageBody::Rules(rules) | StageBody::Gates(rules) => {
                let gate = matches!(stage.body, StageBody::Gates(_));
                rows.extend(rules.iter().map(|rule| StageRow {
                    stage: stage.name,
                    pattern: rule.pattern.to_string(),
                    wildcard: rule.mode.to_string(),
                    on_empty: if gate {
                        "gate".to_string()
                    } else {
                        rule.policy.to_string()
                    },
                }));
            }
            StageBody::Attributes => rows.push(StageRow {
                stage: stage.name,
                pattern: "$sender $<attribute>".to_string(),
                wildcard: "-".to_string(),
                on_empty: "-".to_string(),
            }),
            StageBody::ApiProjection => rows.push(StageRow {
                stage: stage.name,
                pattern: "(api|<url>) (api.<path>) (api._response)".to_string(),
                wildcard: "-".to_string(),
                on_empty: "-".to_string(),
            }),
        }
    }
    rows
}

/// Format stage rows as an ASCII table.
pub fn format_stages_table(rows: &[StageRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Stage", "Placeholder", "Wildcard", "Empty result"]);

    for row in rows {
        table.add_row(vec![
            row.stage.to_string(),
            row.pattern.clone(),
            row.wildcard.clone(),
            row.on_empty.clone(),
        ]);
    }

    table
}
