//! The status command: row counts for the raw warehouse tables.

use granary::{RawTableStat, Warehouse, connect};

use crate::commands::limits::OutputFormat;
use crate::config::Config;

/// One raw table row for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct TableStatusDisplay {
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Rows")]
    pub rows: String,
}

pub(crate) async fn handle_status(
    config: &Config,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = config.warehouse_url()?;
    let warehouse = Warehouse::new(connect(&database_url).await?);
    let report = warehouse.raw_table_report().await?;

    if report.is_empty() {
        println!("No raw_* tables yet. Load some data first: granary run --owner <owner>");
        return Ok(());
    }

    let items = to_display(&report);
    match output {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(items);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    Ok(())
}

fn to_display(report: &[RawTableStat]) -> Vec<TableStatusDisplay> {
    report
        .iter()
        .map(|stat| TableStatusDisplay {
            table: stat.table.clone(),
            rows: stat.rows.to_string(),
        })
        .collect()
}
