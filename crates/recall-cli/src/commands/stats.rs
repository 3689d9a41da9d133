use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde_json::json;

use recall_server::storage::TenantStats;

use crate::client::RpcClient;
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn execute(&self, client: &RpcClient, format: OutputFormat) -> CliResult<()> {
        let result = client.call("memory_stats", json!({})).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let stats: TenantStats = serde_json::from_value(result)?;

                println!("Total memories: {}\n", stats.count);

                let mut by_type: Vec<(&String, &usize)> = stats.by_type.iter().collect();
                by_type.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Type", "Count"]);
                for (memory_type, count) in by_type {
                    table.add_row([memory_type.clone(), count.to_string()]);
                }
                println!("{table}");

                if !stats.by_workspace.is_empty() {
                    let mut by_workspace: Vec<(&String, &usize)> =
                        stats.by_workspace.iter().collect();
                    by_workspace.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL_CONDENSED)
                        .set_content_arrangement(ContentArrangement::Dynamic)
                        .set_header(["Workspace", "Count"]);
                    for (workspace, count) in by_workspace {
                        table.add_row([workspace.clone(), count.to_string()]);
                    }
                    println!("\n{table}");
                }
            }
        }
        Ok(())
    }
}
