use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde_json::json;

use recall_server::search::{SearchResult, SuggestResult};

use crate::client::RpcClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_score, truncate_string};

#[derive(Parser)]
pub struct SearchCommand {
    #[clap(help = "Search query")]
    pub query: String,

    #[clap(long, short, default_value = "10", help = "Maximum results")]
    pub limit: usize,

    #[clap(long, short, help = "Restrict the search to a workspace")]
    pub workspace: Option<String>,

    #[clap(long, help = "Show typo corrections and suggestions instead of results")]
    pub suggest: bool,
}

impl SearchCommand {
    pub async fn execute(&self, client: &RpcClient, format: OutputFormat) -> CliResult<()> {
        if self.suggest {
            return self.run_suggest(client, format).await;
        }

        let mut params = json!({
            "query": self.query,
            "limit": self.limit,
        });
        if let Some(ref workspace) = self.workspace {
            params["workspace"] = json!(workspace);
        }

        let result = client.call("memory_search", params).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let results: Vec<SearchResult> =
                    serde_json::from_value(result["results"].clone())?;

                if results.is_empty() {
                    println!("No results for {:?}", self.query);
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Score", "Lex", "Vec", "Fuzzy", "Content"]);

                for result in &results {
                    table.add_row([
                        result.memory.id.to_string(),
                        format_score(result.score),
                        result
                            .scores
                            .lexical
                            .map(format_score)
                            .unwrap_or_else(|| "-".to_string()),
                        result
                            .scores
                            .vector
                            .map(format_score)
                            .unwrap_or_else(|| "-".to_string()),
                        result
                            .scores
                            .fuzzy
                            .map(format_score)
                            .unwrap_or_else(|| "-".to_string()),
                        truncate_string(&result.memory.content, 56),
                    ]);
                }

                println!("{table}");
            }
        }
        Ok(())
    }

    async fn run_suggest(&self, client: &RpcClient, format: OutputFormat) -> CliResult<()> {
        let result = client
            .call("memory_search_suggest", json!({"query": self.query}))
            .await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let suggest: SuggestResult = serde_json::from_value(result)?;
                match suggest.corrected_query {
                    Some(corrected) => println!("Did you mean: {corrected}"),
                    None => println!("No corrections for {:?}", suggest.original_query),
                }
                if !suggest.suggestions.is_empty() {
                    println!("Completions: {}", suggest.suggestions.join(", "));
                }
            }
        }
        Ok(())
    }
}
