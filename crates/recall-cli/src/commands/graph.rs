use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde_json::json;

use recall_server::memory::types::{Direction, RelatedMemory};

use crate::client::RpcClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, truncate_string};

#[derive(Parser)]
pub struct GraphCommand {
    #[clap(subcommand)]
    pub command: GraphSubcommand,
}

#[derive(Subcommand)]
pub enum GraphSubcommand {
    #[clap(about = "Create a typed link between two memories")]
    Link(LinkArgs),

    #[clap(about = "Remove a typed link")]
    Unlink(LinkArgs),

    #[clap(about = "Show one-hop neighbors of a memory")]
    Related(RelatedArgs),
}

#[derive(Parser)]
pub struct LinkArgs {
    #[clap(help = "Source memory ID")]
    pub from_id: i64,

    #[clap(help = "Target memory ID")]
    pub to_id: i64,

    #[clap(
        long,
        short = 't',
        default_value = "related_to",
        help = "Edge type (related_to, supersedes, contradicts, implements, extends, references, depends_on, blocks, follows_up)"
    )]
    pub r#type: String,
}

#[derive(Parser)]
pub struct RelatedArgs {
    #[clap(help = "Memory ID")]
    pub id: i64,
}

impl GraphCommand {
    pub async fn execute(&self, client: &RpcClient, format: OutputFormat) -> CliResult<()> {
        match &self.command {
            GraphSubcommand::Link(args) => Self::link(client, args, format).await,
            GraphSubcommand::Unlink(args) => Self::unlink(client, args, format).await,
            GraphSubcommand::Related(args) => Self::related(client, args, format).await,
        }
    }

    async fn link(client: &RpcClient, args: &LinkArgs, format: OutputFormat) -> CliResult<()> {
        let result = client
            .call(
                "memory_link",
                json!({"from_id": args.from_id, "to_id": args.to_id, "edge_type": args.r#type}),
            )
            .await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                if result["created"].as_bool().unwrap_or(false) {
                    println!("Linked {} -[{}]-> {}", args.from_id, args.r#type, args.to_id);
                } else {
                    println!("Link already exists");
                }
            }
        }
        Ok(())
    }

    async fn unlink(client: &RpcClient, args: &LinkArgs, format: OutputFormat) -> CliResult<()> {
        let result = client
            .call(
                "memory_unlink",
                json!({"from_id": args.from_id, "to_id": args.to_id, "edge_type": args.r#type}),
            )
            .await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                if result["removed"].as_bool().unwrap_or(false) {
                    println!("Removed {} -[{}]-> {}", args.from_id, args.r#type, args.to_id);
                } else {
                    println!("No such link");
                }
            }
        }
        Ok(())
    }

    async fn related(client: &RpcClient, args: &RelatedArgs, format: OutputFormat) -> CliResult<()> {
        let result = client
            .call("memory_related", json!({"id": args.id}))
            .await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let related: Vec<RelatedMemory> =
                    serde_json::from_value(result["related"].clone())?;

                if related.is_empty() {
                    println!("Memory {} has no links", args.id);
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Edge", "Direction", "Content"]);

                for item in &related {
                    let direction = match item.direction {
                        Direction::Outgoing => "outgoing",
                        Direction::Incoming => "incoming",
                    };
                    table.add_row([
                        item.memory.id.to_string(),
                        item.edge_type.to_string(),
                        direction.to_string(),
                        truncate_string(&item.memory.content, 56),
                    ]);
                }

                println!("{table}");
            }
        }
        Ok(())
    }
}
