use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde_json::json;

use recall_server::memory::types::Memory;
use recall_server::storage::Page;

use crate::client::RpcClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_tags, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct MemoryCommand {
    #[clap(subcommand)]
    pub command: MemorySubcommand,
}

#[derive(Subcommand)]
pub enum MemorySubcommand {
    #[clap(about = "List memories")]
    List(ListArgs),

    #[clap(about = "Show memory details")]
    Show(ShowArgs),

    #[clap(about = "Add a memory")]
    Add(AddArgs),

    #[clap(about = "Update fields of a memory")]
    Update(UpdateArgs),

    #[clap(about = "Delete a memory")]
    Delete(DeleteArgs),
}

#[derive(Parser)]
pub struct ListArgs {
    #[clap(long, short, default_value = "20", help = "Maximum memories to display")]
    pub limit: usize,

    #[clap(long, default_value = "0", help = "Offset into the result set")]
    pub offset: usize,

    #[clap(long, short, help = "Filter by memory type (e.g. note, decision)")]
    pub r#type: Option<String>,

    #[clap(long, short, help = "Filter by workspace")]
    pub workspace: Option<String>,

    #[clap(long, help = "Require a tag (repeatable)")]
    pub tag: Vec<String>,
}

#[derive(Parser)]
pub struct ShowArgs {
    #[clap(help = "Memory ID")]
    pub id: i64,
}

#[derive(Parser)]
pub struct AddArgs {
    #[clap(help = "Memory content text")]
    pub text: String,

    #[clap(long, default_value = "note", help = "Memory type")]
    pub r#type: String,

    #[clap(long, short, help = "Workspace to file the memory under")]
    pub workspace: Option<String>,

    #[clap(long, help = "Tag to attach (repeatable)")]
    pub tag: Vec<String>,

    #[clap(long, help = "Importance score in [0, 1]")]
    pub importance: Option<f32>,
}

#[derive(Parser)]
pub struct UpdateArgs {
    #[clap(help = "Memory ID to update")]
    pub id: i64,

    #[clap(long, help = "Replacement content")]
    pub content: Option<String>,

    #[clap(long, help = "Replacement memory type")]
    pub r#type: Option<String>,

    #[clap(long, help = "Replacement tag set (repeatable)")]
    pub tag: Vec<String>,
}

#[derive(Parser)]
pub struct DeleteArgs {
    #[clap(help = "Memory ID to delete")]
    pub id: i64,
}

impl MemoryCommand {
    pub async fn execute(&self, client: &RpcClient, format: OutputFormat) -> CliResult<()> {
        match &self.command {
            MemorySubcommand::List(args) => Self::list(client, args, format).await,
            MemorySubcommand::Show(args) => Self::show(client, args, format).await,
            MemorySubcommand::Add(args) => Self::add(client, args, format).await,
            MemorySubcommand::Update(args) => Self::update(client, args, format).await,
            MemorySubcommand::Delete(args) => Self::delete(client, args, format).await,
        }
    }

    async fn list(client: &RpcClient, args: &ListArgs, format: OutputFormat) -> CliResult<()> {
        let mut params = json!({
            "limit": args.limit,
            "offset": args.offset,
        });
        if let Some(ref memory_type) = args.r#type {
            params["memory_type"] = json!(memory_type);
        }
        if let Some(ref workspace) = args.workspace {
            params["workspace"] = json!(workspace);
        }
        if !args.tag.is_empty() {
            params["tags"] = json!(args.tag);
        }

        let result = client.call("memory_list", params).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let page: Page = serde_json::from_value(result)?;

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Type", "Workspace", "Tags", "Created", "Content"]);

                for memory in &page.memories {
                    table.add_row([
                        memory.id.to_string(),
                        memory.memory_type.to_string(),
                        memory.workspace.clone().unwrap_or_else(|| "-".to_string()),
                        format_tags(&memory.tags),
                        format_timestamp(&memory.created_at),
                        truncate_string(&memory.content, 60),
                    ]);
                }

                println!("{table}");
                println!(
                    "Showing {} of {} (offset {})",
                    page.memories.len(),
                    page.total,
                    page.offset
                );
            }
        }
        Ok(())
    }

    async fn show(client: &RpcClient, args: &ShowArgs, format: OutputFormat) -> CliResult<()> {
        let result = client.call("memory_get", json!({"id": args.id})).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let memory: Memory = serde_json::from_value(result)?;
                println!("ID:         {}", memory.id);
                println!("Type:       {}", memory.memory_type);
                println!(
                    "Workspace:  {}",
                    memory.workspace.as_deref().unwrap_or("-")
                );
                println!("Tags:       {}", format_tags(&memory.tags));
                if let Some(importance) = memory.importance {
                    println!("Importance: {importance:.2}");
                }
                println!("Created:    {}", format_timestamp(&memory.created_at));
                println!("Updated:    {}", format_timestamp(&memory.updated_at));
                println!("\n{}", memory.content);
            }
        }
        Ok(())
    }

    async fn add(client: &RpcClient, args: &AddArgs, format: OutputFormat) -> CliResult<()> {
        let mut params = json!({
            "content": args.text,
            "memory_type": args.r#type,
            "tags": args.tag,
        });
        if let Some(ref workspace) = args.workspace {
            params["workspace"] = json!(workspace);
        }
        if let Some(importance) = args.importance {
            params["importance"] = json!(importance);
        }

        let result = client.call("memory_create", params).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let memory: Memory = serde_json::from_value(result)?;
                println!("Created memory {}", memory.id);
            }
        }
        Ok(())
    }

    async fn update(client: &RpcClient, args: &UpdateArgs, format: OutputFormat) -> CliResult<()> {
        let mut params = json!({"id": args.id});
        if let Some(ref content) = args.content {
            params["content"] = json!(content);
        }
        if let Some(ref memory_type) = args.r#type {
            params["memory_type"] = json!(memory_type);
        }
        if !args.tag.is_empty() {
            params["tags"] = json!(args.tag);
        }

        let result = client.call("memory_update", params).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                let memory: Memory = serde_json::from_value(result)?;
                println!("Updated memory {}", memory.id);
            }
        }
        Ok(())
    }

    async fn delete(client: &RpcClient, args: &DeleteArgs, format: OutputFormat) -> CliResult<()> {
        let result = client.call("memory_delete", json!({"id": args.id})).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => println!("Deleted memory {}", args.id),
        }
        Ok(())
    }
}
