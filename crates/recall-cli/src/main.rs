use clap::{Parser, Subcommand};

use recall_cli::client::RpcClient;
use recall_cli::commands::{GraphCommand, MemoryCommand, SearchCommand, StatsCommand};
use recall_cli::error::CliResult;
use recall_cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "recall-cli")]
#[command(about = "Recall CLI - client for the recall memory daemon")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(
        long,
        short,
        global = true,
        env = "RECALL_SERVER",
        default_value = "http://127.0.0.1:7077",
        help = "Base URL of the recall daemon"
    )]
    pub server: String,

    #[clap(
        long,
        short,
        global = true,
        env = "RECALL_TENANT",
        default_value = "default",
        help = "Tenant identifier sent with every request"
    )]
    pub tenant: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Memory management commands")]
    Memory(MemoryCommand),

    #[clap(about = "Hybrid search across memories")]
    Search(SearchCommand),

    #[clap(about = "Knowledge graph commands")]
    Graph(GraphCommand),

    #[clap(about = "Show memory statistics")]
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let client = RpcClient::new(&cli.server, &cli.tenant)?;

    match &cli.command {
        Command::Memory(cmd) => cmd.execute(&client, format).await,
        Command::Search(cmd) => cmd.execute(&client, format).await,
        Command::Graph(cmd) => cmd.execute(&client, format).await,
        Command::Stats(cmd) => cmd.execute(&client, format).await,
    }
}
