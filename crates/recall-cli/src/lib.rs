pub mod client;
pub mod commands;
pub mod error;
pub mod output;

pub use client::RpcClient;
pub use commands::{GraphCommand, MemoryCommand, SearchCommand, StatsCommand};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_timestamp, truncate_string};
