mod server;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use gcode_hover::cache::{JsonFileCache, default_storage_dir};
use gcode_hover::fetcher::HaasClient;
use gcode_hover::lookup::HoverLookup;

#[derive(Parser, Debug)]
#[command(version, about = "Hover documentation for CNC G-codes and M-codes")]
struct Cli {
    /// Private storage directory holding the documentation cache
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve hover lookups over MCP
    Serve {
        /// Type of server to run
        #[arg(short, long, value_enum, default_value_t = ServerType::Stdio)]
        server_type: ServerType,

        /// Address for the SSE server
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        address: String,
    },
    /// Print the documentation for a single token
    Lookup {
        /// Token to look up, e.g. g1 or M30
        token: String,
    },
    /// Remove every cached page
    ClearCache,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ServerType {
    /// Start an SSE server
    Sse,
    /// Start a stdio server
    Stdio,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    server::init_tracing();

    let storage_dir = cli
        .storage_dir
        .or_else(default_storage_dir)
        .context("no storage directory given and no platform data directory available")?;
    let cache = JsonFileCache::in_dir(&storage_dir);
    let lookup = Arc::new(HoverLookup::open(cache, HaasClient::new()).await);

    match cli.command {
        Command::Serve { server_type: ServerType::Sse, address } => {
            server::start_sse_server(&address, lookup).await?;
        }
        Command::Serve { server_type: ServerType::Stdio, .. } => {
            server::start_stdio_server(lookup).await?;
        }
        Command::Lookup { token } => match lookup.lookup(&token).await {
            Some(content) => println!("{content}"),
            None => bail!("No documentation found for {token:?}"),
        },
        Command::ClearCache => lookup.clear_cache().await,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_lookup() {
        let args = ["gcode-hover", "lookup", "g1", "--storage-dir", "/tmp/x"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.storage_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Command::Lookup { token } if token == "g1"));
    }

    #[test]
    fn test_cli_serve_defaults() {
        let cli = Cli::try_parse_from(["gcode-hover", "serve"]).unwrap();
        match cli.command {
            Command::Serve { server_type, address } => {
                assert_eq!(server_type, ServerType::Stdio);
                assert_eq!(address, "127.0.0.1:8080");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_serve_sse() {
        let args = ["gcode-hover", "serve", "-s", "sse", "-a", "0.0.0.0:9000"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Serve { server_type, address } => {
                assert_eq!(server_type, ServerType::Sse);
                assert_eq!(address, "0.0.0.0:9000");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
