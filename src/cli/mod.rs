pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "linkctl")]
#[command(about = "linkctl - operator CLI for citizen-to-tenant auto-linking")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "LINK_SERVER_URL", default_value = "http://localhost:3000", help = "Base URL of the link service")]
    pub server: String,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run auto-linking for fallback pool citizens")]
    Run {
        #[arg(long, help = "Restrict the run to one tenant id")]
        tenant: Option<String>,
    },

    #[command(about = "Tenant lifecycle management")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Remote server checks")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(&cli.server)?;

    match cli.command {
        Commands::Run { tenant } => commands::link::handle(&client, tenant, output_format).await,
        Commands::Tenant { cmd } => commands::tenant::handle(&client, cmd, output_format).await,
        Commands::Server { cmd } => commands::server::handle(&client, cmd, output_format).await,
    }
}
