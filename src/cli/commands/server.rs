use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::output_json;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Show server information from API root endpoint")]
    Info,

    #[command(about = "Check server health status from API /health endpoint")]
    Health,
}

pub async fn handle(client: &ApiClient, cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Info => {
            let info: Value = client.get("/").await?;
            match output_format {
                OutputFormat::Json => output_json(&info)?,
                OutputFormat::Text => {
                    let field = |k: &str| info.get(k).and_then(Value::as_str).unwrap_or("-").to_string();
                    println!("{} {}", field("name"), field("version"));
                    println!("{}", field("description"));
                }
            }
            Ok(())
        }
        ServerCommands::Health => {
            let (status, body) = client.health().await?;
            match output_format {
                OutputFormat::Json => output_json(&body)?,
                OutputFormat::Text => println!("{} ({})", if status.is_success() { "up" } else { "degraded" }, status),
            }
            if status.is_success() {
                Ok(())
            } else {
                Err(anyhow::anyhow!("server reported {}", status))
            }
        }
    }
}
