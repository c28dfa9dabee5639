use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::Tenant;
use crate::types::{TenantId, TenantStatus};

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all tenants")]
    List,

    #[command(about = "Show tenant information")]
    Show {
        #[arg(help = "Tenant ID")]
        tenant: String,
    },

    #[command(about = "Create new tenant")]
    Create {
        #[arg(help = "Tenant display name")]
        name: String,
        #[arg(long, default_value = "trial", help = "Initial status (trial, active, suspended, inactive)")]
        status: String,
        #[arg(long, help = "Canonical municipality name")]
        municipality: Option<String>,
        #[arg(long, help = "Canonical state code")]
        state: Option<String>,
    },

    #[command(about = "Activate tenant; waiting citizens are linked in the background")]
    Activate {
        #[arg(help = "Tenant ID")]
        tenant: String,
    },

    #[command(about = "Set tenant status")]
    Status {
        #[arg(help = "Tenant ID")]
        tenant: String,
        #[arg(help = "New status (trial, active, suspended, inactive)")]
        status: String,
    },
}

fn parse_id(raw: &str) -> anyhow::Result<TenantId> {
    raw.parse().map_err(|e| anyhow::anyhow!("invalid tenant id '{}': {}", raw, e))
}

fn parse_status(raw: &str) -> anyhow::Result<TenantStatus> {
    raw.parse().map_err(|e| anyhow::anyhow!("{}", e))
}

pub async fn handle(client: &ApiClient, cmd: TenantCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::List => {
            let tenants: Vec<Tenant> = client.get("/api/root/tenant").await?;

            if tenants.is_empty() {
                return output_empty_collection(&output_format, "tenants", "No tenants found");
            }

            match output_format {
                OutputFormat::Json => output_json(&json!({ "tenants": tenants }))?,
                OutputFormat::Text => print_tenant_table(&tenants),
            }
            Ok(())
        }
        TenantCommands::Show { tenant } => {
            let id = parse_id(&tenant)?;
            let tenant: Tenant = client.get(&format!("/api/root/tenant/{}", id)).await?;
            match output_format {
                OutputFormat::Json => output_json(&tenant)?,
                OutputFormat::Text => print_tenant_table(std::slice::from_ref(&tenant)),
            }
            Ok(())
        }
        TenantCommands::Create { name, status, municipality, state } => {
            let body = json!({
                "name": name,
                "status": parse_status(&status)?,
                "municipality": municipality,
                "state": state,
            });
            let tenant: Tenant = client.post("/api/root/tenant", &body).await?;
            output_success(
                &output_format,
                &format!("Tenant '{}' created ({})", tenant.name, tenant.id),
                Some(json!({ "tenant": tenant })),
            )
        }
        TenantCommands::Activate { tenant } => set_status(client, &tenant, TenantStatus::Active, &output_format).await,
        TenantCommands::Status { tenant, status } => {
            set_status(client, &tenant, parse_status(&status)?, &output_format).await
        }
    }
}

async fn set_status(
    client: &ApiClient,
    tenant: &str,
    status: TenantStatus,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let id = parse_id(tenant)?;
    let tenant: Tenant = client
        .patch(&format!("/api/root/tenant/{}/status", id), &json!({ "status": status }))
        .await?;
    output_success(
        output_format,
        &format!("Tenant '{}' is now {}", tenant.name, tenant.status),
        Some(json!({ "tenant": tenant })),
    )
}
