use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_json, print_outcome};
use crate::cli::OutputFormat;
use crate::linking::LinkOutcome;
use crate::types::TenantId;

pub async fn handle(client: &ApiClient, tenant: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let tenant_id = tenant
        .map(|t| t.parse::<TenantId>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("invalid tenant id: {}", e))?;

    let outcome: LinkOutcome = client
        .post("/api/root/linking", &json!({ "tenant_id": tenant_id }))
        .await?;

    match output_format {
        OutputFormat::Json => output_json(&outcome)?,
        OutputFormat::Text => print_outcome(&outcome),
    }
    Ok(())
}
