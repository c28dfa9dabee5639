use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::database::models::Tenant;
use crate::linking::LinkOutcome;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(obj)) = (data, response.as_object_mut()) {
                obj.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print any serializable value as pretty JSON
pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

pub fn print_tenant_table(tenants: &[Tenant]) {
    println!("{:<38} {:<30} {:<10} {}", "ID", "NAME", "STATUS", "LOCATION");
    println!("{}", "-".repeat(100));
    for t in tenants {
        let location = match (&t.municipality, &t.state) {
            (Some(m), Some(s)) => format!("{}/{}", m, s),
            _ => "-".to_string(),
        };
        println!("{:<38} {:<30} {:<10} {}", t.id, t.name, t.status, location);
    }
}

pub fn print_outcome(outcome: &LinkOutcome) {
    match outcome.target_tenant_id {
        Some(id) => println!("Scoped run for tenant {}", id),
        None => println!("Global run"),
    }
    println!(
        "Processed {}: {} linked, {} unlinked",
        outcome.total_processed, outcome.linked, outcome.unlinked
    );

    if !outcome.linked_citizens.is_empty() {
        println!();
        println!("{:<38} {:<30} {}", "CITIZEN", "NAME", "TENANT");
        for l in &outcome.linked_citizens {
            println!("{:<38} {:<30} {}", l.citizen_id, l.display_name, l.tenant_id);
        }
    }

    if !outcome.unlinked_citizens.is_empty() {
        println!();
        println!("{:<38} {:<30} {}", "CITIZEN", "NAME", "REASON");
        for u in &outcome.unlinked_citizens {
            let reason = serde_json::to_value(u.reason)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            println!("{:<38} {:<30} {}", u.citizen_id, u.display_name, reason);
        }
    }
}
