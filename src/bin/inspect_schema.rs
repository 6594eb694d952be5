//! Prints the platform's tables and columns, optionally probing one table with a throwaway row.
//!
//! Usage: cargo run --bin inspect_schema -- [table] [--probe]

use better_days_closet::infra::config::PlatformSettings;
use better_days_closet::infra::platform::schema::tables_from_openapi;
use better_days_closet::infra::platform::PlatformClient;
use serde_json::{json, Value as JsonValue};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const PROBE_NAME: &str = "__schema_probe__";

fn usage() {
    eprintln!(
        "Usage: cargo run --bin inspect_schema -- [table] [--probe]\n\
         \n\
         --probe   insert and immediately delete a test row in <table>, printing the stored columns\n\
         \n\
         Requires env vars:\n\
           SUPABASE_URL, SUPABASE_ANON_KEY, SUPABASE_SERVICE_ROLE_KEY\n"
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage();
        return ExitCode::SUCCESS;
    }

    let probe = args.iter().any(|a| a == "--probe");
    let table = args.iter().find(|a| !a.starts_with("--")).cloned();
    if probe && table.is_none() {
        error!("--probe needs a table name");
        usage();
        return ExitCode::FAILURE;
    }

    match run(table.as_deref(), probe).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Schema inspection failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(table: Option<&str>, probe: bool) -> anyhow::Result<()> {
    let platform = PlatformClient::new(PlatformSettings::from_env()?)?;

    let doc = platform.rest_openapi().await?;
    let tables = tables_from_openapi(&doc);
    if tables.is_empty() {
        warn!("The platform returned no table definitions");
    }

    let mut printed = 0;
    for (name, columns) in &tables {
        if table.map(|t| t != name).unwrap_or(false) {
            continue;
        }
        printed += 1;
        println!("{}", name);
        for c in columns {
            println!(
                "  {:<28} {:<28}{}{}",
                c.name,
                c.data_type,
                if c.primary_key { " pk" } else { "" },
                if c.required { " required" } else { "" },
            );
        }
    }
    if let Some(t) = table {
        if printed == 0 {
            anyhow::bail!("Table '{}' not found", t);
        }
    }

    if probe {
        if let Some(t) = table {
            probe_table(&platform, t).await?;
        }
    }
    Ok(())
}

/// Inserts a test row, prints what the platform stored, then deletes it by id.
async fn probe_table(platform: &PlatformClient, table: &str) -> anyhow::Result<()> {
    info!("Probing '{}' with a test row...", table);
    let rows = platform
        .insert_returning(table, &json!({ "name": PROBE_NAME }))
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Insert returned no row"))?;

    println!("Stored test row:");
    println!("{}", serde_json::to_string_pretty(&row)?);

    let id = match row.get("id") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => anyhow::bail!("Test row has no id; delete rows named '{}' by hand", PROBE_NAME),
    };
    platform.delete_eq(table, "id", &id).await?;
    info!("Deleted test row {}", id);
    Ok(())
}
