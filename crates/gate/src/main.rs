//! facility-gate command-line driver.
//!
//! Loads the declarations document, builds the endpoint registry and runs
//! one of the subcommands against it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use facility_access::{Caller, TenantId};
use facility_gate::{
    Declarations, EndpointRegistry, GateConfig, GateError, RequestGate, init_logging,
};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "facility-gate")]
#[command(about = "Endpoint authorization and grid query compilation")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: GateConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the registry and print a summary.
    Validate,

    /// List the fields of an entity's catalogue.
    Describe {
        /// Entity name.
        entity: String,
    },

    /// Authorize and compile one grid request, printing the query plan.
    Plan {
        /// Endpoint name.
        #[arg(long)]
        endpoint: String,

        /// Operation name.
        #[arg(long, default_value = "list")]
        operation: String,

        /// JSON file with the grid parameters; empty parameters when omitted.
        #[arg(long)]
        params: Option<PathBuf>,

        /// JSON file with the caller and its role assignments.
        #[arg(long, conflicts_with = "user", required_unless_present = "user")]
        caller: Option<PathBuf>,

        /// User whose roles are taken from the declarations document.
        #[arg(long)]
        user: Option<String>,

        /// Tenant context for `--user`.
        #[arg(long, requires = "user")]
        tenant: Option<String>,
    },
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn describe(registry: &EndpointRegistry, entity: &str) -> anyhow::Result<()> {
    let catalogue = registry
        .catalogue(entity)
        .ok_or_else(|| anyhow::anyhow!("unknown entity: {}", entity))?;

    println!("{} ({} fields)", catalogue.entity(), catalogue.len());
    for field in catalogue.iter() {
        let mut flags = Vec::new();
        if field.can_sort() {
            flags.push("sort");
        }
        if field.can_filter() {
            flags.push("filter");
        }
        println!(
            "  {:>3}  {:<24} {:<7} {:<12} {}",
            field.id,
            field.name,
            field.semantic_type.to_string(),
            flags.join(","),
            field.storage_ref
        );
        if let Some(values) = &field.enum_values {
            for (index, label) in values.iter() {
                println!("         {} = {}", index, label);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config;
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let declarations = Declarations::load(&config.declarations)?;
    let registry = Arc::new(EndpointRegistry::build(&declarations)?);

    match cli.command {
        Command::Validate => {
            info!(path = %config.declarations.display(), "Declarations are valid");
            let roles = declarations.role_store()?;
            println!(
                "{} entities, {} endpoints, {} roles",
                registry.catalogues().count(),
                registry.len(),
                roles.role_count()
            );
            for endpoint in registry.endpoints() {
                println!("  {} -> {}", endpoint.name, endpoint.catalogue.entity());
            }
        }
        Command::Describe { entity } => describe(&registry, &entity)?,
        Command::Plan {
            endpoint,
            operation,
            params,
            caller,
            user,
            tenant,
        } => {
            let params = match params {
                Some(path) => read_json(&path)?,
                None => Value::Null,
            };
            let gate = RequestGate::from_config(registry, &config);

            let result = match (caller, user) {
                (Some(path), _) => {
                    let caller: Caller = serde_json::from_value(read_json(&path)?)
                        .with_context(|| format!("invalid caller in {}", path.display()))?;
                    gate.handle(&endpoint, &operation, &caller, &params)
                }
                (None, Some(user)) => {
                    let store = declarations.role_store()?;
                    gate.handle_for_user(
                        &store,
                        &user,
                        tenant.map(TenantId::new),
                        &endpoint,
                        &operation,
                        &params,
                    )
                    .await
                }
                (None, None) => anyhow::bail!("either --caller or --user is required"),
            };

            match result {
                Ok(plan) => println!("{}", serde_json::to_string_pretty(&plan)?),
                Err(GateError::Forbidden) => {
                    println!("forbidden");
                    std::process::exit(3);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}
