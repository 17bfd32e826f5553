//! Load balancer rule sync (v1)
//!
//! Reconciles a CSV description of listener routing rules with the live
//! rules of a load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!   apply:
//!     rules.csv ─▶ tabular::reader ─▶ rules::grouping ─▶ sync::synchronizer ─▶ ElbApi
//!                                                           │
//!                                     load_balancer::{capacity, priority, targets}
//!
//!   export:
//!     ElbApi ─▶ export::projector ─▶ tabular::writer ─▶ rules.csv
//! ```
//!
//! `apply --dry-run` runs the same pipeline against an in-memory copy of the
//! live state.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::Instrument;
use uuid::Uuid;

use lb_rule_sync::config::validation::validate_config;
use lb_rule_sync::config::{read_config, ConfigError, SyncConfig};
use lb_rule_sync::load_balancer::{ElbApi, HttpElbClient, InMemoryElb};
use lb_rule_sync::observability::logging;
use lb_rule_sync::rules::MergePolicy;
use lb_rule_sync::tabular::{self, ColumnMap};
use lb_rule_sync::{export, sync};

#[derive(Parser)]
#[command(name = "lb-rule-sync")]
#[command(about = "Reconcile load balancer listener rules with a CSV rule table", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load balancer ARN (overrides config)
    #[arg(long)]
    load_balancer: Option<String>,

    /// Control-plane endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level or filter directive (overrides config; RUST_LOG wins)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create rules on the load balancer from a CSV rule table
    Apply {
        /// Rule table to apply
        #[arg(short, long)]
        input: PathBuf,

        /// host-path-pair, all or host-path-pair-strict
        #[arg(long)]
        merge_policy: Option<MergePolicy>,

        /// Rule ceiling per listener
        #[arg(long)]
        max_rules: Option<usize>,

        /// Column layout preset: export or compact
        #[arg(long)]
        columns: Option<String>,

        /// Pause after each submission in milliseconds
        #[arg(long)]
        pause_ms: Option<u64>,

        /// Run against an in-memory copy of the live state
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the live rules of the load balancer to a CSV file
    Export {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        /// Only export this listener
        #[arg(long)]
        listener_port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => SyncConfig::default(),
    };
    if let Some(arn) = cli.load_balancer {
        config.load_balancer.arn = arn;
    }
    if let Some(endpoint) = cli.endpoint {
        config.control_plane.endpoint = endpoint;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    match cli.command {
        Commands::Apply {
            input,
            merge_policy,
            max_rules,
            columns,
            pause_ms,
            dry_run,
        } => {
            if let Some(policy) = merge_policy {
                config.reconcile.merge_policy = policy;
            }
            if let Some(max) = max_rules {
                config.reconcile.max_rules = max;
            }
            if let Some(name) = columns {
                config.columns = ColumnMap::preset(&name)
                    .ok_or_else(|| format!("unknown column preset '{}' (expected export or compact)", name))?;
            }
            if let Some(pause) = pause_ms {
                config.reconcile.pacing.pause_ms = pause;
                config.reconcile.pacing.max_pause_ms = config.reconcile.pacing.max_pause_ms.max(pause);
            }

            let config = prepare(config)?;
            let span = tracing::info_span!("apply", run_id = %Uuid::new_v4(), dry_run);
            run_apply(config, &input, dry_run).instrument(span).await
        }
        Commands::Export { output, listener_port } => {
            let config = prepare(config)?;
            let span = tracing::info_span!("export", run_id = %Uuid::new_v4());
            run_export(config, &output, listener_port).instrument(span).await
        }
    }
}

/// Validate the merged configuration and start logging.
fn prepare(config: SyncConfig) -> Result<SyncConfig, ConfigError> {
    logging::init(&config.observability.log_level);
    validate_config(&config).map_err(ConfigError::Validation)?;
    tracing::info!(
        load_balancer = %config.load_balancer.arn,
        endpoint = %config.control_plane.endpoint,
        max_rules = config.reconcile.max_rules,
        merge_policy = %config.reconcile.merge_policy,
        "Configuration loaded"
    );
    Ok(config)
}

async fn run_apply(mut config: SyncConfig, input: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    // An unreadable table aborts before any control-plane call.
    let table = tabular::reader::read_path(input, &config.columns)?;
    let client = HttpElbClient::new(&config.control_plane)?;

    let report = if dry_run {
        let memory = InMemoryElb::snapshot(&client, &config.load_balancer.arn).await?;
        config.reconcile.pacing.pause_ms = 0;
        config.reconcile.pacing.adaptive = false;
        tracing::info!("Dry run: changes apply to an in-memory copy only");
        sync::apply(&memory as &dyn ElbApi, &config, table).await?
    } else {
        sync::apply(&client, &config, table).await?
    };

    println!("{}", report);
    Ok(())
}

async fn run_export(config: SyncConfig, output: &Path, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let client = HttpElbClient::new(&config.control_plane)?;
    let rows = export::export_rows(
        &client,
        &config.load_balancer.arn,
        port,
        &config.reconcile.not_applicable,
    )
    .await?;
    tabular::writer::write_path(output, &rows)?;
    println!("{} rows written to {}", rows.len(), output.display());
    Ok(())
}
