//! Citegraph Analytics Worker
//!
//! Runs one analytics job against the PostgreSQL corpus and prints the result
//! as JSON:
//! 1. Loads configuration and initializes logging/metrics
//! 2. Connects to the database (or only runs migrations)
//! 3. Executes the requested command

mod jobs;

use crate::jobs::{Command, Jobs, USAGE};
use citegraph_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository},
    metrics::{register_metrics, JOB_BUCKETS},
    VERSION,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // stdout carries the JSON result
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_metrics(config: &ObservabilityConfig) -> anyhow::Result<()> {
    register_metrics();
    if config.metrics_port == 0 {
        return Ok(());
    }

    let addr: SocketAddr = ([0, 0, 0, 0], config.metrics_port).into();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(JOB_BUCKETS)?
        .install()?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {:#}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    // Load configuration; CITEGRAPH_CONFIG points at an explicit file
    let config = match std::env::var("CITEGRAPH_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)?,
        Err(_) => AppConfig::load()?,
    };
    init_tracing(&config.observability);
    init_metrics(&config.observability)?;

    info!(
        service = %config.observability.service_name,
        ?command,
        "Starting Citegraph Analytics Worker v{}",
        VERSION
    );

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;

    if let Command::Migrate { dir } = &command {
        db.migrate(dir).await?;
        return Ok(());
    }

    let store = Arc::new(Repository::new(db));
    let jobs = Jobs::new(store, config.analytics.clone());

    match jobs.run(command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Job failed");
            Err(e)
        }
    }
}
