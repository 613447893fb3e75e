use anyhow::{Context, Result};
use cdmingest::{
    config::IngestConfig,
    parse::plan::REQUIRED_VARIABLE_COLUMNS,
    upload::{self, transport::HttpTransport},
};
use reqwest::Client;
use std::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) args: CSV file + config ──────────────────────────────────
    let mut args = std::env::args().skip(1);
    let usage = "usage: cdmingest <csv-file> <config.yaml>";
    let csv_path = args.next().context(usage)?;
    let config_path = args.next().context(usage)?;

    let cfg = IngestConfig::load(&config_path)
        .with_context(|| format!("loading config {config_path}"))?;
    let csv_text =
        fs::read_to_string(&csv_path).with_context(|| format!("reading {csv_path}"))?;
    info!(file = %csv_path, bytes = csv_text.len(), api = %cfg.api_base, "uploading");

    // ─── 3) run the ingestion pipeline ───────────────────────────────
    let transport = HttpTransport::new(Client::new(), &cfg)?;
    let summary = upload::run(
        &transport,
        &csv_text,
        REQUIRED_VARIABLE_COLUMNS,
        &cfg,
        |p| {
            info!(
                chunk = p.chunk,
                total = p.total_chunks,
                percent = p.percent,
                "chunk complete"
            );
        },
    )
    .await?;

    // ─── 4) report ───────────────────────────────────────────────────
    for err in &summary.errors {
        error!("{err}");
    }
    info!(
        created = summary.created_count,
        errors = summary.error_count,
        "{}",
        summary.message
    );

    if !summary.success {
        std::process::exit(1);
    }
    Ok(())
}
