use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use posabit_reorder::{
    config::{self, AppConfig},
    models::{
        NormalizedLine, ProductUpsert, ReorderParams, ReorderReport, ReorderRow, SaleEvent,
    },
    services::{
        ingest::{IngestOutcome, IngestService},
        ledger::catalog_updates,
        normalizer,
        reorder::ReorderService,
    },
    store::{self, Store},
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Report(args) => handle_report(args, cli.json).await?,
        Commands::Ingest(args) => handle_ingest(args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "reorder-cli",
    about = "Low-stock reports and webhook replays against the configured store",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the ranked reorder report
    Report(ReportArgs),
    /// Replay saved POSaBIT webhook bodies through the ingestion pipeline
    Ingest(IngestArgs),
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, help = "Days of sales history (defaults to configuration)")]
    lookback: Option<i64>,
    #[arg(long, help = "Supplier lead time in days (defaults to configuration)")]
    lead: Option<i64>,
    #[arg(long, help = "Safety buffer in days (defaults to configuration)")]
    safety: Option<i64>,
    #[arg(long, help = "Show at most this many rows")]
    limit: Option<usize>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Only show SKUs with a positive order quantity"
    )]
    to_order: bool,
}

#[derive(Args)]
struct IngestArgs {
    #[arg(required = true, help = "Webhook body files; '-' reads stdin")]
    files: Vec<PathBuf>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Normalize and print without writing to the store"
    )]
    dry_run: bool,
}

struct CliContext {
    config: AppConfig,
    store: Arc<dyn Store>,
}

impl CliContext {
    fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let store = store::build_store(&config).context("failed to initialise store client")?;
        debug!(target: "reorder_cli", backend = %config.store_backend, "store ready");

        Ok(Self { config, store })
    }
}

async fn handle_report(args: ReportArgs, json: bool) -> Result<()> {
    let context = CliContext::initialize()?;
    let defaults = context.config.report_defaults();
    let params = ReorderParams::clamped(
        args.lookback
            .unwrap_or_else(|| i64::from(defaults.lookback_days)),
        args.lead
            .unwrap_or_else(|| i64::from(defaults.lead_time_days)),
        args.safety
            .unwrap_or_else(|| i64::from(defaults.safety_days)),
    );

    let mut report = ReorderService::new(context.store.clone())
        .report(params, Utc::now())
        .await
        .context("failed to compute reorder report")?;

    if args.to_order {
        report.rows.retain(|row| row.order_qty > 0);
    }
    if let Some(limit) = args.limit {
        report.rows.truncate(limit);
    }

    if json {
        print_json(&report)?;
    } else {
        render_report(&report);
    }
    Ok(())
}

#[derive(Serialize)]
struct DryRunResult {
    file: String,
    sale_id: String,
    structured: bool,
    lines: Vec<NormalizedLine>,
    rejected: usize,
    catalog_updates: Vec<ProductUpsert>,
}

async fn handle_ingest(args: IngestArgs, json: bool) -> Result<()> {
    if args.dry_run {
        let mut results = Vec::with_capacity(args.files.len());
        for path in &args.files {
            let body = read_body(path)?;
            let event = SaleEvent::parse(&body);
            let sale = normalizer::normalize(&event);
            results.push(DryRunResult {
                file: path.display().to_string(),
                structured: event.is_structured(),
                catalog_updates: catalog_updates(&sale.lines),
                sale_id: sale.sale_id,
                lines: sale.lines,
                rejected: sale.rejected,
            });
        }

        if json {
            print_json(&results)?;
        } else {
            for result in &results {
                println!(
                    "{}: sale {:?} • {} line(s) • {} rejected • {} catalog update(s){}",
                    result.file,
                    result.sale_id,
                    result.lines.len(),
                    result.rejected,
                    result.catalog_updates.len(),
                    if result.structured { "" } else { " • body is not JSON" }
                );
                for line in &result.lines {
                    println!(
                        "  - {} x {}{}",
                        line.sku,
                        line.qty,
                        line.name
                            .as_deref()
                            .map(|name| format!(" ({})", name))
                            .unwrap_or_default()
                    );
                }
            }
        }
        return Ok(());
    }

    let context = CliContext::initialize()?;
    let service = IngestService::new(context.store.clone());
    let mut failures = 0usize;
    let mut acks = Vec::with_capacity(args.files.len());

    for path in &args.files {
        let body = read_body(path)?;
        let outcome = service.ingest(&body).await;
        if !outcome.is_success() {
            failures += 1;
        }
        if !json {
            match &outcome {
                IngestOutcome::NoLines { sale_id, rejected } => println!(
                    "{}: sale {:?} had no usable lines ({} rejected)",
                    path.display(),
                    sale_id,
                    rejected
                ),
                IngestOutcome::Stored {
                    sale_id,
                    inserted,
                    rejected,
                } => println!(
                    "{}: sale {:?} stored {} line(s) ({} rejected)",
                    path.display(),
                    sale_id,
                    inserted,
                    rejected
                ),
                IngestOutcome::WriteFailed { sale_id, error } => println!(
                    "{}: sale {:?} failed: {}",
                    path.display(),
                    sale_id,
                    error
                ),
            }
        }
        acks.push(outcome.ack());
    }

    if json {
        print_json(&acks)?;
    }

    if failures > 0 {
        anyhow::bail!("{} of {} deliveries failed to store", failures, args.files.len());
    }
    Ok(())
}

fn read_body(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut body = Vec::new();
        io::stdin()
            .read_to_end(&mut body)
            .context("failed to read stdin")?;
        return Ok(body);
    }
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_report(report: &ReorderReport) {
    println!(
        "lookback {}d • lead {}d • safety {}d • {} SKU(s)",
        report.lookback,
        report.lead,
        report.safety,
        report.rows.len()
    );
    for row in &report.rows {
        render_row(row);
    }
}

fn render_row(row: &ReorderRow) {
    let supply = row
        .days_of_supply
        .map(|days| format!("{} days", days))
        .unwrap_or_else(|| "no sales".to_string());
    let cost = row
        .est_cost
        .map(|cost| format!(" • est {}", cost))
        .unwrap_or_default();
    println!(
        "- {} {} • on hand {} • {}/day • {} • order {} (target {}){}",
        row.sku,
        row.name.as_deref().unwrap_or("-"),
        row.on_hand,
        row.daily_rate,
        supply,
        row.order_qty,
        row.target_stock,
        cost
    );
}
