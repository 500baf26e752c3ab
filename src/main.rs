use bridge::{JsonFileStore, LedgerClient, LogHealthRecorder};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::Settings;
use panels::{ChangesPanel, PanelFilterEvent, SnapshotPanel};
use std::sync::Arc;

/// The terminal host for the glass dashboard panels.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if present.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = configuration::load_settings(&cli.config)?;
    let base_url = cli
        .bridge_url
        .clone()
        .or_else(|| std::env::var("GLASS_BRIDGE_URL").ok())
        .unwrap_or_else(|| settings.bridge.base_url.clone());
    let client = Arc::new(LedgerClient::new(&base_url, settings.bridge.timeout_secs)?);

    // Probe the bridge once up front so a dead process shows up in the logs
    // before a panel renders its error banner.
    match client.health().await {
        Ok(true) => tracing::debug!(%base_url, "Ledger bridge is up."),
        Ok(false) => tracing::warn!(%base_url, "Ledger bridge reports unhealthy."),
        Err(e) => tracing::warn!(%base_url, error = %e, "Ledger bridge liveness probe failed."),
    }

    // Execute the appropriate command
    match cli.command {
        Commands::Changes(args) => handle_changes(args, client, &settings).await,
        Commands::Snapshot(args) => handle_snapshot(args, client, &settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Dashboard panels for the glass trading assistant, rendered in the terminal.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the settings file (TOML, extension optional).
    #[arg(long, default_value = "glass")]
    config: String,

    /// Override the ledger bridge base URL.
    #[arg(long)]
    bridge_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the burst-collapsed audit change feed.
    Changes(ChangesArgs),
    /// Show per-timeframe market-data freshness for one symbol.
    Snapshot(SnapshotArgs),
}

#[derive(Parser)]
struct ChangesArgs {
    /// How many raw entries to request.
    #[arg(long)]
    limit: Option<u64>,

    /// Lookback window in hours.
    #[arg(long)]
    range_hours: Option<u32>,

    /// Only show events for this symbol.
    #[arg(long)]
    symbol: Option<String>,

    /// Free-text filter against event type, reason and symbol.
    #[arg(long)]
    query: Option<String>,
}

#[derive(Parser)]
struct SnapshotArgs {
    /// The symbol to inspect (e.g., "EURUSD").
    #[arg(long)]
    symbol: String,

    /// Comma-separated timeframes to classify.
    #[arg(long, value_delimiter = ',', default_value = "1m,5m,15m,1h,4h,1d")]
    timeframes: Vec<String>,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_changes(
    args: ChangesArgs,
    client: Arc<LedgerClient>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut panel = ChangesPanel::new(
        client.clone(),
        client,
        Arc::new(LogHealthRecorder),
        Arc::new(JsonFileStore::new(&settings.ui.prefs_path)),
        settings.feed.clone(),
        &settings.ui,
    );

    // Drive the panel exactly the way the host UI would: a filter event for
    // the structured knobs, then the debounced search box.
    panel
        .apply_filter_event(&PanelFilterEvent {
            range_hours: args.range_hours,
            limit: args.limit,
            symbol: args.symbol,
        })
        .await;
    if let Some(query) = &args.query {
        panel.set_query(query).await;
    }

    if let Some(error) = panel.error() {
        println!("Change feed unavailable: {error}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Level", "Type", "Symbol", "Reason", "Count", "Hidden", "Last activity",
    ]);
    for row in panel.rows() {
        table.add_row(vec![
            row.sample.level.to_string(),
            row.sample.event_type.clone(),
            row.sample.symbol.clone().unwrap_or_else(|| "-".to_string()),
            row.sample.reason_text().unwrap_or("-").to_string(),
            row.count.to_string(),
            row.suppressed_count.to_string(),
            format_ts(row.last_at_ms),
        ]);
    }
    println!("{table}");
    println!(
        "{} rows (limit {}, last {}h{})",
        panel.rows().len(),
        panel.limit(),
        panel.range_hours(),
        panel
            .filter_symbol()
            .map(|s| format!(", symbol {s}"))
            .unwrap_or_default()
    );
    Ok(())
}

async fn handle_snapshot(
    args: SnapshotArgs,
    client: Arc<LedgerClient>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut panel = SnapshotPanel::new(
        client.clone(),
        client,
        Arc::new(LogHealthRecorder),
        &settings.freshness,
        &settings.ui,
        &args.symbol,
        args.timeframes,
    );
    panel.refresh().await;

    if let Some(error) = panel.error() {
        println!("Snapshot unavailable for {}: {error}", panel.symbol());
        return Ok(());
    }

    println!("Snapshot status for {}", panel.symbol());
    if let Some(quote) = panel.quote() {
        println!(
            "  quote: bid {} / ask {} (spread {})",
            format_price(quote.bid),
            format_price(quote.ask),
            format_price(quote.spread),
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["Timeframe", "State", "Detail"]);
    for report in panel.reports() {
        table.add_row(vec![
            report.timeframe.clone(),
            format!("{} {}", badge(report.state.as_str()), report.state.as_str()),
            report.detail.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn badge(state: &str) -> &'static str {
    match state {
        "fresh" => "🟢",
        "aging" => "🟡",
        "stale" => "🔴",
        "short" => "🟠",
        "missing" => "⚫",
        _ => "⚪",
    }
}

fn format_ts(ms: Option<i64>) -> String {
    ms.and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_price(value: Option<rust_decimal::Decimal>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}
