//! ratewatch CLI: keep the local rate history in step with the NBP tables.
//!
//! Commands:
//! - `init`: create the database (and optionally a default config file)
//! - `status`: per-currency row counts, date ranges and sufficiency
//! - `reconcile`: backfill every tracked currency that needs it
//! - `rates`: list stored observations as JSON
//! - `chart`: chart series and summary for one currency over a period
//! - `crypto`: top cryptocurrencies by market cap, passed through as JSON

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{debug, info};
use ratewatch_core::data::{CryptoClient, NbpClient, RateFilter, RateStore};
use ratewatch_core::domain::{CurrencyCode, DATE_FORMAT};
use ratewatch_core::reconcile::{classify, recent_cutoff, CurrencyOutcome};
use ratewatch_core::view::select_currency;
use ratewatch_core::{
    auto_refresh, build_currency_view, needs_update, reconcile_all, AppConfig, Period,
};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "ratewatch.toml";

#[derive(Parser)]
#[command(
    name = "ratewatch",
    about = "ratewatch: PLN exchange-rate history kept fresh from the NBP tables API"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./ratewatch.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overriding the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema.
    Init {
        /// Also write the effective config to this path.
        #[arg(long)]
        write_config: Option<PathBuf>,
    },
    /// Report stored rows per tracked currency.
    Status,
    /// Backfill every tracked currency whose history is insufficient.
    Reconcile {
        /// Print the full report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List stored observations, newest first.
    Rates {
        /// Currency code (e.g., USD).
        #[arg(long)]
        currency: Option<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Maximum rows. Defaults to 30.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Chart series and summary for one currency.
    Chart {
        /// Currency code. Unknown codes fall back to the first tracked currency.
        #[arg(long)]
        currency: Option<String>,

        /// One of 7days, 1month, 6months, 1year. Defaults to 1month.
        #[arg(long, default_value = "1month")]
        period: String,

        /// Skip the staleness check and render whatever is stored.
        #[arg(long, default_value_t = false)]
        no_refresh: bool,
    },
    /// Top cryptocurrencies by market cap.
    Crypto {
        /// Number of assets. Defaults to the config's crypto_limit.
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = load_config(cli.config.as_deref(), cli.db)?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Init { write_config } => run_init(&config, write_config.as_deref()),
        Commands::Status => run_status(&config, today),
        Commands::Reconcile { json } => run_reconcile(&config, today, json),
        Commands::Rates {
            currency,
            start,
            end,
            limit,
        } => run_rates(&config, currency, start, end, limit),
        Commands::Chart {
            currency,
            period,
            no_refresh,
        } => run_chart(&config, today, currency.as_deref(), &period, no_refresh),
        Commands::Crypto { limit } => run_crypto(&config, limit),
    }
}

fn load_config(path: Option<&Path>, db_override: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AppConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => AppConfig::default(),
    };
    if let Some(db) = db_override {
        config.database_path = db;
    }
    debug!("effective config: {config:?}");
    Ok(config)
}

fn open_store(config: &AppConfig) -> Result<RateStore> {
    RateStore::open(&config.database_path)
        .with_context(|| format!("open database {}", config.database_path.display()))
}

fn nbp_client(config: &AppConfig) -> Result<NbpClient> {
    Ok(NbpClient::new(config.nbp_base_url.clone(), config.http_timeout())?)
}

fn parse_date_arg(flag: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{s}'"))
    })
    .transpose()
}

fn run_init(config: &AppConfig, write_config: Option<&Path>) -> Result<()> {
    open_store(config)?;
    println!("Database ready: {}", config.database_path.display());

    if let Some(path) = write_config {
        if path.exists() {
            bail!("refusing to overwrite existing config {}", path.display());
        }
        std::fs::write(path, config.to_toml()?)
            .with_context(|| format!("write config {}", path.display()))?;
        println!("Config written: {}", path.display());
    }
    Ok(())
}

fn run_status(config: &AppConfig, today: NaiveDate) -> Result<()> {
    let store = open_store(config)?;
    let tracked = config.tracked();
    let cutoff = recent_cutoff(today);

    println!("Database: {}", config.database_path.display());
    println!("Total records: {}", store.count(None)?);
    println!();
    println!(
        "{:<6} {:>8} {:>8} {:<25} {:<15}",
        "Code", "Rows", "Recent", "Date Range", "State"
    );
    println!("{}", "-".repeat(66));

    for currency in tracked.codes() {
        let total = store.count(Some(currency))?;
        let recent = store.count_since(currency, cutoff)?;
        let range = match store.date_range(currency)? {
            Some((first, last)) => format!("{first} to {last}"),
            None => "(none)".into(),
        };
        println!(
            "{:<6} {:>8} {:>8} {:<25} {:<15}",
            currency.as_str(),
            total,
            recent,
            range,
            format!("{:?}", classify(total, recent))
        );
    }

    println!();
    println!("Currencies in database: {}", store.distinct_currencies()?.join(", "));
    println!("Auto-update pending: {}", needs_update(&store, &tracked, today)?);
    Ok(())
}

fn run_reconcile(config: &AppConfig, today: NaiveDate, as_json: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let source = nbp_client(config)?;
    let report = reconcile_all(&mut store, &source, &config.tracked(), today)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for entry in &report.currencies {
        let detail = match &entry.outcome {
            CurrencyOutcome::Sufficient => "sufficient".to_string(),
            CurrencyOutcome::CaughtUp => "already up to date".to_string(),
            CurrencyOutcome::Backfilled { window, stored } => {
                format!(
                    "stored {stored} from {} to {} ({} days)",
                    window.start,
                    window.end,
                    window.days()
                )
            }
            CurrencyOutcome::Failed { reason } => format!("FAILED: {reason}"),
        };
        println!(
            "{:<6} {:>6} rows ({} recent)  {detail}",
            entry.currency.as_str(),
            entry.total_before,
            entry.recent_before
        );
    }
    println!("{}", report.message());
    Ok(())
}

fn run_rates(
    config: &AppConfig,
    currency: Option<String>,
    start: Option<String>,
    end: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let store = open_store(config)?;

    let currency = currency
        .as_deref()
        .map(CurrencyCode::parse)
        .transpose()
        .context("--currency must be a 3-letter code")?;
    let mut filter = RateFilter {
        currency,
        start: parse_date_arg("start", start.as_deref())?,
        end: parse_date_arg("end", end.as_deref())?,
        ..RateFilter::default()
    };
    if limit.is_some() {
        filter.limit = limit;
    }

    let rows = store.query(&filter)?;
    let body = json!({
        "status": "success",
        "count": rows.len(),
        "data": rows,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn run_chart(
    config: &AppConfig,
    today: NaiveDate,
    currency: Option<&str>,
    period: &str,
    no_refresh: bool,
) -> Result<()> {
    let tracked = config.tracked();
    let Some(code) = select_currency(currency, &tracked) else {
        bail!("no tracked currencies configured");
    };
    let period = Period::parse_or_default(period);

    let mut store = open_store(config)?;
    if !no_refresh {
        let source = nbp_client(config)?;
        if let Some(report) = auto_refresh(&mut store, &source, &tracked, today) {
            info!("refreshed before rendering: {}", report.message());
        }
    }

    let view = build_currency_view(&store, &code, period, today)?;
    info!("{code} {period}: {}", view.date_info());
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn run_crypto(config: &AppConfig, limit: Option<usize>) -> Result<()> {
    let client = CryptoClient::new(config.crypto_api_url.clone(), config.http_timeout())?;
    let assets = client.top_assets_or_empty(limit.unwrap_or(config.crypto_limit));
    if assets.is_empty() {
        println!("No cryptocurrency data available.");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&assets)?);
    Ok(())
}
