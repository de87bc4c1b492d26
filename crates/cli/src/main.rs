mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use crypto_tracker_core::services::chart_service::ChartService;
use crypto_tracker_core::services::export_service::{ExportService, CSV_FILENAME, REPORT_FILENAME};
use crypto_tracker_core::services::scheduler::{schedule_market_refresh, schedule_price_sync};
use crypto_tracker_core::{
    CoinGeckoGateway, CryptoStore, FileStore, MarketStatus, NewHolding, Settings,
};

// ---------------------------------------------------------------------------
// CLI argument structs
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "crypto-tracker",
    version,
    about = "Track cryptocurrency prices, a watchlist and a simulated portfolio",
    propagate_version = true
)]
struct Cli {
    /// Directory holding the persisted watchlist and portfolio
    #[arg(long, global = true, default_value = ".crypto-tracker")]
    data_dir: PathBuf,

    /// Base URL of the CoinGecko-compatible API
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the top coins by market cap
    Market {
        /// Only show coins whose name or symbol contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show full detail for one coin
    Coin {
        /// Coin id, e.g. "bitcoin"
        id: String,
    },
    /// Manage the watchlist
    #[command(subcommand)]
    Watch(WatchCommand),
    /// Manage the simulated portfolio
    #[command(subcommand)]
    Portfolio(PortfolioCommand),
    /// Export the portfolio to a file
    #[command(subcommand)]
    Export(ExportCommand),
    /// Keep refreshing market data and portfolio prices until Ctrl-C
    Live,
}

#[derive(Subcommand)]
enum WatchCommand {
    /// Watch a coin
    Add { id: String },
    /// Stop watching a coin
    Remove { id: String },
    /// Show watched coins with current prices
    List,
}

#[derive(Subcommand)]
enum PortfolioCommand {
    /// Record a holding
    Add(AddHoldingArgs),
    /// Remove a holding by its id
    Remove { holding_id: String },
    /// List holdings
    List,
    /// Re-price holdings from the API
    Sync,
    /// Show totals and allocation
    Summary,
}

#[derive(Args)]
struct AddHoldingArgs {
    /// Coin id, e.g. "bitcoin"
    coin_id: String,

    /// Number of coins held
    #[arg(long)]
    amount: f64,

    /// Price paid per coin in USD
    #[arg(long)]
    buy_price: f64,
}

#[derive(Subcommand)]
enum ExportCommand {
    /// Write a CSV file
    Csv {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a paginated text report
    Report {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(url) = cli.api_url {
        settings.api_base_url = url.trim_end_matches('/').to_string();
    }

    let gateway = Arc::new(CoinGeckoGateway::from_settings(&settings));
    let backing = Arc::new(FileStore::new(&cli.data_dir));
    tracing::debug!(data_dir = %cli.data_dir.display(), api = %settings.api_base_url, "starting");

    match cli.command {
        Commands::Market { search } => {
            let store = CryptoStore::open(gateway, backing, settings).await;
            ensure_market(&store)?;
            if let Some(term) = search {
                store.set_search_term(term);
            }
            render::coin_table(&store.filtered_coins(), &store.watchlist());
        }
        Commands::Coin { id } => {
            let store = CryptoStore::new(gateway, backing, settings);
            let Some(coin) = store.lookup_coin(&id).await else {
                bail!("could not fetch coin '{id}'");
            };
            let chart = ChartService::new();
            let history = chart.price_history(&coin);
            render::coin_detail(&coin, history.as_ref(), &chart);
            if store.is_watched(&coin.id) {
                println!("  (on your watchlist)");
            }
        }
        Commands::Watch(cmd) => run_watch(cmd, gateway, backing, settings).await?,
        Commands::Portfolio(cmd) => run_portfolio(cmd, gateway, backing, settings).await?,
        Commands::Export(cmd) => {
            let store = CryptoStore::new(gateway, backing, settings);
            run_export(cmd, &store)?;
        }
        Commands::Live => {
            let store = CryptoStore::open(gateway, backing, settings).await;
            run_live(store).await?;
        }
    }

    Ok(())
}

async fn run_watch(
    cmd: WatchCommand,
    gateway: Arc<CoinGeckoGateway>,
    backing: Arc<FileStore>,
    settings: Settings,
) -> Result<()> {
    match cmd {
        WatchCommand::Add { id } => {
            let store = CryptoStore::new(gateway, backing, settings);
            store.add_to_watchlist(&id);
            println!("Watching {id}");
        }
        WatchCommand::Remove { id } => {
            let store = CryptoStore::new(gateway, backing, settings);
            store.remove_from_watchlist(&id);
            println!("No longer watching {id}");
        }
        WatchCommand::List => {
            let store = CryptoStore::open(gateway, backing, settings).await;
            if store.watchlist().is_empty() {
                println!("Watchlist is empty.");
                return Ok(());
            }
            ensure_market(&store)?;
            let watched = store.watched_coins();
            render::coin_table(&watched, &store.watchlist());
            let missing: Vec<String> = store
                .watchlist()
                .into_iter()
                .filter(|id| !watched.iter().any(|c| &c.id == id))
                .collect();
            if !missing.is_empty() {
                println!("Not in the current top listing: {}", missing.join(", "));
            }
        }
    }
    Ok(())
}

async fn run_portfolio(
    cmd: PortfolioCommand,
    gateway: Arc<CoinGeckoGateway>,
    backing: Arc<FileStore>,
    settings: Settings,
) -> Result<()> {
    match cmd {
        PortfolioCommand::Add(args) => {
            validate_holding(args.amount, args.buy_price)?;
            let store = CryptoStore::open(gateway, backing, settings).await;
            let coin = match store.coin(&args.coin_id) {
                Some(c) => c,
                None => store
                    .lookup_coin(&args.coin_id)
                    .await
                    .with_context(|| format!("unknown coin '{}'", args.coin_id))?,
            };
            let id = store.add_to_portfolio(
                NewHolding::new(&coin.id, &coin.name, &coin.symbol, args.amount, args.buy_price)
                    .with_image(&coin.image),
            );
            println!("Added {} {} as holding {id}", args.amount, coin.display_symbol());
        }
        PortfolioCommand::Remove { holding_id } => {
            let store = CryptoStore::new(gateway, backing, settings);
            let before = store.portfolio().len();
            store.remove_from_portfolio(&holding_id);
            if store.portfolio().len() == before {
                bail!("no holding with id '{holding_id}'");
            }
            println!("Removed holding {holding_id}");
        }
        PortfolioCommand::List => {
            let store = CryptoStore::new(gateway, backing, settings);
            render::holdings_table(&store.portfolio());
        }
        PortfolioCommand::Sync => {
            let store = CryptoStore::new(gateway, backing, settings);
            let mut notifications = store.notifications();
            store.sync_portfolio_prices().await;
            if let Ok(n) = notifications.try_recv() {
                if n.is_error() {
                    bail!("{}", n.message);
                }
            }
            render::holdings_table(&store.portfolio());
        }
        PortfolioCommand::Summary => {
            let store = CryptoStore::new(gateway, backing, settings);
            render::summary(&store.summary(), &store.allocation());
        }
    }
    Ok(())
}

fn run_export(cmd: ExportCommand, store: &CryptoStore) -> Result<()> {
    let export = ExportService::new();
    let holdings = store.portfolio();
    match cmd {
        ExportCommand::Csv { out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(CSV_FILENAME));
            export
                .export_csv(&holdings, &path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} holdings to {}", holdings.len(), path.display());
        }
        ExportCommand::Report { out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(REPORT_FILENAME));
            export
                .export_report(&holdings, &path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote report to {}", path.display());
        }
    }
    Ok(())
}

async fn run_live(store: Arc<CryptoStore>) -> Result<()> {
    let settings = store.settings().clone();
    let _market = schedule_market_refresh(
        Arc::clone(&store),
        Duration::from_secs(settings.refresh_interval_secs.max(1)),
    );
    let _prices = schedule_price_sync(
        Arc::clone(&store),
        Duration::from_secs(settings.price_sync_interval_secs.max(1)),
    );

    let mut state = store.subscribe();
    let mut notifications = store.notifications();
    print_live_status(&store);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
            changed = state.changed() => {
                changed.context("store closed")?;
                let ready = state.borrow_and_update().status == MarketStatus::Ready;
                if ready {
                    print_live_status(&store);
                }
            }
            received = notifications.recv() => match received {
                Ok(n) => println!("{n}"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

fn print_live_status(store: &CryptoStore) {
    let snapshot = store.snapshot();
    let updated = snapshot
        .last_updated
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".into());
    println!();
    println!("-- {} ({} coins, updated {updated}) --", snapshot.status, snapshot.coins.len());
    let watched = store.watched_coins();
    if !watched.is_empty() {
        render::coin_table(&watched, &snapshot.watchlist);
    }
    if !snapshot.portfolio.is_empty() {
        println!();
        render::summary(&store.summary(), &[]);
    }
}

fn ensure_market(store: &CryptoStore) -> Result<()> {
    if store.status() == MarketStatus::Failed {
        bail!(
            "{}",
            store.error().unwrap_or_else(|| "market data unavailable".into())
        );
    }
    Ok(())
}

fn validate_holding(amount: f64, buy_price: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("amount must be a positive number, got {amount}");
    }
    if !buy_price.is_finite() || buy_price < 0.0 {
        bail!("buy price must be zero or more, got {buy_price}");
    }
    Ok(())
}
