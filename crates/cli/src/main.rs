//! Cartsync CLI - browse the catalog, edit the cart, place orders.
//!
//! # Usage
//!
//! ```bash
//! # List products (restored from disk, fetched if nothing is stored)
//! cartsync products
//!
//! # Force a catalog refetch
//! cartsync products --refresh
//!
//! # Add a product and review the cart
//! cartsync add 3
//! cartsync cart
//!
//! # Place the order
//! cartsync checkout
//! ```
//!
//! # Commands
//!
//! - `products`, `product`, `refresh` - catalog
//! - `cart`, `add`, `set`, `inc`, `dec`, `remove` - cart
//! - `checkout` - submit the cart as an order
//!
//! State persists in `CARTSYNC_STATE_DIR` between invocations unless
//! `--ephemeral` is given.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use cartsync_core::ProductId;
use cartsync_engine::storage::MemoryStore;
use cartsync_engine::{EngineConfig, EngineError, Result, Session};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "Cart and catalog session tools")]
struct Cli {
    /// Keep state in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog products
    Products {
        /// Refetch the catalog even if a stored snapshot exists
        #[arg(long)]
        refresh: bool,
    },
    /// Show one product
    Product {
        /// Product ID
        id: ProductId,
    },
    /// Refetch the catalog
    Refresh,
    /// Show cart contents and total
    Cart,
    /// Add one unit of a product to the cart
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Set a cart line's quantity (zero or less removes it)
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Increase a cart line by one
    Inc {
        /// Product ID
        id: ProductId,
    },
    /// Decrease a cart line by one
    Dec {
        /// Product ID
        id: ProductId,
    },
    /// Remove a line from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Submit the cart as an order
    Checkout,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &EngineConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn subscriber(json_logs: bool) -> impl tracing::Subscriber + Send + Sync + 'static {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartsync_engine=info,cartsync_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with((!json_logs).then(|| {
            tracing_subscriber::fmt::layer().with_writer(std::io::stderr)
        }))
        .with(json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
}

fn init_tracing(json_logs: bool) {
    subscriber(json_logs).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = init_sentry(&config);

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Faults go to Sentry; expected outcomes are only shown to the user.
#[allow(clippy::print_stdout)]
fn report(err: &EngineError) {
    if err.is_fault() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            error = %err,
            sentry_event_id = %event_id,
            "Command failed"
        );
    } else {
        println!("{err}");
    }
}

async fn run(cli: Cli, config: &EngineConfig) -> Result<()> {
    let mut session = if cli.ephemeral {
        Session::with_store(config, Arc::new(MemoryStore::new()))?
    } else {
        Session::from_config(config)?
    };

    match cli.command {
        Commands::Products { refresh } => commands::catalog::list(&session, refresh).await?,
        Commands::Product { id } => commands::catalog::show(&session, &id).await?,
        Commands::Refresh => commands::catalog::refresh(&session).await?,
        Commands::Cart => commands::cart::show(&session),
        Commands::Add { id } => commands::cart::add(&session, &id).await?,
        Commands::Set { id, quantity } => commands::cart::set(&session, &id, quantity),
        Commands::Inc { id } => commands::cart::increase(&session, &id),
        Commands::Dec { id } => commands::cart::decrease(&session, &id),
        Commands::Remove { id } => commands::cart::remove(&session, &id),
        Commands::Checkout => commands::checkout::submit(&mut session).await?,
    }
    Ok(())
}
