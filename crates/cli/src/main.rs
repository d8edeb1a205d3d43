//! Ops Console CLI - browse, inspect and export orders.
//!
//! # Usage
//!
//! ```bash
//! # First page of cancelled Shopee orders
//! ops-cli orders list --status cancelled --platform shopee
//!
//! # Second order item of one order
//! ops-cli orders show 10023 --item 2
//!
//! # CSV of the filtered list, all pages
//! ops-cli orders export --date 2024-03-05 --output-dir exports
//!
//! # Server-generated bulk export
//! ops-cli orders download
//! ```
//!
//! # Commands
//!
//! - `orders list` - One page of the filtered order list
//! - `orders show` - One order's details
//! - `orders export` - Write `orders-YYYYMMDD.csv`
//! - `orders download` - Write `orders-YYYYMMDD.xml`
//!
//! Credentials and the API location come from the environment; see
//! [`ops_console_admin::config`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ops_console_admin::orders::{OrderBoard, OrderFilter};
use ops_console_admin::{ConsoleConfig, ConsoleError, OrdersClient};
use ops_console_core::{OrderId, StatusFilter};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ops-cli")]
#[command(author, version, about = "Ops Console order tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and export orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Show one page of the filtered order list
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Page number (clamped to the available pages)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one order's details
    Show {
        /// Order ID
        order_id: String,

        /// Order item to show, starting at 1
        #[arg(long, default_value_t = 1)]
        item: usize,

        /// Print the details as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered list (all pages) as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Directory to write `orders-YYYYMMDD.csv` into
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Download the server-generated bulk export
    Download {
        /// Directory to write `orders-YYYYMMDD.xml` into
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Order status (`All`, `Created`, `Processed`, `Email_Sent`, `ESIM_Generated`, `Cancelled`)
    #[arg(long)]
    status: Option<String>,

    /// Order date (YYYY-MM-DD, local calendar day)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Sales platform (e.g. Shopee, Lazada)
    #[arg(long)]
    platform: Option<String>,

    /// Product type substring (e.g. eSIM)
    #[arg(long)]
    product_type: Option<String>,
}

impl From<FilterArgs> for OrderFilter {
    fn from(args: FilterArgs) -> Self {
        Self::new()
            .status(
                args.status
                    .as_deref()
                    .map_or(StatusFilter::All, StatusFilter::from),
            )
            .date(args.date)
            .platform(args.platform.unwrap_or_default())
            .product_type(args.product_type.unwrap_or_default())
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ConsoleConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

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

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ops_console_admin=info,ops_console_cli=info".into());

    // JSON output for log shipping, text for terminals; stdout is kept for
    // command output
    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Another provider may already be installed; either way one is available.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();

    // Configuration is needed for Sentry, which must be up before tracing
    let config = ConsoleConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            commands::orders::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ConsoleConfig) -> Result<(), ConsoleError> {
    let client = OrdersClient::new(config.api)?;
    let board = OrderBoard::new(Arc::new(client));

    match cli.command {
        Commands::Orders { action } => match action {
            OrdersAction::List { filter, page, json } => {
                commands::orders::list(&board, filter.into(), page, json).await?;
            }
            OrdersAction::Show {
                order_id,
                item,
                json,
            } => {
                commands::orders::show(&board, &OrderId::new(order_id), item, json).await?;
            }
            OrdersAction::Export { filter, output_dir } => {
                commands::orders::export(&board, filter.into(), &output_dir).await?;
            }
            OrdersAction::Download { output_dir } => {
                commands::orders::download(&board, &output_dir).await?;
            }
        },
    }
    Ok(())
}
