//! FastBite CLI - drive the client runtime from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password may also come from FASTBITE_PASSWORD)
//! fastbite login -e cocina@fastbite.com -p secret
//!
//! # Browse and fill the cart
//! fastbite products
//! fastbite cart add 3
//! fastbite cart set 3 2
//!
//! # Check out
//! fastbite order place --address "Calle 1 #23" --notes "sin cebolla"
//!
//! # Follow the kitchen board until Ctrl-C
//! fastbite watch kitchen
//! ```
//!
//! Session and cart state persist in `FASTBITE_STATE_DIR` between runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fastbite_client::{
    ClientConfig, FileStore, LogNotifier, Notifier, Runtime, Severity, WatchNavigator,
};
use fastbite_core::{OrderStatus, Role};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "fastbite")]
#[command(author, version, about = "FastBite ordering client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (falls back to `FASTBITE_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,

        /// Password (falls back to `FASTBITE_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        name: String,

        #[arg(long)]
        phone: Option<String>,

        /// Role (`CLIENTE`, `COCINA`, `REPARTIDOR`)
        #[arg(short, long, default_value = "CLIENTE")]
        role: Role,
    },
    /// Sign out and close live channels
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List the menu
    Products,
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place or inspect a single order
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// List orders
    Orders {
        #[command(subcommand)]
        scope: OrdersScope,
    },
    /// Read or post order comments
    Comments {
        #[command(subcommand)]
        action: CommentsAction,
    },
    /// Follow a live channel until Ctrl-C
    Watch {
        #[command(subcommand)]
        channel: WatchChannel,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines, count, and total
    Show,
    /// Add one unit of a product
    Add { product_id: String },
    /// Remove a product's line
    Remove { product_id: String },
    /// Set a product's quantity (zero or less removes it)
    Set {
        product_id: String,
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Submit the cart as an order
    Place {
        #[arg(short, long)]
        address: String,

        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show one order
    Show { order_id: String },
    /// Move an order to a new status
    Status {
        order_id: String,

        /// `RECIBIDO`, `PREPARANDO`, `LISTO`, `EN_CAMINO`, or `ENTREGADO`
        status: OrderStatus,
    },
}

#[derive(Subcommand)]
enum OrdersScope {
    /// Your own orders
    Mine,
    /// Kitchen queue
    Kitchen,
    /// Delivery queue
    Delivery,
}

#[derive(Subcommand)]
enum CommentsAction {
    /// List an order's comments
    List { order_id: String },
    /// Post a comment on an order
    Add { order_id: String, message: String },
}

#[derive(Subcommand)]
enum WatchChannel {
    /// Every order event
    Kitchen,
    /// Events for one order
    Order { order_id: String },
    /// Live comments on one order
    Comments { order_id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let notifier = LogNotifier;

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            notifier.show_alert(&e.to_string(), Severity::Error);
            std::process::exit(1);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Alerts and command output at info; library internals only when asked
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fastbite=info,fastbite_cli=info,fastbite_client=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::debug!(error = ?e, "command failed");
        notifier.show_alert(&e.user_message(), Severity::Error);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CommandError> {
    let store = Arc::new(FileStore::open(&config.state_dir)?);
    let runtime = Runtime::new(
        config,
        store,
        Arc::new(WatchNavigator::new()),
        Arc::new(LogNotifier),
    )?;
    runtime.init();

    match cli.command {
        Commands::Login { email, password } => {
            let password = commands::auth::password_or_env(password)?;
            commands::auth::login(&runtime, &email, &password).await?;
        }
        Commands::Register {
            email,
            password,
            name,
            phone,
            role,
        } => {
            let password = commands::auth::password_or_env(password)?;
            commands::auth::register(&runtime, &email, &password, &name, phone, role).await?;
        }
        Commands::Logout => commands::auth::logout(&runtime)?,
        Commands::Whoami => commands::auth::whoami(&runtime),
        Commands::Products => commands::catalog::list(&runtime).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&runtime),
            CartAction::Add { product_id } => commands::cart::add(&runtime, &product_id.into()).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&runtime, &product_id.into())?,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&runtime, &product_id.into(), quantity)?,
            CartAction::Clear => commands::cart::clear(&runtime)?,
        },
        Commands::Order { action } => match action {
            OrderAction::Place { address, notes } => {
                commands::orders::place(&runtime, &address, notes.as_deref()).await?;
            }
            OrderAction::Show { order_id } => commands::orders::show(&runtime, &order_id.into()).await?,
            OrderAction::Status { order_id, status } => {
                commands::orders::advance(&runtime, &order_id.into(), status).await?;
            }
        },
        Commands::Orders { scope } => match scope {
            OrdersScope::Mine => commands::orders::mine(&runtime).await?,
            OrdersScope::Kitchen => commands::orders::kitchen(&runtime).await?,
            OrdersScope::Delivery => commands::orders::delivery(&runtime).await?,
        },
        Commands::Comments { action } => match action {
            CommentsAction::List { order_id } => commands::orders::comments(&runtime, &order_id.into()).await?,
            CommentsAction::Add { order_id, message } => {
                commands::orders::comment(&runtime, &order_id.into(), &message).await?;
            }
        },
        Commands::Watch { channel } => match channel {
            WatchChannel::Kitchen => commands::watch::kitchen(&runtime).await?,
            WatchChannel::Order { order_id } => commands::watch::order(&runtime, &order_id.into()).await?,
            WatchChannel::Comments { order_id } => {
                commands::watch::comments(&runtime, &order_id.into()).await?;
            }
        },
    }
    Ok(())
}
