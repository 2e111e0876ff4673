//! Scuffmart CLI - Browse, shop and administer the store from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! scuff products
//! scuff product 7
//!
//! # Sign in (password read from SCUFFMART_PASSWORD when not given)
//! scuff login -e ana@example.com
//!
//! # Shop
//! scuff cart add 7 -q 2
//! scuff cart show
//! scuff cart checkout
//! scuff orders
//!
//! # Administer
//! scuff admin products stock 7 12
//! scuff admin orders status 3 shipped
//! ```
//!
//! Configuration comes from the environment (see `scuffmart_client::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Write};
use std::path::PathBuf;

use askama::Template;
use clap::{Parser, Subcommand};
use scuffmart_cli::ViewError;
use scuffmart_cli::views::admin::ProductInput;
use scuffmart_cli::views::{account, admin, cart, header, orders, product, products};
use scuffmart_client::{App, ClientConfig, Route};
use scuffmart_core::{OrderId, ProductId};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scuff")]
#[command(author, version, about = "Scuffmart terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all products
    Products,
    /// Show one product
    Product {
        /// Product ID
        id: ProductId,
    },
    /// Sign in
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "SCUFFMART_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "SCUFFMART_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show order history
    Orders,
    /// Store administration (admins only)
    Admin {
        #[command(subcommand)]
        area: AdminArea,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 or less removes it)
    Update {
        /// Product ID
        product_id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Place an order for the whole cart
    Checkout,
}

#[derive(Subcommand)]
enum AdminArea {
    /// Manage products
    Products {
        #[command(subcommand)]
        action: AdminProductAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: AdminOrderAction,
    },
}

#[derive(clap::Args)]
struct ProductArgs {
    /// Product name
    #[arg(long)]
    name: Option<String>,

    /// Description (empty to clear)
    #[arg(long)]
    description: Option<String>,

    /// Price, e.g. 149.90
    #[arg(long)]
    price: Option<String>,

    /// Price before the discount (empty to clear)
    #[arg(long)]
    original_price: Option<String>,

    /// What is wrong with the item (empty to clear)
    #[arg(long)]
    condition: Option<String>,

    /// Units in stock
    #[arg(long)]
    stock: Option<String>,

    /// Image file to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

impl From<ProductArgs> for ProductInput {
    fn from(args: ProductArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            price: args.price,
            original_price: args.original_price,
            condition_description: args.condition,
            stock: args.stock,
            image: args.image,
        }
    }
}

#[derive(Subcommand)]
enum AdminProductAction {
    /// List products with stock
    List,
    /// Create a product (name and price required)
    Create(ProductArgs),
    /// Edit a product; omitted fields keep their values
    Update {
        /// Product ID
        id: ProductId,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: ProductId,
    },
    /// Set a product's stock
    Stock {
        /// Product ID
        id: ProductId,

        /// New stock (non-negative integer)
        #[arg(allow_negative_numbers = true)]
        stock: String,
    },
}

#[derive(Subcommand)]
enum AdminOrderAction {
    /// List all orders
    List,
    /// Change an order's status
    Status {
        /// Order ID
        id: OrderId,

        /// pending, processing, shipped, delivered or cancelled
        status: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scuffmart_cli=info,scuffmart_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to start client: {e}");
            std::process::exit(1);
        }
    };

    let result = run(&app, cli.command).await;

    if let Err(e) = print_notices(&app) {
        tracing::error!("Failed to write output: {e}");
    }

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(app: &App, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Products => {
            let view = products::load(app).await?;
            page(app, &view).await?;
        }
        Commands::Product { id } => {
            let view = product::load(app, id).await?;
            page(app, &view).await?;
        }
        Commands::Login { email, password } => {
            account::login(app, &email, SecretString::from(password)).await?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            account::register(app, &name, &email, SecretString::from(password)).await?;
        }
        Commands::Logout => account::logout(app),
        Commands::Whoami => {
            let user = account::whoami(app).await?;
            let mut out = io::stdout().lock();
            writeln!(out, "{} <{}> ({})", user.name, user.email, user.role)?;
        }
        Commands::Cart { action } => run_cart(app, action).await?,
        Commands::Orders => {
            let view = orders::load(app).await?;
            page(app, &view).await?;
        }
        Commands::Admin { area } => run_admin(app, area).await?,
    }
    Ok(())
}

async fn run_cart(app: &App, action: CartAction) -> Result<(), ViewError> {
    match action {
        CartAction::Show => {
            let view = cart::load(app).await?;
            page(app, &view).await?;
        }
        CartAction::Add {
            product_id,
            quantity,
        } => product::add_to_cart(app, product_id, quantity).await?,
        CartAction::Update {
            product_id,
            quantity,
        } => cart::set_quantity(app, product_id, quantity).await?,
        CartAction::Remove { product_id } => cart::remove(app, product_id).await?,
        CartAction::Checkout => cart::checkout(app).await?,
    }
    Ok(())
}

async fn run_admin(app: &App, area: AdminArea) -> Result<(), ViewError> {
    match area {
        AdminArea::Products { action } => {
            let view = match action {
                AdminProductAction::List => admin::products(app).await?,
                AdminProductAction::Create(fields) => {
                    admin::create_product(app, fields.into()).await?
                }
                AdminProductAction::Update { id, fields } => {
                    admin::update_product(app, id, fields.into()).await?
                }
                AdminProductAction::Delete { id } => admin::delete_product(app, id).await?,
                AdminProductAction::Stock { id, stock } => {
                    admin::update_stock(app, id, &stock).await?
                }
            };
            page(app, &view).await?;
        }
        AdminArea::Orders { action } => {
            let view = match action {
                AdminOrderAction::List => admin::orders(app).await?,
                AdminOrderAction::Status { id, status } => {
                    admin::update_order_status(app, id, &status).await?
                }
            };
            page(app, &view).await?;
        }
    }
    Ok(())
}

/// Print the header followed by a rendered view.
async fn page(app: &App, view: &impl Template) -> Result<(), ViewError> {
    if app.session.is_authenticated() && app.navigator.current() != Route::Cart {
        if let Err(e) = app.cart.refresh_cart().await {
            tracing::warn!(error = %e, "Failed to load cart for header");
        }
    }
    let header = header::HeaderView::new(app).render()?;
    let body = view.render()?;

    let mut out = io::stdout().lock();
    writeln!(out, "{header}\n\n{body}")?;
    Ok(())
}

/// Print queued notifications, then a sign-in hint if a request bounced us
/// to the login route.
///
/// Each message is drained and shown once per command, so the notification
/// TTL is not consulted here.
fn print_notices(app: &App) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for notice in app.notifications.drain() {
        writeln!(out, "[{}] {}", notice.kind.tag(), notice.text)?;
    }
    if app.navigator.current() == Route::Login && !app.session.is_authenticated() {
        writeln!(out, "Please sign in: scuff login --email <email>")?;
    }
    Ok(())
}
