//! shopdesk CLI - product and webhook management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # First page of products, newest first, filtered by title
//! sd-cli products list --search shirt --sort CREATED_AT-DESC
//!
//! # Product detail with variants, inventory and metafields
//! sd-cli products show 8123456789
//!
//! # Set a variant's price and available quantity
//! sd-cli products update 8123456789 --variant 4412 --price 19.9 --inventory 12
//!
//! # Interactive list with debounced search
//! sd-cli products browse
//!
//! # Subscribe the admin's PRODUCTS_DELETE receiver
//! sd-cli webhooks register https://admin.example.com/webhooks/app/products-delete
//! ```
//!
//! # Commands
//!
//! - `products list|show|update|browse` - Product list and variant edits
//! - `webhooks register` - Webhook subscription
//!
//! Reads the same environment variables as the admin server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use shopdesk_admin::config::AdminConfig;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "shopdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and edit products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage webhook subscriptions
    Webhooks {
        #[command(subcommand)]
        action: WebhookAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List one page of products
    List {
        /// Title substring to search for
        #[arg(short, long, default_value = "")]
        search: String,

        /// Sort order as `<KEY>-<DIRECTION>` (`TITLE-ASC`, `CREATED_AT-DESC`, ...)
        #[arg(long, default_value = "TITLE-ASC")]
        sort: String,

        /// Page after this cursor
        #[arg(long, conflicts_with = "before")]
        after: Option<String>,

        /// Page before this cursor
        #[arg(long)]
        before: Option<String>,
    },
    /// Show one product
    Show {
        /// Product ID (numeric or `gid://shopify/Product/<n>`)
        id: String,
    },
    /// Update one variant's price, inventory and metafields
    Update {
        /// Product ID (numeric or `gid://shopify/Product/<n>`)
        id: String,

        /// Variant ID (numeric or GID)
        #[arg(long)]
        variant: String,

        /// New price
        #[arg(long)]
        price: Option<String>,

        /// New available quantity
        #[arg(long)]
        inventory: Option<String>,

        /// Location ID; defaults to the variant's first stocking location
        #[arg(long)]
        location: Option<String>,

        /// Metafield as `key=value` (repeatable)
        #[arg(short, long = "metafield")]
        metafields: Vec<String>,
    },
    /// Interactive product list
    Browse,
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Subscribe a callback URL to PRODUCTS_DELETE
    Register {
        /// Callback URL; defaults to the receiver under `SHOPDESK_BASE_URL`
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopdesk_cli=info,shopdesk_admin=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AdminConfig::from_env()?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List {
                search,
                sort,
                after,
                before,
            } => {
                commands::products::list(&config, &search, &sort, after, before).await?;
            }
            ProductAction::Show { id } => commands::products::show(&config, &id).await?,
            ProductAction::Update {
                id,
                variant,
                price,
                inventory,
                location,
                metafields,
            } => {
                let edit = commands::products::VariantEdit {
                    variant,
                    price,
                    inventory,
                    location,
                    metafields,
                };
                commands::products::update(&config, &id, edit).await?;
            }
            ProductAction::Browse => commands::browse::run(&config).await?,
        },
        Commands::Webhooks { action } => match action {
            WebhookAction::Register { url } => {
                commands::webhooks::register(&config, url.as_deref()).await?;
            }
        },
    }
    Ok(())
}
