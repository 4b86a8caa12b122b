//! Marigold CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the shop schema and the session table
//! mg-cli migrate
//!
//! # Load products, coupons, posts and settings from YAML
//! mg-cli seed --file catalog.yaml
//!
//! # Create a back-office account
//! mg-cli admin create --email ops@example.com --password '...' --name "Ops"
//!
//! # Promote an existing customer account
//! mg-cli admin grant --email robin@example.com
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL`, falling back to `DATABASE_URL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mg-cli")]
#[command(author, version, about = "Marigold CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (shop schema and sessions)
    Migrate,
    /// Seed the catalog, coupons, blog and settings from a YAML file
    Seed {
        /// Path to the YAML seed file
        #[arg(short, long)]
        file: String,
    },
    /// Manage back-office accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Give an existing account back-office access
    Grant {
        /// Email address of the account
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                name,
            } => {
                commands::admin::create_user(&email, &password, &name).await?;
            }
            AdminAction::Grant { email } => commands::admin::grant(&email).await?,
        },
    }
    Ok(())
}
