//! Tigube CLI - Back-office tools for the command line.
//!
//! # Usage
//!
//! ```bash
//! # Export every user as CSV
//! tigube users export -o benutzer.csv
//!
//! # Export suspended users matching "berlin" to stdout
//! tigube users export --filter suspended --search berlin
//!
//! # Grant or revoke admin rights
//! tigube users grant-admin anna@example.com
//! tigube users revoke-admin anna@example.com
//!
//! # Print the dashboard counters
//! tigube stats
//!
//! # Compare plan columns with billing, then write them back
//! tigube subscriptions sync --dry-run
//! tigube subscriptions sync
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Backend project URL
//! - `SUPABASE_ANON_KEY` - Public API key
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service role key (required for writes)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tigube")]
#[command(author, version, about = "Tigube back-office CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage platform users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Print the dashboard counters
    Stats,
    /// Subscription maintenance
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionsAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Export users as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Table filter (`all`, `owners`, `caretakers`, `suspended`, ...)
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Search term matched against email, name and city
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Grant admin rights to a user
    GrantAdmin {
        /// Email address of the user
        email: String,
    },
    /// Revoke admin rights from a user
    RevokeAdmin {
        /// Email address of the user
        email: String,
    },
}

#[derive(Subcommand)]
enum SubscriptionsAction {
    /// Write billing state onto the users' plan columns
    Sync {
        /// Only report what would change
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tigube_cli=info,tigube_admin=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let client = commands::connect()?;

    match cli.command {
        Commands::Users { action } => match action {
            UsersAction::Export {
                output,
                filter,
                search,
            } => commands::users::export(&client, output.as_deref(), &filter, &search).await?,
            UsersAction::GrantAdmin { email } => {
                commands::users::set_admin(&client, &email, true).await?;
            }
            UsersAction::RevokeAdmin { email } => {
                commands::users::set_admin(&client, &email, false).await?;
            }
        },
        Commands::Stats => commands::stats::print(&client).await,
        Commands::Subscriptions { action } => match action {
            SubscriptionsAction::Sync { dry_run } => {
                commands::subscriptions::sync(&client, dry_run).await?;
            }
        },
    }
    Ok(())
}
