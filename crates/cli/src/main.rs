//! Shipdesk CLI - Database migrations, seeding and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! shipdesk migrate
//!
//! # Load or refresh the carrier list
//! shipdesk seed carriers --file crates/cli/seed/carriers.yaml
//!
//! # Create an account (password read from SHIPDESK_USER_PASSWORD)
//! shipdesk user create -e ops@example.com -n "Ops Team" -r admin
//!
//! # Change an existing account's role
//! shipdesk user set-role -e driver@example.com -r carrier
//! ```
//!
//! # Environment Variables
//!
//! - `SHIPDESK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use shipdesk_core::UserRole;

mod commands;

#[derive(Parser)]
#[command(name = "shipdesk")]
#[command(author, version, about = "Shipdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert or update carriers from a YAML file
    Carriers {
        /// Path to the carriers YAML file
        #[arg(short, long, default_value = "crates/cli/seed/carriers.yaml")]
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account. The password is read from `SHIPDESK_USER_PASSWORD`.
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Role (`shipper`, `carrier`, `admin`)
        #[arg(short, long, default_value = "shipper")]
        role: UserRole,
    },
    /// Change an account's role
    SetRole {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// New role (`shipper`, `carrier`, `admin`)
        #[arg(short, long)]
        role: UserRole,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Seed { target } => match target {
            SeedTarget::Carriers { file } => commands::seed::carriers(&file).await?,
        },
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                commands::user::create(&email, &name, role).await?;
            }
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, role).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_roles() {
        let cli = Cli::try_parse_from([
            "shipdesk", "user", "set-role", "-e", "a@x.com", "-r", "carrier",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::User {
                action: UserAction::SetRole {
                    role: UserRole::Carrier,
                    ..
                }
            }
        ));

        assert!(
            Cli::try_parse_from(["shipdesk", "user", "set-role", "-e", "a@x.com", "-r", "root"])
                .is_err()
        );
    }
}
