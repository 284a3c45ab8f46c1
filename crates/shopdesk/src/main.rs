// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shopdesk - real-time customer-service inbox.
//!
//! This is the binary entry point for the Shopdesk server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;
mod users;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use shopdesk_config::{ConfigError, ShopdeskConfig};
use shopdesk_core::{Role, UserId};

/// Shopdesk - real-time customer-service inbox.
#[derive(Parser, Debug)]
#[command(name = "shopdesk", version, about, long_about = None)]
struct Cli {
    /// Load this TOML file instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP/WebSocket server.
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Maintain the user directory read model.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and print the effective values.
    Check,
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    /// Insert or update a user's display data and role.
    Upsert {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: String,
        /// customer, clerk or admin.
        #[arg(long)]
        role: Role,
        #[arg(long)]
        avatar: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ShopdeskConfig, Vec<ConfigError>> {
    match path {
        Some(path) => shopdesk_config::load_and_validate_path(path),
        None => shopdesk_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            shopdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    eprintln!("shopdesk: config is valid");
                    println!("{rendered}");
                }
                Err(e) => eprintln!("shopdesk: config is valid but could not be rendered: {e}"),
            }
            Ok(())
        }
        Some(Commands::Users {
            action:
                UsersAction::Upsert {
                    id,
                    name,
                    role,
                    avatar,
                },
        }) => users::upsert(&config, UserId(id), name, role, avatar).await,
        None => {
            println!("shopdesk: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("shopdesk: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn users_upsert_parses_role() {
        let cli = Cli::try_parse_from([
            "shopdesk", "users", "upsert", "--id", "7", "--name", "Carla", "--role", "clerk",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Users {
                action: UsersAction::Upsert { id, role, avatar, .. },
            }) => {
                assert_eq!(id, 7);
                assert_eq!(role, Role::Clerk);
                assert!(avatar.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(
            Cli::try_parse_from([
                "shopdesk", "users", "upsert", "--id", "7", "--name", "X", "--role", "owner",
            ])
            .is_err()
        );
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = shopdesk_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 8790);
    }
}
