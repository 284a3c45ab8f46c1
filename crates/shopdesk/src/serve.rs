// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `shopdesk serve` implementation.
//!
//! Opens storage, builds the in-process hub and the inbox service, then runs
//! the gateway until SIGINT/SIGTERM. On shutdown the hub is closed, which
//! ends every WebSocket subscription, and the database WAL is checkpointed.

use std::sync::Arc;

use tracing::{info, warn};

use shopdesk_bus::ChannelHub;
use shopdesk_config::ShopdeskConfig;
use shopdesk_core::{PluginAdapter, ShopdeskError, StorageAdapter};
use shopdesk_gateway::{start_server, AuthConfig, GatewayState, ServerConfig};
use shopdesk_inbox::InboxService;
use shopdesk_storage::SqliteStorage;

use crate::shutdown;

pub async fn run_serve(config: ShopdeskConfig) -> Result<(), ShopdeskError> {
    init_tracing(&config.server.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.storage.database_path,
        "starting shopdesk"
    );
    if config.server.service_token.is_none() {
        warn!("server.service_token is not set -- every API request will be rejected");
    }

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!("storage initialized");

    let hub = Arc::new(ChannelHub::new(config.broadcast.channel_capacity));
    let service = Arc::new(InboxService::new(
        storage.clone(),
        storage.clone(),
        hub.clone(),
        &config,
    ));

    let state = GatewayState::new(
        service,
        hub.clone(),
        storage.clone(),
        AuthConfig {
            service_token: config.server.service_token.clone(),
        },
    );
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&server_config, state, cancel).await;

    if let Err(e) = hub.shutdown().await {
        warn!(error = %e, "hub shutdown failed");
    }
    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage checkpoint failed");
    }

    served?;
    info!("shopdesk serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shopdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
