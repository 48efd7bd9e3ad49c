//! AMoSS JSON API Server

use std::{process, sync::Arc};

use salvo::prelude::*;
use tracing::{error, info};

use amoss_app::{
    auth::{
        SecretStore, SigningKeys, VaultClient,
        rotation::{spawn_key_refresh, spawn_token_renewal},
    },
    context::AppContext,
};

use crate::{config::ServerConfig, observability::Observability, state::State};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod auth;
mod config;
mod cors;
mod errors;
mod extensions;
mod healthcheck;
mod hsts;
mod observability;
mod participants;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

/// AMoSS JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    let observability = Observability::init(&config).unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Observability error: {e}");
        }

        process::exit(1);
    });

    // The signing secret is required before any token can be issued or checked
    let vault: Arc<dyn SecretStore> = Arc::new(VaultClient::new(config.secrets.vault_config()));

    let keys = match vault.signing_secret().await {
        Ok(key) => SigningKeys::new(key),
        Err(secret_error) => {
            error!("failed to read signing secret: {secret_error}");

            process::exit(1);
        }
    };

    let mut background = vec![spawn_token_renewal(
        Arc::clone(&vault),
        config.secrets.renew_interval(),
    )];

    if let Some(interval) = config.secrets.key_refresh_interval() {
        background.push(spawn_key_refresh(Arc::clone(&vault), keys.clone(), interval));
    }

    let app = match AppContext::from_database_url(
        &config.database.database_url,
        config.database.pool_settings(),
        keys,
    )
    .await
    {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let server = Server::new(listener);

    let handle = server.handle();
    let grace = config.server.shutdown_grace();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, grace).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server
        .serve(router::app_service(State::from_app_context(app)))
        .await;

    for task in background {
        task.abort();
    }

    observability.shutdown();
}
