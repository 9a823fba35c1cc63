//! # Message Ingestion Service
//!
//! Receives signed webhook messages, stores each `message_id` exactly once
//! and exposes read, health and metrics endpoints.

#![recursion_limit = "256"]

pub mod api;
pub mod config;
pub mod consts;
pub mod endpoints;
pub mod logger;
pub mod metric;
pub mod models;
pub mod repo;
pub mod services;
pub mod utils;
pub mod webhook;

use anyhow::Context;
use logfire::config::{MetricsOptions, SendToLogfire};
use ntex::web;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration
    config::init_config()?;

    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;

    // Initialize logging and metrics
    let logfire_config = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()));
    let logfire_config = match app_config.logfire_token() {
        Some(token) => logfire_config
            .send_to_logfire(SendToLogfire::Yes)
            .with_token(token),
        None => logfire_config.send_to_logfire(SendToLogfire::No),
    };
    let shutdown_handler = logfire_config.finish()?;

    if app_config.webhook_secret().is_none() {
        logfire::warn!("WEBHOOK_SECRET is not set, webhooks will be rejected");
    }

    // Initialize database connection pool
    let sqlite_repo = repo::sqlite::SqlxSqliteRepo {
        db_pool: utils::setup_sqlite_db_pool(app_config).await?,
    };

    // Shared by every worker so /metrics sees all requests
    let telemetry = Arc::new(services::telemetry::TelemetrySink::default());

    configure_and_run_server(sqlite_repo, telemetry).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor(
    app_config: &config::AppConfig,
) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Creates application state from the provided services
fn create_app_state(
    sqlite_repo: repo::sqlite::SqlxSqliteRepo,
    observer: services::ImplObservabilitySink,
    webhook_secret: Option<String>,
) -> endpoints::AppState {
    endpoints::AppState {
        repo: Box::new(sqlite_repo),
        observer,
        webhook_secret,
    }
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(
    sqlite_repo: repo::sqlite::SqlxSqliteRepo,
    telemetry: Arc<services::telemetry::TelemetrySink>,
) -> anyhow::Result<()> {
    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;
    let server_addr = (app_config.server_host.clone(), app_config.server_port);
    let webhook_secret = app_config.webhook_secret();

    let server = web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(create_app_state(
                sqlite_repo.clone(),
                telemetry.clone(),
                webhook_secret.clone(),
            ))
            .configure(webhook::routes::webhook)
            .configure(endpoints::routes::messages)
            .configure(endpoints::routes::health)
            .configure(endpoints::routes::metrics)
            .default_service(web::route().to(endpoints::routes::not_found))
    });

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor(app_config)?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    logfire::info!(
        "Server listening on {host}:{port}",
        host = app_config.server_host.clone(),
        port = app_config.server_port.to_string()
    );

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
