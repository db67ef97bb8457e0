//! Application host demo (v1)
//!
//! Hosts a small widget API behind the dispatcher, with static content
//! served from the configured application root.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server (axum bridge)
//!                        │ env, headers, body, cancel, respond, next
//!                        ▼
//!                    host::HostAdapter
//!                        │
//!                        ▼
//!                    Dispatcher
//!                        ├─ lifecycle::startup (once)
//!                        ├─ content::static_files ──▶ file body
//!                        └─ routing cache ─▶ handlers pipeline ──▶ handler body
//!     Client Response
//!     ◀───────────── respond(status, headers, body writer) or 404
//! ```

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use app_host::config::{load_config, ConfigWatcher, HostConfig, StaticContentConfig};
use app_host::handlers::{
    handler_fn, Handler, HandlerError, HandlerFuture, HandlerRegistration, HandlerRegistry,
    RegistryError, Variables,
};
use app_host::host::{BytesBody, Context, Status};
use app_host::lifecycle::StartupError;
use app_host::observability::{logging, metrics};
use app_host::{Dispatcher, HostAdapter, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "app-host", version, about = "Embeddable HTTP application host demo")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload static content settings when the configuration file changes.
    #[arg(long)]
    watch: bool,
}

#[derive(Serialize)]
struct Widget<'a> {
    id: &'a str,
    tags: &'a [String],
}

/// Echoes the request body back with the request content type.
struct EchoHandler;

impl Handler for EchoHandler {
    fn handle<'a>(
        &'a self,
        _variables: &'a Variables,
        context: &'a mut Context,
    ) -> Option<HandlerFuture<'a>> {
        Some(Box::pin(async move {
            let mut body = Vec::new();
            context.request.body_mut().read_to_end(&mut body).await?;

            let content_type = context
                .request
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            context.response.set_content_type(&content_type)?;
            context.response.set_body(BytesBody::new(body))?;
            Ok::<(), HandlerError>(())
        }))
    }
}

fn widget(variables: &Variables, context: &mut Context) -> Result<(), HandlerError> {
    let id = variables.first("id").unwrap_or_default();
    let tags = variables.get("tag").unwrap_or(&[]);
    let json = serde_json::to_vec(&Widget { id, tags })
        .map_err(|e| HandlerError::Failed(e.to_string()))?;

    context.response.set_content_type("application/json")?;
    context.response.set_body(BytesBody::new(json))?;
    Ok(())
}

fn create_widget(_variables: &Variables, context: &mut Context) -> Result<(), HandlerError> {
    context.response.set_status(Status::CREATED);
    Ok(())
}

fn demo_registry() -> Result<HandlerRegistry, RegistryError> {
    let mut registry = HandlerRegistry::new();

    registry.register(
        HandlerRegistration::new("health", "GET", "/health", handler_fn(|_, context| {
            context.response.set_body(BytesBody::new("ok"))?;
            Ok(())
        }))?
        .produces(["text/plain"]),
    )?;
    registry.register(
        HandlerRegistration::new("widget", "GET", "/api/widgets/{id}", handler_fn(widget))?
            .produces(["application/json"]),
    )?;
    registry.register(
        HandlerRegistration::new("create-widget", "POST", "/api/widgets", handler_fn(create_widget))?
            .consumes(["application/json"]),
    )?;
    registry.register(HandlerRegistration::new("echo", "POST", "/api/echo/{*rest}", EchoHandler)?)?;

    Ok(registry)
}

/// Serves `<app_root>/public` when no folders are configured.
fn default_public_folder(config: &mut StaticContentConfig) -> Result<(), StartupError> {
    if config.public_folders.is_empty() && config.app_root.join("public").is_dir() {
        tracing::info!("No public folders configured, serving /public");
        config.add_public_folder("/public");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("app-host v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = Arc::new(
        Dispatcher::builder(demo_registry()?)
            .static_content(config.static_content.clone())
            .startup_task(default_public_folder)
            .build(),
    );

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path, config.static_content.clone());
            let watcher = watcher.run()?;
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                while let Some(static_content) = updates.recv().await {
                    dispatcher.static_content().reload(static_content);
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let app = HostAdapter::new(dispatcher).into_app();
    HttpServer::new(app).run(listener, shutdown_signal()).await?;

    Ok(())
}
