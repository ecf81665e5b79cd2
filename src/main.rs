//! simple-h2 demo server.
//!
//! ```text
//!   client (h2 / h2c)
//!       → net::Listener (connection limits, optional TLS)
//!       → http::Server (hyper HTTP/2, one task per stream)
//!       → dispatch::Router (route table, middleware chain, Next)
//!       → handler
//! ```
//!
//! Registers a handful of example routes and serves them until SIGINT or
//! SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hyper::Method;
use serde_json::json;

use simple_h2::config::{load_config, ServerConfig};
use simple_h2::lifecycle::{spawn_signal_handler, Shutdown};
use simple_h2::net::Listener;
use simple_h2::observability::{logging, metrics};
use simple_h2::{
    handler_fn, HandlerError, HandlerOptions, Headers, Next, Params, Reply, RouteTree, Router,
    Server, Stream,
};

#[derive(Debug, Parser)]
#[command(name = "simple-h2", version, about = "Minimal HTTP/2 router")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        "simple-h2 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = Arc::new(Router::with_body_limits(config.body.limits()));
    register_routes(&router)?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let listener = Listener::bind(&config.listener).await?;
    Server::new(router, config).run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_routes(router: &Router) -> Result<(), simple_h2::RouteError> {
    router.use_middleware(handler_fn(|stream: Stream, headers: Headers, params, next: Next| async move {
        tracing::info!(stream_id = %stream.id(), method = %headers.method(), path = headers.path(), "Request");
        next.run(params).await
    }));

    router.add_routes(
        RouteTree::root()
            .branch(RouteTree::new("/hello").route(Method::GET, hello))
            .branch(
                RouteTree::new("/greet/:name").route(
                    Method::GET,
                    handler_fn(|_, _, params: Params, next: Next| async move {
                        let name = params.path.get("name").map(String::as_str).unwrap_or("world");
                        next.send(json!({ "message": format!("Hello, {name}!") }))
                    }),
                ),
            ),
    )?;

    router.post(
        "/echo",
        handler_fn(|_, _, params: Params, next: Next| async move {
            let body = params.body_text().map(|b| b.into_owned()).unwrap_or_default();
            next.send(Reply::Text(body))
        }),
        HandlerOptions::buffered(),
    )?;

    Ok(())
}

async fn hello(_: Stream, _: Headers, _: Params, next: Next) -> Result<(), HandlerError> {
    next.send("Hello, world!")
}
