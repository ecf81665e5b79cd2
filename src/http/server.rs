//! HTTP/2 server.
//!
//! # Responsibilities
//! - Accept connections from the listener, optionally through TLS
//! - Serve each connection with hyper's HTTP/2 connection driver
//! - Turn every inbound stream into a [`Stream`] + [`Headers`] pair and
//!   hand it to the [`Router`]
//! - Drain open connections on shutdown, bounded by a grace period
//!
//! # Design Decisions
//! - Dispatch runs in its own task per stream; the service only waits for
//!   the response slot. A handler that drops its stream without answering,
//!   or panics, yields a 500 and leaves the connection serving
//! - Cleartext connections speak HTTP/2 with prior knowledge (h2c); TLS
//!   connections negotiate `h2` via ALPN

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum_server::accept::Accept;
use axum_server::tls_rustls::RustlsAcceptor;
use hyper::body::Incoming;
use hyper::server::conn::http2;
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::config::{Http2Config, ServerConfig};
use crate::dispatch::Router;
use crate::error::ServerError;
use crate::http::response::plain_response;
use crate::http::stream::boxed;
use crate::http::{Headers, Stream, WireResponse};
use crate::lifecycle::ShutdownSignal;
use crate::net::tls;
use crate::net::{ConnectionPermit, ConnectionTracker, Listener};
use crate::observability::metrics;

/// Backoff after a failed accept (e.g. file descriptor exhaustion).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP/2 server bound to a [`Router`].
pub struct Server {
    router: Arc<Router>,
    config: ServerConfig,
    tracker: ConnectionTracker,
}

impl Server {
    pub fn new(router: Arc<Router>, config: ServerConfig) -> Self {
        Self {
            router,
            config,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Open connections, for shutdown reporting and tests.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept and serve connections until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let acceptor = match &self.config.listener.tls {
            Some(tls_config) => Some(tls::acceptor(tls::load_tls_config(tls_config).await?)),
            None => None,
        };

        tracing::info!(
            address = %listener.local_addr()?,
            tls = acceptor.is_some(),
            max_concurrent_streams = self.config.http2.max_concurrent_streams,
            "HTTP/2 server starting"
        );

        let connection_shutdown = shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((tcp, peer, permit)) => self.spawn_connection(
                        tcp,
                        peer,
                        permit,
                        acceptor.clone(),
                        connection_shutdown.clone(),
                    ),
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
        drop(listener);

        tracing::info!(active_connections = self.tracker.active_count(), "Draining connections");
        let grace = Duration::from_secs(self.config.shutdown.grace_period_secs);
        if !self.tracker.wait_idle(grace).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Grace period elapsed with connections still open"
            );
        }

        tracing::info!("HTTP/2 server stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        tcp: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
        acceptor: Option<RustlsAcceptor>,
        shutdown: ShutdownSignal,
    ) {
        let guard = self.tracker.track();
        let router = Arc::clone(&self.router);
        let http2_config = self.config.http2.clone();
        let span = tracing::info_span!("connection", connection_id = %guard.id(), peer_addr = %peer);

        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                match acceptor {
                    Some(acceptor) => match acceptor.accept(tcp, ()).await {
                        Ok((tls_stream, ())) => {
                            serve_connection(TokioIo::new(tls_stream), router, &http2_config, shutdown)
                                .await
                        }
                        Err(e) => tracing::warn!(error = %e, "TLS handshake failed"),
                    },
                    None => serve_connection(TokioIo::new(tcp), router, &http2_config, shutdown).await,
                }
            }
            .instrument(span),
        );
    }
}

/// Drive one HTTP/2 connection to completion.
async fn serve_connection<I>(
    io: I,
    router: Arc<Router>,
    config: &Http2Config,
    mut shutdown: ShutdownSignal,
) where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let mut builder = http2::Builder::new(TokioExecutor::new());
    builder
        .timer(TokioTimer::new())
        .max_concurrent_streams(config.max_concurrent_streams);
    if let Some(secs) = config.keep_alive_interval_secs {
        builder.keep_alive_interval(Duration::from_secs(secs));
    }

    let service = service_fn(move |request| handle_stream(Arc::clone(&router), request));
    let connection = builder.serve_connection(io, service);
    tokio::pin!(connection);

    tokio::select! {
        result = connection.as_mut() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Connection ended with error");
            }
        }
        _ = shutdown.recv() => {
            // GOAWAY: in-flight streams finish, new ones are refused.
            connection.as_mut().graceful_shutdown();
            if let Err(e) = connection.as_mut().await {
                tracing::warn!(error = %e, "Connection ended with error while draining");
            }
        }
    }
}

/// Serve one inbound stream.
async fn handle_stream(
    router: Arc<Router>,
    request: Request<Incoming>,
) -> Result<WireResponse, Infallible> {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let headers = Headers::from_parts(&parts);
    let method = headers.method().clone();
    let (stream, responder) = Stream::new(boxed(body));

    let span = tracing::info_span!(
        "stream",
        stream_id = %stream.id(),
        method = %method,
        path = headers.path(),
    );
    let dispatch = tokio::spawn(
        async move { router.dispatch(stream, headers).await }.instrument(span.clone()),
    );

    let response = match responder.recv().await {
        Some(response) => response,
        None => {
            match dispatch.await {
                Err(e) if e.is_panic() => {
                    span.in_scope(|| tracing::error!("Handler panicked"));
                }
                _ => span.in_scope(|| tracing::error!("Stream dropped without a response")),
            }
            plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
        }
    };

    span.in_scope(|| {
        tracing::debug!(status = response.status().as_u16(), elapsed = ?start.elapsed(), "Stream answered")
    });
    metrics::record_request(&method, response.status().as_u16(), start);
    Ok(response)
}
