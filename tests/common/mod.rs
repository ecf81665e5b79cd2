//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use simple_h2::config::ServerConfig;
use simple_h2::net::Listener;
use simple_h2::{HandlerError, Headers, Next, Params, RouteTree, Router, Server, ServerError, Shutdown, Stream};
use tokio::task::JoinHandle;

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub router: Arc<Router>,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.shutdown.grace_period_secs = 1;
    config
}

/// Start a server for `router`.
pub async fn start(router: Router) -> TestServer {
    start_with(router, test_config()).await
}

pub async fn start_with(router: Router, config: ServerConfig) -> TestServer {
    let router = Arc::new(router);
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = Server::new(Arc::clone(&router), config);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        router,
        shutdown,
        handle,
    }
}

/// A cleartext HTTP/2 (prior knowledge) client.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .http2_prior_knowledge()
        .build()
        .unwrap()
}

/// Responds `text/plain` "Hello, world!" directly on the stream.
pub async fn hello_world(stream: Stream, _: Headers, _: Params, _: Next) -> Result<(), HandlerError> {
    let mut headers = hyper::HeaderMap::new();
    headers.insert(hyper::header::CONTENT_TYPE, hyper::header::HeaderValue::from_static("text/plain"));
    stream.respond(hyper::StatusCode::OK, headers)?;
    Ok(stream.end("Hello, world!")?)
}

/// `/hello`, `/branch/leafA` and `/branch/leafB`, all serving [`hello_world`].
pub fn hello_world_tree() -> RouteTree {
    RouteTree::root()
        .branch(RouteTree::new("/hello").route(hyper::Method::GET, hello_world))
        .branch(
            RouteTree::new("/branch")
                .branch(RouteTree::new("/leafA").route(hyper::Method::GET, hello_world))
                .branch(RouteTree::new("/leafB").route(hyper::Method::GET, hello_world)),
        )
}

/// A router preloaded with [`hello_world_tree`].
pub fn hello_router() -> Router {
    let router = Router::new();
    router.add_routes(hello_world_tree()).unwrap();
    router
}


/// Collects formatted log lines from tasks running on the current thread.
///
/// `#[tokio::test]` runs a current-thread runtime, so the server spawned by
/// the test logs through the subscriber installed here.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Install a WARN-and-above subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Wait up to two seconds for a line containing `needle`.
    pub async fn wait_for(&self, needle: &str) -> Option<String> {
        for _ in 0..40 {
            if let Some(line) = self.contents().lines().find(|line| line.contains(needle)) {
                return Some(line.to_string());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        None
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
