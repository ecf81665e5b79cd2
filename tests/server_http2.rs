//! End-to-end tests over cleartext HTTP/2.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use common::{client, hello_router, hello_world, start, CapturedLogs};
use hyper::Method;
use reqwest::StatusCode;
use serde_json::json;
use simple_h2::{handler_fn, HandlerError, HandlerOptions, Headers, Next, Params, Reply, Stream};

#[tokio::test]
async fn serves_hello_world() {
    let server = start(hello_router()).await;
    let resp = client().get(server.url("/hello")).send().await.unwrap();

    assert_eq!(resp.version(), reqwest::Version::HTTP_2);
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Hello, world!");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn serves_route_tree_leaves() {
    let server = start(hello_router()).await;
    for path in ["/branch/leafA", "/branch/leafB"] {
        let resp = client().get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.text().await.unwrap(), "Hello, world!");
    }
    server.stop().await.unwrap();
}

#[tokio::test]
async fn unknown_path_is_404() {
    let server = start(hello_router()).await;
    let resp = client().get(server.url("/404-not-found")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()["content-type"], "text/plain");
    assert_eq!(resp.text().await.unwrap(), "Not found.");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn unknown_method_is_404() {
    let server = start(hello_router()).await;
    let resp = client()
        .post(server.url("/hello"))
        .body("POSTDATA")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "Not found.");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn next_without_value_sends_empty_body() {
    let server = start(hello_router()).await;
    server
        .router
        .get(
            "/hello-next",
            handler_fn(|_, _, params, next: Next| async move { next.run(params).await }),
        )
        .unwrap();

    let resp = client().get(server.url("/hello-next")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn next_with_text_sends_body() {
    let server = start(hello_router()).await;
    server
        .router
        .get(
            "/hello-next-body",
            handler_fn(|_, _, _, next: Next| async move { next.send("Hello, world!") }),
        )
        .unwrap();

    let resp = client().get(server.url("/hello-next-body")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "Hello, world!");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn middleware_value_short_circuits_handler() {
    let server = start(hello_router()).await;
    let handler_ran = Arc::new(AtomicBool::new(false));

    server.router.use_middleware(handler_fn(|_, _, _, next: Next| async move {
        next.send("Hello, next!")
    }));
    let ran = Arc::clone(&handler_ran);
    server
        .router
        .get(
            "/hello-next-body-middleware",
            handler_fn(move |_, _, _, next: Next| {
                let ran = Arc::clone(&ran);
                async move {
                    ran.store(true, Ordering::SeqCst);
                    next.send("Hello, world!")
                }
            }),
        )
        .unwrap();

    let resp = client()
        .get(server.url("/hello-next-body-middleware"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "Hello, next!");
    assert!(!handler_ran.load(Ordering::SeqCst));
    server.stop().await.unwrap();
}

#[tokio::test]
async fn next_serializes_json() {
    let server = start(hello_router()).await;
    server
        .router
        .get(
            "/hello-next-json",
            handler_fn(|_, _, _, next: Next| async move {
                next.send(json!({ "message": "Hello, world!" }))
            }),
        )
        .unwrap();

    let resp = client().get(server.url("/hello-next-json")).send().await.unwrap();
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert_eq!(resp.text().await.unwrap(), r#"{"message":"Hello, world!"}"#);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn middleware_sees_method_path_and_query() {
    let server = start(hello_router()).await;
    let last_log = Arc::new(Mutex::new(String::new()));
    let query_seen = Arc::new(AtomicBool::new(false));

    let log = Arc::clone(&last_log);
    server.router.use_middleware(handler_fn(move |_, headers: Headers, params, next: Next| {
        *log.lock().unwrap() = format!("{} {}", headers.method(), headers.path());
        async move { next.run(params).await }
    }));
    let seen = Arc::clone(&query_seen);
    server.router.use_middleware(handler_fn(move |_, _, params: Params, next: Next| {
        assert_eq!(params.get.get("middleware").map(String::as_str), Some("paramA"));
        assert_eq!(params.get.get("and").map(String::as_str), Some("paramB"));
        seen.store(true, Ordering::SeqCst);
        async move { next.run(params).await }
    }));

    let path = "/hello?middleware=paramA&and=paramB";
    let resp = client().get(server.url(path)).send().await.unwrap();

    assert_eq!(resp.text().await.unwrap(), "Hello, world!");
    assert!(query_seen.load(Ordering::SeqCst));
    assert_eq!(*last_log.lock().unwrap(), format!("GET {path}"));
    server.stop().await.unwrap();
}

#[tokio::test]
async fn handles_post_without_buffering() {
    let server = start(hello_router()).await;
    server
        .router
        .post(
            "/post-body",
            handler_fn(|stream: Stream, _, params: Params, _| async move {
                assert!(params.body.is_none());
                Ok::<(), HandlerError>(stream.end("POST RECIEVED")?)
            }),
            HandlerOptions::default(),
        )
        .unwrap();

    let resp = client()
        .post(server.url("/post-body"))
        .body("ThisIsSomePostData")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "POST RECIEVED");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn buffers_post_body() {
    let server = start(hello_router()).await;
    server
        .router
        .post(
            "/post-body-parse",
            handler_fn(|stream: Stream, _, params: Params, _| async move {
                let body = params.body_text().map(|b| b.into_owned());
                stream.end(format!("POST RECIEVED {}", body.unwrap_or_default()))?;
                Ok::<(), HandlerError>(())
            }),
            HandlerOptions::buffered(),
        )
        .unwrap();

    let resp = client()
        .post(server.url("/post-body-parse"))
        .body("ThisIsSomePostData")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "POST RECIEVED ThisIsSomePostData");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn oversized_buffered_body_is_413() {
    let server = start(hello_router()).await;
    server
        .router
        .post(
            "/small",
            handler_fn(|_, _, _, next: Next| async move { next.send("unreachable") }),
            HandlerOptions::buffered().with_body_limits(simple_h2::handler::BodyLimits {
                max_bytes: 8,
                ..Default::default()
            }),
        )
        .unwrap();

    let resp = client()
        .post(server.url("/small"))
        .body("far more than eight bytes")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp.text().await.unwrap(), "Payload too large.");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn handles_put() {
    let server = start(hello_router()).await;
    server
        .router
        .put(
            "/put-body",
            handler_fn(|stream: Stream, _, _, _| async move { Ok::<(), HandlerError>(stream.end("PUT RECIEVED")?) }),
            HandlerOptions::default(),
        )
        .unwrap();

    let resp = client()
        .put(server.url("/put-body"))
        .body("ThisIsSomePutData")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "PUT RECIEVED");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn handles_delete() {
    let server = start(hello_router()).await;
    server
        .router
        .delete(
            "/delete",
            handler_fn(|stream: Stream, _, _, _| async move { Ok::<(), HandlerError>(stream.end("DELETE RECIEVED")?) }),
            HandlerOptions::default(),
        )
        .unwrap();

    let resp = client().delete(server.url("/delete")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "DELETE RECIEVED");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn add_registers_generic_method() {
    let server = start(hello_router()).await;
    server
        .router
        .add("/hello-add", Method::GET, hello_world, HandlerOptions::default())
        .unwrap();

    let resp = client().get(server.url("/hello-add")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "Hello, world!");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn path_parameters_reach_handler() {
    let server = start(hello_router()).await;
    server
        .router
        .get(
            "/users/:id",
            handler_fn(|_, _, params: Params, next: Next| async move {
                let id = params.path.get("id").cloned().unwrap_or_default();
                next.send(Reply::json(&json!({ "id": id })))
            }),
        )
        .unwrap();

    let resp = client().get(server.url("/users/42")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), r#"{"id":"42"}"#);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn handler_error_is_500() {
    let server = start(hello_router()).await;
    server
        .router
        .get(
            "/fails",
            handler_fn(|_, _, _, _| async move { Err::<(), _>(HandlerError::new("boom")) }),
        )
        .unwrap();

    let resp = client().get(server.url("/fails")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().await.unwrap(), "Internal server error.");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn handler_that_never_answers_is_500() {
    let server = start(hello_router()).await;
    server
        .router
        .get("/silent", handler_fn(|_, _, _, _| async move { Ok::<(), HandlerError>(()) }))
        .unwrap();

    let resp = client().get(server.url("/silent")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn panicking_handler_is_500_and_connection_survives() {
    let server = start(hello_router()).await;
    server
        .router
        .get(
            "/panics",
            handler_fn(|_: Stream, _: Headers, _: Params, _: Next| async move {
                if true {
                    panic!("handler bug");
                }
                Ok::<(), HandlerError>(())
            }),
        )
        .unwrap();

    let client = client();
    let resp = client.get(server.url("/panics")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = client.get(server.url("/hello")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "Hello, world!");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn concurrent_streams_on_one_connection() {
    let server = start(hello_router()).await;
    let client = client();

    let requests = (0..16).map(|_| {
        let client = client.clone();
        let url = server.url("/hello");
        tokio::spawn(async move { client.get(url).send().await.unwrap().text().await.unwrap() })
    });
    for body in futures_util::future::join_all(requests).await {
        assert_eq!(body.unwrap(), "Hello, world!");
    }
    server.stop().await.unwrap();
}

#[tokio::test]
async fn stop_drains_and_returns() {
    let server = start(hello_router()).await;
    let resp = client().get(server.url("/hello")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let addr = server.addr;
    server.stop().await.unwrap();
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn http1_request_on_cleartext_port_is_logged_as_warning() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let logs = CapturedLogs::default();
    let _guard = logs.install();
    let server = start(hello_router()).await;

    let mut tcp = tokio::net::TcpStream::connect(server.addr).await.unwrap();
    tcp.write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), tcp.read_to_end(&mut buf)).await;

    let line = logs
        .wait_for("Connection ended with error")
        .await
        .unwrap_or_else(|| panic!("no connection warning in:\n{}", logs.contents()));
    assert!(line.contains("WARN"), "unexpected level: {line}");

    // Other clients are unaffected.
    let resp = client().get(server.url("/hello")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "Hello, world!");
    server.stop().await.unwrap();
}
