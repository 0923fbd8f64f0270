//! Fake-mode scenarios for the client factory.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use grapple::middleware::RetryPolicy;
use grapple::{Error, FAKE_HISTORY, Factory, LOG, Logger, Method, RETRY, RequestOptions};
use serde_json::json;
use tracing::Level;

type Lines = Arc<Mutex<Vec<(Level, String)>>>;

fn capturing_logger() -> (Lines, Arc<dyn Logger>) {
    let lines = Lines::default();
    let sink = Arc::clone(&lines);
    let logger: Arc<dyn Logger> = Arc::new(move |level: Level, message: &str| {
        sink.lock().expect("lock").push((level, message.to_string()));
    });
    (lines, logger)
}

#[tokio::test]
async fn logging_emits_formatted_line() {
    let (lines, logger) = capturing_logger();
    let mut factory = Factory::new(true, Some(logger));

    let client = factory
        .enable_logging_with_format("log request: {method} {uri}")
        .expect("logger configured")
        .build();
    client.get("https://some.url").await.expect("response");

    assert_eq!(
        *lines.lock().expect("lock"),
        vec![(Level::INFO, "log request: GET https://some.url".to_string())]
    );
}

#[tokio::test]
async fn logging_with_default_format() {
    let (lines, logger) = capturing_logger();
    let mut factory = Factory::new(true, Some(logger));

    let client = factory.enable_logging().expect("logger configured").build();
    client.get("https://some.url").await.expect("response");

    let lines = lines.lock().expect("lock");
    assert_eq!(lines.len(), 1);
    insta::assert_snapshot!(&lines[0].1, @r#"GET https://some.url HTTP/1.1 200 ( text/plain) {"request": , "response": Fake test response for request: GET https://some.url}"#);
}

#[test]
fn logging_without_logger_fails() {
    let mut factory = Factory::new(true, None);

    let err = factory.enable_logging().map(|_| ()).expect_err("no logger");

    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "configuration error: logging requires a logger instance");
}

#[tokio::test]
async fn history_records_resolved_request_and_fake_response() {
    let mut factory = Factory::new(true, None);

    let client = factory
        .with_options(RequestOptions::new().with_base_uri("https://some.url"))
        .build();
    client.request(Method::Get, "path").await.expect("response");

    let history = factory.get_history(&client);
    assert_eq!(history.len(), 1);

    let exchange = &history[0];
    assert_eq!(exchange.request().method(), Method::Get);
    assert_eq!(exchange.request().uri(), "https://some.url/path");

    let response = exchange.response().expect("recorded response");
    assert_eq!(response.status(), 200);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(
        response.body().text(),
        "Fake test response for request: GET https://some.url/path"
    );
}

#[tokio::test]
async fn every_retry_attempt_is_recorded() {
    let mut factory = Factory::new(true, None);

    let client = factory
        .enable_retries(RetryPolicy::new(2).with_min_error_status(200))
        .build();
    let response = client.get("https://some.url").await.expect("last attempt");

    assert_eq!(response.status(), 200);
    assert_eq!(factory.get_history(&client).len(), 3);
}

#[tokio::test]
async fn fake_mode_collapses_retry_delay() {
    let mut factory = Factory::new(true, None);

    // one second base delay would sleep 1 + 2 + 3 seconds on a real transport
    let client = factory
        .enable_retries(RetryPolicy::default().with_min_error_status(200))
        .build();
    let start = Instant::now();
    client.get("https://some.url").await.expect("last attempt");
    let elapsed = start.elapsed();

    assert_eq!(factory.get_history(&client).len(), 4);
    assert!(elapsed < Duration::from_secs(1), "retries slept for {elapsed:?}");
}

#[tokio::test]
async fn retries_are_not_triggered_below_min_status() {
    let mut factory = Factory::new(true, None);

    let client = factory.enable_retries(RetryPolicy::default()).build();
    client.get("https://some.url").await.expect("response");

    assert_eq!(factory.get_history(&client).len(), 1);
}

#[test]
fn options_are_exposed_unchanged() {
    let mut factory = Factory::new(true, None);

    let options = RequestOptions::try_from(json!({
        "base_uri": "https://some.url",
        "auth": ["user", "secret"],
    }))
    .expect("options");
    let client = factory.with_options(options).build();

    assert_eq!(client.config("base_uri"), Some(&json!("https://some.url")));
    assert_eq!(client.config("auth"), Some(&json!(["user", "secret"])));
}

#[tokio::test]
async fn build_resets_factory_state() {
    let (_, logger) = capturing_logger();
    let mut factory = Factory::new(true, Some(logger));

    let first = factory
        .with_options(RequestOptions::new().with_base_uri("https://some.url"))
        .enable_logging()
        .expect("logger configured")
        .enable_retries(RetryPolicy::default())
        .build();

    assert!(factory.options().is_empty());
    assert!(factory.pipeline().is_empty());
    assert!(!factory.pipeline().contains(LOG));
    assert!(!factory.pipeline().contains(RETRY));
    assert!(!factory.pipeline().contains(FAKE_HISTORY));

    let second = factory.build();
    assert_ne!(first.id(), second.id());
    assert!(second.options().is_empty());

    // the second client has no base_uri to resolve against
    let err = second.get("path").await.expect_err("relative uri");
    assert!(matches!(err, Error::InvalidUrl(_)));

    second.get("https://other.url").await.expect("absolute uri");
    first.get("path").await.expect("first client keeps its base_uri");

    assert_eq!(factory.get_history(&first).len(), 1);
    assert_eq!(factory.get_history(&second).len(), 1);
}

#[test]
fn unknown_client_has_empty_history() {
    let mut other = Factory::new(true, None);
    let stranger = other.build();

    let factory = Factory::new(true, None);

    assert!(factory.get_history(&stranger).is_empty());
}

#[tokio::test]
async fn histories_are_kept_per_client() {
    let mut factory = Factory::new(true, None);
    let first = factory.build();
    let second = factory.build();

    first.get("https://some.url/a").await.expect("a");
    first.get("https://some.url/b").await.expect("b");
    second.get("https://some.url/c").await.expect("c");

    let uris = |client| {
        factory
            .get_history(client)
            .iter()
            .map(|exchange| exchange.request().uri().into_owned())
            .collect::<Vec<_>>()
    };
    assert_eq!(uris(&first), ["https://some.url/a", "https://some.url/b"]);
    assert_eq!(uris(&second), ["https://some.url/c"]);
}

#[tokio::test]
async fn fake_responses_echo_method_and_uri() {
    let mut factory = Factory::new(true, None);
    let client = factory.build();

    for method in [Method::Post, Method::Put, Method::Delete, Method::Patch] {
        let response = client
            .request(method, "https://some.url/items?id=7")
            .await
            .expect("response");
        assert_eq!(
            response.body().text(),
            format!("Fake test response for request: {method} https://some.url/items?id=7")
        );
    }
}
