use std::time::Duration;

use rampr_http::{HttpClient, HttpRequest, HttpTransportErrorKind};
use rampr_testserver::TestServer;

#[tokio::test]
async fn get_returns_status_and_body() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));
    let client = HttpClient::default();

    let res = client
        .get(&server.urls().devices)
        .await
        .unwrap_or_else(|e| panic!("GET /devices failed: {e}"));

    assert_eq!(res.status, 200);
    assert!(res.is_success());
    assert!(res.body_utf8().is_some_and(|b| b.contains("sensor-a")));
    assert_eq!(server.stats().requests_total(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn error_statuses_are_responses_not_errors() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));
    let client = HttpClient::default();

    let res = client
        .get(&server.urls().status(503))
        .await
        .unwrap_or_else(|e| panic!("GET /status/503 failed: {e}"));

    assert_eq!(res.status, 503);
    assert!(!res.is_success());

    server.shutdown().await;
}

#[tokio::test]
async fn request_timeout_is_reported_as_timeout() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));
    let client = HttpClient::default();

    let req = HttpRequest::get(&server.urls().slow).with_timeout(Some(Duration::from_millis(5)));
    let err = match client.request(req).await {
        Ok(res) => panic!("expected timeout, got status {}", res.status),
        Err(err) => err,
    };

    assert_eq!(err.transport_error_kind(), HttpTransportErrorKind::Timeout);

    server.shutdown().await;
}
