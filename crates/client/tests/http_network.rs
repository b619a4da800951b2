//! Integration tests for HttpNetwork.
//!
//! Uses wiremock for HTTP mocking. Tests cover status passthrough, header and
//! body capture, navigation Accept header, size limits, and transport errors.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;

use swproxy_client::{FetchConfig, HttpNetwork};
use swproxy_core::{InterceptedRequest, Network, NetworkError};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(server: &MockServer, p: &str) -> InterceptedRequest {
    InterceptedRequest::get(Url::parse(&format!("{}{}", server.uri(), p)).unwrap())
}

fn network() -> HttpNetwork {
    HttpNetwork::new(FetchConfig::default()).expect("failed to create client")
}

#[tokio::test]
async fn test_fetch_success_captures_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/static/css/styles.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("body { margin: 0 }")
                .insert_header("content-type", "text/css"),
        )
        .mount(&server)
        .await;

    let response = network()
        .fetch(&request(&server, "/static/css/styles.css"))
        .await
        .expect("fetch failed");

    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "body { margin: 0 }");
    assert_eq!(response.header("Content-Type"), Some("text/css"));
    assert_eq!(response.url, Some(format!("{}/static/css/styles.css", server.uri())));
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let response = network().fetch(&request(&server, "/missing.png")).await.expect("fetch failed");

    assert_eq!(response.status, 404);
    assert_eq!(response.text(), "Not Found");
}

#[tokio::test]
async fn test_navigation_sends_html_accept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let response = network()
        .fetch(&InterceptedRequest::navigate(url))
        .await
        .expect("fetch failed");

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_request_method_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/vote"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let req = request(&server, "/api/vote").with_method("POST");
    let response = network().fetch(&req).await.expect("fetch failed");

    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_body_too_large() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 2048]))
        .mount(&server)
        .await;

    let config = FetchConfig { max_bytes: 1024, ..Default::default() };
    let network = HttpNetwork::new(config).unwrap();
    let result = network.fetch(&request(&server, "/big")).await;

    assert!(matches!(result, Err(NetworkError::TooLarge(_))));
}

/// Serve one chunked response of `chunks` 1KiB chunks with no Content-Length.
fn chunked_server(chunks: usize) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n");
        let chunk = vec![b'x'; 1024];
        for _ in 0..chunks {
            let _ = stream.write_all(b"400\r\n");
            let _ = stream.write_all(&chunk);
            let _ = stream.write_all(b"\r\n");
        }
        let _ = stream.write_all(b"0\r\n\r\n");
    });
    port
}

#[tokio::test]
async fn test_chunked_body_too_large() {
    let port = chunked_server(8);
    let config = FetchConfig { max_bytes: 1536, ..Default::default() };
    let network = HttpNetwork::new(config).unwrap();
    let req = InterceptedRequest::get(Url::parse(&format!("http://127.0.0.1:{port}/stream")).unwrap());

    let result = network.fetch(&req).await;

    assert!(matches!(result, Err(NetworkError::TooLarge(_))));
}

#[tokio::test]
async fn test_chunked_body_within_limit() {
    let port = chunked_server(2);
    let config = FetchConfig { max_bytes: 4096, ..Default::default() };
    let network = HttpNetwork::new(config).unwrap();
    let req = InterceptedRequest::get(Url::parse(&format!("http://127.0.0.1:{port}/stream")).unwrap());

    let response = network.fetch(&req).await.expect("fetch failed");

    assert_eq!(response.body.len(), 2048);
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = FetchConfig { timeout: Duration::from_millis(200), ..Default::default() };
    let network = HttpNetwork::new(config).unwrap();
    let result = network.fetch(&request(&server, "/slow")).await;

    assert!(matches!(result, Err(NetworkError::Timeout(_))));
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let req = InterceptedRequest::get(Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap());

    let result = network().fetch(&req).await;

    assert!(matches!(result, Err(NetworkError::Connect(_))));
}
