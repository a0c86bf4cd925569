//! HttpFetcher against a throwaway local HTTP server.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use wikicorpus::engine::{Fetch, HttpFetcher};
use wikicorpus::{FetchStatus, Task};

/// Accept one connection, read the request head, and answer with `status_line` and `body`
/// after `delay`.
fn serve_once(status_line: &'static str, body: &'static str, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            respond(stream, status_line, body, delay);
        }
    });
    format!("http://{addr}/wiki/")
}

fn respond(mut stream: TcpStream, status_line: &str, body: &str, delay: Duration) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    while reader.read_line(&mut line).unwrap_or(0) > 0 {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }
    thread::sleep(delay);
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn fetcher(timeout: Duration) -> HttpFetcher {
    HttpFetcher::new(timeout, "wikicorpus-tests").unwrap()
}

// --- status mapping ---

#[test]
fn test_fetch_success_returns_body() {
    let base = serve_once("200 OK", "<p>Hello.</p><p>World.</p>", Duration::ZERO);
    let task = Task::new("Example Topic", &base);
    let outcome = fetcher(Duration::from_secs(5)).fetch(&task);
    assert_eq!(outcome.task, task);
    assert_eq!(
        outcome.status,
        FetchStatus::Ok("<p>Hello.</p><p>World.</p>".to_string())
    );
}

#[test]
fn test_fetch_not_found_is_http_error() {
    let base = serve_once("404 Not Found", "missing", Duration::ZERO);
    let outcome = fetcher(Duration::from_secs(5)).fetch(&Task::new("Nope", &base));
    assert_eq!(outcome.status, FetchStatus::HttpError(404));
}

#[test]
fn test_fetch_server_error_is_http_error() {
    let base = serve_once("503 Service Unavailable", "", Duration::ZERO);
    let outcome = fetcher(Duration::from_secs(5)).fetch(&Task::new("Busy", &base));
    assert_eq!(outcome.status, FetchStatus::HttpError(503));
    assert!(!outcome.status.is_transient());
}

// --- transport failures ---

#[test]
fn test_fetch_refused_connection_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let base = format!("http://{addr}/wiki/");
    let outcome = fetcher(Duration::from_secs(5)).fetch(&Task::new("Gone", &base));
    match outcome.status {
        FetchStatus::TransportError(cause) => assert!(!cause.is_empty()),
        other => panic!("expected TransportError, got {:?}", other),
    }
}

#[test]
fn test_fetch_timeout_is_transport_error() {
    let base = serve_once("200 OK", "late", Duration::from_secs(2));
    let outcome = fetcher(Duration::from_millis(200)).fetch(&Task::new("Slow", &base));
    assert!(outcome.status.is_transient());
}
