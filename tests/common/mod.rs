//! Shared utilities for integration tests.

use std::path::Path;
use std::time::Duration;

use axum::{routing::post, Router};
use rpc_bootstrap::RpcServer;
use tokio::net::TcpStream;

/// Pick a port that is free right now.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("0.0.0.0:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Poll until something accepts TCP connections on `port`.
pub async fn wait_for_port(port: u16) -> bool {
    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Poll until nothing accepts TCP connections on `port`.
#[allow(dead_code)]
pub async fn wait_for_close(port: u16) -> bool {
    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_err() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Registration mounting `echo.API/Echo`.
pub fn register_echo(server: &mut RpcServer) {
    server.add_service(
        "echo.API",
        Router::new().route("/Echo", post(|body: String| async move { body })),
    );
}

/// HTTP client that never reuses connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Cleartext HTTP/2 client using prior knowledge.
#[allow(dead_code)]
pub fn h2c_client() -> reqwest::Client {
    reqwest::Client::builder()
        .http2_prior_knowledge()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// HTTPS client that trusts any certificate.
#[allow(dead_code)]
pub fn tls_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Write a self-signed `tls.crt` / `tls.key` pair for `localhost` into `dir`.
#[allow(dead_code)]
pub fn write_self_signed(dir: &Path) {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    std::fs::write(dir.join("tls.crt"), cert.cert.pem()).unwrap();
    std::fs::write(dir.join("tls.key"), cert.key_pair.serialize_pem()).unwrap();
}
