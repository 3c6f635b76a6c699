//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use caching_proxy::config::ProxyConfig;
use caching_proxy::net::BoundedListener;
use caching_proxy::proxy::ProxyServer;

/// A mock origin server returning a fixed response, counting connections
/// and capturing the request heads it receives.
pub struct MockOrigin {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockOrigin {
    pub async fn start(response: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let conn_counter = Arc::clone(&connections);
        let req_log = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((mut socket, _)) => {
                        conn_counter.fetch_add(1, Ordering::SeqCst);
                        let req_log = Arc::clone(&req_log);
                        tokio::spawn(async move {
                            let mut head = Vec::new();
                            let mut buf = [0u8; 4096];
                            loop {
                                match socket.read(&mut buf).await {
                                    Ok(0) | Err(_) => break,
                                    Ok(n) => {
                                        head.extend_from_slice(&buf[..n]);
                                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                                            break;
                                        }
                                    }
                                }
                            }
                            req_log.lock().unwrap().push(head);
                            let _ = socket.write_all(response).await;
                            let _ = socket.shutdown().await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            addr,
            connections,
            requests,
        }
    }

    /// Number of connections the origin has accepted.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Request heads received so far.
    pub fn received_requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a proxy with the given config on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> SocketAddr {
    let listener = BoundedListener::bind(
        "127.0.0.1:0".parse().unwrap(),
        config.listener.max_workers,
    )
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = ProxyServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// Send raw request bytes to the proxy and collect the full response.
pub async fn roundtrip(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}
