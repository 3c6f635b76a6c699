//! Per-connection worker: the dispatcher state machine.
//!
//! # Responsibilities
//! - Read the request head until the `\r\n\r\n` terminator
//! - Serve cache hits directly from the shared cache
//! - Parse misses, rewrite headers, forward to the origin
//! - Relay the origin response while buffering it for the cache
//!
//! # Design Decisions
//! - The exact raw bytes read from the client are the cache key
//! - No read or connect timeouts: a stalled peer or origin holds this
//!   worker (and its admission permit) until the peer goes away
//! - Every protocol failure turns into an error page; the client only sees
//!   a silent close when it disconnected first or the socket died

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::cache::ResponseCache;
use crate::config::{IoConfig, ProxyConfig};
use crate::http::{error_page, request, HttpError, Request};
use crate::observability::metrics;

/// Handle one client connection end to end.
pub async fn handle_connection(
    mut client: TcpStream,
    peer: SocketAddr,
    cache: Arc<ResponseCache>,
    config: &ProxyConfig,
) -> io::Result<()> {
    // Reading: accumulate until the header terminator or peer close.
    let raw = match read_request_head(&mut client, &config.io).await? {
        Some(raw) => raw,
        None => {
            tracing::debug!(peer_addr = %peer, "Client disconnected before completing a request");
            metrics::record_request("disconnect");
            return Ok(());
        }
    };

    // The raw bytes are the cache key, checked before any parsing.
    if let Some(body) = cache.lookup(&raw) {
        metrics::record_cache_hit();
        metrics::record_request("cache_hit");
        stream_body(&mut client, &body, config.io.chunk_bytes).await?;
        tracing::debug!(peer_addr = %peer, bytes = body.len(), "Served from cache");
        let _ = client.shutdown().await;
        return Ok(());
    }
    metrics::record_cache_miss();

    // Parsing.
    let mut request = match Request::parse(&raw) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(peer_addr = %peer, error = %e, "Rejecting request");
            metrics::record_request("rejected");
            error_page::send(&mut client, error_status(&e)).await;
            let _ = client.shutdown().await;
            return Ok(());
        }
    };
    if let Err(e) = request.require_supported_version() {
        tracing::debug!(peer_addr = %peer, version = request.version(), error = %e, "Rejecting request");
        metrics::record_request("rejected");
        error_page::send(&mut client, error_status(&e)).await;
        let _ = client.shutdown().await;
        return Ok(());
    }

    // Header rewrites for the outbound request.
    let host = request.host().to_owned();
    let mut rewrite = request.headers_mut().set("Connection", "close");
    if rewrite.is_ok() && request.headers().get("Host").is_none() {
        rewrite = request.headers_mut().set("Host", &host);
    }
    let outbound = match rewrite.and_then(|_| request.serialize()) {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::error!(peer_addr = %peer, error = %e, "Failed to rebuild outbound request");
            metrics::record_request("rejected");
            error_page::send(&mut client, 500).await;
            let _ = client.shutdown().await;
            return Ok(());
        }
    };

    // Forwarding.
    let origin_port = request.port_or_default();
    let mut origin = match TcpStream::connect((request.host(), origin_port)).await {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!(
                peer_addr = %peer,
                origin_host = request.host(),
                origin_port,
                error = %e,
                "Origin connection failed"
            );
            metrics::record_request("origin_unreachable");
            error_page::send(&mut client, 500).await;
            let _ = client.shutdown().await;
            return Ok(());
        }
    };

    if let Err(e) = origin.write_all(&outbound).await {
        tracing::warn!(peer_addr = %peer, origin_host = request.host(), error = %e, "Origin send failed");
        metrics::record_request("origin_unreachable");
        error_page::send(&mut client, 500).await;
        let _ = client.shutdown().await;
        return Ok(());
    }

    // Relay origin bytes to the client while buffering them for the cache.
    let body = match relay_response(&mut origin, &mut client, &config.io).await {
        Ok(body) => body,
        Err(e) => {
            // Part of the response may already be on the wire; nothing
            // useful can be sent to the client beyond closing.
            tracing::warn!(peer_addr = %peer, error = %e, "Relay interrupted");
            metrics::record_request("relay_failed");
            let _ = client.shutdown().await;
            return Ok(());
        }
    };

    // Caching: best effort, the client already has its bytes.
    cache.insert(&raw, &body);
    metrics::record_request("forwarded");
    tracing::debug!(
        peer_addr = %peer,
        origin_host = request.host(),
        bytes = body.len(),
        "Forwarded and relayed"
    );

    let _ = origin.shutdown().await;
    let _ = client.shutdown().await;
    Ok(())
}

/// Map a protocol error to the status code of its error page.
fn error_status(err: &HttpError) -> u16 {
    match err {
        HttpError::MalformedRequest => 400,
        HttpError::UnsupportedMethod => 501,
        HttpError::UnsupportedVersion => 505,
        _ => 500,
    }
}

fn oom(_: std::collections::TryReserveError) -> io::Error {
    io::Error::new(io::ErrorKind::OutOfMemory, "buffer allocation failed")
}

/// Read from the client until the head terminator appears.
///
/// Returns `None` on a clean disconnect before the terminator. A head that
/// outgrows the configured maximum is returned as-is; the parser rejects it
/// and the client gets a 400.
async fn read_request_head<R>(client: &mut R, io: &IoConfig) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; io.chunk_bytes];
    loop {
        let n = client.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.try_reserve(n).map_err(oom)?;
        buf.extend_from_slice(&chunk[..n]);
        if request::find(&buf, b"\r\n\r\n").is_some() || buf.len() > io.max_request_bytes {
            return Ok(Some(buf));
        }
    }
}

/// Write a cached body to the client in fixed-size chunks.
async fn stream_body<W>(client: &mut W, body: &[u8], chunk_bytes: usize) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for chunk in body.chunks(chunk_bytes) {
        client.write_all(chunk).await?;
    }
    Ok(())
}

/// Relay the origin response to the client chunk by chunk, accumulating a
/// copy for the cache. Ends on the origin's zero-length read.
async fn relay_response<R, W>(origin: &mut R, client: &mut W, io: &IoConfig) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut body = Vec::new();
    let mut chunk = vec![0u8; io.chunk_bytes];
    loop {
        let n = origin.read(&mut chunk).await?;
        if n == 0 {
            return Ok(body);
        }
        client.write_all(&chunk[..n]).await?;
        body.try_reserve(n).map_err(oom)?;
        body.extend_from_slice(&chunk[..n]);
    }
}
