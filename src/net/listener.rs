//! TCP listener with worker admission control.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce the worker concurrency limit via semaphore
//!
//! A permit is acquired before the connection is accepted and travels with
//! the worker as an RAII guard, so a slot is released on every exit path,
//! including panics. No accept or read timeouts exist on this path; a
//! stalled peer holds its worker and permit until the peer goes away.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),
    /// Failed to accept a connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// A TCP listener that bounds the number of in-flight workers.
///
/// When `max_workers` connections are being processed, further accepts wait
/// until a worker finishes and its permit is dropped.
pub struct BoundedListener {
    inner: TcpListener,
    worker_slots: Arc<Semaphore>,
    max_workers: usize,
}

impl BoundedListener {
    /// Bind to `addr` with a fixed worker capacity.
    pub async fn bind(addr: SocketAddr, max_workers: usize) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_workers,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            worker_slots: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        })
    }

    /// Accept the next connection once a worker slot is available.
    ///
    /// Returns the stream together with the permit that must be held for
    /// the connection's whole lifetime.
    pub async fn accept(
        &self,
    ) -> Result<(TcpStream, SocketAddr, WorkerPermit), ListenerError> {
        let permit = self
            .worker_slots
            .clone()
            .acquire_owned()
            .await
            .expect("worker semaphore closed unexpectedly");

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_slots = self.worker_slots.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, WorkerPermit { _permit: permit }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Worker slots currently free.
    pub fn available_slots(&self) -> usize {
        self.worker_slots.available_permits()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

/// A held worker slot, released back to the pool on drop.
#[derive(Debug)]
pub struct WorkerPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn accept_blocks_once_worker_limit_is_reached() {
        let listener = BoundedListener::bind("127.0.0.1:0".parse().unwrap(), 1)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let _c2 = TcpStream::connect(addr).await.unwrap();

        let (_s1, _a1, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_slots(), 0);

        // Slot exhausted: the second accept must not complete.
        let blocked =
            tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(blocked.is_err());

        drop(permit);
        let admitted = tokio::time::timeout(Duration::from_secs(1), listener.accept()).await;
        assert!(admitted.is_ok());
        assert_eq!(listener.available_slots(), 0);
    }

    #[tokio::test]
    async fn permits_replenish_up_to_capacity() {
        let listener = BoundedListener::bind("127.0.0.1:0".parse().unwrap(), 3)
            .await
            .unwrap();
        assert_eq!(listener.max_workers(), 3);
        assert_eq!(listener.available_slots(), 3);

        let addr = listener.local_addr().unwrap();
        let _c = TcpStream::connect(addr).await.unwrap();
        let (_s, _a, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_slots(), 2);
        drop(permit);
        assert_eq!(listener.available_slots(), 3);
    }
}
