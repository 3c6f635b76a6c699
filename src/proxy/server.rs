//! Accept loop: turns accepted connections into worker tasks.

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::net::{BoundedListener, ListenerError};
use crate::proxy::worker;

/// The forwarding proxy server.
pub struct ProxyServer {
    config: Arc<ProxyConfig>,
    cache: Arc<ResponseCache>,
}

impl ProxyServer {
    /// Create a server with a fresh cache sized from the configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let cache = Arc::new(ResponseCache::new(
            config.cache.capacity_bytes,
            config.cache.max_entry_bytes,
        ));
        Self {
            config: Arc::new(config),
            cache,
        }
    }

    /// The shared response cache.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Accept connections forever, one worker task per connection.
    ///
    /// The worker permit acquired by the listener moves into the task and
    /// is released when the task finishes, on every exit path.
    pub async fn run(self, listener: BoundedListener) -> Result<(), ListenerError> {
        tracing::info!(
            max_workers = listener.max_workers(),
            cache_capacity_bytes = self.cache.capacity_bytes(),
            "Proxy server starting"
        );

        loop {
            let (stream, peer, permit) = listener.accept().await?;
            let cache = Arc::clone(&self.cache);
            let config = Arc::clone(&self.config);

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = worker::handle_connection(stream, peer, cache, &config).await {
                    tracing::warn!(peer_addr = %peer, error = %e, "Connection ended with error");
                }
            });
        }
    }
}
