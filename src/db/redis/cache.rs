use redis::AsyncCommands;
use redis::Client;
use tokio::sync::{mpsc, oneshot};

use crate::db::cache::{CacheKey, CacheStore};
use crate::error::{AppError, AppResult};

/// Creates a Redis client for caching
///
/// Establishes a connection to Redis for fast data caching.
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Mutation queued for the background writer
///
/// Sets and deletes share one queue so an invalidation is never overtaken by
/// a write that was issued before it. A delete reports its outcome back to the
/// caller.
#[derive(Debug)]
enum CacheOp {
    Set {
        key: String,
        value: String,
        ttl: u64,
    },
    Delete {
        key: String,
        done: oneshot::Sender<AppResult<()>>,
    },
}

/// Redis-backed cache store
///
/// Reads go straight to Redis. Writes and deletes are applied in order by a
/// background task; handlers never wait on writes but do wait for a delete to
/// land before reporting it.
#[derive(Clone)]
pub struct RedisCacheStore {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheOp>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which flushes all pending
    /// operations to Redis before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl RedisCacheStore {
    /// Creates a new store and spawns its background writer task
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let store = Self {
            redis_client,
            write_tx,
        };

        (store, CacheWriterHandle { shutdown_tx })
    }

    /// Background task that applies queued cache operations
    ///
    /// On shutdown signal, drains the queue before exiting.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheOp>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(op) = write_rx.recv() => Self::process(&client, op).await,
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining operations");

                    write_rx.close();
                    while let Some(op) = write_rx.recv().await {
                        Self::process(&client, op).await;
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn process(client: &Client, op: CacheOp) {
        match op {
            CacheOp::Set { key, value, ttl } => {
                if let Err(e) = Self::write(client, key, value, ttl).await {
                    tracing::error!(error = %e, "Failed to write Redis cache entry");
                }
            }
            CacheOp::Delete { key, done } => {
                let result = Self::remove(client, key).await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Failed to delete Redis cache entry");
                }
                // The caller may have gone away; the delete still happened.
                let _ = done.send(result);
            }
        }
    }

    async fn write(client: &Client, key: String, value: String, ttl: u64) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl).await?;
        Ok(())
    }

    async fn remove(client: &Client, key: String) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    fn enqueue(&self, op: CacheOp) -> AppResult<()> {
        self.write_tx
            .send(op)
            .map_err(|e| AppError::Internal(format!("Cache writer unavailable: {}", e)))
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;
        Ok(cached)
    }

    async fn set(&self, key: &CacheKey, value: String, ttl_secs: u64) -> AppResult<()> {
        self.enqueue(CacheOp::Set {
            key: key.to_string(),
            value,
            ttl: ttl_secs.max(1),
        })
    }

    async fn delete(&self, key: &CacheKey) -> AppResult<()> {
        let (done, ack) = oneshot::channel();
        self.enqueue(CacheOp::Delete {
            key: key.to_string(),
            done,
        })?;

        ack.await
            .map_err(|_| AppError::Internal("Cache writer stopped before delete".to_string()))?
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (store, _handle) = RedisCacheStore::new(client).await;

        let key = CacheKey::Recommendations(Uuid::new_v4());
        let retrieved = store.get(&key).await.unwrap();

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_set_then_delete_applied_in_order() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (store, _handle) = RedisCacheStore::new(client).await;

        let key = CacheKey::Recommendations(Uuid::new_v4());
        store.set(&key, "[]".to_string(), 60).await.unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        assert_eq!(store.get(&key).await.unwrap(), Some("[]".to_string()));

        store.set(&key, "[1]".to_string(), 60).await.unwrap();
        store.delete(&key).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_reports_unreachable_redis() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (store, _handle) = RedisCacheStore::new(client).await;

        let key = CacheKey::Recommendations(Uuid::new_v4());
        let result = store.delete(&key).await;

        assert!(matches!(result, Err(AppError::Cache(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_cache_writer_graceful_shutdown() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (store, handle) = RedisCacheStore::new(client.clone()).await;

        let key = CacheKey::Recommendations(Uuid::new_v4());
        store.set(&key, "[\"shutdown\"]".to_string(), 60).await.unwrap();

        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let retrieved: Option<String> = conn.get(key.to_string()).await.unwrap();
        assert_eq!(retrieved, Some("[\"shutdown\"]".to_string()));

        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
