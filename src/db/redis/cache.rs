use redis::AsyncCommands;
use redis::Client;
use tokio::sync::mpsc;

use crate::db::PersistentStore;
use crate::error::EngineResult;

/// Creates a Redis client for the persistent store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Queued write for the background writer
#[derive(Debug)]
enum WriteOp {
    Set {
        key: String,
        value: String,
        ttl: Option<u64>,
    },
    Remove {
        keys: Vec<String>,
    },
}

/// Redis-backed store. Reads go straight to Redis; writes are queued and
/// applied in order by a background task.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<WriteOp>,
}

/// Handle for gracefully shutting down the store writer
pub struct StoreWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl StoreWriterHandle {
    /// Signals the writer task to flush queued writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Store writer shutdown signal sent");
    }
}

impl RedisStore {
    /// Creates a store and spawns its background writer
    pub async fn new(redis_client: Client) -> (Self, StoreWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::writer_task(client, write_rx, shutdown_rx).await;
        });

        let store = Self {
            redis_client,
            write_tx,
        };

        (store, StoreWriterHandle { shutdown_tx })
    }

    async fn writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<WriteOp>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Store writer task started");

        loop {
            tokio::select! {
                Some(op) = write_rx.recv() => {
                    if let Err(e) = Self::apply(&client, op).await {
                        tracing::error!(error = %e, "Failed to write to Redis");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Stop accepting writes, then drain what is already queued
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(op) = write_rx.recv().await {
                        if let Err(e) = Self::apply(&client, op).await {
                            tracing::error!(error = %e, "Failed to flush write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }
                    tracing::info!(flushed, "Store writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply(client: &Client, op: WriteOp) -> EngineResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        match op {
            WriteOp::Set {
                key,
                value,
                ttl: Some(ttl),
            } => {
                let _: () = conn.set_ex(key, value, ttl).await?;
            }
            WriteOp::Set {
                key,
                value,
                ttl: None,
            } => {
                let _: () = conn.set(key, value).await?;
            }
            WriteOp::Remove { keys } => {
                if !keys.is_empty() {
                    let _: () = conn.del(keys).await?;
                }
            }
        }
        Ok(())
    }

    fn enqueue(&self, op: WriteOp) {
        if let Err(e) = self.write_tx.send(op) {
            tracing::error!(error = %e, "Failed to queue store write");
        }
    }

    /// Reads and deserializes a JSON value
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> EngineResult<Option<T>> {
        match self.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Serializes a value and queues it with an expiry
    pub fn set_json_in_background<T: serde::Serialize>(&self, key: &str, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Store serialization error");
                return;
            }
        };

        self.enqueue(WriteOp::Set {
            key: key.to_string(),
            value: json,
            ttl: Some(ttl),
        });
    }
}

#[async_trait::async_trait]
impl PersistentStore for RedisStore {
    async fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    fn set(&self, key: &str, value: String) {
        self.enqueue(WriteOp::Set {
            key: key.to_string(),
            value,
            ttl: None,
        });
    }

    fn remove(&self, key: &str) {
        self.enqueue(WriteOp::Remove {
            keys: vec![key.to_string()],
        });
    }

    fn multi_remove(&self, keys: &[String]) {
        self.enqueue(WriteOp::Remove {
            keys: keys.to_vec(),
        });
    }
}
