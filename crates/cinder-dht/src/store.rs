//! Local value store.
//!
//! A flat `KadId -> bytes` map with last-write-wins semantics, owned by a
//! single coordinator task so concurrent readers and writers are
//! linearized without a lock. Values live in memory only.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use cinder_types::KadId;

/// Requests served by the store coordinator.
enum StoreCommand {
    Put(KadId, Vec<u8>, oneshot::Sender<()>),
    Get(KadId, oneshot::Sender<Option<Vec<u8>>>),
}

/// Async handle to the store coordinator. Cheap to clone.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    /// Spawn the coordinator task for an empty store.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::channel::<StoreCommand>(64);
        tokio::spawn(async move {
            let mut data: HashMap<KadId, Vec<u8>> = HashMap::new();
            while let Some(command) = rx.recv().await {
                match command {
                    StoreCommand::Put(key, value, reply) => {
                        data.insert(key, value);
                        let _ = reply.send(());
                    }
                    StoreCommand::Get(key, reply) => {
                        let _ = reply.send(data.get(&key).cloned());
                    }
                }
            }
        });
        Self { tx }
    }

    /// Store a value under a key, overwriting any previous value.
    ///
    /// Resolves once the coordinator has applied the write.
    pub async fn put(&self, key: KadId, value: Vec<u8>) {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(StoreCommand::Put(key, value, reply))
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Fetch the value stored under a key.
    pub async fn get(&self, key: KadId) -> Option<Vec<u8>> {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(StoreCommand::Get(key, reply))
            .await
            .is_err()
        {
            return None;
        }
        rx.await.unwrap_or(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = StoreHandle::spawn();
        let key = KadId::random();

        store.put(key, b"hello world".to_vec()).await;
        assert_eq!(store.get(key).await, Some(b"hello world".to_vec()));

        assert_eq!(store.get(KadId::random()).await, None);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = StoreHandle::spawn();
        let key = KadId::random();

        store.put(key, b"first".to_vec()).await;
        store.put(key, b"second".to_vec()).await;
        assert_eq!(store.get(key).await, Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_concurrent_writers_settle() {
        let store = StoreHandle::spawn();
        let key = KadId::random();

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put(key, vec![i]).await;
            }));
        }
        for handle in handles {
            handle.await.expect("writer task");
        }

        let value = store.get(key).await.expect("some write landed");
        assert_eq!(value.len(), 1);
    }
}
