//! Live query fan-out.
//!
//! Each distinct `QueryKey` owns at most one store listener, driven by a
//! pump task. Every `subscribe` call gets its own consumer channel on that
//! listener; the listener is released when the last consumer detaches and
//! evicted (with the error delivered to every consumer) when it fails.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{RepoError, RepoResult};
use crate::model::{Entity, decode};
use crate::store::{Document, DocumentStore, Query, QueryKey};

/// One emission of a listener: the full result set, not a diff.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Position in the listener's emission order, starting at 1.
    pub version: u64,
    pub documents: Arc<Vec<Document>>,
}

type Delivery = RepoResult<Snapshot>;

struct Channel {
    generation: u64,
    consumers: HashMap<u64, mpsc::UnboundedSender<Delivery>>,
    latest: Option<Snapshot>,
    pump: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Registry {
    channels: HashMap<QueryKey, Channel>,
    next_consumer: u64,
    next_generation: u64,
}

#[derive(Clone)]
pub struct SubscriptionManager {
    store: Arc<dyn DocumentStore>,
    registry: Arc<Mutex<Registry>>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Attaches a consumer to the listener for `query`, opening one if
    /// none is active. A consumer joining a running listener receives its
    /// latest snapshot first.
    ///
    /// Listeners are pumped on the calling tokio runtime; outside one this
    /// fails with `InvalidState`.
    pub fn subscribe(&self, query: Query) -> RepoResult<Subscription> {
        let runtime = Handle::try_current().map_err(|err| {
            RepoError::InvalidState(format!("live queries need a tokio runtime: {err}"))
        })?;
        let key = query.key();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut registry = self.registry.lock();
        registry.next_consumer += 1;
        let consumer_id = registry.next_consumer;

        let generation = match registry.channels.get_mut(&key) {
            Some(channel) => {
                if let Some(latest) = &channel.latest {
                    let _ = tx.send(Ok(latest.clone()));
                }
                channel.consumers.insert(consumer_id, tx);
                debug!(
                    key = %key,
                    consumers = channel.consumers.len(),
                    "Joined existing listener"
                );
                channel.generation
            }
            None => {
                registry.next_generation += 1;
                let generation = registry.next_generation;
                let pump = runtime.spawn(pump(
                    Arc::clone(&self.store),
                    Arc::clone(&self.registry),
                    query,
                    key.clone(),
                    generation,
                ));
                registry.channels.insert(
                    key.clone(),
                    Channel {
                        generation,
                        consumers: HashMap::from([(consumer_id, tx)]),
                        latest: None,
                        pump: Some(pump),
                    },
                );
                debug!(key = %key, generation, "Opened store listener");
                generation
            }
        };

        Ok(Subscription {
            key,
            generation,
            consumer_id,
            receiver: rx,
            registry: Arc::clone(&self.registry),
            closed: false,
        })
    }

    /// Number of keys with a live listener.
    pub fn active_keys(&self) -> usize {
        self.registry.lock().channels.len()
    }

    pub fn consumer_count(&self, key: &QueryKey) -> usize {
        self.registry
            .lock()
            .channels
            .get(key)
            .map_or(0, |channel| channel.consumers.len())
    }
}

async fn pump(
    store: Arc<dyn DocumentStore>,
    registry: Arc<Mutex<Registry>>,
    query: Query,
    key: QueryKey,
    generation: u64,
) {
    let mut stream = match store.listen(&query).await {
        Ok(stream) => stream,
        Err(err) => {
            terminate(&registry, &key, generation, err.into());
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(documents) => {
                let mut reg = registry.lock();
                let Some(channel) = reg
                    .channels
                    .get_mut(&key)
                    .filter(|channel| channel.generation == generation)
                else {
                    return;
                };
                let version = channel.latest.as_ref().map_or(1, |s| s.version + 1);
                let snapshot = Snapshot {
                    version,
                    documents: Arc::new(documents),
                };
                channel
                    .consumers
                    .retain(|_, tx| tx.send(Ok(snapshot.clone())).is_ok());
                channel.latest = Some(snapshot);
                let abandoned = channel.consumers.is_empty();
                if abandoned {
                    reg.channels.remove(&key);
                    debug!(key = %key, "Listener abandoned by all consumers");
                    return;
                }
            }
            Err(err) => {
                terminate(&registry, &key, generation, err.into());
                return;
            }
        }
    }

    terminate(
        &registry,
        &key,
        generation,
        RepoError::StoreUnavailable("listener closed by the store".into()),
    );
}

/// Delivers `err` to every consumer of `key` and evicts the key so the next
/// `subscribe` opens a fresh listener.
fn terminate(registry: &Mutex<Registry>, key: &QueryKey, generation: u64, err: RepoError) {
    let mut reg = registry.lock();
    let current = reg
        .channels
        .get(key)
        .is_some_and(|channel| channel.generation == generation);
    if !current {
        return;
    }
    if let Some(channel) = reg.channels.remove(key) {
        warn!(key = %key, error = %err, consumers = channel.consumers.len(), "Listener failed");
        for tx in channel.consumers.values() {
            let _ = tx.send(Err(err.clone()));
        }
    }
}

/// A consumer of one live query. Yields snapshots until cancelled, dropped
/// or terminated by a listener error (delivered as the final item).
pub struct Subscription {
    key: QueryKey,
    generation: u64,
    consumer_id: u64,
    receiver: mpsc::UnboundedReceiver<Delivery>,
    registry: Arc<Mutex<Registry>>,
    closed: bool,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_cancelled(&self) -> bool {
        self.closed
    }

    pub async fn next_snapshot(&mut self) -> Option<Delivery> {
        StreamExt::next(self).await
    }

    /// Nothing is observed after this returns. The store listener is torn
    /// down (asynchronously) when this was the last consumer.
    pub fn cancel(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.receiver.close();

        let mut reg = self.registry.lock();
        let last = match reg.channels.get_mut(&self.key) {
            Some(channel) if channel.generation == self.generation => {
                channel.consumers.remove(&self.consumer_id);
                channel.consumers.is_empty()
            }
            _ => false,
        };
        if last {
            if let Some(pump) = reg.channels.remove(&self.key).and_then(|c| c.pump) {
                pump.abort();
            }
            debug!(key = %self.key, "Last consumer detached, releasing listener");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("consumer_id", &self.consumer_id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Stream for Subscription {
    type Item = Delivery;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Typed view over a `Subscription`.
pub struct LiveQuery<T> {
    inner: Subscription,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> LiveQuery<T> {
    pub(crate) fn new(inner: Subscription) -> Self {
        Self {
            inner,
            _entity: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        self.inner.key()
    }

    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

impl<T: Entity> Stream for LiveQuery<T> {
    type Item = RepoResult<Vec<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.inner).poll_next(cx).map(|delivery| {
            delivery.map(|result| {
                result.and_then(|snapshot| {
                    snapshot
                        .documents
                        .iter()
                        .cloned()
                        .map(decode::<T>)
                        .collect::<RepoResult<Vec<T>>>()
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn subscribing_outside_a_runtime_is_an_error() {
        let live = SubscriptionManager::new(Arc::new(MemoryStore::new()));
        let err = live.subscribe(Query::collection("employees")).unwrap_err();
        assert!(matches!(err, RepoError::InvalidState(_)));
        assert_eq!(live.active_keys(), 0);
    }
}
