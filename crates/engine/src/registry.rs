//! Process-wide get-or-create registries.
//!
//! Every cache in the engine (transport clients, body strategies, method
//! descriptors, proxy instances) is a [`OnceRegistry`]: a concurrent map of
//! once-cells. Readers take a shard read lock only long enough to clone the
//! cell; construction happens inside the cell, so concurrent first misses for
//! the same key run the constructor once and all observe the same value. A
//! constructor that fails leaves the cell empty and the next caller retries.

use std::{
    any::{TypeId, type_name},
    fmt,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use courier_api::{DefaultClientFactory, TransportClient, TransportClientFactory, TransportError};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::{
    DispatchError,
    strategy::{BodyStrategy, BodyStrategyRef},
};

pub struct OnceRegistry<K, V> {
    cells: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> OnceRegistry<K, V> {
    pub fn new() -> Self {
        Self { cells: DashMap::new() }
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        if let Some(cell) = self.cells.get(key) {
            return Arc::clone(cell.value());
        }
        Arc::clone(self.cells.entry(key.clone()).or_default().value())
    }

    /// Returns the published value for `key`, constructing it on first use.
    pub fn get_or_try_init<E>(&self, key: &K, init: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        self.cell(key).get_or_try_init(init).cloned()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.cells.get(key).and_then(|cell| cell.value().get().cloned())
    }

    /// Publishes `value` unless one is already published. Returns whether it was stored.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.cell(&key).set(value).is_ok()
    }

    /// Number of published values.
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for OnceRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

type ClientConstructor = fn() -> Result<Arc<dyn TransportClient>, TransportError>;

fn build_default<F: TransportClientFactory + Default>() -> Result<Arc<dyn TransportClient>, TransportError> {
    F::default().build_client()
}

/// Names a transport-client factory type and how to run it.
#[derive(Clone, Copy)]
pub struct ClientFactoryRef {
    name: &'static str,
    type_id: TypeId,
    build: ClientConstructor,
}

impl ClientFactoryRef {
    pub fn of<F: TransportClientFactory + Default>() -> Self {
        Self {
            name: type_name::<F>(),
            type_id: TypeId::of::<F>(),
            build: build_default::<F>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl Default for ClientFactoryRef {
    fn default() -> Self {
        Self::of::<DefaultClientFactory>()
    }
}

impl PartialEq for ClientFactoryRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for ClientFactoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientFactoryRef").field(&self.name).finish()
    }
}

/// One transport client per factory type, built on first use.
#[derive(Default)]
pub struct ClientRegistry {
    clients: OnceRegistry<TypeId, Arc<dyn TransportClient>>,
    builds: AtomicUsize,
}

impl ClientRegistry {
    pub fn client_for(&self, factory: &ClientFactoryRef) -> Result<Arc<dyn TransportClient>, DispatchError> {
        self.clients.get_or_try_init(&factory.type_id, || {
            self.builds.fetch_add(1, Ordering::SeqCst);
            match (factory.build)() {
                Ok(client) => {
                    info!(factory = factory.name, "built transport client");
                    Ok(client)
                }
                Err(e) => {
                    error!(factory = factory.name, error = %e, "transport client construction failed");
                    Err(DispatchError::construction(factory.name, e.to_string()))
                }
            }
        })
    }

    /// Seeds the client for factory type `F`, bypassing the factory.
    ///
    /// Returns false if a client for `F` was already published.
    pub fn install<F: TransportClientFactory>(&self, client: Arc<dyn TransportClient>) -> bool {
        self.clients.insert(TypeId::of::<F>(), client)
    }

    /// Number of factory invocations so far, failed ones included.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// One body strategy per strategy type, built on first use.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: OnceRegistry<TypeId, Arc<dyn BodyStrategy>>,
}

impl StrategyRegistry {
    pub fn strategy_for(&self, strategy: &BodyStrategyRef) -> Result<Arc<dyn BodyStrategy>, DispatchError> {
        self.strategies.get_or_try_init(&strategy.type_id(), || {
            strategy
                .construct()
                .inspect(|_| info!(strategy = strategy.name(), "built body strategy"))
                .inspect_err(|e| error!(strategy = strategy.name(), error = %e, "body strategy construction failed"))
        })
    }

    /// Builds and publishes a strategy ahead of first use.
    pub fn register(&self, strategy: &BodyStrategyRef) -> Result<(), DispatchError> {
        self.strategy_for(strategy).map(|_| ())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
