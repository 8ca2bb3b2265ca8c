//! The owning registry object behind every proxy.

use std::{
    any::{Any, TypeId, type_name},
    fmt,
    sync::Arc,
};

use courier_api::{TransportClient, TransportClientFactory};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    DispatchError,
    argument::SchemaCache,
    declaration::HttpInterface,
    descriptor::DescriptorResolver,
    engine::InvocationEngine,
    facade::Requests,
    registry::{ClientRegistry, OnceRegistry, StrategyRegistry},
    strategy::BodyStrategyRef,
};

static GLOBAL: Lazy<Arc<Dispatcher>> = Lazy::new(Dispatcher::new);

/// A hand-written adapter over an [`InvocationEngine`] for one interface.
///
/// ```ignore
/// struct Users { engine: InvocationEngine }
///
/// impl HttpInterface for Users {
///     fn declarations() -> Vec<MethodDeclaration> {
///         vec![MethodDeclaration::with_verb("get", VerbMarker::get("/users/{id}"))
///             .param(ParamDeclaration::new(ParamType::Scalar(ScalarKind::Long)).field("id"))
///             .returns(ReturnKind::Text)]
///     }
/// }
///
/// impl ServiceProxy for Users {
///     fn from_engine(engine: InvocationEngine) -> Self {
///         Self { engine }
///     }
/// }
///
/// impl Users {
///     async fn get(&self, id: i64) -> Result<Option<String>, DispatchError> {
///         Ok(self.engine.invoke("get", vec![id.into()]).await?.into_text())
///     }
/// }
/// ```
pub trait ServiceProxy: HttpInterface + Sized {
    fn from_engine(engine: InvocationEngine) -> Self;
}

/// The caches an [`InvocationEngine`] reads on every call: transport clients,
/// body strategies, method descriptors and plain-object schemas.
///
/// Engines hold these directly, never the [`Dispatcher`], so cached proxies do
/// not keep their owner alive.
#[derive(Default)]
pub struct Registries {
    clients: ClientRegistry,
    strategies: StrategyRegistry,
    descriptors: DescriptorResolver,
    schemas: SchemaCache,
}

impl Registries {
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    pub fn descriptors(&self) -> &DescriptorResolver {
        &self.descriptors
    }

    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registries")
            .field("clients", &self.clients.len())
            .field("strategies", &self.strategies.len())
            .field("descriptors", &self.descriptors.len())
            .field("schemas", &self.schemas.len())
            .finish()
    }
}

/// Owns the shared [`Registries`] and the memoized proxy instances.
#[derive(Default)]
pub struct Dispatcher {
    registries: Arc<Registries>,
    proxies: OnceRegistry<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Dispatcher {
    /// A fresh dispatcher with empty caches.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The dispatcher shared by the whole process.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// An engine for interface `I` backed by this dispatcher's caches.
    pub fn engine<I: HttpInterface>(&self) -> InvocationEngine {
        InvocationEngine::new::<I>(Arc::clone(&self.registries))
    }

    /// The memoized proxy instance for `P`.
    pub fn get_instance<P: ServiceProxy>(&self) -> Result<Arc<P>, DispatchError> {
        let instance = self.proxies.get_or_try_init(&TypeId::of::<P>(), || {
            debug!(interface = type_name::<P>(), "creating proxy instance");
            let proxy: Arc<dyn Any + Send + Sync> = Arc::new(P::from_engine(self.engine::<P>()));
            Ok::<_, DispatchError>(proxy)
        })?;
        instance.downcast::<P>().map_err(|_| DispatchError::Runtime {
            message: format!("proxy cache holds a foreign type for {}", type_name::<P>()),
        })
    }

    /// Builds and publishes a body strategy ahead of first use.
    pub fn register_strategy(&self, strategy: &BodyStrategyRef) -> Result<(), DispatchError> {
        self.registries.strategies.register(strategy)
    }

    /// Seeds the transport client used by every method declared with factory `F`.
    ///
    /// Returns false if a client for `F` already exists.
    pub fn install_client<F: TransportClientFactory>(&self, client: Arc<dyn TransportClient>) -> bool {
        self.registries.clients.install::<F>(client)
    }

    /// Direct requests without a declared interface.
    pub fn requests(&self) -> Requests {
        Requests::new(Arc::clone(&self.registries))
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    pub fn clients(&self) -> &ClientRegistry {
        self.registries.clients()
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        self.registries.strategies()
    }

    pub fn descriptors(&self) -> &DescriptorResolver {
        self.registries.descriptors()
    }

    pub fn schemas(&self) -> &SchemaCache {
        self.registries.schemas()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registries", &self.registries)
            .field("proxies", &self.proxies.len())
            .finish()
    }
}
