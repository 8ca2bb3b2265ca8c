//! Method descriptors: the frozen, shared form of a method declaration.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use courier_api::TransportClient;
use courier_types::{ReturnKind, Verb};
use tracing::{debug, info};

use crate::{
    DispatchError,
    classify::{ParameterRole, RequestAssembly, freeze_roles},
    declaration::{MethodDeclaration, MethodKey, ParamDeclaration},
    executor::{CallContext, DispatchOutput, VerbExecutor, executor_for},
    registry::{ClientFactoryRef, ClientRegistry, OnceRegistry, StrategyRegistry},
    strategy::{BodyStrategy, BodyStrategyRef},
};

/// Everything needed to dispatch one declared method, resolved once.
pub struct MethodDescriptor {
    pub name: String,
    pub verb: Verb,
    pub url_template: String,
    pub client_factory: ClientFactoryRef,
    pub client: Arc<dyn TransportClient>,
    pub body_strategy: BodyStrategyRef,
    /// Shared instance of `body_strategy`; `None` for verbs without a body.
    pub strategy: Option<Arc<dyn BodyStrategy>>,
    pub params: Vec<ParamDeclaration>,
    pub roles: Vec<ParameterRole>,
    pub returns: ReturnKind,
    executor: &'static dyn VerbExecutor,
}

impl MethodDescriptor {
    pub async fn dispatch(
        &self,
        assembly: &mut RequestAssembly,
        strategies: &StrategyRegistry,
    ) -> Result<DispatchOutput, DispatchError> {
        let call = CallContext {
            method: &self.name,
            verb: self.verb,
            url_template: &self.url_template,
            client: &self.client,
            strategy: self.body_strategy,
            strategy_instance: self.strategy.as_ref(),
            strategies,
        };
        self.executor.execute(call, assembly).await
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("verb", &self.verb)
            .field("url_template", &self.url_template)
            .field("client_factory", &self.client_factory)
            .field("body_strategy", &self.body_strategy)
            .field("roles", &self.roles)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Caches one descriptor per method key.
///
/// A method without a verb marker resolves to `None`, and that answer is
/// cached as well. Failed resolutions (client or strategy construction) are
/// not cached.
#[derive(Default)]
pub struct DescriptorResolver {
    descriptors: OnceRegistry<MethodKey, Option<Arc<MethodDescriptor>>>,
    resolutions: AtomicUsize,
}

impl DescriptorResolver {
    pub fn resolve(
        &self,
        key: &MethodKey,
        declaration: &MethodDeclaration,
        clients: &ClientRegistry,
        strategies: &StrategyRegistry,
    ) -> Result<Option<Arc<MethodDescriptor>>, DispatchError> {
        self.descriptors.get_or_try_init(key, || {
            self.resolutions.fetch_add(1, Ordering::SeqCst);
            let Some(marker) = &declaration.verb else {
                debug!(method = %key.signature, "no verb marker; calls resolve to nothing");
                return Ok(None);
            };

            let client = clients.client_for(&marker.client_factory)?;
            let strategy = if marker.verb.carries_body() {
                Some(strategies.strategy_for(&marker.body_strategy)?)
            } else {
                None
            };
            let roles = freeze_roles(&declaration.params);
            info!(
                method = %key.signature,
                verb = %marker.verb,
                url = %marker.url_template,
                client = marker.client_factory.name(),
                strategy = marker.body_strategy.name(),
                "resolved method descriptor"
            );

            Ok(Some(Arc::new(MethodDescriptor {
                name: declaration.name.clone(),
                verb: marker.verb,
                url_template: marker.url_template.clone(),
                client_factory: marker.client_factory,
                client,
                body_strategy: marker.body_strategy,
                strategy,
                params: declaration.params.clone(),
                roles,
                returns: declaration.returns,
                executor: executor_for(marker.verb),
            })))
        })
    }

    /// Number of resolution attempts, failed ones included.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
