//! Containers: eager graph validation at construction, resolution, nesting,
//! disposal.

use std::sync::Arc;

use crate::dispose::DisposalList;
use crate::factory::{self, Factory, ResolvedGraph};
use crate::graph;
use crate::registry::Registry;
use crate::scope::ScopeCache;
use crate::{BuildFailure, DisposalFailure, Instance, ResolveError, Settings, TeardownFn, TypeKey};

/// Shared state of one container. Compiled factories receive it as the
/// resolution context; children hold their parent's core as a shared,
/// non-owning link (disposal never crosses it).
pub(crate) struct ContainerCore {
    registry: Registry,
    settings: Settings,
    graph: ResolvedGraph,
    scope: ScopeCache,
    disposals: DisposalList,
    parent: Option<Arc<ContainerCore>>,
}

impl ContainerCore {
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn parent(&self) -> Option<&Arc<ContainerCore>> {
        self.parent.as_ref()
    }

    pub(crate) fn scope(&self) -> &ScopeCache {
        &self.scope
    }

    pub(crate) fn record_disposal(&self, key: TypeKey, instance: Instance, teardown: TeardownFn) {
        self.disposals.record(key, instance, teardown);
    }

    pub(crate) fn resolve_key(&self, key: TypeKey) -> Result<Instance, ResolveError> {
        match self.graph.factory(key) {
            Some(factory) => (**factory)(self),
            None => Err(ResolveError::NotRegistered(key)),
        }
    }
}

/// A dependency-injection container: a validated, compiled graph plus the
/// instances it caches and owns.
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    /// Build a root container with default settings. Fails fast, reporting
    /// every problem found in the registry at once.
    pub fn new(registry: Registry) -> Result<Self, BuildFailure> {
        Self::with_settings(registry, Settings::default())
    }

    /// Build a root container with explicit settings.
    pub fn with_settings(registry: Registry, settings: Settings) -> Result<Self, BuildFailure> {
        Self::build(registry, settings, None)
    }

    /// Build a nested container. Its registry overrides this container's
    /// bindings for itself and its descendants; settings are inherited.
    pub fn create_nested(&self, registry: Registry) -> Result<Container, BuildFailure> {
        Self::build(registry, self.core.settings, Some(Arc::clone(&self.core)))
    }

    fn build(
        registry: Registry,
        settings: Settings,
        parent: Option<Arc<ContainerCore>>,
    ) -> Result<Self, BuildFailure> {
        let plan = graph::plan(&registry, settings, parent.as_ref())?;
        let graph = factory::compile(&plan, parent.as_ref());
        tracing::debug!(
            types = graph.len(),
            nested = parent.is_some(),
            "container graph validated"
        );
        Ok(Self {
            core: Arc::new(ContainerCore {
                registry,
                settings,
                graph,
                scope: ScopeCache::default(),
                disposals: DisposalList::default(),
                parent,
            }),
        })
    }

    /// Resolve one instance of `key`.
    pub fn resolve_key(&self, key: TypeKey) -> Result<Instance, ResolveError> {
        self.core.resolve_key(key)
    }

    /// The compiled factory for `key`, bound to this container, for repeated
    /// invocation without the per-resolution lookup.
    pub fn factory_key(&self, key: TypeKey) -> Result<InstanceFactory, ResolveError> {
        match self.core.graph.factory(key) {
            Some(factory) => Ok(InstanceFactory {
                core: Arc::clone(&self.core),
                factory: Arc::clone(factory),
            }),
            None => Err(ResolveError::NotRegistered(key)),
        }
    }

    /// Tear down every instance this container created whose policy requires
    /// it, in reverse creation order; instances borrowed from ancestors are
    /// never touched. Idempotent. Must not run concurrently with in-flight
    /// resolutions on this same container; that synchronization is the
    /// caller's responsibility.
    pub fn dispose(&self) -> Result<(), DisposalFailure> {
        self.core.disposals.dispose_all()
    }
}

/// A compiled factory handle bound to the container it came from.
pub struct InstanceFactory {
    core: Arc<ContainerCore>,
    factory: Factory,
}

impl InstanceFactory {
    pub fn call(&self) -> Result<Instance, ResolveError> {
        (*self.factory)(&self.core)
    }
}
