//! Typed container facade: build from sealed bindings, resolve `Arc<T>`.

use std::marker::PhantomData;
use std::sync::Arc;

use vessel_core::{
    BuildFailure, Container, DisposalFailure, InstanceFactory, ResolveError, Settings, TypeKey,
};

use crate::bindings::Bindings;

/// Typed container: validates the graph eagerly on construction and resolves
/// shared instances by Rust type.
pub struct Injector {
    container: Container,
}

impl Injector {
    pub fn new(bindings: Bindings) -> Result<Self, BuildFailure> {
        Ok(Self {
            container: Container::new(bindings.into_registry())?,
        })
    }

    pub fn with_settings(bindings: Bindings, settings: Settings) -> Result<Self, BuildFailure> {
        Ok(Self {
            container: Container::with_settings(bindings.into_registry(), settings)?,
        })
    }

    /// Nested injector: its bindings override this one's, for itself and its
    /// descendants.
    pub fn nested(&self, bindings: Bindings) -> Result<Injector, BuildFailure> {
        Ok(Injector {
            container: self.container.create_nested(bindings.into_registry())?,
        })
    }

    /// Resolve one `Arc<T>`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let key = TypeKey::of::<T>();
        let instance = self.container.resolve_key(key)?;
        instance.downcast::<T>().map_err(|_| mismatch(key))
    }

    /// Resolve a trait-object abstraction registered through `bind_trait`.
    pub fn resolve_trait<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>, ResolveError> {
        let key = TypeKey::of::<I>();
        let instance = self.container.resolve_key(key)?;
        instance
            .downcast_ref::<Arc<I>>()
            .map(Arc::clone)
            .ok_or_else(|| mismatch(key))
    }

    /// The compiled factory for `T`, for repeated invocation.
    pub fn factory<T: Send + Sync + 'static>(&self) -> Result<TypedFactory<T>, ResolveError> {
        let inner = self.container.factory_key(TypeKey::of::<T>())?;
        Ok(TypedFactory {
            inner,
            _marker: PhantomData,
        })
    }

    /// Tear down every instance this injector's container owns. Idempotent.
    pub fn dispose(&self) -> Result<(), DisposalFailure> {
        self.container.dispose()
    }

    /// The underlying core container.
    pub fn container(&self) -> &Container {
        &self.container
    }
}

fn mismatch(key: TypeKey) -> ResolveError {
    ResolveError::Recipe {
        key,
        source: format!("bound recipe did not produce a {key}").into(),
    }
}

/// Typed wrapper over a compiled factory handle.
pub struct TypedFactory<T> {
    inner: InstanceFactory,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypedFactory<T> {
    pub fn call(&self) -> Result<Arc<T>, ResolveError> {
        let instance = self.inner.call()?;
        instance
            .downcast::<T>()
            .map_err(|_| mismatch(TypeKey::of::<T>()))
    }
}
