//! Typed registry construction over the untyped core: register by Rust type,
//! let the container resolve by `TypeKey`.

use std::sync::Arc;

use thiserror::Error;
use vessel_core::{
    Binding, ConstructFn, Dispose, Instance, Lifetime, Recipe, RecipeError, Registry, TeardownFn,
    TypeKey,
};

use crate::module::Module;

/// Shorthand for `TypeKey::of::<T>()`, for dependency lists.
pub fn key<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}

/// A dependency value slice with typed accessors, handed to construction
/// closures in declaration order.
pub struct Resolved<'a> {
    values: &'a [Instance],
}

/// A dependency slot does not hold the expected type: the declared
/// dependency keys and the closure's accessors are out of step.
#[derive(Error, Debug)]
#[error("dependency slot {index} is not a {expected}")]
pub struct ArgMismatch {
    pub index: usize,
    pub expected: &'static str,
}

impl Resolved<'_> {
    /// The dependency at `index` as `Arc<T>`.
    pub fn arg<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ArgMismatch> {
        self.values
            .get(index)
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
            .ok_or(ArgMismatch {
                index,
                expected: std::any::type_name::<T>(),
            })
    }

    /// The dependency at `index` as a shared trait object, for dependencies
    /// registered through `bind_trait`.
    pub fn trait_arg<I: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Arc<I>, ArgMismatch> {
        self.values
            .get(index)
            .and_then(|value| value.downcast_ref::<Arc<I>>())
            .map(Arc::clone)
            .ok_or(ArgMismatch {
                index,
                expected: std::any::type_name::<I>(),
            })
    }
}

/// Container-managed teardown, attached by the `managed` binder and run when
/// the owning container is disposed.
pub trait Teardown: Send + Sync + 'static {
    fn teardown(&self) -> Result<(), RecipeError>;
}

fn construct_fn<T, F>(f: F) -> ConstructFn
where
    T: Send + Sync + 'static,
    F: Fn(&Resolved<'_>) -> Result<T, RecipeError> + Send + Sync + 'static,
{
    Arc::new(move |values: &[Instance]| {
        let value = f(&Resolved { values })?;
        Ok(Arc::new(value) as Instance)
    })
}

fn construct_trait_fn<I, F>(f: F) -> ConstructFn
where
    I: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolved<'_>) -> Result<Arc<I>, RecipeError> + Send + Sync + 'static,
{
    Arc::new(move |values: &[Instance]| {
        let value = f(&Resolved { values })?;
        Ok(Arc::new(value) as Instance)
    })
}

fn decorator_fn<T, F>(f: F) -> ConstructFn
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, &Resolved<'_>) -> Result<T, RecipeError> + Send + Sync + 'static,
{
    Arc::new(move |values: &[Instance]| {
        let (inner, rest) = split_inner(values)?;
        let inner = Arc::clone(inner).downcast::<T>().map_err(|_| {
            Box::new(ArgMismatch {
                index: 0,
                expected: std::any::type_name::<T>(),
            }) as RecipeError
        })?;
        let value = f(inner, &Resolved { values: rest })?;
        Ok(Arc::new(value) as Instance)
    })
}

fn decorator_trait_fn<I, F>(f: F) -> ConstructFn
where
    I: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<I>, &Resolved<'_>) -> Result<Arc<I>, RecipeError> + Send + Sync + 'static,
{
    Arc::new(move |values: &[Instance]| {
        let (inner, rest) = split_inner(values)?;
        let inner = inner.downcast_ref::<Arc<I>>().map(Arc::clone).ok_or_else(|| {
            Box::new(ArgMismatch {
                index: 0,
                expected: std::any::type_name::<I>(),
            }) as RecipeError
        })?;
        let value = f(inner, &Resolved { values: rest })?;
        Ok(Arc::new(value) as Instance)
    })
}

fn split_inner(values: &[Instance]) -> Result<(&Instance, &[Instance]), RecipeError> {
    values.split_first().ok_or_else(|| {
        Box::new(ArgMismatch {
            index: 0,
            expected: "inner instance",
        }) as RecipeError
    })
}

fn teardown_fn<T: Teardown>() -> TeardownFn {
    Arc::new(|instance: &Instance| match instance.downcast_ref::<T>() {
        Some(value) => value.teardown(),
        None => Ok(()),
    })
}

/// Collects typed bindings and seals them into a core [`Registry`].
#[derive(Default)]
pub struct Bindings {
    registry: Registry,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-call binding with the container's default dispose policy.
    pub fn bind<T, F>(&mut self, deps: Vec<TypeKey>, f: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolved<'_>) -> Result<T, RecipeError> + Send + Sync + 'static,
    {
        self.bind_full(deps, Lifetime::PerCall, None, f);
    }

    /// Per-container binding with the container's default dispose policy.
    pub fn singleton<T, F>(&mut self, deps: Vec<TypeKey>, f: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolved<'_>) -> Result<T, RecipeError> + Send + Sync + 'static,
    {
        self.bind_full(deps, Lifetime::PerContainer, None, f);
    }

    /// Fully-specified binding; `dispose: None` defers to container settings.
    pub fn bind_full<T, F>(
        &mut self,
        deps: Vec<TypeKey>,
        lifetime: Lifetime,
        dispose: Option<Dispose>,
        f: F,
    ) where
        T: Send + Sync + 'static,
        F: Fn(&Resolved<'_>) -> Result<T, RecipeError> + Send + Sync + 'static,
    {
        let recipe = Recipe::new(deps, construct_fn(f));
        self.registry.bind(
            TypeKey::of::<T>(),
            Binding {
                recipe,
                lifetime,
                dispose,
            },
        );
    }

    /// Binding whose instances the container tears down through [`Teardown`]
    /// when the dispose policy asks for it. `dispose: None` defers to the
    /// container's default policy.
    pub fn managed<T, F>(
        &mut self,
        deps: Vec<TypeKey>,
        lifetime: Lifetime,
        dispose: Option<Dispose>,
        f: F,
    ) where
        T: Teardown,
        F: Fn(&Resolved<'_>) -> Result<T, RecipeError> + Send + Sync + 'static,
    {
        let mut recipe = Recipe::new(deps, construct_fn(f));
        recipe.teardown = Some(teardown_fn::<T>());
        self.registry.bind(
            TypeKey::of::<T>(),
            Binding {
                recipe,
                lifetime,
                dispose,
            },
        );
    }

    /// A ready-made value, shared as-is with every resolution. The caller
    /// keeps ownership of its teardown; the container never disposes it.
    pub fn instance<T: Send + Sync + 'static>(&mut self, value: T) {
        let shared = Arc::new(value);
        let construct: ConstructFn =
            Arc::new(move |_values: &[Instance]| Ok(Arc::clone(&shared) as Instance));
        self.registry.bind(
            TypeKey::of::<T>(),
            Binding {
                recipe: Recipe::new(Vec::new(), construct),
                lifetime: Lifetime::PerContainer,
                dispose: Some(Dispose::Never),
            },
        );
    }

    /// Bind an abstraction (`dyn Trait`) to a recipe producing a shared
    /// trait object. Resolve it with `Injector::resolve_trait`.
    pub fn bind_trait<I, F>(&mut self, deps: Vec<TypeKey>, lifetime: Lifetime, f: F)
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolved<'_>) -> Result<Arc<I>, RecipeError> + Send + Sync + 'static,
    {
        let recipe = Recipe::new(deps, construct_trait_fn(f));
        self.registry.bind(
            TypeKey::of::<I>(),
            Binding {
                recipe,
                lifetime,
                dispose: None,
            },
        );
    }

    /// Append a decorator for `T`. Chains apply in registration order; the
    /// last registered becomes the outermost wrapper.
    pub fn decorate<T, F>(&mut self, deps: Vec<TypeKey>, f: F)
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &Resolved<'_>) -> Result<T, RecipeError> + Send + Sync + 'static,
    {
        self.registry
            .decorate(TypeKey::of::<T>(), Recipe::new(deps, decorator_fn(f)));
    }

    /// Append a decorator for a trait-object abstraction.
    pub fn decorate_trait<I, F>(&mut self, deps: Vec<TypeKey>, f: F)
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>, &Resolved<'_>) -> Result<Arc<I>, RecipeError> + Send + Sync + 'static,
    {
        self.registry
            .decorate(TypeKey::of::<I>(), Recipe::new(deps, decorator_trait_fn(f)));
    }

    /// Register a module's bindings.
    pub fn install(&mut self, module: &mut dyn Module) {
        module.register_into(self);
    }

    /// Raw escape hatch for recipes assembled by other layers.
    pub fn bind_key(&mut self, key: TypeKey, binding: Binding) {
        self.registry.bind(key, binding);
    }

    /// Seal into the core registry consumed by container construction.
    pub fn into_registry(self) -> Registry {
        self.registry
    }
}
