//! Binding registry: one configuration layer's declarative rules, consumed
//! by container construction.

use std::collections::HashMap;

use crate::{ConstructFn, TeardownFn, TypeKey};

/// Instance reuse policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// A new instance on every resolution.
    PerCall,
    /// One instance per owning container, shared with descendants that do
    /// not override the binding.
    PerContainer,
    /// Reserved: one instance per top-level resolution call. Rejected at
    /// container construction, never silently downgraded to `PerCall`.
    PerGraph,
}

/// Disposal policy for instances created from a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispose {
    /// The container never tears the instance down.
    Never,
    /// The container always tears the instance down. The recipe is expected
    /// to carry a teardown action; without one there is nothing to run.
    Always,
    /// Torn down exactly when the recipe carries a teardown action.
    IfDisposable,
}

impl Dispose {
    pub(crate) fn records(self) -> bool {
        !matches!(self, Dispose::Never)
    }
}

/// Construction recipe: ordered dependency keys plus the callable consuming
/// their resolved values. Decorator recipes receive the inner instance
/// prepended to the dependency values.
#[derive(Clone)]
pub struct Recipe {
    pub deps: Vec<TypeKey>,
    pub construct: ConstructFn,
    pub teardown: Option<TeardownFn>,
}

impl Recipe {
    pub fn new(deps: Vec<TypeKey>, construct: ConstructFn) -> Self {
        Self {
            deps,
            construct,
            teardown: None,
        }
    }
}

/// One declared rule: recipe, lifetime, dispose policy (`None` defers to the
/// container's default).
#[derive(Clone)]
pub struct Binding {
    pub recipe: Recipe,
    pub lifetime: Lifetime,
    pub dispose: Option<Dispose>,
}

impl Binding {
    /// Per-call binding with the container's default dispose policy.
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            lifetime: Lifetime::PerCall,
            dispose: None,
        }
    }
}

/// Bindings and decorator chains for a single container. Sealed by moving it
/// into `Container::new` / `create_nested`; immutable from then on.
#[derive(Default)]
pub struct Registry {
    bindings: HashMap<TypeKey, Binding>,
    decorators: HashMap<TypeKey, Vec<Recipe>>,
    /// First-mention order; keeps validation reports deterministic.
    declared: Vec<TypeKey>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare or replace the binding for `key`.
    pub fn bind(&mut self, key: TypeKey, binding: Binding) {
        self.note(key);
        self.bindings.insert(key, binding);
    }

    /// Append a decorator for `key`. Chains apply in registration order; the
    /// last registered becomes the outermost wrapper.
    pub fn decorate(&mut self, key: TypeKey, recipe: Recipe) {
        self.note(key);
        self.decorators.entry(key).or_default().push(recipe);
    }

    pub fn binding(&self, key: TypeKey) -> Option<&Binding> {
        self.bindings.get(&key)
    }

    pub fn decorators(&self, key: TypeKey) -> &[Recipe] {
        self.decorators.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every declared key, in first-mention order.
    pub fn declared(&self) -> &[TypeKey] {
        &self.declared
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.decorators.is_empty()
    }

    fn note(&mut self, key: TypeKey) {
        if !self.bindings.contains_key(&key) && !self.decorators.contains_key(&key) {
            self.declared.push(key);
        }
    }
}
