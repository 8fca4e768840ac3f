//! Vessel core: binding registry, dependency graph, lifetimes, disposal.
//!
//! The engine is untyped at its heart: abstraction types are [`TypeKey`]s,
//! instances are [`Instance`] values, construction recipes are opaque
//! callables over resolved dependency slices. Typed sugar lives in the
//! `vessel-rs` facade.

pub mod container;
pub mod registry;

mod dispose;
mod factory;
mod graph;
mod scope;

pub use container::{Container, InstanceFactory};
pub use registry::{Binding, Dispose, Lifetime, Recipe, Registry};

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

/// A resolved instance: an opaque shared value.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Error raised by a construction recipe or a teardown action. Opaque to the
/// engine; passed through to the caller unmodified.
pub type RecipeError = Box<dyn std::error::Error + Send + Sync>;

/// Construction callable: receives the resolved dependency values in
/// declaration order (for decorators: the inner instance first) and produces
/// one instance.
pub type ConstructFn = Arc<dyn Fn(&[Instance]) -> Result<Instance, RecipeError> + Send + Sync>;

/// Teardown callable run against a recorded instance at container disposal.
pub type TeardownFn = Arc<dyn Fn(&Instance) -> Result<(), RecipeError> + Send + Sync>;

/// Identifies an abstraction type: `TypeId` for lookup, the type name for
/// cycle and not-found reports.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Container-wide defaults. Nested containers inherit the parent's settings.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// Dispose policy applied to bindings that declare none.
    pub default_dispose: Dispose,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_dispose: Dispose::Never,
        }
    }
}

/// The exact path of a dependency cycle: first and last entries are the same
/// type, intermediate entries follow dependency order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CyclePath(pub Vec<TypeKey>);

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(key.name())?;
        }
        Ok(())
    }
}

/// A single problem found while validating a container's dependency graph.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A required type has no binding anywhere in the ancestor chain.
    #[error("no binding for {missing}{}", requester(.requested_by))]
    DependencyNotFound {
        missing: TypeKey,
        requested_by: Option<TypeKey>,
    },
    /// A type depends on itself, directly or transitively.
    #[error("circular dependency: {cycle}")]
    CircularDependency { cycle: CyclePath },
    /// The binding declares a reserved, unimplemented lifetime.
    #[error("binding for {binding} uses reserved lifetime {lifetime:?}")]
    UnsupportedLifetime { binding: TypeKey, lifetime: Lifetime },
}

fn requester(requested_by: &Option<TypeKey>) -> String {
    match requested_by {
        Some(key) => format!(" (required by {key})"),
        None => String::new(),
    }
}

/// Aggregate of every problem found during one container construction.
#[derive(Error, Debug)]
#[error("container validation failed: {}", summary(.errors))]
pub struct BuildFailure {
    pub errors: Vec<BuildError>,
}

fn summary(errors: &[BuildError]) -> String {
    let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    lines.join("; ")
}

/// Resolution failure against an already-validated graph.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The requested type was never declared in this container or any
    /// ancestor; the one request construction cannot pre-validate.
    #[error("no binding for {0}")]
    NotRegistered(TypeKey),
    /// A construction recipe failed; the inner error passes through untouched.
    #[error("recipe for {key} failed")]
    Recipe {
        key: TypeKey,
        #[source]
        source: RecipeError,
    },
}

/// One teardown action that failed during container disposal.
#[derive(Error, Debug)]
#[error("teardown of {key} failed")]
pub struct TeardownFailure {
    pub key: TypeKey,
    #[source]
    pub source: RecipeError,
}

/// Aggregate of every teardown failure from one container disposal. Every
/// recorded instance is given its chance before this is reported.
#[derive(Error, Debug)]
#[error("disposal failed for {} instance(s)", .failures.len())]
pub struct DisposalFailure {
    pub failures: Vec<TeardownFailure>,
}
