//! Vessel Rust facade: typed bindings, modules and resolution on vessel-core.

pub mod bindings;
pub mod injector;
pub mod module;

pub use bindings::{key, ArgMismatch, Bindings, Resolved, Teardown};
pub use injector::{Injector, TypedFactory};
pub use module::Module;
pub use vessel_core::{
    Binding, BuildError, BuildFailure, Container, CyclePath, DisposalFailure, Dispose, Instance,
    InstanceFactory, Lifetime, Recipe, RecipeError, Registry, ResolveError, Settings,
    TeardownFailure, TypeKey,
};
