//! Factory compilation: every planned node becomes a closure closed over its
//! resolved dependency factories; decorator chains compose in registration
//! order. Compilation constructs nothing; it only builds callables.

use std::collections::HashMap;
use std::sync::Arc;

use crate::container::ContainerCore;
use crate::graph::{GraphPlan, NodePlan};
use crate::registry::{Dispose, Lifetime, Recipe};
use crate::{Instance, ResolveError, TypeKey};

/// A compiled factory. The argument is the resolving container, used for
/// scope caching and disposal recording only.
pub(crate) type Factory =
    Arc<dyn Fn(&ContainerCore) -> Result<Instance, ResolveError> + Send + Sync>;

/// One container's compiled nodes, immutable after construction.
pub(crate) struct ResolvedGraph {
    nodes: HashMap<TypeKey, Factory>,
}

impl ResolvedGraph {
    pub(crate) fn factory(&self, key: TypeKey) -> Option<&Factory> {
        self.nodes.get(&key)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Compile every node of a validated plan, dependencies first, so each
/// closure captures its dependencies' already-compiled factories.
pub(crate) fn compile(plan: &GraphPlan, parent: Option<&Arc<ContainerCore>>) -> ResolvedGraph {
    let mut nodes: HashMap<TypeKey, Factory> = HashMap::new();
    for key in plan.compile_order() {
        let factory = match plan.node(key) {
            None => continue,
            Some(NodePlan::Construct {
                recipe,
                decorators,
                lifetime,
                dispose,
            }) => {
                let base = construct(key, recipe, *dispose, &nodes);
                let chained = decorate(key, base, decorators, *dispose, &nodes);
                match lifetime {
                    Lifetime::PerContainer => cached(key, chained),
                    _ => chained,
                }
            }
            Some(NodePlan::Delegate) => match parent {
                Some(parent) => delegate(key, Arc::clone(parent)),
                None => continue,
            },
            Some(NodePlan::DelegateDecorated {
                decorators,
                dispose,
            }) => match parent {
                Some(parent) => {
                    let base = delegate(key, Arc::clone(parent));
                    cached(key, decorate(key, base, decorators, *dispose, &nodes))
                }
                None => continue,
            },
        };
        nodes.insert(key, factory);
    }
    ResolvedGraph { nodes }
}

/// Closure constructing the undecorated instance: resolves each dependency
/// through its captured factory, invokes the recipe, records disposal
/// against the resolving container when the policy asks for it.
fn construct(
    key: TypeKey,
    recipe: &Recipe,
    dispose: Dispose,
    nodes: &HashMap<TypeKey, Factory>,
) -> Factory {
    let deps: Vec<Factory> = recipe.deps.iter().map(|d| Arc::clone(&nodes[d])).collect();
    let construct = Arc::clone(&recipe.construct);
    let teardown = recipe.teardown.clone();
    let record = dispose.records() && teardown.is_some();
    Arc::new(move |ctx: &ContainerCore| {
        let mut values = Vec::with_capacity(deps.len());
        for dep in &deps {
            values.push((**dep)(ctx)?);
        }
        let instance =
            (*construct)(&values).map_err(|source| ResolveError::Recipe { key, source })?;
        if record {
            if let Some(teardown) = &teardown {
                ctx.record_disposal(key, Arc::clone(&instance), Arc::clone(teardown));
            }
        }
        Ok(instance)
    })
}

/// Wrap `inner` with each decorator in registration order; the chain's last
/// entry becomes the public factory. Each decorator receives the previous
/// stage's instance prepended to its own resolved dependencies.
fn decorate(
    key: TypeKey,
    inner: Factory,
    decorators: &[Recipe],
    dispose: Dispose,
    nodes: &HashMap<TypeKey, Factory>,
) -> Factory {
    let mut current = inner;
    for recipe in decorators {
        let deps: Vec<Factory> = recipe.deps.iter().map(|d| Arc::clone(&nodes[d])).collect();
        let construct = Arc::clone(&recipe.construct);
        let teardown = recipe.teardown.clone();
        let record = dispose.records() && teardown.is_some();
        let prev = current;
        current = Arc::new(move |ctx: &ContainerCore| {
            let mut values = Vec::with_capacity(deps.len() + 1);
            values.push((*prev)(ctx)?);
            for dep in &deps {
                values.push((**dep)(ctx)?);
            }
            let instance =
                (*construct)(&values).map_err(|source| ResolveError::Recipe { key, source })?;
            if record {
                if let Some(teardown) = &teardown {
                    ctx.record_disposal(key, Arc::clone(&instance), Arc::clone(teardown));
                }
            }
            Ok(instance)
        });
    }
    current
}

/// Per-container cache interception: at most one creation per
/// (container, type) pair.
fn cached(key: TypeKey, creation: Factory) -> Factory {
    Arc::new(move |ctx: &ContainerCore| ctx.scope().get_or_create(key, || (*creation)(ctx)))
}

/// Inherited per-container binding: resolve in the owning ancestor, which
/// creates, caches and eventually disposes the instance.
fn delegate(key: TypeKey, parent: Arc<ContainerCore>) -> Factory {
    Arc::new(move |_ctx: &ContainerCore| parent.resolve_key(key))
}
