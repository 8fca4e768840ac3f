//! Dependency graph construction: effective bindings across the ancestor
//! chain, eager validation with aggregated errors, cycle detection with
//! exact paths, and dependency-first compile ordering.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::container::ContainerCore;
use crate::registry::{Dispose, Lifetime, Recipe, Registry};
use crate::{BuildError, BuildFailure, CyclePath, Settings, TypeKey};

/// How one type's node gets built in this container.
pub(crate) enum NodePlan {
    /// Construct here: locally bound, or an inherited per-call binding
    /// recompiled so its dependencies come from this container's own graph.
    Construct {
        recipe: Recipe,
        decorators: Vec<Recipe>,
        lifetime: Lifetime,
        dispose: Dispose,
    },
    /// Inherited per-container binding: the owning ancestor creates, caches
    /// and eventually disposes the instance.
    Delegate,
    /// Inherited per-container binding with local decorators: wrap the
    /// ancestor's instance, cache at most one wrapper here.
    DelegateDecorated {
        decorators: Vec<Recipe>,
        dispose: Dispose,
    },
}

impl NodePlan {
    /// Outgoing dependency edges validated against this container's graph.
    /// Delegates carry none; their subtree was validated by the owner.
    fn edges(&self) -> Vec<TypeKey> {
        match self {
            NodePlan::Construct {
                recipe, decorators, ..
            } => {
                let mut deps = recipe.deps.clone();
                for decorator in decorators {
                    deps.extend(decorator.deps.iter().copied());
                }
                deps
            }
            NodePlan::Delegate => Vec::new(),
            NodePlan::DelegateDecorated { decorators, .. } => decorators
                .iter()
                .flat_map(|d| d.deps.iter().copied())
                .collect(),
        }
    }
}

/// A validated graph plan: every type visible anywhere in the ancestor chain,
/// each with its node plan, in deterministic declaration order.
pub(crate) struct GraphPlan {
    order: Vec<TypeKey>,
    plans: HashMap<TypeKey, NodePlan>,
}

impl GraphPlan {
    pub(crate) fn node(&self, key: TypeKey) -> Option<&NodePlan> {
        self.plans.get(&key)
    }

    /// Keys in dependency-first order, so every node compiles after the
    /// factories it closes over.
    pub(crate) fn compile_order(&self) -> Vec<TypeKey> {
        let mut done: HashSet<TypeKey> = HashSet::new();
        let mut out: Vec<TypeKey> = Vec::new();
        for &key in &self.order {
            postorder(key, &self.plans, &mut done, &mut out);
        }
        out
    }
}

fn postorder(
    key: TypeKey,
    plans: &HashMap<TypeKey, NodePlan>,
    done: &mut HashSet<TypeKey>,
    out: &mut Vec<TypeKey>,
) {
    if !done.insert(key) {
        return;
    }
    if let Some(plan) = plans.get(&key) {
        for dep in plan.edges() {
            postorder(dep, plans, done, out);
        }
    }
    out.push(key);
}

/// Resolve every visible type against the ancestor chain and validate the
/// result. All problems found are collected and surfaced together.
pub(crate) fn plan(
    registry: &Registry,
    settings: Settings,
    parent: Option<&Arc<ContainerCore>>,
) -> Result<GraphPlan, BuildFailure> {
    // Ancestor chain, this container's layer first.
    let mut chain: Vec<&Registry> = vec![registry];
    let mut cursor = parent;
    while let Some(core) = cursor {
        chain.push(core.registry());
        cursor = core.parent();
    }

    // Deterministic key order: outermost ancestor first, each layer in
    // first-mention order.
    let mut order: Vec<TypeKey> = Vec::new();
    let mut declared: HashSet<TypeKey> = HashSet::new();
    for layer in chain.iter().rev() {
        for &key in layer.declared() {
            if declared.insert(key) {
                order.push(key);
            }
        }
    }

    let mut errors: Vec<BuildError> = Vec::new();
    let mut plans: HashMap<TypeKey, NodePlan> = HashMap::new();

    for &key in &order {
        let mut found = None;
        for (depth, layer) in chain.iter().enumerate() {
            if let Some(binding) = layer.binding(key) {
                found = Some((depth, binding));
                break;
            }
        }
        let Some((owner_depth, binding)) = found else {
            // Decorated but never bound anywhere in the chain.
            errors.push(BuildError::DependencyNotFound {
                missing: key,
                requested_by: None,
            });
            continue;
        };

        let dispose = binding.dispose.unwrap_or(settings.default_dispose);
        let node = match binding.lifetime {
            Lifetime::PerGraph => {
                errors.push(BuildError::UnsupportedLifetime {
                    binding: key,
                    lifetime: Lifetime::PerGraph,
                });
                continue;
            }
            Lifetime::PerCall => {
                // Rebuilt per container: the base recipe plus every decorator
                // layer from the owner down to this container, innermost first.
                let mut decorators = Vec::new();
                for depth in (0..=owner_depth).rev() {
                    decorators.extend(chain[depth].decorators(key).iter().cloned());
                }
                NodePlan::Construct {
                    recipe: binding.recipe.clone(),
                    decorators,
                    lifetime: Lifetime::PerCall,
                    dispose,
                }
            }
            Lifetime::PerContainer if owner_depth == 0 => NodePlan::Construct {
                recipe: binding.recipe.clone(),
                decorators: chain[0].decorators(key).to_vec(),
                lifetime: Lifetime::PerContainer,
                dispose,
            },
            Lifetime::PerContainer => {
                let local = chain[0].decorators(key);
                if local.is_empty() {
                    NodePlan::Delegate
                } else {
                    NodePlan::DelegateDecorated {
                        decorators: local.to_vec(),
                        dispose,
                    }
                }
            }
        };
        plans.insert(key, node);
    }

    // Resolvability: every edge must land on a declared type. Broken targets
    // (unplanned but declared) already carry their own error.
    let mut reported: HashSet<(TypeKey, TypeKey)> = HashSet::new();
    for &key in &order {
        let Some(node) = plans.get(&key) else { continue };
        for dep in node.edges() {
            if !declared.contains(&dep) && reported.insert((dep, key)) {
                errors.push(BuildError::DependencyNotFound {
                    missing: dep,
                    requested_by: Some(key),
                });
            }
        }
    }

    // Cycle detection: depth-first walk with an explicit current-path stack;
    // hitting a type already on the path yields the exact cycle slice.
    let mut state: HashMap<TypeKey, Visit> = HashMap::new();
    let mut path: Vec<TypeKey> = Vec::new();
    for &key in &order {
        walk(key, &plans, &mut state, &mut path, &mut errors);
    }

    if errors.is_empty() {
        Ok(GraphPlan { order, plans })
    } else {
        Err(BuildFailure { errors })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

fn walk(
    key: TypeKey,
    plans: &HashMap<TypeKey, NodePlan>,
    state: &mut HashMap<TypeKey, Visit>,
    path: &mut Vec<TypeKey>,
    errors: &mut Vec<BuildError>,
) {
    match state.get(&key) {
        Some(Visit::Done) => return,
        Some(Visit::InProgress) => {
            if let Some(start) = path.iter().position(|k| *k == key) {
                let mut cycle = path[start..].to_vec();
                cycle.push(key);
                errors.push(BuildError::CircularDependency {
                    cycle: CyclePath(cycle),
                });
            }
            return;
        }
        None => {}
    }
    // Missing or broken nodes were reported above; nothing to walk through.
    let Some(plan) = plans.get(&key) else { return };
    state.insert(key, Visit::InProgress);
    path.push(key);
    for dep in plan.edges() {
        walk(dep, plans, state, path, errors);
    }
    path.pop();
    state.insert(key, Visit::Done);
}
