//! Per-container instance cache for the per-container lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::{Instance, ResolveError, TypeKey};

/// At most one creation per (container, type): the map lock is held only to
/// fetch the type's cell; the cell itself serializes first creation and
/// hands concurrent losers the winner's instance. A failed creation leaves
/// the cell empty, so the next resolution retries.
#[derive(Default)]
pub(crate) struct ScopeCache {
    cells: Mutex<HashMap<TypeKey, Arc<OnceCell<Instance>>>>,
}

impl ScopeCache {
    pub(crate) fn get_or_create(
        &self,
        key: TypeKey,
        create: impl FnOnce() -> Result<Instance, ResolveError>,
    ) -> Result<Instance, ResolveError> {
        let cell = Arc::clone(self.cells.lock().entry(key).or_default());
        cell.get_or_try_init(create).cloned()
    }
}
