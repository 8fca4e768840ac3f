//! Disposal coordination: the instances a container owns, torn down exactly
//! once in reverse creation order.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::{DisposalFailure, Instance, TeardownFailure, TeardownFn, TypeKey};

struct DisposalRecord {
    key: TypeKey,
    instance: Instance,
    teardown: TeardownFn,
}

/// Insertion-ordered record of the instances this container must tear down.
/// Only the container that created an instance ever records it here.
#[derive(Default)]
pub(crate) struct DisposalList {
    records: Mutex<Vec<DisposalRecord>>,
    disposed: AtomicBool,
}

impl DisposalList {
    pub(crate) fn record(&self, key: TypeKey, instance: Instance, teardown: TeardownFn) {
        self.records.lock().push(DisposalRecord {
            key,
            instance,
            teardown,
        });
    }

    /// Tear down every recorded instance in reverse creation order. A failed
    /// teardown never stops the walk; all failures are aggregated and
    /// reported once, at the end. A second call is a no-op.
    pub(crate) fn dispose_all(&self) -> Result<(), DisposalFailure> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let records = std::mem::take(&mut *self.records.lock());
        let mut failures = Vec::new();
        for record in records.iter().rev() {
            if let Err(source) = (*record.teardown)(&record.instance) {
                failures.push(TeardownFailure {
                    key: record.key,
                    source,
                });
            }
        }
        tracing::debug!(
            disposed = records.len(),
            failed = failures.len(),
            "container disposed"
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DisposalFailure { failures })
        }
    }
}
