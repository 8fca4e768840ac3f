//! Modules: one subsystem's wiring, installed into `Bindings` as a group.

use crate::bindings::Bindings;

/// A reusable group of bindings. Install with `Bindings::install`.
pub trait Module {
    fn register_into(&mut self, bindings: &mut Bindings);
}
