mod xor;

pub use xor::Xor;

use neuroevolve_core::prelude::Scape;
use std::sync::Arc;

/// Names accepted by [`by_name`], for `neuroevolve tasks` to list.
pub const NAMES: &[&str] = &["xor"];

/// Built-in task environments selectable from the command line. The engine itself is
/// task-agnostic; these exist so `neuroevolve run` has something to point at without a separate
/// scripting layer.
pub fn by_name(name: &str, population_size: usize) -> Option<Arc<dyn Scape>> {
    match name {
        "xor" => Some(Arc::new(Xor::new(population_size))),
        _ => None,
    }
}
