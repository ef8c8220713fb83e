//! Pure structural helpers over state values.
//!
//! Nothing in here holds state. Equality and deep copies go through the
//! serialized value tree, which makes them lossy for anything the serializer
//! skips.

mod compare;
mod freeze;
mod merge;

pub use compare::{deep_copy, naive_object_comparison, structurally_equal};
pub use freeze::{deep_freeze, Frozen};
pub use merge::{copy_array, copy_object, is_object, merge_deep, object_is_empty};
