//! Namespace Module
//!
//! The hierarchical, dynamically-shaped data model: an insertion-ordered
//! mapping from string keys to a restricted value tree. Namespaces nest
//! freely up to [`MAX_DEPTH`] levels; equality is deep and structural and
//! ignores key order.

mod tree;
mod value;

pub use tree::Namespace;
pub use value::Value;

/// Maximum container-nesting levels (namespaces and lists combined).
///
/// Ownership makes reference cycles unrepresentable, so the hazard that
/// remains is unbounded nesting, which would make serialization recurse
/// without limit. Mutations reject values that would exceed this bound,
/// and archive write/read validate whole trees against it.
pub const MAX_DEPTH: usize = 128;
