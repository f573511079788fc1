//! Namespace tree
//!
//! Insertion-ordered string-keyed mapping over [`Value`]. All reads are
//! explicit (`Option` or strict `Result` accessors); the only implicit
//! construction points are `get_or_create`, `set_default`, and the
//! intermediate namespaces of `set_path`, every one a mutating call.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PakError, Result};

use super::value::Value;
use super::MAX_DEPTH;

/// Hierarchical save-data container
///
/// Equality is deep structural equality and ignores key order; iteration
/// order is insertion order, which keeps serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace {
    entries: IndexMap<String, Value>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no direct entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Get a value, `None` when absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Mutably get a value, `None` when absent
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Strict get: absent keys fail with `KeyNotFound`
    pub fn require(&self, key: &str) -> Result<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| PakError::KeyNotFound(key.to_string()))
    }

    /// True when the key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    // -------------------------------------------------------------------------
    // Typed Reads
    // -------------------------------------------------------------------------

    /// Get a bool, failing on absence or kind mismatch
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_kind(key, "bool", other)),
        }
    }

    /// Get an integer, failing on absence or kind mismatch
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            Value::Int(i) => Ok(*i),
            other => Err(wrong_kind(key, "int", other)),
        }
    }

    /// Get a float, failing on absence or kind mismatch
    pub fn get_float(&self, key: &str) -> Result<f64> {
        match self.require(key)? {
            Value::Float(x) => Ok(*x),
            other => Err(wrong_kind(key, "float", other)),
        }
    }

    /// Get a string slice, failing on absence or kind mismatch
    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            Value::Str(s) => Ok(s),
            other => Err(wrong_kind(key, "string", other)),
        }
    }

    /// Get a byte slice, failing on absence or kind mismatch
    pub fn get_bytes(&self, key: &str) -> Result<&[u8]> {
        match self.require(key)? {
            Value::Bytes(b) => Ok(b),
            other => Err(wrong_kind(key, "bytes", other)),
        }
    }

    /// Get a list slice, failing on absence or kind mismatch
    pub fn get_list(&self, key: &str) -> Result<&[Value]> {
        match self.require(key)? {
            Value::List(items) => Ok(items),
            other => Err(wrong_kind(key, "list", other)),
        }
    }

    /// Get a nested namespace, failing on absence or kind mismatch
    pub fn get_map(&self, key: &str) -> Result<&Namespace> {
        match self.require(key)? {
            Value::Map(ns) => Ok(ns),
            other => Err(wrong_kind(key, "namespace", other)),
        }
    }

    /// Mutably get a nested namespace, failing on absence or kind mismatch
    pub fn get_map_mut(&mut self, key: &str) -> Result<&mut Namespace> {
        match self.entries.get_mut(key) {
            Some(Value::Map(ns)) => Ok(ns),
            Some(other) => Err(wrong_kind(key, "namespace", other)),
            None => Err(PakError::KeyNotFound(key.to_string())),
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Insert or overwrite a value
    ///
    /// Rejects values nested deeper than [`MAX_DEPTH`] with `CycleDetected`,
    /// leaving the namespace unmodified.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        guard_depth(&value)?;
        self.entries.insert(key.into(), value);
        Ok(())
    }

    /// Insert `default` only when the key is absent; return the live value
    ///
    /// An existing value always wins, so repeated calls with different
    /// defaults are idempotent after the first.
    pub fn set_default(
        &mut self,
        key: impl Into<String>,
        default: impl Into<Value>,
    ) -> Result<&mut Value> {
        let key = key.into();
        if !self.entries.contains_key(&key) {
            let value = default.into();
            guard_depth(&value)?;
            self.entries.insert(key.clone(), value);
        }
        match self.entries.get_mut(&key) {
            Some(value) => Ok(value),
            None => Err(PakError::KeyNotFound(key)), // unreachable: just inserted
        }
    }

    /// Get the nested namespace under `key`, creating an empty one when absent
    ///
    /// Fails with `WrongKind` when the key holds a non-namespace value.
    pub fn get_or_create(&mut self, key: impl Into<String>) -> Result<&mut Namespace> {
        let key = key.into();
        if let Some(existing) = self.entries.get(&key) {
            if !matches!(existing, Value::Map(_)) {
                return Err(wrong_kind(&key, "namespace", existing));
            }
        } else {
            self.entries.insert(key.clone(), Value::Map(Namespace::new()));
        }
        match self.entries.get_mut(&key) {
            Some(Value::Map(ns)) => Ok(ns),
            Some(other) => Err(wrong_kind(&key, "namespace", other)),
            None => Err(PakError::KeyNotFound(key)), // unreachable: just inserted
        }
    }

    /// Remove a key, returning its value when it was present
    ///
    /// Preserves the insertion order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    // -------------------------------------------------------------------------
    // Dotted Paths
    // -------------------------------------------------------------------------

    /// Get a value by dotted path (`"a.b.c"`), `None` on any missing or
    /// non-namespace intermediate. Pure read, never creates.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let last = segments.next_back()?;
        let mut current = self;
        for seg in segments {
            current = match current.entries.get(seg) {
                Some(Value::Map(ns)) => ns,
                _ => return None,
            };
        }
        current.entries.get(last)
    }

    /// Set a value by dotted path, creating intermediate namespaces
    ///
    /// Fails with `WrongKind` when an intermediate holds a non-namespace
    /// value. Segments are ordinary keys; no escaping.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => return Err(PakError::KeyNotFound(path.to_string())), // unreachable: split yields >= 1
        };
        let mut current = self;
        for seg in parents {
            current = current.get_or_create(*seg)?;
        }
        current.set(*last, value)
    }

    /// Remove a value by dotted path, returning it when it was present
    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for seg in parents {
            current = match current.entries.get_mut(*seg) {
                Some(Value::Map(ns)) => ns,
                _ => return None,
            };
        }
        current.entries.shift_remove(*last)
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Recursively remove empty child namespaces, deepest first, returning
    /// how many were removed. Only direct `Map` values are culled; maps
    /// inside lists are left alone. Never runs implicitly.
    pub fn cull(&mut self) -> usize {
        let mut removed = 0;
        for value in self.entries.values_mut() {
            if let Value::Map(child) = value {
                removed += child.cull();
            }
        }
        let before = self.entries.len();
        self.entries
            .retain(|_, v| !matches!(v, Value::Map(ns) if ns.is_empty()));
        removed + (before - self.entries.len())
    }

    /// Validate the whole tree against [`MAX_DEPTH`]
    ///
    /// Mutations only check the subtree they insert, so a tree grown
    /// top-down can pass every local check; archive write and read call
    /// this before encoding and after decoding. Iterative walk.
    pub(crate) fn ensure_depth(&self) -> Result<()> {
        let mut stack: Vec<(&Value, usize)> =
            self.entries.values().map(|v| (v, 2)).collect();
        while let Some((value, depth)) = stack.pop() {
            match value {
                Value::Map(ns) => {
                    if depth > MAX_DEPTH {
                        return Err(PakError::CycleDetected { depth });
                    }
                    stack.extend(ns.entries.values().map(|v| (v, depth + 1)));
                }
                Value::List(items) => {
                    if depth > MAX_DEPTH {
                        return Err(PakError::CycleDetected { depth });
                    }
                    stack.extend(items.iter().map(|v| (v, depth + 1)));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_tree(self, f, 0)
    }
}

/// Indented tree rendering, four spaces per level
fn fmt_tree(ns: &Namespace, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    for (key, value) in ns.iter() {
        match value {
            Value::Map(child) => {
                writeln!(f, "{:indent$}{key}:", "")?;
                fmt_tree(child, f, indent + 4)?;
            }
            other => writeln!(f, "{:indent$}{key}: {other}", "")?,
        }
    }
    Ok(())
}

/// Reject values whose own nesting would push a tree past [`MAX_DEPTH`]
fn guard_depth(value: &Value) -> Result<()> {
    let depth = value.height() + 1;
    if depth > MAX_DEPTH {
        return Err(PakError::CycleDetected { depth });
    }
    Ok(())
}

fn wrong_kind(key: &str, expected: &'static str, found: &Value) -> PakError {
    PakError::WrongKind {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
