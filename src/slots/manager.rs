//! Slot manager
//!
//! Registry of save slots and their migration chains. Registration happens
//! up-front through `&mut self`; everything afterwards takes `&self` with
//! no internal locking; callers serialize access.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::archive;
use crate::config::{SaveOptions, SessionOptions};
use crate::error::{PakError, Result};
use crate::namespace::Namespace;
use crate::session::Session;

use super::migration::{run_chain, Migration};
use super::SlotState;

/// Binding of a logical slot name to an archive path and schema version
#[derive(Debug, Clone)]
pub struct SlotDef {
    name: String,
    path: PathBuf,
    version: u32,
}

impl SlotDef {
    /// Define a slot. Paths without an extension get `.pak` appended.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, version: u32) -> Self {
        Self {
            name: name.into(),
            path: archive::normalize_path(&path.into()),
            version,
        }
    }

    /// Logical slot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Archive path backing this slot
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared schema version
    pub fn version(&self) -> u32 {
        self.version
    }
}

/// One slot's bookkeeping: the definition plus migrations sorted by
/// starting version
#[derive(Debug)]
struct SlotEntry {
    def: SlotDef,
    migrations: Vec<Migration>,
}

/// A slot's namespace after loading and migration
#[derive(Debug)]
pub struct LoadedSlot {
    namespace: Namespace,
    name: String,
    stored_version: u32,
    version: u32,
    migrations_applied: usize,
    state: SlotState,
}

impl LoadedSlot {
    /// The migrated namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Mutable access to the migrated namespace
    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }

    /// Take ownership of the namespace
    pub fn into_namespace(self) -> Namespace {
        self.namespace
    }

    /// Slot name this was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema version found in the archive (0 for a missing file)
    pub fn stored_version(&self) -> u32 {
        self.stored_version
    }

    /// Declared schema version, reached after migration
    pub fn version(&self) -> u32 {
        self.version
    }

    /// How many migration steps ran during this load
    pub fn migrations_applied(&self) -> usize {
        self.migrations_applied
    }

    /// Lifecycle state (`Migrated` after a successful load)
    pub fn state(&self) -> SlotState {
        self.state
    }
}

/// Registry of save slots
pub struct SlotManager {
    slots: IndexMap<String, SlotEntry>,
    options: SaveOptions,
}

impl SlotManager {
    /// Create a manager with default save options
    pub fn new() -> Self {
        Self::with_options(SaveOptions::default())
    }

    /// Create a manager whose saves use the given defaults
    ///
    /// A password given per call overrides the one in these options.
    pub fn with_options(options: SaveOptions) -> Self {
        Self {
            slots: IndexMap::new(),
            options,
        }
    }

    /// Register a slot definition
    pub fn register(&mut self, def: SlotDef) -> Result<()> {
        if self.slots.contains_key(def.name()) {
            return Err(PakError::Slot(format!(
                "slot {:?} already registered",
                def.name()
            )));
        }
        self.slots.insert(
            def.name().to_string(),
            SlotEntry {
                def,
                migrations: Vec::new(),
            },
        );
        Ok(())
    }

    /// Add a migration step to a registered slot
    ///
    /// Steps may be added in any order; the chain is kept sorted. A step
    /// starting at or beyond the declared version is a definition error.
    pub fn add_migration(&mut self, slot: &str, migration: Migration) -> Result<()> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| PakError::Slot(format!("unknown slot: {slot:?}")))?;
        if migration.from_version() >= entry.def.version {
            return Err(PakError::Slot(format!(
                "migration from version {} is beyond declared version {}",
                migration.from_version(),
                entry.def.version
            )));
        }
        match entry
            .migrations
            .binary_search_by_key(&migration.from_version(), Migration::from_version)
        {
            Ok(_) => Err(PakError::Slot(format!(
                "duplicate migration for version {}",
                migration.from_version()
            ))),
            Err(pos) => {
                entry.migrations.insert(pos, migration);
                Ok(())
            }
        }
    }

    /// Registered slot names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Look up a slot definition
    pub fn def(&self, slot: &str) -> Option<&SlotDef> {
        self.slots.get(slot).map(|entry| &entry.def)
    }

    /// Load a slot's namespace and migrate it to the declared version
    ///
    /// A missing archive loads as an empty namespace at version 0, so the
    /// full migration chain runs and a fresh save starts structurally
    /// current.
    pub fn load(&self, slot: &str, password: Option<&str>) -> Result<LoadedSlot> {
        let entry = self.entry(slot)?;
        let password = password.or(self.options.password.as_deref());
        let (mut namespace, stored) = match archive::read(entry.def.path(), password) {
            Ok((ns, info)) => (ns, info.schema_version),
            Err(PakError::Io(e)) if e.kind() == io::ErrorKind::NotFound => (Namespace::new(), 0),
            Err(e) => return Err(e),
        };
        let applied = run_chain(&mut namespace, stored, entry.def.version, &entry.migrations)?;
        debug!(
            slot,
            stored,
            declared = entry.def.version,
            migrations = applied,
            "Slot loaded"
        );
        Ok(LoadedSlot {
            namespace,
            name: slot.to_string(),
            stored_version: stored,
            version: entry.def.version,
            migrations_applied: applied,
            state: SlotState::Migrated,
        })
    }

    /// Save a namespace to a slot, stamping the declared schema version
    pub fn save(&self, slot: &str, namespace: &Namespace, password: Option<&str>) -> Result<()> {
        let entry = self.entry(slot)?;
        let mut options = self.options.clone();
        options.schema_version = entry.def.version;
        if let Some(password) = password {
            options.password = Some(password.to_string());
        }
        archive::write(namespace, entry.def.path(), &options)
    }

    /// Open a scoped session over a slot
    ///
    /// The slot is loaded and migrated first; the session then writes the
    /// declared version on exit. The session's own `SaveOptions` govern
    /// its writes, except that a missing password falls back to the
    /// manager's.
    pub fn open(&self, slot: &str, options: SessionOptions) -> Result<Session> {
        let entry = self.entry(slot)?;
        let mut options = options;
        if options.save.password.is_none() {
            options.save.password = self.options.password.clone();
        }
        let loaded = self.load(slot, options.save.password.as_deref())?;
        Ok(Session::from_slot(
            loaded,
            entry.def.path.clone(),
            options,
            entry.def.version,
        ))
    }

    /// Delete a slot's archive file, reporting whether one existed
    pub fn delete(&self, slot: &str) -> Result<bool> {
        let entry = self.entry(slot)?;
        match fs::remove_file(entry.def.path()) {
            Ok(()) => {
                debug!(slot, "Slot archive deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn entry(&self, slot: &str) -> Result<&SlotEntry> {
        self.slots
            .get(slot)
            .ok_or_else(|| PakError::Slot(format!("unknown slot: {slot:?}")))
    }
}

impl Default for SlotManager {
    fn default() -> Self {
        Self::new()
    }
}
