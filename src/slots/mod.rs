//! Save Slots Module
//!
//! Named bindings from logical slot names ("slot1", "autosave") to archive
//! paths plus a declared schema version. Loading a slot migrates its
//! namespace forward through ordered steps until the stored version meets
//! the declared one; saving stamps the declared version into the header.

mod manager;
mod migration;

pub use manager::{LoadedSlot, SlotDef, SlotManager};
pub use migration::Migration;

/// Slot lifecycle states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing loaded yet
    #[default]
    Unloaded,

    /// Archive decoded (or a fresh namespace for a missing file)
    Loaded,

    /// All pending migrations applied
    Migrated,

    /// Written back to the archive
    Saved,

    /// Finished without writing
    Discarded,
}
