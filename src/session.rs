//! Scoped sessions
//!
//! A [`Session`] owns a namespace bound to an archive path and writes it
//! back exactly once when it leaves scope. The write-back also happens
//! while unwinding from a panic, a documented policy that
//! `save_on_panic(false)` turns off. Explicit exits are available too:
//! `commit` surfaces the write error, `discard` skips the write entirely.
//! Drop-path write failures cannot propagate, so they are logged and
//! swallowed.

use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};
use zeroize::Zeroize;

use crate::archive;
use crate::config::SessionOptions;
use crate::error::{PakError, Result};
use crate::namespace::Namespace;
use crate::slots::{LoadedSlot, SlotState};

/// Scoped handle over a namespace, saved on scope exit
///
/// Derefs to [`Namespace`], so reads and writes go straight through:
///
/// ```no_run
/// # fn main() -> pakkit::Result<()> {
/// let mut session = pakkit::open_session("saves/slot1", Default::default())?;
/// session.set_default("gold", 0)?;
/// // saved automatically when `session` goes out of scope
/// # Ok(())
/// # }
/// ```
pub struct Session {
    namespace: Namespace,
    path: PathBuf,
    schema_version: u32,
    options: SessionOptions,
    state: SlotState,
    finished: bool,
}

impl Session {
    /// Open a session over an archive path
    ///
    /// Missing archives start an empty session when `create_if_missing`
    /// is on (the default) and fail with the IO error otherwise. Sessions
    /// opened this way keep the loaded schema version on save; slot
    /// sessions stamp their slot's declared version instead.
    pub fn open(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self> {
        let path = archive::normalize_path(path.as_ref());
        let (namespace, schema_version) =
            match archive::read(&path, options.save.password.as_deref()) {
                Ok((ns, info)) => (ns, info.schema_version),
                Err(PakError::Io(e))
                    if e.kind() == io::ErrorKind::NotFound && options.create_if_missing =>
                {
                    (Namespace::new(), options.save.schema_version)
                }
                Err(e) => return Err(e),
            };
        debug!(path = %path.display(), schema_version, "Session opened");
        Ok(Self {
            namespace,
            path,
            schema_version,
            options,
            state: SlotState::Loaded,
            finished: false,
        })
    }

    /// Build a session from an already-loaded slot
    pub(crate) fn from_slot(
        loaded: LoadedSlot,
        path: PathBuf,
        options: SessionOptions,
        declared_version: u32,
    ) -> Self {
        Self {
            namespace: loaded.into_namespace(),
            path,
            schema_version: declared_version,
            options,
            state: SlotState::Migrated,
            finished: false,
        }
    }

    /// The owned namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Mutable access to the owned namespace
    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }

    /// Archive path this session writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema version the write-back will stamp
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Lifecycle state
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Mid-session checkpoint write; the session stays open
    pub fn save(&mut self) -> Result<()> {
        if self.options.read_only {
            return Err(PakError::ReadOnly);
        }
        self.write_back()
    }

    /// Write back and finish, surfacing the write error
    ///
    /// The scope-exit write is skipped afterwards, even when this fails:
    /// the commit attempt was the one write.
    pub fn commit(mut self) -> Result<()> {
        if self.options.read_only {
            return Err(PakError::ReadOnly);
        }
        self.finished = true;
        let result = self.write_back();
        if result.is_ok() {
            self.state = SlotState::Saved;
        }
        result
    }

    /// Finish without ever writing
    pub fn discard(mut self) {
        self.state = SlotState::Discarded;
        self.finished = true;
    }

    fn write_back(&self) -> Result<()> {
        let mut options = self.options.save.clone();
        options.schema_version = self.schema_version;
        archive::write(&self.namespace, &self.path, &options)
    }

    fn wipe_password(&mut self) {
        if let Some(password) = self.options.save.password.as_mut() {
            password.zeroize();
        }
    }
}

impl Deref for Session {
    type Target = Namespace;

    fn deref(&self) -> &Namespace {
        &self.namespace
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.finished && self.options.auto_save && !self.options.read_only {
            if std::thread::panicking() && !self.options.save_on_panic {
                warn!(path = %self.path.display(), "Skipping save-on-exit during panic");
            } else if let Err(err) = self.write_back() {
                // drop cannot fail; log and swallow
                error!(path = %self.path.display(), error = %err, "Save-on-exit failed");
            }
        }
        self.wipe_password();
    }
}
