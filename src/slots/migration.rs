//! Schema migrations
//!
//! A migration step upgrades a namespace from version N to N+1 through a
//! pure function of the namespace. Steps form a total order by starting
//! version; a slot's chain is applied until the stored version reaches the
//! declared one, so re-loading an already-current archive applies nothing.

use std::fmt;

use tracing::info;

use crate::error::{PakError, Result};
use crate::namespace::Namespace;

type StepFn = Box<dyn Fn(&mut Namespace) -> Result<()> + Send + Sync>;

/// One schema upgrade step, from `from_version` to `from_version + 1`
pub struct Migration {
    from_version: u32,
    description: String,
    step: StepFn,
}

impl Migration {
    /// Define a step upgrading from `from_version` to `from_version + 1`
    pub fn new(
        from_version: u32,
        description: impl Into<String>,
        step: impl Fn(&mut Namespace) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            from_version,
            description: description.into(),
            step: Box::new(step),
        }
    }

    /// Version this step upgrades from
    pub fn from_version(&self) -> u32 {
        self.from_version
    }

    /// Version this step upgrades to
    pub fn target_version(&self) -> u32 {
        self.from_version + 1
    }

    /// Short human-readable label for logs
    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn apply(&self, namespace: &mut Namespace) -> Result<()> {
        (self.step)(namespace)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("from_version", &self.from_version)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Apply every step between `stored` and `declared` in ascending order
///
/// `steps` is sorted by starting version; a missing link fails the whole
/// load with `Migration`, a stored version beyond the declared one with
/// `UnsupportedVersion`. Returns how many steps ran.
pub(crate) fn run_chain(
    namespace: &mut Namespace,
    stored: u32,
    declared: u32,
    steps: &[Migration],
) -> Result<usize> {
    if stored > declared {
        return Err(PakError::UnsupportedVersion { stored, declared });
    }
    let mut applied = 0;
    for version in stored..declared {
        let step = steps
            .iter()
            .find(|m| m.from_version == version)
            .ok_or_else(|| {
                PakError::Migration(format!(
                    "no migration step from version {version} to {}",
                    version + 1
                ))
            })?;
        info!(
            from = version,
            to = version + 1,
            step = %step.description,
            "Applying migration"
        );
        step.apply(namespace)?;
        applied += 1;
    }
    Ok(applied)
}
