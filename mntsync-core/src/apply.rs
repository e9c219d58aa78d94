//! Drive the reconcilers for single resources and whole manifests.

use crate::config::PlatformConfig;
use crate::manifest::Manifest;
use crate::mountpoint::{DesiredMount, MountPointSpec, Reconciler};
use crate::mounttab::{MountTab, MountTabSpec, TableSet};
use crate::report::Outcome;
use mntsync_error::MntsyncResult;
use mntsync_hal::ProcessOps;

pub fn apply_mountpoint<H: ProcessOps + ?Sized>(
    hal: &H,
    config: &PlatformConfig,
    spec: &MountPointSpec,
    dry_run: bool,
) -> MntsyncResult<Outcome> {
    let desired = DesiredMount::from_spec(spec, config)?;
    let reconciler = Reconciler::new(hal, config, dry_run)?;
    reconciler.apply(&desired, spec.refresh)
}

pub fn apply_mounttab(
    config: &PlatformConfig,
    spec: &MountTabSpec,
    dry_run: bool,
) -> MntsyncResult<Outcome> {
    let entry = MountTab::from_spec(spec, config)?;
    let mut tables = TableSet::new(&config.schema, dry_run);
    let outcome = tables.apply(&entry)?;
    tables.flush_all()?;
    Ok(outcome)
}

/// Apply a manifest.
///
/// Every declaration is validated before anything is touched. Table entries
/// go first and each table file is written once; live mount points follow in
/// declaration order, so a mount can rely on a table entry from the same
/// manifest. The first failure stops the run.
pub fn apply_manifest<H: ProcessOps + ?Sized>(
    hal: &H,
    config: &PlatformConfig,
    manifest: &Manifest,
    dry_run: bool,
) -> MntsyncResult<Vec<Outcome>> {
    let entries = manifest
        .mounttab
        .iter()
        .map(|spec| MountTab::from_spec(spec, config))
        .collect::<MntsyncResult<Vec<_>>>()?;
    let mounts = manifest
        .mountpoint
        .iter()
        .map(|spec| Ok((DesiredMount::from_spec(spec, config)?, spec.refresh)))
        .collect::<MntsyncResult<Vec<_>>>()?;

    log::info!(
        "applying {} table entries and {} mount points",
        entries.len(),
        mounts.len()
    );

    let mut outcomes = Vec::with_capacity(entries.len() + mounts.len());

    let mut tables = TableSet::new(&config.schema, dry_run);
    for entry in &entries {
        outcomes.push(tables.apply(entry)?);
    }
    for path in tables.flush_all()? {
        log::debug!("flushed {}", path.display());
    }

    if !mounts.is_empty() {
        let reconciler = Reconciler::new(hal, config, dry_run)?;
        for (desired, refresh) in &mounts {
            outcomes.push(reconciler.apply(desired, *refresh)?);
        }
    }

    Ok(outcomes)
}
