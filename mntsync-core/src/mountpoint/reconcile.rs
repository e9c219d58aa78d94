//! Decide and execute the commands that bring one mount point in line.
//!
//! | ensure  | mounted | device matches | action                      |
//! |---------|---------|----------------|-----------------------------|
//! | absent  | no      |                | nothing                     |
//! | absent  | yes     |                | umount                      |
//! | present | no      |                | mount                       |
//! | present | yes     | yes            | nothing                     |
//! | present | yes     | no             | remount (in place or not)   |

use super::desired::DesiredMount;
use super::grammar::{Grammar, MountEntry};
use super::live::{CommandLiveState, LiveState};
use crate::config::PlatformConfig;
use crate::report::{Action, Outcome};
use crate::resource::Ensure;
use mntsync_error::{MntsyncError, MntsyncResult};
use mntsync_hal::{render_command, ProcessOps};

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub program: String,
    pub args: Vec<String>,
}

impl Step {
    fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }

    pub fn render(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        render_command(&self.program, &args)
    }
}

/// Pure decision table, see the module docs.
pub fn decide(desired: &DesiredMount, live: Option<&MountEntry>) -> Action {
    match (desired.ensure, live) {
        (Ensure::Absent, None) => Action::Noop,
        (Ensure::Absent, Some(_)) => Action::Unmount,
        (Ensure::Present, None) => Action::Mount,
        (Ensure::Present, Some(entry)) if desired.device_matches(&entry.device) => Action::Noop,
        (Ensure::Present, Some(_)) => remount_action(desired),
    }
}

fn remount_action(desired: &DesiredMount) -> Action {
    if desired.remounts {
        Action::RemountInPlace
    } else {
        Action::Remount
    }
}

/// Arguments for a fresh mount: `[-o OPTIONS] [DEVICE] MOUNTPOINT`.
pub fn mount_args(desired: &DesiredMount) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(options) = desired.options.to_arg() {
        args.push("-o".to_string());
        args.push(options);
    }
    if let Some(device) = &desired.device {
        args.push(device.clone());
    }
    args.push(desired.name.clone());
    args
}

/// Arguments for an in-place remount: `[-o OPTIONS] -o remount MOUNTPOINT`,
/// so changed options take effect without unmounting.
pub fn remount_args(desired: &DesiredMount) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(options) = desired.options.to_arg() {
        args.push("-o".to_string());
        args.push(options);
    }
    args.push("-o".to_string());
    args.push("remount".to_string());
    args.push(desired.name.clone());
    args
}

/// Commands for `action`, in the order they must run.
pub fn steps(action: Action, desired: &DesiredMount, config: &PlatformConfig) -> Vec<Step> {
    let mount = config.mount_program.as_str();
    let umount = config.umount_program.as_str();
    match action {
        Action::Mount => vec![Step::new(mount, mount_args(desired))],
        Action::Unmount => vec![Step::new(umount, vec![desired.name.clone()])],
        Action::RemountInPlace => vec![Step::new(mount, remount_args(desired))],
        Action::Remount => vec![
            Step::new(umount, vec![desired.name.clone()]),
            Step::new(mount, mount_args(desired)),
        ],
        Action::Noop | Action::Created | Action::Updated | Action::Removed => Vec::new(),
    }
}

pub struct Reconciler<'a, H: ProcessOps + ?Sized> {
    hal: &'a H,
    config: &'a PlatformConfig,
    live: CommandLiveState<'a, H>,
    dry_run: bool,
}

impl<'a, H: ProcessOps + ?Sized> Reconciler<'a, H> {
    /// Fails with `MissingOverride` when the platform has no live-state
    /// grammar.
    pub fn new(hal: &'a H, config: &'a PlatformConfig, dry_run: bool) -> MntsyncResult<Self> {
        let grammar = Grammar::for_platform(&config.platform)?;
        Ok(Self {
            hal,
            config,
            live: CommandLiveState::new(hal, grammar, &config.mount_program),
            dry_run,
        })
    }

    pub fn live_entry(&self, desired: &DesiredMount) -> MntsyncResult<Option<MountEntry>> {
        self.live.query_live_entry(&desired.name)
    }

    pub fn exists(&self, desired: &DesiredMount) -> MntsyncResult<bool> {
        Ok(self.live_entry(desired)?.is_some())
    }

    /// Device currently mounted on the mount point, if any.
    pub fn device(&self, desired: &DesiredMount) -> MntsyncResult<Option<String>> {
        Ok(self.live_entry(desired)?.map(|e| e.device))
    }

    /// Bring the mount point to its declared state.
    pub fn converge(&self, desired: &DesiredMount) -> MntsyncResult<Outcome> {
        let live = self.live_entry(desired)?;
        let action = decide(desired, live.as_ref());
        self.execute(desired, action, live)
    }

    /// Handle a refresh event: an existing mount that should be present is
    /// remounted whether or not it is in sync.
    pub fn refresh(&self, desired: &DesiredMount) -> MntsyncResult<Outcome> {
        let live = self.live_entry(desired)?;
        let action = match (desired.ensure, &live) {
            (Ensure::Present, Some(_)) => remount_action(desired),
            _ => Action::Noop,
        };
        self.execute(desired, action, live)
    }

    /// Converge, then refresh if requested and converging changed nothing.
    /// A converge that already mounted or remounted absorbs the refresh.
    pub fn apply(&self, desired: &DesiredMount, refresh: bool) -> MntsyncResult<Outcome> {
        let outcome = self.converge(desired)?;
        if refresh && !outcome.is_change() {
            return self.refresh(desired);
        }
        Ok(outcome)
    }

    fn execute(
        &self,
        desired: &DesiredMount,
        action: Action,
        live: Option<MountEntry>,
    ) -> MntsyncResult<Outcome> {
        let resource = desired.resource_id();
        let mut outcome = Outcome::new(&resource, action);
        outcome.observed_device = live.map(|e| e.device);
        outcome.dry_run = self.dry_run;

        if action == Action::Noop {
            log::debug!("{}: in sync", resource);
            return Ok(outcome);
        }

        for step in steps(action, desired, self.config) {
            let rendered = step.render();
            if self.dry_run {
                log::info!("DRY RUN: {}: {}", resource, rendered);
            } else {
                log::info!("{}: {}", resource, rendered);
                let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
                self.hal
                    .command_status(&step.program, &args)
                    .map_err(|source| MntsyncError::CommandFailed {
                        resource: resource.clone(),
                        command: rendered.clone(),
                        source,
                    })?;
            }
            outcome.commands.push(rendered);
        }
        Ok(outcome)
    }
}
