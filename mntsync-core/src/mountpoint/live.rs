use super::grammar::{Grammar, MountEntry};
use super::index::LiveIndex;
use mntsync_error::{MntsyncError, MntsyncResult};
use mntsync_hal::ProcessOps;

/// Lookup of the current mount for one mount point.
pub trait LiveState {
    fn query_live_entry(&self, mount_point: &str) -> MntsyncResult<Option<MountEntry>>;
}

/// Live state read by running the mount program without arguments.
pub struct CommandLiveState<'a, H: ProcessOps + ?Sized> {
    hal: &'a H,
    grammar: Grammar,
    mount_program: &'a str,
}

impl<'a, H: ProcessOps + ?Sized> CommandLiveState<'a, H> {
    pub fn new(hal: &'a H, grammar: Grammar, mount_program: &'a str) -> Self {
        Self {
            hal,
            grammar,
            mount_program,
        }
    }

    /// Query and index the whole table.
    pub fn snapshot(&self) -> MntsyncResult<LiveIndex> {
        let output = self
            .hal
            .command_stdout(self.mount_program, &[])
            .map_err(|source| MntsyncError::CommandFailed {
                resource: "live mount table".to_string(),
                command: self.mount_program.to_string(),
                source,
            })?;
        Ok(LiveIndex::build(&output, self.grammar))
    }
}

impl<H: ProcessOps + ?Sized> LiveState for CommandLiveState<'_, H> {
    fn query_live_entry(&self, mount_point: &str) -> MntsyncResult<Option<MountEntry>> {
        Ok(self.snapshot()?.get(mount_point).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mntsync_hal::FakeHal;

    #[test]
    fn queries_mount_without_arguments() {
        let hal = FakeHal::new();
        hal.set_stdout("mount", "/device on /mountdir type ext3 (rw)\n");
        let live = CommandLiveState::new(&hal, Grammar::Linux, "mount");

        let entry = live.query_live_entry("/mountdir").unwrap().unwrap();
        assert_eq!(entry.device, "/device");
        assert_eq!(
            hal.commands(),
            vec![("mount".to_string(), Vec::<String>::new())]
        );
    }

    #[test]
    fn absent_mount_point_is_none() {
        let hal = FakeHal::new();
        hal.set_stdout("mount", "proc on /proc type proc (rw)\n");
        let live = CommandLiveState::new(&hal, Grammar::Linux, "mount");
        assert!(live.query_live_entry("/mountdir").unwrap().is_none());
    }

    #[test]
    fn failing_query_is_a_command_error() {
        let hal = FakeHal::new();
        hal.fail_command("mount", Some(&[][..]), 1);
        let live = CommandLiveState::new(&hal, Grammar::Linux, "mount");
        let err = live.query_live_entry("/mountdir").unwrap_err();
        assert!(matches!(err, MntsyncError::CommandFailed { .. }));
    }
}
