//! CLI argument parsing for mntsync

use crate::mountpoint::MountPointSpec;
use crate::mounttab::MountTabSpec;
use crate::resource::{Ensure, OptionsValue, Scalar};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mntsync")]
#[command(about = "Converge live mounts and mount table entries to a declared state")]
#[command(long_about = "Converge live mounts and mount table entries to a declared state.\n\n\
    `mountpoint` drives mount/umount against the running system.\n\
    `mounttab` edits /etc/fstab (or /etc/vfstab on Solaris) in place,\n\
    leaving every line it does not manage byte-for-byte intact.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: /etc/mntsync.toml when it exists)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override platform detection (linux, solaris, freebsd, darwin, aix)
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Log what would change without running commands or writing files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print outcomes as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converge one live mount point
    Mountpoint(MountpointArgs),

    /// Converge one mount table entry
    Mounttab(MounttabArgs),

    /// Apply every resource declared in a TOML manifest
    Apply {
        #[arg(long)]
        manifest: PathBuf,
    },

    /// Print parsed state without changing anything
    Show {
        #[command(subcommand)]
        what: ShowCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShowCommand {
    /// Mounts reported by the mount program
    Live,
    /// Records of a mount table file
    Table {
        /// Table file (platform default when omitted)
        #[arg(long)]
        target: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct MountpointArgs {
    /// Absolute mount point path
    #[arg(long)]
    pub name: String,

    #[arg(long, value_enum, default_value_t = Ensure::Present)]
    pub ensure: Ensure,

    #[arg(long)]
    pub device: Option<String>,

    #[arg(long)]
    pub fstype: Option<String>,

    /// Mount option (repeatable); a single value is passed through as-is
    #[arg(long = "options")]
    pub options: Vec<String>,

    /// Whether `mount -o remount` works for this mount
    #[arg(long)]
    pub remounts: Option<bool>,

    /// Remount even when already in sync
    #[arg(long)]
    pub refresh: bool,
}

impl MountpointArgs {
    pub fn to_spec(&self) -> MountPointSpec {
        MountPointSpec {
            name: self.name.clone(),
            ensure: self.ensure,
            device: self.device.clone(),
            fstype: self.fstype.clone(),
            options: OptionsValue::from_flags(self.options.clone()),
            remounts: self.remounts,
            refresh: self.refresh,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MounttabArgs {
    /// Mount point column (e.g. /data, or swap)
    #[arg(long)]
    pub name: String,

    #[arg(long, value_enum, default_value_t = Ensure::Present)]
    pub ensure: Ensure,

    #[arg(long)]
    pub device: Option<String>,

    #[arg(long)]
    pub blockdevice: Option<String>,

    #[arg(long)]
    pub fstype: Option<String>,

    /// Mount option (repeatable, one option per flag)
    #[arg(long = "options")]
    pub options: Vec<String>,

    #[arg(long)]
    pub pass: Option<String>,

    /// yes, no, true or false
    #[arg(long)]
    pub atboot: Option<String>,

    #[arg(long)]
    pub dump: Option<String>,

    /// Table file (platform default when omitted)
    #[arg(long)]
    pub target: Option<PathBuf>,
}

impl MounttabArgs {
    pub fn to_spec(&self) -> MountTabSpec {
        let scalar = |value: &Option<String>| value.as_deref().map(Scalar::from);
        MountTabSpec {
            name: self.name.clone(),
            ensure: self.ensure,
            device: self.device.clone(),
            blockdevice: self.blockdevice.clone(),
            fstype: self.fstype.clone(),
            options: OptionsValue::from_flags(self.options.clone()),
            pass: scalar(&self.pass),
            atboot: scalar(&self.atboot),
            dump: scalar(&self.dump),
            target: self.target.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mountpoint_flags_build_a_spec() {
        let cli = Cli::parse_from([
            "mntsync",
            "--dry-run",
            "mountpoint",
            "--name",
            "/mnt/data",
            "--device",
            "/dev/sdb1",
            "--options",
            "devices",
            "--options",
            "exec",
            "--remounts",
            "false",
        ]);
        assert!(cli.dry_run);
        let Command::Mountpoint(args) = cli.command else {
            panic!("expected mountpoint");
        };
        let spec = args.to_spec();
        assert_eq!(spec.name, "/mnt/data");
        assert_eq!(spec.ensure, Ensure::Present);
        assert_eq!(spec.remounts, Some(false));
        assert_eq!(
            spec.options,
            Some(OptionsValue::Many(vec!["devices".to_string(), "exec".to_string()]))
        );
    }

    #[test]
    fn mounttab_flags_build_a_spec() {
        let cli = Cli::parse_from([
            "mntsync",
            "mounttab",
            "--name",
            "/export",
            "--ensure",
            "absent",
            "--atboot",
            "yes",
            "--target",
            "/tmp/vfstab",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Mounttab(args) = cli.command else {
            panic!("expected mounttab");
        };
        let spec = args.to_spec();
        assert_eq!(spec.ensure, Ensure::Absent);
        assert_eq!(spec.atboot, Some(Scalar::from("yes")));
        assert_eq!(spec.target, Some(PathBuf::from("/tmp/vfstab")));
        assert_eq!(spec.options, None);
    }

    #[test]
    fn show_table_takes_optional_target() {
        let cli = Cli::parse_from(["mntsync", "--json", "show", "table"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Show {
                what: ShowCommand::Table { target: None }
            }
        ));
    }
}
