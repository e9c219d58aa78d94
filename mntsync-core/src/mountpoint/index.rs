use super::grammar::{Grammar, MountEntry};
use super::path::normalize_mount_path;
use std::collections::HashMap;

/// Snapshot of the live mount table keyed by normalized mount point.
#[derive(Debug, Clone, Default)]
pub struct LiveIndex {
    entries: HashMap<String, MountEntry>,
}

impl LiveIndex {
    /// Index full `mount` output. When a mount point appears more than once
    /// the last line wins: it is the most recent mount stacked on that path.
    pub fn build(output: &str, grammar: Grammar) -> Self {
        let mut entries = HashMap::new();
        for line in output.lines() {
            match grammar.parse_line(line) {
                Some(entry) => {
                    entries.insert(normalize_mount_path(&entry.mount_point), entry);
                }
                None => log::trace!("skipping unparsed mount line: {:?}", line),
            }
        }
        Self { entries }
    }

    pub fn get(&self, mount_point: &str) -> Option<&MountEntry> {
        self.entries.get(&normalize_mount_path(mount_point))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by mount point.
    pub fn sorted(&self) -> Vec<&MountEntry> {
        let mut out: Vec<(&String, &MountEntry)> = self.entries.iter().collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out.into_iter().map(|(_, e)| e).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_OUTPUT: &str = "/dev/mapper/VolGroup00-LogVol00 on / type ext3 (rw)
proc on /proc type proc (rw)
sysfs on /sys type sysfs (rw)
devpts on /dev/pts type devpts (rw,gid=5,mode=620)
/dev/cciss/c0d0p1 on /boot type ext3 (rw)
tmpfs on /dev/shm type tmpfs (rw)
none on /proc/sys/fs/binfmt_misc type binfmt_misc (rw)
/device on /mountdir type ext3 (rw)
";

    #[test]
    fn indexes_every_matching_line() {
        let index = LiveIndex::build(LINUX_OUTPUT, Grammar::Linux);
        assert_eq!(index.len(), 8);
        assert_eq!(index.get("/mountdir").unwrap().device, "/device");
        assert_eq!(index.get("/mountdir/").unwrap().device, "/device");
        assert!(index.get("/missing").is_none());
    }

    #[test]
    fn last_mount_on_a_path_wins() {
        let output = "/dev/sdb1 on /data type ext4 (rw)\n/dev/sdc1 on /data/ type xfs (ro)\n";
        let index = LiveIndex::build(output, Grammar::Linux);
        assert_eq!(index.len(), 1);
        let entry = index.get("/data").unwrap();
        assert_eq!(entry.device, "/dev/sdc1");
        assert_eq!(entry.options.as_deref(), Some("ro"));
    }

    #[test]
    fn unparsable_lines_are_dropped() {
        let output = "header nonsense\n\n/dev/sdb1 on /data type ext4 (rw)\n";
        let index = LiveIndex::build(output, Grammar::Linux);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn sorted_orders_by_mount_point() {
        let index = LiveIndex::build(LINUX_OUTPUT, Grammar::Linux);
        let points: Vec<&str> = index
            .sorted()
            .into_iter()
            .map(|e| e.mount_point.as_str())
            .take(3)
            .collect();
        assert_eq!(points, vec!["/", "/boot", "/dev/pts"]);
    }

    #[test]
    fn solaris_output_is_keyed_by_first_column() {
        let output = "/ on /dev/dsk/c0t0d0s0 read/write/setuid on Mon Jun  4 12:00:00 2012\n/export/home on /dev/dsk/c0t0d0s7 read/write on Mon Jun  4 12:00:00 2012\n";
        let index = LiveIndex::build(output, Grammar::Solaris);
        assert_eq!(index.get("/export/home").unwrap().device, "/dev/dsk/c0t0d0s7");
    }
}
