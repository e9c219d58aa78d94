//! In-memory mount table: read once, converge any number of entries, write
//! once.

use super::entry::{AtBoot, MountTab};
use super::options::OptionSet;
use crate::filetab::{self, FieldSchema, Record};
use crate::report::{Action, Outcome, PropertyChange};
use crate::resource::Ensure;
use mntsync_error::{MntsyncError, MntsyncResult};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn same_name(a: &str, b: &str) -> bool {
    let trim = |s: &str| -> String {
        if s.len() > 1 {
            s.trim_end_matches('/').to_string()
        } else {
            s.to_string()
        }
    };
    trim(a) == trim(b)
}

#[derive(Debug, Clone)]
pub struct MountTable {
    path: PathBuf,
    schema: FieldSchema,
    records: Vec<Record>,
    dirty: bool,
}

impl MountTable {
    pub fn from_text(path: impl Into<PathBuf>, text: &str, schema: &FieldSchema) -> Self {
        Self {
            path: path.into(),
            schema: schema.clone(),
            records: filetab::parse(text, schema),
            dirty: false,
        }
    }

    /// Read `path`. A missing file is an empty table that will be created on
    /// flush.
    pub fn load(path: &Path, schema: &FieldSchema) -> MntsyncResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} does not exist yet", path.display());
                String::new()
            }
            Err(e) => return Err(MntsyncError::io(path, e)),
        };
        Ok(Self::from_text(path, &text, schema))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Data records only.
    pub fn entries(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_data())
    }

    pub fn find(&self, name: &str) -> Option<&Record> {
        self.position(name).map(|i| &self.records[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| {
            r.is_data() && r.get("name").is_some_and(|n| same_name(n, name))
        })
    }

    pub fn render(&self) -> String {
        filetab::serialize(&self.records, &self.schema)
    }

    /// Converge one entry in memory. Creating a line needs the columns
    /// `mount -a` cannot do without; updates and removals do not.
    pub fn apply(&mut self, desired: &MountTab) -> MntsyncResult<Outcome> {
        let resource = desired.resource_id();
        let mut outcome = Outcome::new(&resource, Action::Noop);
        outcome.computed = desired.computed.clone();

        match (desired.ensure, self.position(&desired.name)) {
            (Ensure::Absent, None) => {}
            (Ensure::Absent, Some(_)) => {
                self.remove_all(&desired.name);
                outcome.action = Action::Removed;
            }
            (Ensure::Present, None) => {
                let properties = desired.properties(&self.schema);
                for field in ["device", "fstype"] {
                    if self.schema.has_field(field) && !properties.iter().any(|(f, _)| *f == field) {
                        return Err(MntsyncError::validation(
                            field,
                            format!(
                                "{} is required to add {} to {}",
                                field,
                                resource,
                                self.path.display()
                            ),
                        ));
                    }
                }
                let mut values = vec![("name", desired.name.clone())];
                values.extend(properties);
                // A new line never leaves its options column blank.
                if self.schema.has_field("options") && !values.iter().any(|(f, _)| *f == "options") {
                    let marker = desired.empty_options().to_string();
                    outcome.computed.insert("options".to_string(), marker.clone());
                    values.push(("options", marker));
                }
                outcome.changes = values
                    .iter()
                    .filter(|(field, _)| *field != "name")
                    .map(|(field, value)| PropertyChange {
                        property: field.to_string(),
                        from: None,
                        to: value.clone(),
                    })
                    .collect();
                self.push(Record::data(values));
                outcome.action = Action::Created;
            }
            (Ensure::Present, Some(index)) => {
                let properties = desired.properties(&self.schema);
                let record = &mut self.records[index];
                for (field, want) in properties {
                    let current = record.value(&self.schema, field).map(str::to_string);
                    if in_sync(field, current.as_deref(), &want) {
                        continue;
                    }
                    record.set(field, want.clone());
                    outcome.changes.push(PropertyChange {
                        property: field.to_string(),
                        from: current,
                        to: want,
                    });
                }
                if !outcome.changes.is_empty() {
                    outcome.action = Action::Updated;
                }
            }
        }

        if outcome.is_change() {
            self.dirty = true;
            log::info!("{}: {} in {}", resource, outcome.action, self.path.display());
        } else {
            log::debug!("{}: in sync", resource);
        }
        Ok(outcome)
    }

    fn push(&mut self, record: Record) {
        if let Some(last) = self.records.last_mut() {
            last.set_terminated(true);
        }
        self.records.push(record);
    }

    fn remove_all(&mut self, name: &str) {
        let ended_open = self.records.last().is_some_and(|r| !r.is_terminated());
        self.records
            .retain(|r| !(r.is_data() && r.get("name").is_some_and(|n| same_name(n, name))));
        if ended_open {
            if let Some(last) = self.records.last_mut() {
                last.set_terminated(false);
            }
        }
    }

    /// Write the table back if anything changed. Returns whether a write
    /// happened (or would have, in dry-run mode).
    pub fn flush(&mut self, dry_run: bool) -> MntsyncResult<bool> {
        if !self.dirty {
            return Ok(false);
        }
        if dry_run {
            log::info!("DRY RUN: would rewrite {}", self.path.display());
            return Ok(true);
        }
        write_atomic(&self.path, &self.render())?;
        log::info!("wrote {}", self.path.display());
        self.dirty = false;
        Ok(true)
    }
}

fn in_sync(field: &str, current: Option<&str>, want: &str) -> bool {
    match field {
        "options" => OptionSet::from_field(current.unwrap_or("")).in_sync(&OptionSet::from_field(want)),
        "atboot" => current.and_then(AtBoot::parse) == AtBoot::parse(want),
        _ => current == Some(want),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mounttab".to_string());
    path.with_file_name(format!(".{}.mntsync.tmp", name))
}

/// Replace `path` via a temp file in the same directory, keeping the
/// original permissions. A failed write leaves no temp file behind.
fn write_atomic(path: &Path, content: &str) -> MntsyncResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MntsyncError::io(parent, e))?;
    }

    let tmp_path = temp_path(path);
    if let Err(err) = replace_via(&tmp_path, path, content) {
        match fs::remove_file(&tmp_path) {
            Ok(()) => log::debug!("removed {}", tmp_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not remove {}: {}", tmp_path.display(), e),
        }
        return Err(err);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            dir.sync_all().ok();
        }
    }
    Ok(())
}

fn replace_via(tmp_path: &Path, path: &Path, content: &str) -> MntsyncResult<()> {
    let mut file = File::create(tmp_path).map_err(|e| MntsyncError::io(tmp_path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| MntsyncError::io(tmp_path, e))?;
    file.sync_all().map_err(|e| MntsyncError::io(tmp_path, e))?;
    drop(file);

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp_path, meta.permissions())
            .map_err(|e| MntsyncError::io(tmp_path, e))?;
    }

    fs::rename(tmp_path, path).map_err(|e| MntsyncError::io(path, e))
}

/// Every table touched during one run, keyed by path. Each file is read on
/// first use and written at most once by [`TableSet::flush_all`].
#[derive(Debug)]
pub struct TableSet {
    schema: FieldSchema,
    dry_run: bool,
    tables: BTreeMap<PathBuf, MountTable>,
}

impl TableSet {
    pub fn new(schema: &FieldSchema, dry_run: bool) -> Self {
        Self {
            schema: schema.clone(),
            dry_run,
            tables: BTreeMap::new(),
        }
    }

    pub fn table(&mut self, path: &Path) -> MntsyncResult<&mut MountTable> {
        if !self.tables.contains_key(path) {
            let table = MountTable::load(path, &self.schema)?;
            self.tables.insert(path.to_path_buf(), table);
        }
        self.tables
            .get_mut(path)
            .ok_or_else(|| MntsyncError::Config(format!("table {} not loaded", path.display())))
    }

    pub fn apply(&mut self, desired: &MountTab) -> MntsyncResult<Outcome> {
        let dry_run = self.dry_run;
        let mut outcome = self.table(&desired.target)?.apply(desired)?;
        outcome.dry_run = dry_run;
        Ok(outcome)
    }

    /// Flush every dirty table; returns the paths written.
    pub fn flush_all(&mut self) -> MntsyncResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (path, table) in self.tables.iter_mut() {
            if table.flush(self.dry_run)? {
                written.push(path.clone());
            }
        }
        Ok(written)
    }
}
