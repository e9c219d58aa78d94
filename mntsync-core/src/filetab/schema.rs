use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Column layout of a table file.
///
/// The first `mandatory` fields must be present for a line to count as a
/// record; the rest are optional and may carry a default.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<&'static str>,
    mandatory: usize,
    defaults: Vec<Option<&'static str>>,
    separator: Regex,
    joiner: &'static str,
    absent_marker: &'static str,
}

impl FieldSchema {
    /// Whitespace-separated, tab-joined schema without defaults.
    pub fn new(fields: &[&'static str], mandatory: usize) -> Self {
        Self {
            fields: fields.to_vec(),
            mandatory: mandatory.min(fields.len()),
            defaults: vec![None; fields.len()],
            separator: WHITESPACE.clone(),
            joiner: "\t",
            absent_marker: "-",
        }
    }

    /// Defaults per field position; missing trailing entries mean no default.
    pub fn with_defaults(mut self, defaults: &[Option<&'static str>]) -> Self {
        for (slot, value) in self.defaults.iter_mut().zip(defaults) {
            *slot = *value;
        }
        self
    }

    /// `/etc/vfstab`: every column is required.
    pub fn solaris() -> Self {
        Self::new(
            &[
                "device",
                "blockdevice",
                "name",
                "fstype",
                "pass",
                "atboot",
                "options",
            ],
            7,
        )
    }

    /// `/etc/fstab`: only device and mount point are required.
    pub fn generic() -> Self {
        Self::new(&["device", "name", "fstype", "options", "dump", "pass"], 2).with_defaults(&[
            None,
            None,
            None,
            None,
            Some("0"),
            Some("2"),
        ])
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn mandatory_count(&self) -> usize {
        self.mandatory
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    pub fn is_mandatory(&self, field: &str) -> bool {
        self.position(field).is_some_and(|i| i < self.mandatory)
    }

    pub fn default_for(&self, field: &str) -> Option<&'static str> {
        self.position(field).and_then(|i| self.defaults[i])
    }

    pub fn separator(&self) -> &Regex {
        &self.separator
    }

    pub fn joiner(&self) -> &'static str {
        self.joiner
    }

    /// Placeholder written for an empty column that is followed by a
    /// populated one.
    pub fn absent_marker(&self) -> &'static str {
        self.absent_marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_schema_layout() {
        let schema = FieldSchema::generic();
        assert_eq!(
            schema.fields(),
            &["device", "name", "fstype", "options", "dump", "pass"]
        );
        assert_eq!(schema.mandatory_count(), 2);
        assert!(schema.is_mandatory("name"));
        assert!(!schema.is_mandatory("fstype"));
        assert_eq!(schema.default_for("dump"), Some("0"));
        assert_eq!(schema.default_for("pass"), Some("2"));
        assert_eq!(schema.default_for("options"), None);
        assert!(!schema.has_field("blockdevice"));
    }

    #[test]
    fn solaris_schema_requires_all_columns() {
        let schema = FieldSchema::solaris();
        assert_eq!(schema.mandatory_count(), 7);
        assert_eq!(schema.position("atboot"), Some(5));
        assert!(schema.is_mandatory("options"));
        assert_eq!(schema.joiner(), "\t");
    }

    #[test]
    fn mandatory_count_is_clamped() {
        let schema = FieldSchema::new(&["a", "b"], 5);
        assert_eq!(schema.mandatory_count(), 2);
    }
}
