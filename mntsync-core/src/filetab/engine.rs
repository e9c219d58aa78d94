//! Line classification, parsing and serialization.
//!
//! Every line of the input becomes exactly one [`Record`]. Lines that are not
//! touched after parsing are written back from their raw text, so
//! `serialize(parse(text))` is the identity.

use super::FieldSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#").expect("static regex"));
static BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    Blank,
    /// Fewer columns than the schema requires. Kept verbatim, the same way
    /// `mount -a` silently ignores such lines.
    Incomplete,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    kind: LineKind,
    raw: String,
    values: BTreeMap<String, String>,
    modified: bool,
    terminated: bool,
}

impl Record {
    /// A new data record that is not backed by any existing line.
    pub fn data<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: LineKind::Data,
            raw: String::new(),
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v)| !v.is_empty())
                .collect(),
            modified: true,
            terminated: true,
        }
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn is_data(&self) -> bool {
        self.kind == LineKind::Data
    }

    /// The line as read, without its terminator. Empty for new records.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether the line ended with `\n` in the source text.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn set_terminated(&mut self, terminated: bool) {
        self.terminated = terminated;
    }

    /// Value explicitly present on the line.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Value present on the line, falling back to the schema default.
    pub fn value<'a>(&'a self, schema: &FieldSchema, field: &str) -> Option<&'a str> {
        self.get(field).or_else(|| schema.default_for(field))
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set `field`, returning whether the record changed. Only data records
    /// carry fields; other kinds are left alone.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> bool {
        if self.kind != LineKind::Data {
            return false;
        }
        let value = value.into();
        if value.is_empty() {
            return self.unset(field);
        }
        if self.get(field) == Some(value.as_str()) {
            return false;
        }
        self.values.insert(field.to_string(), value);
        self.modified = true;
        true
    }

    pub fn unset(&mut self, field: &str) -> bool {
        if self.values.remove(field).is_some() {
            self.modified = true;
            true
        } else {
            false
        }
    }
}

pub fn classify(line: &str, schema: &FieldSchema) -> LineKind {
    if COMMENT.is_match(line) {
        LineKind::Comment
    } else if BLANK.is_match(line) {
        LineKind::Blank
    } else if line.split_whitespace().count() < schema.mandatory_count() {
        LineKind::Incomplete
    } else {
        LineKind::Data
    }
}

/// Parse a single line (without terminator).
pub fn parse_line(line: &str, schema: &FieldSchema) -> Record {
    let kind = classify(line, schema);
    let mut values = BTreeMap::new();

    if kind == LineKind::Data {
        let fields = schema.fields();
        let tokens: Vec<&str> = schema.separator().split(line.trim()).collect();
        for (i, field) in fields.iter().enumerate() {
            let value = if i + 1 == fields.len() && tokens.len() > fields.len() {
                // Surplus columns are folded into the last field.
                tokens[i..].join(" ")
            } else {
                match tokens.get(i) {
                    Some(token) => token.to_string(),
                    None => break,
                }
            };
            if !value.is_empty() {
                values.insert(field.to_string(), value);
            }
        }
    }

    Record {
        kind,
        raw: line.to_string(),
        values,
        modified: false,
        terminated: true,
    }
}

pub fn parse(text: &str, schema: &FieldSchema) -> Vec<Record> {
    text.split_inclusive('\n')
        .map(|chunk| {
            let (line, terminated) = match chunk.strip_suffix('\n') {
                Some(line) => (line, true),
                None => (chunk, false),
            };
            let mut record = parse_line(line, schema);
            record.terminated = terminated;
            record
        })
        .collect()
}

/// Render a record from its fields. Non-data records render as their raw
/// text.
pub fn to_line(record: &Record, schema: &FieldSchema) -> String {
    if record.kind != LineKind::Data {
        return record.raw.clone();
    }

    let fields = schema.fields();
    let last = fields
        .iter()
        .enumerate()
        .filter(|(i, f)| *i < schema.mandatory_count() || record.get(f).is_some())
        .map(|(i, _)| i)
        .last();
    let Some(last) = last else {
        return String::new();
    };

    fields[..=last]
        .iter()
        .map(|f| {
            record
                .get(f)
                .or_else(|| schema.default_for(f))
                .unwrap_or(schema.absent_marker())
        })
        .collect::<Vec<_>>()
        .join(schema.joiner())
}

pub fn serialize(records: &[Record], schema: &FieldSchema) -> String {
    let mut out = String::new();
    for record in records {
        if record.kind == LineKind::Data && record.modified {
            out.push_str(&to_line(record, schema));
        } else {
            out.push_str(&record.raw);
        }
        if record.terminated {
            out.push('\n');
        }
    }
    out
}
