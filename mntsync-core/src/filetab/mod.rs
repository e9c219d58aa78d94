//! Schema-driven reader/writer for line-oriented system tables.
//!
//! Knows nothing about mounts: a [`FieldSchema`] supplies the column names,
//! how many of them are mandatory and how to split and join a line.

pub mod engine;
pub mod schema;

pub use engine::{classify, parse, parse_line, serialize, to_line, LineKind, Record};
pub use schema::FieldSchema;
