//! Core data model for mm.
//!
//! Only log records live here: the provenance graph is rebuilt from them
//! on every invocation and is never stored.

mod record;

pub use record::{CommandRecord, LogRecord, MoveRecord};
