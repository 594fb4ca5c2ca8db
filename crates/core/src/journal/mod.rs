//! Journal parsing, reading and ingestion into the fleet store.

mod fields;
pub mod parser;
/// Incremental reading of journal files.
pub mod reader;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::fleet::{Applied, FleetStore};

pub use fields::Fields;
pub use parser::{is_known, parse_line, parse_record, parse_tagged};
pub use reader::{is_journal_file, latest_journal, JournalReader};

/// Why a journal record for a known event could not be turned into an event.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The line is not JSON at all.
    #[error("record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Valid JSON, but not an object.
    #[error("record is not a JSON object")]
    NotAnObject,
    /// No `event` key.
    #[error("record has no event tag")]
    MissingEventTag,
    /// No `timestamp` key.
    #[error("{event}: missing timestamp")]
    MissingTimestamp {
        /// Event tag of the record.
        event: String,
    },
    /// A `timestamp` that is not RFC 3339.
    #[error("{event}: invalid timestamp {value:?}")]
    InvalidTimestamp {
        /// Event tag of the record.
        event: String,
        /// The text that failed to parse.
        value: String,
    },
    /// A field the event cannot do without is absent.
    #[error("{event}: missing required field {field}")]
    MissingField {
        /// Event tag of the record.
        event: String,
        /// Journal key that was looked up.
        field: String,
    },
    /// A field is present with the wrong JSON type or range.
    #[error("{event}: field {field} is not a valid {expected}")]
    InvalidField {
        /// Event tag of the record.
        event: String,
        /// Journal key that was looked up.
        field: String,
        /// What the field should have held.
        expected: &'static str,
    },
}

/// What happened to one journal line.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    /// Empty or whitespace-only line.
    Blank,
    /// The event tag has no parser.
    Ignored,
    /// The line could not be parsed and was skipped.
    Malformed,
    /// Handed to the store, with the outcome.
    Applied(Applied),
    /// The event parsed but the fleet rejected it.
    Rejected,
}

/// Parse one journal line and apply it to the store.
///
/// Never fails: parse and mutation errors are logged and the caller moves on
/// to the next line.
pub fn ingest_line(store: &FleetStore, line: &str, replay: bool) -> Ingested {
    let line = line.trim();
    if line.is_empty() {
        return Ingested::Blank;
    }
    let event = match parse_line(line) {
        Ok(Some(event)) => event,
        Ok(None) => return Ingested::Ignored,
        Err(err) => {
            warn!(%err, "Skipping malformed journal record");
            return Ingested::Malformed;
        }
    };
    let event = if replay { event.replayed() } else { event };
    let name = event.name();
    match store.apply_event(&event) {
        Ok(applied) => {
            debug!(event = name, status = ?applied.status, "Applied journal event");
            Ingested::Applied(applied)
        }
        Err(err) => {
            error!(event = name, %err, "Journal event rejected");
            Ingested::Rejected
        }
    }
}
