//! `roster` - Keep an ordered list of person records in a key-value store
//!
//! This library holds the record collection, the entry form state machine,
//! and the storage backends the collection is mirrored to after every change.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod record;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use form::{Field, FormAction, FormMode, FormState};
pub use logging::init_logging;
pub use record::{Record, RecordId};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StorageStats};
pub use store::{Entry, RecordStore, SaveOutcome};
