//! The record store controller.
//!
//! [`RecordStore`] owns the record collection, the entry form state and the
//! live search term. The durable copy of the collection is read once in
//! [`RecordStore::initialize`] and rewritten synchronously at the end of
//! every operation that changes the collection.

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::form::{reduce, Field, FormAction, FormState};
use crate::record::{decode_collection, encode_collection, Record, RecordId};
use crate::storage::KeyValueStore;

/// Storage key the collection is kept under unless configured otherwise.
pub const DEFAULT_COLLECTION_KEY: &str = "items";

/// What a save did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new record was added at the end.
    Appended {
        /// Position of the new record.
        position: usize,
    },
    /// The record being edited was overwritten in place.
    Replaced {
        /// Position of the overwritten record.
        position: usize,
    },
}

impl SaveOutcome {
    /// Position of the saved record.
    #[must_use]
    pub fn position(self) -> usize {
        match self {
            Self::Appended { position } | Self::Replaced { position } => position,
        }
    }
}

/// A record together with where it currently sits in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    /// Current position. Not stable across deletions.
    pub position: usize,
    /// Stable in-memory id.
    pub id: RecordId,
    /// The record itself.
    pub record: &'a Record,
}

/// Record store controller over a durable key-value backend.
#[derive(Debug)]
pub struct RecordStore<S: KeyValueStore> {
    backend: S,
    key: String,
    records: Vec<Record>,
    /// Parallel to `records`.
    ids: Vec<RecordId>,
    next_id: u64,
    form: FormState,
    search_term: String,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Load the collection stored under [`DEFAULT_COLLECTION_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. Stored content that
    /// does not decode is logged and replaced by an empty collection.
    pub fn initialize(backend: S) -> Result<Self> {
        Self::initialize_with_key(backend, DEFAULT_COLLECTION_KEY)
    }

    /// Load the collection stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. Stored content that
    /// does not decode is logged and replaced by an empty collection.
    pub fn initialize_with_key(backend: S, key: impl Into<String>) -> Result<Self> {
        let key = key.into();

        let loaded = match backend.get(&key)? {
            None => {
                debug!("No stored collection under key {key}");
                Vec::new()
            }
            Some(raw) => decode_collection(&key, &raw).unwrap_or_else(|err| {
                warn!("{err}; starting with an empty collection");
                Vec::new()
            }),
        };

        debug!(count = loaded.len(), key = %key, "Loaded record collection");

        let mut store = Self {
            backend,
            key,
            records: Vec::with_capacity(loaded.len()),
            ids: Vec::with_capacity(loaded.len()),
            next_id: 0,
            form: FormState::default(),
            search_term: String::new(),
        };
        for record in loaded {
            store.push(record);
        }
        Ok(store)
    }

    // === Form ===

    /// Show the form for a new record. Ignored while the form is already open.
    pub fn open_form(&mut self) {
        self.dispatch(FormAction::OpenCreate);
    }

    /// Update one draft field. Ignored while the form is hidden.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.dispatch(FormAction::SetField(field, value.into()));
    }

    /// Update several draft fields. Fields not listed keep their value.
    pub fn set_fields<I, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (Field, V)>,
        V: Into<String>,
    {
        for (field, value) in fields {
            self.set_field(field, value);
        }
    }

    /// Start editing the record at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if there is no record at `position`;
    /// the form is left untouched.
    pub fn begin_edit(&mut self, position: usize) -> Result<()> {
        let (Some(record), Some(&id)) = (self.records.get(position), self.ids.get(position)) else {
            return Err(Error::out_of_range(position, self.len()));
        };
        let record = record.clone();
        debug!(position, %id, "Editing record");
        self.dispatch(FormAction::BeginEdit { id, record });
        Ok(())
    }

    /// Start editing the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRecord`] if no record has this id.
    pub fn begin_edit_by_id(&mut self, id: RecordId) -> Result<()> {
        let position = self
            .position_of(id)
            .ok_or(Error::UnknownRecord { id: id.get() })?;
        self.begin_edit(position)
    }

    /// Close the form and drop the draft. The collection is not touched.
    pub fn cancel(&mut self) {
        self.dispatch(FormAction::Cancel);
    }

    /// Save the draft.
    ///
    /// Replaces the record under the edit cursor, or appends when there is
    /// none. If the record under the cursor was deleted in the meantime the
    /// draft is appended instead. The form is then reset and hidden, and the
    /// collection is written to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails. The in-memory change is
    /// kept in that case.
    pub fn submit_draft(&mut self) -> Result<SaveOutcome> {
        let candidate = self.form.draft.to_record();

        let outcome = match self.form.mode.edit_cursor() {
            Some(id) => {
                if let Some(position) = self.position_of(id) {
                    self.records[position] = candidate;
                    SaveOutcome::Replaced { position }
                } else {
                    warn!(%id, "Record being edited no longer exists, saving as new");
                    self.append(candidate)
                }
            }
            None => self.append(candidate),
        };

        debug!(?outcome, "Saved draft");
        self.dispatch(FormAction::Submitted);
        self.collection_changed()?;
        Ok(outcome)
    }

    /// Overwrite some fields of the record at `position` and save it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if there is no record at `position`, or
    /// the backend error if the write fails.
    pub fn update_at<I, V>(&mut self, position: usize, fields: I) -> Result<SaveOutcome>
    where
        I: IntoIterator<Item = (Field, V)>,
        V: Into<String>,
    {
        self.begin_edit(position)?;
        self.set_fields(fields);
        self.submit_draft()
    }

    // === Collection ===

    /// Remove the record at `position`, shifting later records down.
    ///
    /// Returns the removed record, or `None` (and writes nothing) if
    /// `position` is out of range.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn delete_at(&mut self, position: usize) -> Result<Option<Record>> {
        if position >= self.records.len() {
            debug!(position, len = self.records.len(), "Ignoring delete out of range");
            return Ok(None);
        }

        let removed = self.records.remove(position);
        let id = self.ids.remove(position);
        debug!(position, %id, "Deleted record");

        self.collection_changed()?;
        Ok(Some(removed))
    }

    /// Remove the record with the given id, if it still exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn delete_by_id(&mut self, id: RecordId) -> Result<Option<Record>> {
        match self.position_of(id) {
            Some(position) => self.delete_at(position),
            None => Ok(None),
        }
    }

    /// Records whose name, surname or location contains `term`, ignoring
    /// case, in collection order. An empty term returns everything.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Record> {
        self.search_entries(term)
            .into_iter()
            .map(|entry| entry.record)
            .collect()
    }

    /// Like [`RecordStore::search`], keeping each record's position and id.
    #[must_use]
    pub fn search_entries(&self, term: &str) -> Vec<Entry<'_>> {
        let needle = term.to_lowercase();
        self.entries()
            .filter(|entry| needle.is_empty() || entry.record.matches_needle(&needle))
            .collect()
    }

    /// Set the live search term used by [`RecordStore::visible_entries`].
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        trace!(term = %self.search_term, "Search term changed");
    }

    /// The live search term.
    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Entries matching the live search term.
    #[must_use]
    pub fn visible_entries(&self) -> Vec<Entry<'_>> {
        self.search_entries(&self.search_term)
    }

    // === Accessors ===

    /// All records in order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// All records with their positions and ids.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.records
            .iter()
            .zip(&self.ids)
            .enumerate()
            .map(|(position, (record, &id))| Entry {
                position,
                id,
                record,
            })
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// The id of the record at `position`.
    #[must_use]
    pub fn id_at(&self, position: usize) -> Option<RecordId> {
        self.ids.get(position).copied()
    }

    /// Current position of the record with the given id.
    #[must_use]
    pub fn position_of(&self, id: RecordId) -> Option<usize> {
        self.ids.iter().position(|&candidate| candidate == id)
    }

    /// Current form state.
    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Position of the record being edited, if the form is editing one that
    /// still exists.
    #[must_use]
    pub fn edit_cursor(&self) -> Option<usize> {
        self.form
            .mode
            .edit_cursor()
            .and_then(|id| self.position_of(id))
    }

    /// The storage key the collection is written to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The durable backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Give up the controller and return its backend.
    #[must_use]
    pub fn into_backend(self) -> S {
        self.backend
    }

    // === Internals ===

    fn dispatch(&mut self, action: FormAction) {
        self.form = reduce(&self.form, action);
        trace!(mode = ?self.form.mode, "Form state changed");
    }

    fn push(&mut self, record: Record) -> RecordId {
        let id = RecordId::new(self.next_id);
        self.next_id += 1;
        self.records.push(record);
        self.ids.push(id);
        id
    }

    fn append(&mut self, record: Record) -> SaveOutcome {
        self.push(record);
        SaveOutcome::Appended {
            position: self.records.len() - 1,
        }
    }

    /// Runs after every change to the collection: mirrors it to the backend.
    fn collection_changed(&mut self) -> Result<()> {
        let encoded = encode_collection(&self.records)?;
        self.backend.set(&self.key, &encoded)?;
        trace!(count = self.records.len(), key = %self.key, "Persisted collection");
        Ok(())
    }
}
