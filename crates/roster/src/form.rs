//! Entry form state.
//!
//! The form is modelled as a plain value ([`FormState`]) and a pure
//! transition function ([`reduce`]). The [`RecordStore`](crate::RecordStore)
//! keeps the current value and swaps it for the reduced one on every action.
//!
//! ```text
//!            OpenCreate               BeginEdit
//!   Hidden ─────────────▶ Creating ─────────────▶ Editing(id)
//!     │  ▲                   │                      │   ▲
//!     │  └───── Cancel / Submitted ─────────────────┘   │ BeginEdit
//!     └────────────────────── BeginEdit ────────────────┘
//! ```

use crate::record::{Record, RecordId};

/// Which mode the entry form is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    /// The form is not shown.
    #[default]
    Hidden,
    /// The form is shown and a save appends a new record.
    Creating,
    /// The form is shown and a save replaces the record with this id.
    Editing(RecordId),
}

impl FormMode {
    /// Whether the form is shown.
    #[must_use]
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }

    /// The id of the record being edited, if any.
    #[must_use]
    pub fn edit_cursor(self) -> Option<RecordId> {
        match self {
            Self::Editing(id) => Some(id),
            Self::Hidden | Self::Creating => None,
        }
    }
}

/// One of the four draft fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Given name.
    Name,
    /// Family name.
    Surname,
    /// Age.
    Age,
    /// Location.
    Location,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Surname => write!(f, "surname"),
            Self::Age => write!(f, "age"),
            Self::Location => write!(f, "location"),
        }
    }
}

/// Scratch values bound to the form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Age as typed.
    pub age: String,
    /// Location.
    pub location: String,
}

impl Draft {
    /// Build the record this draft describes. No validation is applied.
    #[must_use]
    pub fn to_record(&self) -> Record {
        Record::new(
            self.name.clone(),
            self.surname.clone(),
            self.age.clone(),
            self.location.clone(),
        )
    }

    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Surname => &mut self.surname,
            Field::Age => &mut self.age,
            Field::Location => &mut self.location,
        };
        *slot = value;
    }
}

impl From<Record> for Draft {
    fn from(record: Record) -> Self {
        Self {
            name: record.name,
            surname: record.surname,
            age: record.age,
            location: record.location,
        }
    }
}

/// Complete form state: mode plus draft values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Current mode.
    pub mode: FormMode,
    /// Current draft values.
    pub draft: Draft,
}

/// Something that happened to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// The user asked to add a record.
    OpenCreate,
    /// The user picked an existing record to edit.
    BeginEdit {
        /// Id of the picked record.
        id: RecordId,
        /// Its current contents, copied into the draft.
        record: Record,
    },
    /// An input changed. Ignored while the form is hidden.
    SetField(Field, String),
    /// The user dismissed the form.
    Cancel,
    /// The draft was saved.
    Submitted,
}

/// Compute the form state that follows `action`.
#[must_use]
pub fn reduce(state: &FormState, action: FormAction) -> FormState {
    match action {
        FormAction::OpenCreate => match state.mode {
            FormMode::Hidden => FormState {
                mode: FormMode::Creating,
                draft: Draft::default(),
            },
            FormMode::Creating | FormMode::Editing(_) => state.clone(),
        },
        FormAction::BeginEdit { id, record } => FormState {
            mode: FormMode::Editing(id),
            draft: Draft::from(record),
        },
        FormAction::SetField(..) if !state.mode.is_visible() => state.clone(),
        FormAction::SetField(field, value) => {
            let mut next = state.clone();
            next.draft.set(field, value);
            next
        }
        FormAction::Cancel | FormAction::Submitted => FormState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing(id: u64) -> FormState {
        reduce(
            &FormState::default(),
            FormAction::BeginEdit {
                id: RecordId::new(id),
                record: Record::new("Ali", "Vali", "20", "Tashkent"),
            },
        )
    }

    #[test]
    fn test_default_is_hidden_and_empty() {
        let state = FormState::default();
        assert_eq!(state.mode, FormMode::Hidden);
        assert!(!state.mode.is_visible());
        assert_eq!(state.draft, Draft::default());
    }

    #[test]
    fn test_open_create_from_hidden() {
        let state = reduce(&FormState::default(), FormAction::OpenCreate);
        assert_eq!(state.mode, FormMode::Creating);
        assert!(state.mode.is_visible());
        assert_eq!(state.mode.edit_cursor(), None);
    }

    #[test]
    fn test_open_create_starts_from_empty_draft() {
        let stale = FormState {
            mode: FormMode::Hidden,
            draft: Draft::from(Record::new("ghost", "", "", "")),
        };
        let state = reduce(&stale, FormAction::OpenCreate);
        assert_eq!(state.mode, FormMode::Creating);
        assert_eq!(state.draft, Draft::default());
    }

    #[test]
    fn test_set_field_while_hidden_is_ignored() {
        let hidden = FormState::default();
        let state = reduce(&hidden, FormAction::SetField(Field::Name, "ghost".into()));
        assert_eq!(state, hidden);

        let opened = reduce(&state, FormAction::OpenCreate);
        assert_eq!(opened.draft.name, "");
    }

    #[test]
    fn test_open_create_while_editing_is_ignored() {
        let state = editing(3);
        assert_eq!(reduce(&state, FormAction::OpenCreate), state);
    }

    #[test]
    fn test_begin_edit_copies_record() {
        let state = editing(3);
        assert_eq!(state.mode, FormMode::Editing(RecordId::new(3)));
        assert_eq!(state.mode.edit_cursor(), Some(RecordId::new(3)));
        assert_eq!(state.draft.name, "Ali");
        assert_eq!(state.draft.surname, "Vali");
        assert_eq!(state.draft.age, "20");
        assert_eq!(state.draft.location, "Tashkent");
    }

    #[test]
    fn test_begin_edit_from_creating_replaces_draft() {
        let creating = reduce(&FormState::default(), FormAction::OpenCreate);
        let typed = reduce(&creating, FormAction::SetField(Field::Name, "Zed".into()));
        let state = reduce(
            &typed,
            FormAction::BeginEdit {
                id: RecordId::new(1),
                record: Record::new("Dina", "Be", "31", "Samarkand"),
            },
        );
        assert_eq!(state.mode, FormMode::Editing(RecordId::new(1)));
        assert_eq!(state.draft.name, "Dina");
    }

    #[test]
    fn test_set_field_only_touches_one_field() {
        let state = reduce(
            &editing(0),
            FormAction::SetField(Field::Location, "Bukhara".into()),
        );
        assert_eq!(state.draft.location, "Bukhara");
        assert_eq!(state.draft.name, "Ali");
        assert_eq!(state.draft.age, "20");
        assert_eq!(state.mode, FormMode::Editing(RecordId::new(0)));
    }

    #[test]
    fn test_cancel_and_submit_reset_everything() {
        for action in [FormAction::Cancel, FormAction::Submitted] {
            let state = reduce(&editing(2), action);
            assert_eq!(state, FormState::default());
        }
    }

    #[test]
    fn test_reduce_does_not_mutate_input() {
        let before = editing(5);
        let snapshot = before.clone();
        let _ = reduce(&before, FormAction::Cancel);
        assert_eq!(before, snapshot);
    }

    #[test]
    fn test_draft_set_and_to_record() {
        let mut draft = Draft::default();
        let fields = [Field::Name, Field::Surname, Field::Age, Field::Location];
        for (field, value) in fields.into_iter().zip(["a", "b", "c", "d"]) {
            draft.set(field, value.to_string());
        }
        assert_eq!(draft.to_record(), Record::new("a", "b", "c", "d"));
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::Name.to_string(), "name");
        assert_eq!(Field::Surname.to_string(), "surname");
        assert_eq!(Field::Age.to_string(), "age");
        assert_eq!(Field::Location.to_string(), "location");
    }
}
