use std::fmt;

use thiserror::Error;

use super::editor::NoteEdit;
use super::sort::{sorted, SortOrder};
use super::{Note, NoteDraft, NoteId};
use crate::gateway::{GatewayError, NoteGateway};

pub const DELETE_ALL_PROMPT: &str = "Delete All Notes?";
pub const DELETE_FAILED_ALERT: &str = "Failed to delete note!";
pub const DELETE_ALL_FAILED_ALERT: &str = "Failed to delete all notes!";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note {0} is not in the list")]
    NotFound(NoteId),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub note_id: NoteId,
    pub title: String,
    pub preview: String,
}

impl fmt::Display for DeletePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delete \"{}\": {}...?", self.title, self.preview)
    }
}

/// Orders refetches. Only a snapshot newer than the last applied one is
/// allowed to replace the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HydrateTicket(pub u64);

#[derive(Debug, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    sort: SortOrder,
    issued: u64,
    applied: u64,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn position(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn begin_hydrate(&mut self) -> HydrateTicket {
        self.issued += 1;
        HydrateTicket(self.issued)
    }

    /// Applies a fetched snapshot. Returns `Ok(false)` when a newer snapshot
    /// has already been applied. On error the collection is left alone.
    pub fn finish_hydrate(
        &mut self,
        ticket: HydrateTicket,
        result: Result<Vec<Note>, GatewayError>,
    ) -> Result<bool, GatewayError> {
        let notes = match result {
            Ok(notes) => notes,
            Err(err) => {
                tracing::error!(%err, ticket = ticket.0, "failed to fetch notes");
                return Err(err);
            }
        };
        if ticket.0 <= self.applied {
            tracing::debug!(
                ticket = ticket.0,
                applied = self.applied,
                "discarding stale note snapshot"
            );
            return Ok(false);
        }
        self.applied = ticket.0;
        self.notes = notes;
        self.sort = SortOrder::DateDescending;
        Ok(true)
    }

    pub fn hydrate(&mut self, gateway: &dyn NoteGateway) -> Result<bool, GatewayError> {
        let ticket = self.begin_hydrate();
        self.finish_hydrate(ticket, gateway.list())
    }

    /// Refetch after a successful write. The write stands even when the
    /// refetch fails; the cached notes are kept and the failure is logged.
    fn refetch(&mut self, gateway: &dyn NoteGateway) {
        if self.hydrate(gateway).is_err() {
            tracing::warn!(backend = gateway.name(), "keeping cached notes after failed refetch");
        }
    }

    pub fn insert_created(&mut self, note: Note) {
        self.notes.retain(|existing| existing.id != note.id);
        self.notes.insert(0, note);
    }

    pub fn create(
        &mut self,
        gateway: &dyn NoteGateway,
        draft: &NoteDraft,
    ) -> Result<Note, GatewayError> {
        match gateway.create(draft) {
            Ok(note) => {
                self.insert_created(note.clone());
                Ok(note)
            }
            Err(err) => {
                tracing::error!(%err, backend = gateway.name(), "failed to create note");
                Err(err)
            }
        }
    }

    pub fn prepare_delete(&self, id: NoteId) -> Result<DeletePrompt, StoreError> {
        let note = self.get(id).ok_or(StoreError::NotFound(id))?;
        Ok(DeletePrompt {
            note_id: id,
            title: note.title.clone(),
            preview: note.content_preview(),
        })
    }

    /// Deletes after `confirm` agrees, then refetches. An unknown id aborts
    /// before the gateway is contacted.
    pub fn delete_one<F>(
        &mut self,
        gateway: &dyn NoteGateway,
        id: NoteId,
        confirm: F,
    ) -> Result<DeleteOutcome, StoreError>
    where
        F: FnOnce(&DeletePrompt) -> bool,
    {
        let prompt = self.prepare_delete(id)?;
        if !confirm(&prompt) {
            return Ok(DeleteOutcome::Cancelled);
        }
        if let Err(err) = gateway.delete_one(id) {
            tracing::error!(%err, %id, "failed to delete note");
            return Err(err.into());
        }
        self.refetch(gateway);
        Ok(DeleteOutcome::Deleted)
    }

    pub fn delete_all<F>(
        &mut self,
        gateway: &dyn NoteGateway,
        confirm: F,
    ) -> Result<DeleteOutcome, GatewayError>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(DELETE_ALL_PROMPT) {
            return Ok(DeleteOutcome::Cancelled);
        }
        if let Err(err) = gateway.delete_all() {
            tracing::error!(%err, "failed to delete all notes");
            return Err(err);
        }
        self.refetch(gateway);
        Ok(DeleteOutcome::Deleted)
    }

    pub fn apply_local_edit(
        &mut self,
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or(StoreError::NotFound(id))?;
        note.title = title.into();
        note.content = content.into();
        Ok(())
    }

    pub fn apply_edit(&mut self, edit: &NoteEdit) -> Result<(), StoreError> {
        self.apply_local_edit(edit.note_id, edit.title.clone(), edit.content.clone())
    }

    pub fn save_edit(
        &mut self,
        gateway: &dyn NoteGateway,
        edit: &NoteEdit,
    ) -> Result<(), StoreError> {
        self.apply_edit(edit)?;
        if let Err(err) = gateway.update(edit.note_id, &edit.draft()) {
            tracing::error!(%err, id = %edit.note_id, "failed to persist note edit");
            return Err(err.into());
        }
        self.refetch(gateway);
        Ok(())
    }

    pub fn sort_by(&mut self, order: SortOrder) {
        self.notes = sorted(&self.notes, order);
        self.sort = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::EmbeddedGateway;
    use crate::notes::InstantNanos;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    fn embedded() -> anyhow::Result<(TempDir, EmbeddedGateway)> {
        let temp = TempDir::new()?;
        let gateway = EmbeddedGateway::open(&temp.path().join("notes.db"), 1000)?;
        Ok((temp, gateway))
    }

    #[derive(Default)]
    struct FailingGateway {
        calls: Mutex<Vec<&'static str>>,
        listed: Vec<Note>,
    }

    impl FailingGateway {
        fn refuse(&self, op: &'static str) -> GatewayError {
            self.calls.lock().push(op);
            GatewayError::Status {
                status: 503,
                message: "unavailable".into(),
            }
        }
    }

    impl NoteGateway for FailingGateway {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn create(&self, _draft: &NoteDraft) -> Result<Note, GatewayError> {
            Err(self.refuse("create"))
        }

        fn list(&self) -> Result<Vec<Note>, GatewayError> {
            self.calls.lock().push("list");
            Ok(self.listed.clone())
        }

        fn delete_one(&self, _id: NoteId) -> Result<(), GatewayError> {
            Err(self.refuse("delete_one"))
        }

        fn delete_all(&self) -> Result<(), GatewayError> {
            Err(self.refuse("delete_all"))
        }

        fn update(&self, _id: NoteId, _draft: &NoteDraft) -> Result<Note, GatewayError> {
            Err(self.refuse("update"))
        }
    }

    struct ListDownGateway;

    impl NoteGateway for ListDownGateway {
        fn name(&self) -> &'static str {
            "list-down"
        }

        fn create(&self, draft: &NoteDraft) -> Result<Note, GatewayError> {
            Ok(note(7, &draft.title, &draft.content, 70))
        }

        fn list(&self) -> Result<Vec<Note>, GatewayError> {
            Err(GatewayError::Status {
                status: 503,
                message: "list down".into(),
            })
        }

        fn delete_one(&self, _id: NoteId) -> Result<(), GatewayError> {
            Ok(())
        }

        fn delete_all(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        fn update(&self, id: NoteId, draft: &NoteDraft) -> Result<Note, GatewayError> {
            Ok(note(id.0, &draft.title, &draft.content, 10))
        }
    }

    fn note(id: u64, title: &str, content: &str, ts: i128) -> Note {
        Note {
            id: NoteId(id),
            title: title.into(),
            content: content.into(),
            time_stamp: InstantNanos(ts),
        }
    }

    #[test]
    fn create_prepends_canonical_note() -> anyhow::Result<()> {
        let (_temp, gateway) = embedded()?;
        let mut store = NoteStore::new();
        store.create(&gateway, &NoteDraft::new("first", "1"))?;
        let created = store.create(&gateway, &NoteDraft::new("second", "2"))?;

        assert_eq!(store.len(), 2);
        assert_eq!(store.notes()[0], created);
        assert_eq!(store.notes()[0].title, "second");
        assert_eq!(store.notes()[0].content, "2");
        assert_ne!(store.notes()[0].id, store.notes()[1].id);
        Ok(())
    }

    #[test]
    fn empty_draft_is_accepted() -> anyhow::Result<()> {
        let (_temp, gateway) = embedded()?;
        let mut store = NoteStore::new();
        store.create(&gateway, &NoteDraft::new("seed", "x"))?;
        store.create(&gateway, &NoteDraft::default())?;
        assert_eq!(store.notes()[0].title, "");
        assert_eq!(store.notes()[0].content, "");
        Ok(())
    }

    #[test]
    fn failed_create_leaves_collection_unchanged() {
        let gateway = FailingGateway::default();
        let mut store = NoteStore::new();
        store.insert_created(note(1, "kept", "", 1));
        assert_matches!(
            store.create(&gateway, &NoteDraft::new("t", "c")),
            Err(GatewayError::Status { status: 503, .. })
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn hydrate_replaces_collection_and_resets_sort() -> anyhow::Result<()> {
        let (_temp, gateway) = embedded()?;
        let a = gateway.create(&NoteDraft::new("a", ""))?;
        let b = gateway.create(&NoteDraft::new("b", ""))?;

        let mut store = NoteStore::new();
        store.insert_created(note(99, "local only", "", 0));
        store.sort_by(SortOrder::TitleAscending);
        assert!(store.hydrate(&gateway)?);

        assert_eq!(store.notes(), &[b, a]);
        assert_eq!(store.sort_order(), SortOrder::DateDescending);
        Ok(())
    }

    #[test]
    fn stale_snapshot_never_overwrites_newer_one() {
        let mut store = NoteStore::new();
        let older = store.begin_hydrate();
        let newer = store.begin_hydrate();

        let applied = store
            .finish_hydrate(newer, Ok(vec![note(2, "new", "", 2)]))
            .expect("newer");
        assert!(applied);
        let applied = store
            .finish_hydrate(older, Ok(vec![note(1, "old", "", 1)]))
            .expect("older");
        assert!(!applied);
        assert_eq!(store.notes()[0].title, "new");
    }

    #[test]
    fn failed_hydrate_keeps_collection() {
        let mut store = NoteStore::new();
        store.insert_created(note(1, "kept", "", 1));
        let ticket = store.begin_hydrate();
        let result = store.finish_hydrate(
            ticket,
            Err(GatewayError::Decode("truncated".into())),
        );
        assert_matches!(result, Err(GatewayError::Decode(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_one_refetches_without_the_note() -> anyhow::Result<()> {
        let (_temp, gateway) = embedded()?;
        let mut store = NoteStore::new();
        let keep = store.create(&gateway, &NoteDraft::new("keep", "k"))?;
        let doomed = store.create(&gateway, &NoteDraft::new("Groceries", "milk, eggs, butter"))?;

        let mut shown = None;
        let outcome = store.delete_one(&gateway, doomed.id, |prompt| {
            shown = Some(prompt.to_string());
            true
        })?;

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(
            shown.as_deref(),
            Some("Delete \"Groceries\": milk, eggs...?")
        );
        assert!(store.get(doomed.id).is_none());
        assert_eq!(store.notes(), &[keep]);
        Ok(())
    }

    #[test]
    fn declined_delete_changes_nothing() -> anyhow::Result<()> {
        let (_temp, gateway) = embedded()?;
        let mut store = NoteStore::new();
        let note = store.create(&gateway, &NoteDraft::new("t", "c"))?;
        let outcome = store.delete_one(&gateway, note.id, |_| false)?;
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(gateway.list()?.len(), 1);
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn unknown_id_never_reaches_gateway() {
        let gateway = FailingGateway::default();
        let mut store = NoteStore::new();
        let mut asked = false;
        let result = store.delete_one(&gateway, NoteId(7), |_| {
            asked = true;
            true
        });
        assert_matches!(result, Err(StoreError::NotFound(NoteId(7))));
        assert!(!asked);
        assert!(gateway.calls.lock().is_empty());
    }

    #[test]
    fn failed_delete_leaves_state_and_skips_refetch() {
        let gateway = FailingGateway::default();
        let mut store = NoteStore::new();
        store.insert_created(note(1, "t", "c", 1));
        let result = store.delete_one(&gateway, NoteId(1), |_| true);
        assert_matches!(result, Err(StoreError::Gateway(GatewayError::Status { .. })));
        assert_eq!(store.len(), 1);
        assert_eq!(*gateway.calls.lock(), vec!["delete_one"]);
    }

    #[test]
    fn delete_all_empties_collection() -> anyhow::Result<()> {
        let (_temp, gateway) = embedded()?;
        let mut store = NoteStore::new();
        store.create(&gateway, &NoteDraft::new("a", ""))?;
        store.create(&gateway, &NoteDraft::new("b", ""))?;

        let mut prompt = String::new();
        let outcome = store.delete_all(&gateway, |text| {
            prompt = text.to_string();
            true
        })?;
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(prompt, DELETE_ALL_PROMPT);
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn failed_delete_all_keeps_notes() {
        let gateway = FailingGateway::default();
        let mut store = NoteStore::new();
        store.insert_created(note(1, "t", "c", 1));
        assert!(store.delete_all(&gateway, |_| true).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn writes_succeed_even_when_refetch_fails() {
        let mut store = NoteStore::new();
        store.insert_created(note(1, "old", "x", 10));
        store.insert_created(note(2, "gone", "y", 20));

        let edit = NoteEdit {
            note_id: NoteId(1),
            title: "new".into(),
            content: "z".into(),
        };
        assert_matches!(store.save_edit(&ListDownGateway, &edit), Ok(()));
        assert_eq!(store.get(NoteId(1)).map(|n| n.title.as_str()), Some("new"));

        assert_matches!(
            store.delete_one(&ListDownGateway, NoteId(2), |_| true),
            Ok(DeleteOutcome::Deleted)
        );
        assert_matches!(
            store.delete_all(&ListDownGateway, |_| true),
            Ok(DeleteOutcome::Deleted)
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn local_edit_keeps_timestamp_and_position() {
        let mut store = NoteStore::new();
        store.insert_created(note(1, "old", "x", 10));
        store.insert_created(note(2, "other", "y", 20));
        store
            .apply_local_edit(NoteId(1), "new", "z")
            .expect("edit");
        assert_eq!(store.notes()[1], note(1, "new", "z", 10));
        assert_matches!(
            store.apply_local_edit(NoteId(3), "", ""),
            Err(StoreError::NotFound(NoteId(3)))
        );
    }

    #[test]
    fn save_edit_persists_through_gateway() -> anyhow::Result<()> {
        let (_temp, gateway) = embedded()?;
        let mut store = NoteStore::new();
        let created = store.create(&gateway, &NoteDraft::new("draft", "text"))?;
        let edit = NoteEdit {
            note_id: created.id,
            title: "final".into(),
            content: "words".into(),
        };
        store.save_edit(&gateway, &edit)?;

        let persisted = gateway.list()?;
        assert_eq!(persisted[0].title, "final");
        assert_eq!(persisted[0].time_stamp, created.time_stamp);
        assert_eq!(store.notes(), persisted.as_slice());
        Ok(())
    }

    #[test]
    fn failed_update_keeps_local_edit() {
        let gateway = FailingGateway::default();
        let mut store = NoteStore::new();
        store.insert_created(note(1, "old", "x", 10));
        let edit = NoteEdit {
            note_id: NoteId(1),
            title: "new".into(),
            content: "y".into(),
        };
        assert!(store.save_edit(&gateway, &edit).is_err());
        assert_eq!(store.notes()[0].title, "new");
    }

    #[test]
    fn sort_records_applied_order() {
        let mut store = NoteStore::new();
        store.insert_created(note(1, "b", "", 100));
        store.insert_created(note(2, "a", "", 300));
        store.insert_created(note(3, "c", "", 200));
        store.sort_by(SortOrder::TitleAscending);
        let titles: Vec<_> = store.notes().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(store.sort_order(), SortOrder::TitleAscending);
    }
}
