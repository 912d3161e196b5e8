use crate::app::worker::{DraftOrigin, Reply, Request};
use crate::notes::composer::{ComposerControl, DraftComposer};
use crate::notes::editor::NoteEditor;
use crate::notes::format::TimestampFormatter;
use crate::notes::sort::SortOrder;
use crate::notes::store::{
    DeletePrompt, NoteStore, StoreError, DELETE_ALL_FAILED_ALERT, DELETE_FAILED_ALERT,
};
use crate::notes::{Note, NoteId};
use crate::sources::SourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Composer,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    ConfirmDelete(DeletePrompt),
    ConfirmDeleteAll,
    Alert(String),
}

/// Everything the page shows. Backend calls never happen here; methods hand
/// back the `Request`s the caller should send to the worker.
#[derive(Debug)]
pub struct AppState {
    store: NoteStore,
    composer: DraftComposer,
    editor: Option<NoteEditor>,
    selected: usize,
    focus: FocusPane,
    overlay: Option<Overlay>,
    status_message: Option<String>,
    formatter: TimestampFormatter,
    persist_edits: bool,
    pending: usize,
    submitting: bool,
}

impl AppState {
    pub fn new(formatter: TimestampFormatter, persist_edits: bool) -> Self {
        Self {
            store: NoteStore::new(),
            composer: DraftComposer::new(),
            editor: None,
            selected: 0,
            focus: FocusPane::List,
            overlay: None,
            status_message: None,
            formatter,
            persist_edits,
            pending: 0,
            submitting: false,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn notes(&self) -> &[Note] {
        self.store.notes()
    }

    pub fn composer(&self) -> &DraftComposer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut DraftComposer {
        &mut self.composer
    }

    pub fn formatter(&self) -> &TimestampFormatter {
        &self.formatter
    }

    pub fn focus(&self) -> FocusPane {
        self.focus
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn set_pending(&mut self, pending: usize) {
        self.pending = pending;
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.store.notes().get(self.selected)
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.store.is_empty() {
            return;
        }
        let last = self.store.len() as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, last);
        self.selected = next as usize;
    }

    fn select_by_id(&mut self, id: Option<NoteId>) {
        self.selected = id
            .and_then(|id| self.store.position(id))
            .unwrap_or(self.selected);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.store.len().saturating_sub(1));
    }

    pub fn alert(&mut self, message: impl Into<String>) {
        self.overlay = Some(Overlay::Alert(message.into()));
    }

    // composer

    pub fn focus_composer(&mut self, control: ComposerControl) {
        self.focus = FocusPane::Composer;
        self.composer.focus_control(control);
    }

    pub fn blur_composer(&mut self) {
        self.composer.blur(None);
        self.focus = FocusPane::List;
    }

    /// `None` while the previous typed note is still being saved.
    pub fn submit_typed(&mut self) -> Option<Request> {
        if self.submitting {
            self.set_status_message(Some("Still saving the last note"));
            return None;
        }
        self.submitting = true;
        Some(Request::Create {
            draft: self.composer.draft(),
            origin: DraftOrigin::Typed,
        })
    }

    pub fn request_source(&self, kind: SourceKind) -> Request {
        Request::Fetch(kind)
    }

    pub fn request_hydrate(&mut self) -> Request {
        Request::Hydrate(self.store.begin_hydrate())
    }

    // editing

    pub fn editor(&self) -> Option<&NoteEditor> {
        self.editor.as_ref().filter(|editor| editor.is_editing())
    }

    pub fn editor_mut(&mut self) -> Option<&mut NoteEditor> {
        self.editor.as_mut().filter(|editor| editor.is_editing())
    }

    pub fn is_editing(&self) -> bool {
        self.editor().is_some()
    }

    pub fn begin_edit_selected(&mut self) -> bool {
        if let Some(open_id) = self.editor().map(NoteEditor::note_id) {
            if self.selected_note().map(|note| note.id) != Some(open_id) {
                self.set_status_message(Some("Finish editing the open note first"));
            }
            return false;
        }
        let Some(note) = self.selected_note().cloned() else {
            return false;
        };
        let mut editor = NoteEditor::new(note.id);
        let started = editor.begin(&note);
        self.editor = Some(editor);
        started
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.editor.as_mut().is_some_and(NoteEditor::cancel)
    }

    pub fn save_edit(&mut self) -> Option<Request> {
        let edit = self.editor.as_mut()?.save()?;
        match self.store.apply_edit(&edit) {
            Ok(()) => {
                if self.persist_edits {
                    Some(Request::Update(edit))
                } else {
                    self.set_status_message(Some("Edit saved locally"));
                    None
                }
            }
            Err(StoreError::NotFound(id)) => {
                tracing::warn!(%id, "edited note vanished before save");
                self.alert(format!("Note {id} no longer exists."));
                None
            }
            Err(StoreError::Gateway(err)) => {
                tracing::error!(%err, "unexpected gateway error on local edit");
                None
            }
        }
    }

    // deletion

    pub fn begin_delete_selected(&mut self) {
        if let Some(id) = self.selected_note().map(|note| note.id) {
            self.begin_delete(id);
        }
    }

    pub fn begin_delete(&mut self, id: NoteId) {
        match self.store.prepare_delete(id) {
            Ok(prompt) => self.overlay = Some(Overlay::ConfirmDelete(prompt)),
            Err(err) => {
                tracing::warn!(%err, "delete requested for unknown note");
                self.alert(format!("Note {id} not found."));
            }
        }
    }

    pub fn begin_delete_all(&mut self) {
        self.overlay = Some(Overlay::ConfirmDeleteAll);
    }

    pub fn confirm_overlay(&mut self) -> Option<Request> {
        match self.overlay.take()? {
            Overlay::ConfirmDelete(prompt) => Some(Request::Delete(prompt.note_id)),
            Overlay::ConfirmDeleteAll => Some(Request::DeleteAll),
            Overlay::Alert(_) => None,
        }
    }

    pub fn dismiss_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn apply_sort(&mut self, order: SortOrder) {
        let selected = self.selected_note().map(|note| note.id);
        self.store.sort_by(order);
        self.select_by_id(selected);
    }

    pub fn apply_reply(&mut self, reply: Reply) -> Vec<Request> {
        match reply {
            Reply::Hydrated { ticket, result } => {
                let selected = self.selected_note().map(|note| note.id);
                match self.store.finish_hydrate(ticket, result) {
                    Ok(true) => {
                        self.drop_orphaned_editor();
                        self.select_by_id(selected);
                    }
                    Ok(false) => {}
                    Err(err) => {
                        self.set_status_message(Some(format!("Could not load notes: {err}")))
                    }
                }
                Vec::new()
            }
            Reply::Created { origin, result } => {
                if origin == DraftOrigin::Typed {
                    self.submitting = false;
                }
                match result {
                    Ok(note) => {
                        self.store.insert_created(note);
                        self.composer.submitted();
                        if self.focus == FocusPane::Composer {
                            self.focus = FocusPane::List;
                        }
                        self.selected = 0;
                        self.set_status_message(Some("Note added"));
                    }
                    Err(err) => {
                        tracing::error!(%err, ?origin, "failed to create note");
                        self.set_status_message(Some(format!("Could not save note: {err}")));
                    }
                }
                Vec::new()
            }
            Reply::Deleted { id, result } => match result {
                Ok(()) => vec![self.request_hydrate()],
                Err(err) => {
                    tracing::error!(%err, %id, "failed to delete note");
                    self.alert(DELETE_FAILED_ALERT);
                    Vec::new()
                }
            },
            Reply::DeletedAll(result) => match result {
                Ok(()) => vec![self.request_hydrate()],
                Err(err) => {
                    tracing::error!(%err, "failed to delete all notes");
                    self.alert(DELETE_ALL_FAILED_ALERT);
                    Vec::new()
                }
            },
            Reply::Updated { id, result } => match result {
                Ok(_) => vec![self.request_hydrate()],
                Err(err) => {
                    tracing::error!(%err, %id, "failed to persist note edit");
                    self.set_status_message(Some(format!(
                        "Edit kept locally, saving failed: {err}"
                    )));
                    Vec::new()
                }
            },
            Reply::Fetched { kind, result } => match result {
                Ok(draft) => vec![Request::Create {
                    draft,
                    origin: DraftOrigin::Sourced(kind),
                }],
                Err(err) => {
                    tracing::error!(%err, %kind, "content source failed");
                    self.alert(kind.failure_alert());
                    Vec::new()
                }
            },
        }
    }

    fn drop_orphaned_editor(&mut self) {
        let orphaned = self
            .editor
            .as_ref()
            .is_some_and(|editor| self.store.get(editor.note_id()).is_none());
        if orphaned {
            self.editor = None;
        }
    }
}
