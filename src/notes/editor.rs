use super::text::TextInput;
use super::{Note, NoteDraft, NoteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditField {
    Title,
    #[default]
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub title: TextInput,
    pub content: TextInput,
    pub focus: EditField,
}

impl EditBuffer {
    fn seeded_from(note: &Note) -> Self {
        Self {
            title: TextInput::single_line(note.title.clone()),
            content: TextInput::multi_line(note.content.clone()),
            focus: EditField::Content,
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            EditField::Title => &mut self.title,
            EditField::Content => &mut self.content,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            EditField::Title => EditField::Content,
            EditField::Content => EditField::Title,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Viewing,
    Editing(EditBuffer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEdit {
    pub note_id: NoteId,
    pub title: String,
    pub content: String,
}

impl NoteEdit {
    pub fn draft(&self) -> NoteDraft {
        NoteDraft::new(self.title.clone(), self.content.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEditor {
    note_id: NoteId,
    mode: EditorMode,
}

impl NoteEditor {
    pub fn new(note_id: NoteId) -> Self {
        Self {
            note_id,
            mode: EditorMode::Viewing,
        }
    }

    pub fn note_id(&self) -> NoteId {
        self.note_id
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Editing(_))
    }

    /// Seeds the buffer from the note's current values. Returns false when
    /// already editing; the existing buffer is kept.
    pub fn begin(&mut self, note: &Note) -> bool {
        debug_assert_eq!(note.id, self.note_id);
        if self.is_editing() {
            return false;
        }
        self.mode = EditorMode::Editing(EditBuffer::seeded_from(note));
        true
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        match &self.mode {
            EditorMode::Editing(buffer) => Some(buffer),
            EditorMode::Viewing => None,
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        match &mut self.mode {
            EditorMode::Editing(buffer) => Some(buffer),
            EditorMode::Viewing => None,
        }
    }

    pub fn save(&mut self) -> Option<NoteEdit> {
        match std::mem::take(&mut self.mode) {
            EditorMode::Editing(buffer) => Some(NoteEdit {
                note_id: self.note_id,
                title: buffer.title.as_str().to_string(),
                content: buffer.content.as_str().to_string(),
            }),
            EditorMode::Viewing => None,
        }
    }

    pub fn cancel(&mut self) -> bool {
        let was_editing = self.is_editing();
        self.mode = EditorMode::Viewing;
        was_editing
    }
}
