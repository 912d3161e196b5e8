use super::text::TextInput;
use super::NoteDraft;

const JOKE_TITLE_WORDS: usize = 3;
const TITLE_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerMode {
    #[default]
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerControl {
    Title,
    Content,
    Submit,
    Joke,
    Quote,
}

impl ComposerControl {
    const ORDER: [ComposerControl; 5] = [
        ComposerControl::Title,
        ComposerControl::Content,
        ComposerControl::Submit,
        ComposerControl::Joke,
        ComposerControl::Quote,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|c| *c == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        let idx = Self::ORDER.iter().position(|c| *c == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text_field(self) -> bool {
        matches!(self, ComposerControl::Title | ComposerControl::Content)
    }
}

/// The "new note" card. Collapsed it shows only the title field; it expands
/// while focused or while either field holds text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftComposer {
    title: TextInput,
    content: TextInput,
    mode: ComposerMode,
    focus: Option<ComposerControl>,
}

impl Default for DraftComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftComposer {
    pub fn new() -> Self {
        Self {
            title: TextInput::single_line(""),
            content: TextInput::multi_line(""),
            mode: ComposerMode::Collapsed,
            focus: None,
        }
    }

    pub fn mode(&self) -> ComposerMode {
        self.mode
    }

    pub fn is_expanded(&self) -> bool {
        self.mode == ComposerMode::Expanded
    }

    pub fn focus(&self) -> Option<ComposerControl> {
        self.focus
    }

    pub fn title(&self) -> &TextInput {
        &self.title
    }

    pub fn content(&self) -> &TextInput {
        &self.content
    }

    pub fn is_blank(&self) -> bool {
        self.title.is_blank() && self.content.is_blank()
    }

    pub fn focus_control(&mut self, control: ComposerControl) {
        self.focus = Some(control);
        self.mode = ComposerMode::Expanded;
    }

    /// Focus leaves the current control. `next` is the composer control that
    /// receives focus, or `None` when focus leaves the card entirely.
    pub fn blur(&mut self, next: Option<ComposerControl>) {
        match next {
            Some(control) => self.focus_control(control),
            None => {
                self.focus = None;
                self.mode = if self.is_blank() {
                    ComposerMode::Collapsed
                } else {
                    ComposerMode::Expanded
                };
            }
        }
    }

    pub fn focus_next(&mut self) {
        let next = self.focus.map_or(ComposerControl::Title, ComposerControl::next);
        self.blur(Some(next));
    }

    pub fn focus_previous(&mut self) {
        let previous = self
            .focus
            .map_or(ComposerControl::Quote, ComposerControl::previous);
        self.blur(Some(previous));
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focus? {
            ComposerControl::Title => Some(&mut self.title),
            ComposerControl::Content => Some(&mut self.content),
            _ => None,
        }
    }

    pub fn edit_focused<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut TextInput) -> bool,
    {
        let changed = match self.focused_input_mut() {
            Some(input) => edit(input),
            None => false,
        };
        if !self.is_blank() {
            self.mode = ComposerMode::Expanded;
        }
        changed
    }

    pub fn draft(&self) -> NoteDraft {
        NoteDraft::new(self.title.as_str(), self.content.as_str())
    }

    pub fn submitted(&mut self) {
        self.title.clear();
        self.content.clear();
        self.focus = None;
        self.mode = ComposerMode::Collapsed;
    }
}

impl NoteDraft {
    /// Title is the first three space-separated words of the joke.
    pub fn from_joke(joke: &str) -> Self {
        let lead = joke
            .split(' ')
            .take(JOKE_TITLE_WORDS)
            .collect::<Vec<_>>()
            .join(" ");
        NoteDraft::new(format!("{lead}{TITLE_ELLIPSIS}"), joke)
    }

    pub fn from_quote(body: &str, author: &str) -> Self {
        NoteDraft::new(format!("{author}{TITLE_ELLIPSIS}"), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_expands_and_blank_blur_collapses() {
        let mut composer = DraftComposer::new();
        assert_eq!(composer.mode(), ComposerMode::Collapsed);
        composer.focus_control(ComposerControl::Title);
        assert!(composer.is_expanded());
        composer.blur(None);
        assert_eq!(composer.mode(), ComposerMode::Collapsed);
        assert_eq!(composer.focus(), None);
    }

    #[test]
    fn moving_to_sibling_control_stays_expanded() {
        let mut composer = DraftComposer::new();
        composer.focus_control(ComposerControl::Title);
        composer.blur(Some(ComposerControl::Joke));
        assert!(composer.is_expanded());
        assert_eq!(composer.focus(), Some(ComposerControl::Joke));
    }

    #[test]
    fn blur_with_text_stays_expanded() {
        let mut composer = DraftComposer::new();
        composer.focus_control(ComposerControl::Content);
        composer.edit_focused(|input| input.insert_char('x'));
        composer.blur(None);
        assert!(composer.is_expanded());
    }

    #[test]
    fn whitespace_only_draft_collapses_on_blur() {
        let mut composer = DraftComposer::new();
        composer.focus_control(ComposerControl::Title);
        composer.edit_focused(|input| input.insert_char(' '));
        composer.blur(None);
        assert_eq!(composer.mode(), ComposerMode::Collapsed);
        assert_eq!(composer.draft().title, " ");
    }

    #[test]
    fn submission_resets_and_collapses() {
        let mut composer = DraftComposer::new();
        composer.focus_control(ComposerControl::Title);
        composer.edit_focused(|input| input.insert_char('t'));
        composer.focus_next();
        composer.edit_focused(|input| input.insert_char('c'));
        assert_eq!(composer.draft(), NoteDraft::new("t", "c"));

        composer.submitted();
        assert_eq!(composer.mode(), ComposerMode::Collapsed);
        assert_eq!(composer.draft(), NoteDraft::default());
        assert_eq!(composer.focus(), None);
    }

    #[test]
    fn buttons_ignore_typing() {
        let mut composer = DraftComposer::new();
        composer.focus_control(ComposerControl::Submit);
        assert!(!composer.edit_focused(|input| input.insert_char('x')));
        assert!(composer.is_blank());
    }

    #[test]
    fn tab_order_wraps() {
        let mut composer = DraftComposer::new();
        composer.focus_next();
        assert_eq!(composer.focus(), Some(ComposerControl::Title));
        for _ in 0..5 {
            composer.focus_next();
        }
        assert_eq!(composer.focus(), Some(ComposerControl::Title));
        composer.focus_previous();
        assert_eq!(composer.focus(), Some(ComposerControl::Quote));
    }

    #[test]
    fn joke_title_uses_first_three_words() {
        let draft = NoteDraft::from_joke("Why did the chicken cross the road?");
        assert_eq!(draft.title, "Why did the...");
        assert_eq!(draft.content, "Why did the chicken cross the road?");

        let short = NoteDraft::from_joke("Puns.");
        assert_eq!(short.title, "Puns....");
    }

    #[test]
    fn quote_title_is_author() {
        let draft = NoteDraft::from_quote("Stay hungry.", "Steve Jobs");
        assert_eq!(draft.title, "Steve Jobs...");
        assert_eq!(draft.content, "Stay hungry.");
    }
}
