use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::gateway::NoteGateway;
use crate::notes::composer::ComposerControl;
use crate::notes::sort::SortOrder;
use crate::notes::text::TextInput;
use crate::sources::{ContentSources, SourceKind};
use crate::ui;

pub mod state;
pub mod worker;

pub use state::{AppState, FocusPane, Overlay};
pub use worker::{DraftOrigin, Reply, Request, Worker};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    Compose,
    EnterEdit,
    DeleteNote,
    DeleteAll,
    Sort(SortOrder),
    CycleSort,
    Refresh,
}

#[derive(Debug, Default)]
pub struct KeyOutcome {
    pub requests: Vec<Request>,
    pub quit: bool,
}

impl KeyOutcome {
    fn request(request: Request) -> Self {
        Self {
            requests: vec![request],
            quit: false,
        }
    }

    fn maybe(request: Option<Request>) -> Self {
        Self {
            requests: request.into_iter().collect(),
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            requests: Vec::new(),
            quit: true,
        }
    }
}

pub struct App {
    state: AppState,
    worker: Worker,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(
        state: AppState,
        gateway: Arc<dyn NoteGateway>,
        sources: ContentSources,
    ) -> Result<Self> {
        let worker = Worker::spawn(gateway, sources).context("starting request worker")?;
        Ok(Self {
            state,
            worker,
            list_state: ListState::default(),
            should_quit: false,
            tick_rate: Duration::from_millis(100),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let hydrate = self.state.request_hydrate();
        self.submit(hydrate);
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.state.notes().is_empty() {
                        self.list_state.select(None);
                    } else {
                        self.list_state.select(Some(self.state.selected_index()));
                    }
                    ui::draw_app(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    let outcome = handle_key(&mut self.state, key);
                    for request in outcome.requests {
                        self.submit(request);
                    }
                    self.should_quit |= outcome.quit;
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        while let Some(reply) = self.worker.try_recv() {
            for request in self.state.apply_reply(reply) {
                self.submit(request);
            }
        }
        self.state.set_pending(self.worker.in_flight());
    }

    fn submit(&mut self, request: Request) {
        if !self.worker.submit(request) {
            self.state
                .set_status_message(Some("Background worker stopped; restart notetake"));
        }
        self.state.set_pending(self.worker.in_flight());
    }
}

fn is_plain(key: &KeyEvent) -> bool {
    !key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

/// Routes a key to the open overlay, the editing card, the composer or the
/// list, in that order.
pub fn handle_key(state: &mut AppState, key: KeyEvent) -> KeyOutcome {
    if key.kind != KeyEventKind::Press {
        return KeyOutcome::default();
    }
    if is_ctrl(&key, 'c') {
        return KeyOutcome::quit();
    }
    if state.overlay().is_some() {
        return handle_overlay_key(state, key);
    }
    if state.is_editing() {
        return handle_editor_key(state, key);
    }
    if state.focus() == FocusPane::Composer {
        return handle_composer_key(state, key);
    }
    match list_action(&key) {
        Some(action) => handle_action(state, action),
        None => KeyOutcome::default(),
    }
}

fn list_action(key: &KeyEvent) -> Option<Action> {
    if !is_plain(key) {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrevious,
        KeyCode::Char('a') => Action::Compose,
        KeyCode::Char('e') => Action::EnterEdit,
        KeyCode::Char('d') => Action::DeleteNote,
        KeyCode::Char('D') => Action::DeleteAll,
        KeyCode::Char('s') => Action::CycleSort,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char(digit @ '1'..='4') => {
            let index = digit.to_digit(10)? as usize - 1;
            Action::Sort(SortOrder::from_index(index)?)
        }
        _ => return None,
    };
    Some(action)
}

fn handle_action(state: &mut AppState, action: Action) -> KeyOutcome {
    match action {
        Action::Quit => return KeyOutcome::quit(),
        Action::SelectNext => state.move_selection(1),
        Action::SelectPrevious => state.move_selection(-1),
        Action::Compose => state.focus_composer(ComposerControl::Title),
        Action::EnterEdit => {
            if state.begin_edit_selected() {
                state.set_status_message(Some(
                    "Editing: Tab switches field, Ctrl-s saves, Esc cancels",
                ));
            }
        }
        Action::DeleteNote => state.begin_delete_selected(),
        Action::DeleteAll => state.begin_delete_all(),
        Action::Sort(order) => state.apply_sort(order),
        Action::CycleSort => {
            let next = state.store().sort_order().next();
            state.apply_sort(next);
        }
        Action::Refresh => return KeyOutcome::request(state.request_hydrate()),
    }
    KeyOutcome::default()
}

fn handle_overlay_key(state: &mut AppState, key: KeyEvent) -> KeyOutcome {
    let is_alert = matches!(state.overlay(), Some(Overlay::Alert(_)));
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') if !is_alert || key.code == KeyCode::Enter => {
            match state.confirm_overlay() {
                Some(request) => KeyOutcome::request(request),
                None => KeyOutcome::default(),
            }
        }
        KeyCode::Esc | KeyCode::Char('n') if !is_alert || key.code == KeyCode::Esc => {
            state.dismiss_overlay();
            if !is_alert {
                state.set_status_message(Some("Delete cancelled"));
            }
            KeyOutcome::default()
        }
        _ => KeyOutcome::default(),
    }
}

fn handle_editor_key(state: &mut AppState, key: KeyEvent) -> KeyOutcome {
    if is_ctrl(&key, 's') {
        return match state.save_edit() {
            Some(request) => KeyOutcome::request(request),
            None => KeyOutcome::default(),
        };
    }
    match key.code {
        KeyCode::Esc => {
            state.cancel_edit();
            state.set_status_message(Some("Edit cancelled"));
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if let Some(buffer) = state.editor_mut().and_then(|editor| editor.buffer_mut()) {
                buffer.toggle_focus();
            }
        }
        _ => {
            if let Some(buffer) = state.editor_mut().and_then(|editor| editor.buffer_mut()) {
                edit_text(buffer.focused_mut(), &key);
            }
        }
    }
    KeyOutcome::default()
}

fn handle_composer_key(state: &mut AppState, key: KeyEvent) -> KeyOutcome {
    if is_ctrl(&key, 's') {
        return KeyOutcome::maybe(state.submit_typed());
    }
    if is_ctrl(&key, 'j') {
        return KeyOutcome::request(state.request_source(SourceKind::Joke));
    }
    if is_ctrl(&key, 'o') {
        return KeyOutcome::request(state.request_source(SourceKind::Quote));
    }
    match (key.code, state.composer().focus()) {
        (KeyCode::Esc, _) => state.blur_composer(),
        (KeyCode::Tab, _) => state.composer_mut().focus_next(),
        (KeyCode::BackTab, _) => state.composer_mut().focus_previous(),
        (KeyCode::Enter, Some(ComposerControl::Submit)) => {
            return KeyOutcome::maybe(state.submit_typed());
        }
        (KeyCode::Enter, Some(ComposerControl::Joke)) => {
            return KeyOutcome::request(state.request_source(SourceKind::Joke));
        }
        (KeyCode::Enter, Some(ComposerControl::Quote)) => {
            return KeyOutcome::request(state.request_source(SourceKind::Quote));
        }
        (KeyCode::Enter, Some(ComposerControl::Title)) => state.composer_mut().focus_next(),
        _ => {
            state
                .composer_mut()
                .edit_focused(|input| edit_text(input, &key));
        }
    }
    KeyOutcome::default()
}

fn edit_text(input: &mut TextInput, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(ch) if is_plain(key) => input.insert_char(ch),
        KeyCode::Enter => input.insert_newline(),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Up => input.move_up(),
        KeyCode::Down => input.move_down(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => false,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
