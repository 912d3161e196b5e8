use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use strum::IntoEnumIterator;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, Overlay};
use crate::notes::composer::{ComposerControl, DraftComposer};
use crate::notes::editor::{EditBuffer, EditField};
use crate::notes::format::DateStyle;
use crate::notes::sort::SortOrder;
use crate::notes::store::DELETE_ALL_PROMPT;
use crate::notes::text::TextInput;
use crate::notes::Note;

const APP_TITLE: &str = "note-take";
const CURSOR_GLYPH: char = '▌';
const MIN_CONTENT_ROWS: u16 = 3;
const MAX_CONTENT_ROWS: u16 = 8;

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let composer_height = composer_height(state.composer());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(composer_height),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, state, rows[0]);
    render_sort_bar(frame, state, rows[1]);
    render_composer(frame, state, rows[2]);
    render_notes(frame, state, list_state, rows[3]);
    render_footer(frame, state, rows[4]);
    frame.render_widget(
        Paragraph::new(build_status_line(state)).style(Style::default().fg(Color::Gray)),
        rows[5],
    );

    render_overlay(frame, state);
}

fn render_header(frame: &mut Frame, state: &AppState, area: Rect) {
    let today = state.formatter().format_now(DateStyle::Full);
    let line = Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(today, Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}

fn render_sort_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let active = state.store().sort_order();
    let mut spans = Vec::new();
    for (idx, order) in SortOrder::iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("   "));
        }
        let (marker, style) = if order == active {
            (
                "(•)",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("( )", Style::default())
        };
        spans.push(Span::styled(
            format!("{} {marker} {}", idx + 1, order.label()),
            style,
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().title("Sort").borders(Borders::ALL)),
        area,
    );
}

fn composer_height(composer: &DraftComposer) -> u16 {
    if !composer.is_expanded() {
        return 3;
    }
    let lines = composer.content().as_str().split('\n').count() as u16;
    // borders + title + content + buttons
    2 + 1 + lines.clamp(MIN_CONTENT_ROWS, MAX_CONTENT_ROWS) + 1
}

const COLLAPSED_HINT: &str = "Press a to add new note.";

fn render_composer(frame: &mut Frame, state: &AppState, area: Rect) {
    let composer = state.composer();
    let focused = state.focus() == FocusPane::Composer;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title("New note (a)")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);

    let placeholder = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC);
    let mut lines = Vec::new();
    if !composer.is_expanded() && composer.title().is_empty() {
        lines.push(Line::from(Span::styled(COLLAPSED_HINT, placeholder)));
    } else if composer.title().is_empty() {
        lines.push(Line::from(Span::styled("Title", placeholder)));
    } else {
        lines.push(Line::from(Span::styled(
            composer.title().as_str().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }

    if composer.is_expanded() {
        let content_rows = inner.height.saturating_sub(2) as usize;
        if composer.content().is_empty() {
            lines.push(Line::from(Span::styled("Take a note...", placeholder)));
            lines.extend((1..content_rows).map(|_| Line::from("")));
        } else {
            let content_lines: Vec<&str> = composer.content().as_str().split('\n').collect();
            let skip = content_lines.len().saturating_sub(content_rows);
            lines.extend(
                content_lines
                    .iter()
                    .skip(skip)
                    .map(|line| Line::from(line.to_string())),
            );
            lines.extend((content_lines.len()..content_rows).map(|_| Line::from("")));
        }
        lines.push(button_row(composer.focus()));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);

    if focused {
        if let Some((x, y)) = composer_cursor(composer, inner) {
            frame.set_cursor(x, y);
        }
    }
}

fn button_row(focus: Option<ComposerControl>) -> Line<'static> {
    let buttons = [
        (ComposerControl::Submit, "Add (Ctrl-s)"),
        (ComposerControl::Joke, "Joke (Ctrl-j)"),
        (ComposerControl::Quote, "Quote (Ctrl-o)"),
    ];
    let mut spans = Vec::new();
    for (control, label) in buttons {
        let style = if focus == Some(control) {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(format!("[ {label} ]"), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn composer_cursor(composer: &DraftComposer, inner: Rect) -> Option<(u16, u16)> {
    if inner.width == 0 || inner.height == 0 {
        return None;
    }
    let (row, before) = match composer.focus()? {
        ComposerControl::Title => (0, composer.title().cursor_line().1),
        ComposerControl::Content => {
            let content_rows = inner.height.saturating_sub(2) as usize;
            let total = composer.content().as_str().split('\n').count();
            let skip = total.saturating_sub(content_rows);
            let (line, before) = composer.content().cursor_line();
            (1 + line.saturating_sub(skip), before)
        }
        _ => return None,
    };
    let col = UnicodeWidthStr::width(before).min(inner.width as usize - 1) as u16;
    let row = (row as u16).min(inner.height - 1);
    Some((inner.x + col, inner.y + row))
}

fn render_notes(frame: &mut Frame, state: &AppState, list_state: &mut ListState, area: Rect) {
    let list_focused = state.focus() == FocusPane::List;
    let editing = state.editor();
    let mut items = Vec::with_capacity(state.notes().len());
    for note in state.notes() {
        let buffer = editing
            .filter(|editor| editor.note_id() == note.id)
            .and_then(|editor| editor.buffer());
        let lines = match buffer {
            Some(buffer) => editing_card(state, note, buffer),
            None => note_card(state, note),
        };
        items.push(ListItem::new(lines));
    }
    if items.is_empty() {
        items.push(ListItem::new("No notes yet. Press `a` to write one."));
    }

    let border_style = if list_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Notes ({})", state.notes().len()))
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn note_card(state: &AppState, note: &Note) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            note.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            state
                .formatter()
                .format_instant(note.time_stamp, DateStyle::Abbr),
            Style::default().fg(Color::Gray),
        )),
    ];
    lines.extend(note.content.lines().map(|line| Line::from(line.to_string())));
    lines.push(Line::from(""));
    lines
}

fn editing_card(state: &AppState, note: &Note, buffer: &EditBuffer) -> Vec<Line<'static>> {
    let edit_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    let title = with_cursor(&buffer.title, buffer.focus == EditField::Title);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("[EDIT] ", edit_style),
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(
            state
                .formatter()
                .format_instant(note.time_stamp, DateStyle::Abbr),
            Style::default().fg(Color::Gray),
        )),
    ];
    let content = with_cursor(&buffer.content, buffer.focus == EditField::Content);
    lines.extend(content.split('\n').map(|line| Line::from(line.to_string())));
    lines.push(Line::from(Span::styled(
        "Tab field • Ctrl-s save • Esc cancel",
        Style::default().fg(Color::Gray),
    )));
    lines
}

fn with_cursor(input: &TextInput, focused: bool) -> String {
    let mut text = input.as_str().to_string();
    if focused {
        text.insert(input.cursor(), CURSOR_GLYPH);
    }
    text
}

fn render_footer(frame: &mut Frame, state: &AppState, area: Rect) {
    let year = state.formatter().format_now(DateStyle::Year);
    let line = Line::from(vec![
        Span::raw("Jokes by icanhazdadjoke"),
        Span::raw(" • "),
        Span::raw("Quotes by favqs"),
        Span::raw(" • "),
        Span::raw(format!("© {year}")),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let mut spans = Vec::new();
    if state.pending() > 0 {
        spans.push(Span::styled(
            format!("⟳ {} pending ", state.pending()),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(message) = state.status_message() {
        spans.push(Span::raw(message.to_string()));
        spans.push(Span::raw(" | "));
    }
    let hints = if state.is_editing() {
        "Tab field  Ctrl-s save  Esc cancel"
    } else if state.focus() == FocusPane::Composer {
        "Tab next  Ctrl-s add  Ctrl-j joke  Ctrl-o quote  Esc done"
    } else {
        "a new  e edit  d delete  D delete all  1-4/s sort  r refresh  q quit"
    };
    spans.push(Span::styled(hints, Style::default().fg(Color::DarkGray)));
    Text::from(Line::from(spans))
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    let Some(overlay) = state.overlay() else {
        return;
    };
    let (title, message, hint, accent) = match overlay {
        Overlay::ConfirmDelete(prompt) => (
            "Delete Note",
            prompt.to_string(),
            "Enter/y delete • Esc/n cancel",
            Color::Red,
        ),
        Overlay::ConfirmDeleteAll => (
            "Delete All",
            DELETE_ALL_PROMPT.to_string(),
            "Enter/y delete everything • Esc/n cancel",
            Color::Red,
        ),
        Overlay::Alert(message) => ("Alert", message.clone(), "Enter to dismiss", Color::Yellow),
    };
    let area = centered_rect(60, 30, frame.size());
    frame.render_widget(Clear, area);
    let mut lines = vec![Line::from("")];
    lines.extend(message.lines().map(|line| {
        Line::from(Span::styled(
            line.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
    }));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));
    let paragraph = Paragraph::new(lines)
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::worker::{Reply, Request};
    use crate::notes::format::TimestampFormatter;
    use crate::notes::{InstantNanos, NoteId};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn loaded_state() -> AppState {
        let mut state = AppState::new(TimestampFormatter::utc(), true);
        let Request::Hydrate(ticket) = state.request_hydrate() else {
            panic!("hydrate");
        };
        state.apply_reply(Reply::Hydrated {
            ticket,
            result: Ok(vec![Note {
                id: NoteId(1),
                title: "Groceries".into(),
                content: "milk\neggs".into(),
                time_stamp: InstantNanos(1_712_148_300_000_000_000),
            }]),
        });
        state
    }

    fn render(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 32)).expect("terminal");
        let mut list_state = ListState::default();
        list_state.select(Some(state.selected_index()));
        terminal
            .draw(|frame| draw_app(frame, state, &mut list_state))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn page_shows_header_sort_bar_and_cards() {
        let screen = render(&loaded_state());
        assert!(screen.contains(APP_TITLE));
        assert!(screen.contains("1 (•) New to Old"));
        assert!(screen.contains("4 ( ) Z to A"));
        assert!(screen.contains("Groceries"));
        assert!(screen.contains("4/3/2024 12:45"));
        assert!(screen.contains("eggs"));
        assert!(screen.contains("icanhazdadjoke"));
        assert!(screen.contains("favqs"));
    }

    #[test]
    fn collapsed_composer_hides_buttons() {
        let mut state = loaded_state();
        assert!(!render(&state).contains("Joke (Ctrl-j)"));
        state.focus_composer(ComposerControl::Title);
        assert!(render(&state).contains("Joke (Ctrl-j)"));
    }

    #[test]
    fn collapsed_composer_shows_hint_instead_of_title() {
        let mut state = loaded_state();
        let screen = render(&state);
        assert!(screen.contains(COLLAPSED_HINT));
        assert!(!screen.contains("Take a note..."));

        state.focus_composer(ComposerControl::Title);
        let screen = render(&state);
        assert!(!screen.contains(COLLAPSED_HINT));
        assert!(screen.contains("Title"));
    }

    #[test]
    fn editing_card_shows_buffer() {
        let mut state = loaded_state();
        state.begin_edit_selected();
        let screen = render(&state);
        assert!(screen.contains("[EDIT] Groceries"));
        assert!(screen.contains(&format!("eggs{CURSOR_GLYPH}")));
    }

    #[test]
    fn delete_prompt_is_drawn_as_overlay() {
        let mut state = loaded_state();
        state.begin_delete_selected();
        let screen = render(&state);
        assert!(screen.contains("Delete \"Groceries\": milk"));
        assert!(screen.contains("Esc/n cancel"));
    }

    #[test]
    fn empty_list_shows_hint() {
        let state = AppState::new(TimestampFormatter::utc(), true);
        assert!(render(&state).contains("No notes yet"));
    }

    #[test]
    fn composer_cursor_tracks_content_line() {
        let mut composer = DraftComposer::new();
        composer.focus_control(ComposerControl::Content);
        composer.edit_focused(|input| input.insert_char('a'));
        composer.edit_focused(|input| input.insert_newline());
        composer.edit_focused(|input| input.insert_char('漢'));
        let inner = Rect::new(1, 1, 40, 5);
        assert_eq!(composer_cursor(&composer, inner), Some((3, 3)));
    }
}
