use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    buffer: String,
    cursor: usize,
    multiline: bool,
    preferred_column: Option<usize>,
}

impl TextInput {
    pub fn single_line(text: impl Into<String>) -> Self {
        Self::with_text(text.into(), false)
    }

    pub fn multi_line(text: impl Into<String>) -> Self {
        Self::with_text(text.into(), true)
    }

    fn with_text(buffer: String, multiline: bool) -> Self {
        let cursor = buffer.len();
        Self {
            buffer,
            cursor,
            multiline,
            preferred_column: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.preferred_column = None;
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' {
            return self.insert_newline();
        }
        let mut scratch = [0u8; 4];
        let encoded = ch.encode_utf8(&mut scratch);
        self.buffer.insert_str(self.cursor, encoded);
        self.cursor += encoded.len();
        self.preferred_column = None;
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        if !self.multiline {
            return false;
        }
        self.buffer.insert(self.cursor, '\n');
        self.cursor += 1;
        self.preferred_column = Some(0);
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        self.preferred_column = None;
        true
    }

    pub fn delete(&mut self) -> bool {
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.buffer.drain(self.cursor..next);
        self.preferred_column = None;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_right(&mut self) -> bool {
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.cursor = next;
        self.preferred_column = None;
        true
    }

    pub fn move_home(&mut self) -> bool {
        let start = line_start(&self.buffer, self.cursor);
        if self.cursor == start {
            return false;
        }
        self.cursor = start;
        self.preferred_column = Some(0);
        true
    }

    pub fn move_end(&mut self) -> bool {
        let end = line_end(&self.buffer, self.cursor);
        if self.cursor == end {
            return false;
        }
        self.cursor = end;
        self.preferred_column = None;
        true
    }

    pub fn move_up(&mut self) -> bool {
        let start = line_start(&self.buffer, self.cursor);
        if start == 0 {
            return false;
        }
        let column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.buffer, start, self.cursor));
        let prev_start = line_start(&self.buffer, start - 1);
        self.cursor = position_for_column(&self.buffer, prev_start, column);
        self.preferred_column = Some(column);
        true
    }

    pub fn move_down(&mut self) -> bool {
        let end = line_end(&self.buffer, self.cursor);
        if end == self.buffer.len() {
            return false;
        }
        let start = line_start(&self.buffer, self.cursor);
        let column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.buffer, start, self.cursor));
        self.cursor = position_for_column(&self.buffer, end + 1, column);
        self.preferred_column = Some(column);
        true
    }

    pub fn cursor_line(&self) -> (usize, &str) {
        let start = line_start(&self.buffer, self.cursor);
        let row = self.buffer[..start].matches('\n').count();
        (row, &self.buffer[start..self.cursor])
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_at(text: &str, line_start: usize, cursor: usize) -> usize {
    text[line_start..cursor].graphemes(true).count()
}

fn position_for_column(text: &str, line_start: usize, column: usize) -> usize {
    let end = line_end(text, line_start);
    text[line_start..end]
        .grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| line_start + idx)
        .unwrap_or(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut input = TextInput::single_line("cafe\u{301}");
        assert!(input.backspace());
        assert_eq!(input.as_str(), "caf");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn single_line_refuses_newlines() {
        let mut input = TextInput::single_line("title");
        assert!(!input.insert_newline());
        assert!(!input.insert_char('\n'));
        assert_eq!(input.as_str(), "title");
    }

    #[test]
    fn vertical_motion_keeps_preferred_column() {
        let mut input = TextInput::multi_line("abcdef\nxy\nlonger line");
        assert!(input.move_up());
        assert_eq!(input.cursor_line(), (1, "xy"));
        assert!(input.move_up());
        assert_eq!(input.cursor_line(), (0, "abcdef"));
        assert!(!input.move_up());
        assert!(input.move_down());
        assert!(input.move_down());
        assert_eq!(input.cursor_line(), (2, "longer line"));
    }

    #[test]
    fn insertion_happens_at_cursor() {
        let mut input = TextInput::single_line("hllo");
        input.move_home();
        input.move_right();
        input.insert_char('e');
        assert_eq!(input.as_str(), "hello");
        assert!(input.move_end());
        assert!(!input.delete());
    }

    #[test]
    fn whitespace_only_is_blank() {
        assert!(TextInput::multi_line(" \n\t").is_blank());
        assert!(!TextInput::multi_line(" x ").is_blank());
    }
}
