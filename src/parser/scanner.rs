use super::types::{LineWindow, Position};

/// Space separators and tabs. Line terminators are never spaces.
pub fn is_space(ch: char) -> bool {
    ch == '\t'
        || (ch.is_whitespace()
            && !matches!(
                ch,
                '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
            ))
}

fn is_newline(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// Splits template text into line windows, one per physical line.
///
/// `\n`, `\r\n`, `\n\r` and lone `\r` each end one line, so files with mixed
/// endings number their lines the same way an editor does. A text ending in a
/// newline yields one final empty window.
pub struct LineScanner<'a> {
    text: &'a str,
    cursor: usize,
    line: u32,
    done: bool,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            cursor: 0,
            line: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = LineWindow<'a>;

    fn next(&mut self) -> Option<LineWindow<'a>> {
        if self.done {
            return None;
        }

        let text = self.text;
        let begin = self.cursor;
        let begin_non_space = text[begin..]
            .char_indices()
            .find(|&(_, ch)| !is_space(ch))
            .map(|(i, _)| begin + i)
            .unwrap_or(text.len());
        let end = text[begin_non_space..]
            .char_indices()
            .find(|&(_, ch)| is_newline(ch))
            .map(|(i, _)| begin_non_space + i)
            .unwrap_or(text.len());

        self.line += 1;
        let window = LineWindow {
            text,
            begin,
            begin_non_space,
            end,
            position: Position::new(self.line, 1),
        };

        let bytes = text.as_bytes();
        if end < text.len() {
            let first = bytes[end];
            let mut next = end + 1;
            let complement = if first == b'\r' { b'\n' } else { b'\r' };
            if next < text.len() && bytes[next] == complement {
                next += 1;
            }
            self.cursor = next;
        } else {
            self.done = true;
        }

        Some(window)
    }
}

pub fn scan_lines(text: &str) -> LineScanner<'_> {
    LineScanner::new(text)
}
