use std::fmt::Write;

/// Escape `text` for a double-quoted C-family string literal.
pub fn escape_literal(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\0' => out.push_str("\\0"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0B}' => out.push_str("\\v"),
            c if c.is_control() => {
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
}

/// `text` as a complete quoted literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    escape_literal(text, &mut out);
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_controls() {
        assert_eq!(quote(r#"say "hi"\"#), r#""say \"hi\"\\""#);
        assert_eq!(quote("it's"), r#""it\'s""#);
        assert_eq!(quote("a\tb\r\n"), r#""a\tb\r\n""#);
        assert_eq!(quote("\u{1b}[0m"), r#""\u001b[0m""#);
        assert_eq!(quote("\u{7f}"), r#""\u007f""#);
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(quote("héllo #{x}"), "\"héllo #{x}\"");
    }
}
