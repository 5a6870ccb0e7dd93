/// Find the quote that closes the one at `open`, honoring `\` escapes.
///
/// `open` must index a `"` or `'`. Returns `None` when the quote is not closed
/// before `limit`.
pub fn find_quote_end(text: &str, open: usize, limit: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let limit = limit.min(bytes.len());
    let quote = *bytes.get(open)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let mut i = open + 1;
    while i < limit {
        match bytes[i] {
            b'\\' => i += 2,
            ch if ch == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Find the `}` matching the `{` at `open`, skipping quoted text.
///
/// Returns `None` on a closing brace with nothing open, an unterminated quote,
/// or reaching `limit` with braces still open.
pub fn match_braces(text: &str, open: usize, limit: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let limit = limit.min(bytes.len());
    let mut depth = 0usize;
    let mut i = open;

    while i < limit {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' | b'\'' => i = find_quote_end(text, i, limit)?,
            _ => {}
        }
        i += 1;
    }
    None
}
