use super::braces::{find_quote_end, match_braces};
use super::commands::RenderCommand;
use super::scanner::is_space;
use super::types::{LineWindow, Position};
use crate::remap::Severity;

/// A recoverable problem found while parsing. Parsing always continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub severity: Severity,
    pub position: Position,
    pub message: String,
}

/// Commands and diagnostics produced by rules, in emission order.
#[derive(Debug, Default)]
pub struct RuleOutput<'a> {
    pub commands: Vec<RenderCommand<'a>>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> RuleOutput<'a> {
    fn push(&mut self, command: RenderCommand<'a>) {
        self.commands.push(command);
    }

    fn report(&mut self, severity: Severity, position: Position, message: impl Into<String>) {
        self.diagnostics.push(ParseDiagnostic {
            severity,
            position,
            message: message.into(),
        });
    }
}

/// Consumes one line window and appends zero or more commands.
pub trait Rule {
    fn apply<'a>(&self, window: &LineWindow<'a>, out: &mut RuleOutput<'a>);
}

fn skip_spaces(text: &str, from: usize, limit: usize) -> usize {
    text[from..limit]
        .char_indices()
        .find(|&(_, ch)| !is_space(ch))
        .map(|(i, _)| from + i)
        .unwrap_or(limit)
}

fn script<'a>(window: &LineWindow<'a>) -> RenderCommand<'a> {
    RenderCommand::Script {
        code: window.span(window.begin, window.end),
        end: window.end_span(),
    }
}

/// Fallback: the whole line is target-language code.
pub struct PassThrough;

impl Rule for PassThrough {
    fn apply<'a>(&self, window: &LineWindow<'a>, out: &mut RuleOutput<'a>) {
        out.push(script(window));
    }
}

/// `#pragma <name> "<argument>"`; any other `#` line passes through untouched.
pub struct Preprocessor;

impl Preprocessor {
    fn match_pragma<'a>(window: &LineWindow<'a>) -> Option<RenderCommand<'a>> {
        let text = window.text;
        let end = window.end;
        let bytes = text.as_bytes();

        let keyword = window.after_trigger();
        if !text[keyword..end].starts_with("pragma") {
            return None;
        }
        let after_keyword = keyword + "pragma".len();
        let name_begin = skip_spaces(text, after_keyword, end);
        if name_begin == after_keyword {
            return None;
        }

        let name_end = text[name_begin..end]
            .char_indices()
            .find(|&(_, ch)| !(ch.is_alphanumeric() || ch == '_'))
            .map(|(i, _)| name_begin + i)
            .unwrap_or(end);
        if name_end == name_begin {
            return None;
        }

        let quote = skip_spaces(text, name_end, end);
        if quote == name_end || quote >= end || bytes[quote] != b'"' {
            return None;
        }
        let close = find_quote_end(text, quote, end)?;
        if skip_spaces(text, close + 1, end) != end {
            return None;
        }

        Some(RenderCommand::Pragma {
            name: window.span(name_begin, name_end),
            argument: window.span(quote + 1, close),
            line: window.span(window.begin, end),
            end: window.end_span(),
        })
    }
}

impl Rule for Preprocessor {
    fn apply<'a>(&self, window: &LineWindow<'a>, out: &mut RuleOutput<'a>) {
        match Self::match_pragma(window) {
            Some(pragma) => out.push(pragma),
            None => {
                let directive = &window.text[window.after_trigger()..window.end];
                let is_pragma = directive
                    .strip_prefix("pragma")
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(is_space));
                if is_pragma {
                    out.report(
                        Severity::Warning,
                        window.span(window.begin_non_space, window.end).position(),
                        "malformed pragma, expected `#pragma <name> \"<argument>\"`; line kept as code",
                    );
                }
                out.push(script(window));
            }
        }
    }
}

/// `\text #{expr} text`: literal text with embedded expressions. `##` is a
/// literal `#`. Leading whitespace after the trigger becomes indentation.
pub struct Interpolation {
    pub new_line: bool,
}

impl Interpolation {
    fn scan<'a>(window: &LineWindow<'a>, from: usize, out: &mut RuleOutput<'a>) {
        let text = window.text;
        let bytes = text.as_bytes();
        let end = window.end;

        let flush = |begin: usize, stop: usize, out: &mut RuleOutput<'a>| {
            if begin < stop {
                out.push(RenderCommand::Text {
                    text: window.span(begin, stop),
                    end: window.span(stop, stop),
                });
            }
        };

        let mut literal = from;
        let mut i = from;
        while i + 1 < end {
            if bytes[i] != b'#' {
                i += 1;
                continue;
            }
            match bytes[i + 1] {
                b'#' => {
                    flush(literal, i, out);
                    flush(i, i + 1, out);
                    i += 2;
                    literal = i;
                }
                b'{' => match match_braces(text, i + 1, end) {
                    Some(close) => {
                        flush(literal, i, out);
                        let expr = window.span(i + 2, close);
                        if expr.text().trim().is_empty() {
                            out.report(
                                Severity::Warning,
                                window.span(i, i).position(),
                                "empty interpolation `#{}` ignored",
                            );
                        } else {
                            out.push(RenderCommand::Expression {
                                expr,
                                end: window.span(close, close),
                            });
                        }
                        i = close + 1;
                        literal = i;
                    }
                    None => {
                        out.report(
                            Severity::Error,
                            window.span(i, i).position(),
                            "unterminated `#{`, rest of line treated as text",
                        );
                        break;
                    }
                },
                _ => i += 1,
            }
        }
        flush(literal, end, out);
    }
}

impl Rule for Interpolation {
    fn apply<'a>(&self, window: &LineWindow<'a>, out: &mut RuleOutput<'a>) {
        let start = window.after_trigger();
        let content = skip_spaces(window.text, start, window.end);

        let indented = content > start;
        if indented {
            out.push(RenderCommand::PushIndentation {
                indent: window.span(start, content),
                end: window.span(content, content),
            });
        }

        Self::scan(window, content, out);

        if indented {
            out.push(RenderCommand::PopIndentation {
                end: window.end_span(),
            });
        }
        if self.new_line {
            out.push(RenderCommand::NewLine {
                end: window.end_span(),
            });
        }
    }
}

/// `= statement`: evaluated at a call site, indented by its leading whitespace.
pub struct Call;

impl Rule for Call {
    fn apply<'a>(&self, window: &LineWindow<'a>, out: &mut RuleOutput<'a>) {
        let start = window.after_trigger();
        let code = skip_spaces(window.text, start, window.end);

        let indented = code > start;
        if indented {
            out.push(RenderCommand::PushIndentation {
                indent: window.span(start, code),
                end: window.span(code, code),
            });
        }
        if code < window.end {
            out.push(RenderCommand::Statement {
                code: window.span(code, window.end),
                end: window.end_span(),
            });
        }
        if indented {
            out.push(RenderCommand::PopIndentation {
                end: window.end_span(),
            });
        }
    }
}
