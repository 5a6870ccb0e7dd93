mod braces;
mod commands;
mod rules;
mod scanner;
mod types;

use std::collections::HashMap;

pub use braces::{find_quote_end, match_braces};
pub use commands::{CommandKind, RenderCommand};
pub use rules::{
    Call, Interpolation, ParseDiagnostic, PassThrough, Preprocessor, Rule, RuleOutput,
};
pub use scanner::{is_space, scan_lines, LineScanner};
pub use types::{FilePosition, LineWindow, Position, SourceSpan};

/// Parser output: the command stream plus recoverable diagnostics.
pub type ParseOutput<'a> = RuleOutput<'a>;

/// Dispatches each line to a rule keyed by its first non-space character.
pub struct Parser {
    rules: HashMap<char, Box<dyn Rule>>,
    fallback: Box<dyn Rule>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// `#` pragma, `\` text, `|` text line, `=` call; everything else is code.
    pub fn new() -> Self {
        Self::empty()
            .with_rule('#', Preprocessor)
            .with_rule('\\', Interpolation { new_line: false })
            .with_rule('|', Interpolation { new_line: true })
            .with_rule('=', Call)
    }

    /// Only the pass-through fallback.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            fallback: Box::new(PassThrough),
        }
    }

    pub fn with_rule(mut self, trigger: char, rule: impl Rule + 'static) -> Self {
        self.rules.insert(trigger, Box::new(rule));
        self
    }

    pub fn parse<'a>(&self, text: &'a str) -> ParseOutput<'a> {
        let mut out = RuleOutput::default();
        for window in scan_lines(text) {
            self.parse_line(&window, &mut out);
        }
        out
    }

    pub fn parse_line<'a>(&self, window: &LineWindow<'a>, out: &mut RuleOutput<'a>) {
        let rule = window
            .trigger()
            .and_then(|ch| self.rules.get(&ch))
            .unwrap_or(&self.fallback);
        rule.apply(window, out);
    }
}
