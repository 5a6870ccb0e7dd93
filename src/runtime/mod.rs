//! The renderer generated code calls into.
//!
//! One `Renderer` serves exactly one invocation. It is passed to the invoked
//! entry point explicitly; nothing here is process-wide. Until [`Renderer::attach`]
//! is called every operation is a no-op, so code running outside a managed
//! render session cannot fail on a missing sink.

mod indent;

use crate::error::RenderError;
use crate::mapping::{Features, Mapping};
use crate::parser::{FilePosition, Position};
use indent::IndentStack;

/// Output text and the mapping from output positions back to templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub output: String,
    pub mapping: Mapping,
}

pub struct Renderer {
    output: Option<String>,
    newline: String,
    indents: IndentStack,
    blank_line: bool,
    callers: Vec<usize>,
    position: Position,
    mapping: Mapping,
}

impl Renderer {
    pub fn new(newline: impl Into<String>) -> Self {
        Self {
            output: None,
            newline: newline.into(),
            indents: IndentStack::new(),
            blank_line: true,
            callers: Vec::new(),
            position: Position::new(1, 1),
            mapping: Mapping::new(),
        }
    }

    /// Start a fresh render session, discarding any previous state.
    pub fn attach(&mut self) {
        self.output = Some(String::new());
        self.indents.clear();
        self.blank_line = true;
        self.callers.clear();
        self.position = Position::new(1, 1);
        self.mapping = Mapping::new();
    }

    /// End the session and hand back what was rendered.
    pub fn detach(&mut self) -> Option<Rendered> {
        let output = self.output.take()?;
        Some(Rendered {
            output,
            mapping: std::mem::take(&mut self.mapping),
        })
    }

    pub fn is_attached(&self) -> bool {
        self.output.is_some()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Current output position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Live call sites, innermost first.
    pub fn call_sites(&self) -> Vec<FilePosition> {
        self.mapping
            .call_sites(self.callers.last().map(|&c| c as u32))
    }

    fn put(&mut self, text: &str) {
        if let Some(out) = self.output.as_mut() {
            out.push_str(text);
            self.position.column += text.chars().count() as u32;
        }
    }

    fn break_line(&mut self, newline: &str) {
        if let Some(out) = self.output.as_mut() {
            out.push_str(newline);
            self.position.line += 1;
            self.position.column = 1;
            self.blank_line = true;
        }
    }

    /// Emit the current indentation if the output line is still blank. A
    /// non-empty indentation gets its own entry, attributed to the line that
    /// pushed it. Returns whether anything was emitted.
    fn indent_if_blank(&mut self) -> bool {
        if !self.blank_line {
            return false;
        }
        self.blank_line = false;
        let (indentation, origin, features) = match self.indents.innermost() {
            Some((text, origin, features)) if !text.is_empty() => {
                (text.to_string(), origin.clone(), features)
            }
            _ => return false,
        };
        self.record(&origin, features);
        self.put(&indentation);
        true
    }

    fn record(&mut self, at: &FilePosition, features: Features) {
        let caller = self.callers.last().copied();
        self.mapping.add_entry(self.position, at, caller, features);
    }

    /// Write `text`, indenting first if the output line is still blank.
    ///
    /// Without [`Features::MULTILINE`] the text is assumed to be single-line.
    /// With it, embedded `\n`s are tracked and every following non-empty line
    /// is indented as well; the write's entry is repeated after each such
    /// indentation.
    pub fn write(&mut self, text: &str, at: &FilePosition, features: Features) {
        if !self.is_attached() {
            return;
        }
        if !features.contains(Features::MULTILINE) {
            if !text.is_empty() {
                self.indent_if_blank();
            }
            self.record(at, features);
            self.put(text);
            return;
        }

        let mut recorded = false;
        for segment in text.split_inclusive('\n') {
            let (body, ends_line) = match segment.strip_suffix('\n') {
                Some(body) => (body, true),
                None => (segment, false),
            };
            let indented = !body.is_empty() && self.indent_if_blank();
            if !recorded || indented {
                self.record(at, features);
                recorded = true;
            }
            self.put(body);
            if ends_line {
                self.break_line("\n");
            }
        }
        if !recorded {
            self.record(at, features);
        }
    }

    /// Emit the configured newline.
    pub fn write_line(&mut self, at: &FilePosition) {
        if !self.is_attached() {
            return;
        }
        self.record(at, Features::NONE);
        let newline = std::mem::take(&mut self.newline);
        self.break_line(&newline);
        self.newline = newline;
    }

    /// Indent every following output line by `text` on top of the current
    /// indentation. Emitted indentation maps back to `at`.
    pub fn push_indentation(&mut self, text: &str, at: &FilePosition, features: Features) {
        if !self.is_attached() {
            return;
        }
        self.indents.push(text, at, features);
    }

    pub fn pop_indentation(&mut self) -> Result<(), RenderError> {
        if !self.is_attached() {
            return Ok(());
        }
        self.indents
            .pop()
            .map(|_| ())
            .ok_or(RenderError::IndentationUnderflow)
    }

    pub fn indentation_depth(&self) -> usize {
        self.indents.depth()
    }

    /// Attribute everything written until the matching `pop_caller` to `at`.
    pub fn push_caller(&mut self, at: &FilePosition) {
        if !self.is_attached() {
            return;
        }
        let parent = self.callers.last().copied();
        let index = self.mapping.add_caller(at, parent);
        self.callers.push(index);
    }

    pub fn pop_caller(&mut self) -> Result<(), RenderError> {
        if !self.is_attached() {
            return Ok(());
        }
        self.callers
            .pop()
            .map(|_| ())
            .ok_or(RenderError::CallerUnderflow)
    }
}
