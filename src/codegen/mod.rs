//! Turns a template's command stream into target-language source.
//!
//! Every generated unit starts with a `#line 1` directive naming the template
//! followed by the import block, then one generated line per command. Each
//! command maps its generated line start to the payload's template position;
//! copied code is additionally mapped at its first character (verbatim, so
//! columns carry over) and after its last, so errors reported inside or just
//! past it land on the right template column.

mod escape;
mod writer;

use crate::mapping::{Features, Mapping};
use crate::parser::{ParseDiagnostic, Parser, Position, RenderCommand, SourceSpan};
use crate::remap::Severity;
use serde::{Deserialize, Serialize};
use writer::CodeWriter;

pub use escape::{escape_literal, quote};

/// Shape of the boilerplate around emitted commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetConventions {
    /// First line of every unit; `{file}` becomes the quoted template name.
    pub line_directive: String,
    pub imports: Vec<String>,
    /// Identifier of the renderer handle in generated code.
    pub renderer: String,
}

impl Default for TargetConventions {
    fn default() -> Self {
        Self {
            line_directive: "#line 1 {file}".to_string(),
            imports: vec![
                "using System;".to_string(),
                "using LineTemplates.Runtime;".to_string(),
            ],
            renderer: "__r".to_string(),
        }
    }
}

/// Generated source for one template.
#[derive(Debug, Clone)]
pub struct Generated {
    pub code: String,
    pub mapping: Mapping,
    /// Arguments of `#pragma include`, in template order.
    pub includes: Vec<String>,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub command_count: usize,
}

pub struct Generator {
    parser: Parser,
    conventions: TargetConventions,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(TargetConventions::default())
    }
}

impl Generator {
    pub fn new(conventions: TargetConventions) -> Self {
        Self::with_parser(Parser::new(), conventions)
    }

    pub fn with_parser(parser: Parser, conventions: TargetConventions) -> Self {
        Self {
            parser,
            conventions,
        }
    }

    pub fn conventions(&self) -> &TargetConventions {
        &self.conventions
    }

    pub fn generate(&self, source_name: &str, text: &str) -> Generated {
        let parsed = self.parser.parse(text);
        let mut emitter = Emitter {
            out: CodeWriter::new(source_name),
            file_literal: quote(source_name),
            renderer: &self.conventions.renderer,
            includes: Vec::new(),
            diagnostics: parsed.diagnostics,
        };

        let directive = self
            .conventions
            .line_directive
            .replace("{file}", &emitter.file_literal);
        emitter.out.write(&directive);
        emitter.out.newline();
        emitter.out.restart_numbering();
        for import in &self.conventions.imports {
            emitter.out.write(import);
            emitter.out.newline();
        }

        for command in &parsed.commands {
            emitter.emit(command);
        }

        let (code, mapping) = emitter.out.finish();
        Generated {
            code,
            mapping,
            includes: emitter.includes,
            diagnostics: emitter.diagnostics,
            command_count: parsed.commands.len(),
        }
    }
}

struct Emitter<'g> {
    out: CodeWriter,
    file_literal: String,
    renderer: &'g str,
    includes: Vec<String>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'g> Emitter<'g> {
    fn emit(&mut self, command: &RenderCommand<'_>) {
        match *command {
            RenderCommand::Text { text, end } => self.emit_text(text, end),
            RenderCommand::Expression { expr, end } => self.emit_expression(expr, end),
            RenderCommand::Statement { code, end } => self.emit_statement(code, end),
            RenderCommand::Script { code, end } => self.emit_script(code, end),
            RenderCommand::Pragma {
                name,
                argument,
                line,
                ..
            } => self.emit_pragma(name, argument, line),
            RenderCommand::PushIndentation { indent, .. } => {
                self.out.map(indent.position(), Features::NONE);
                let at = self.location(indent.position());
                let features = Features::NONE.bits().to_string();
                self.call(
                    "PushIndentation",
                    &[quote(indent.text()).as_str(), at.as_str(), features.as_str()],
                );
            }
            RenderCommand::PopIndentation { end } => {
                self.out.map(end.position(), Features::NONE);
                self.call("PopIndentation", &[]);
            }
            RenderCommand::NewLine { end } => {
                self.out.map(end.position(), Features::NONE);
                let at = self.location(end.position());
                self.call("WriteLine", &[at.as_str()]);
            }
        }
        self.out.newline();
    }

    /// `"file", line, column`
    fn location(&self, position: Position) -> String {
        format!(
            "{}, {}, {}",
            self.file_literal, position.line, position.column
        )
    }

    fn call(&mut self, method: &str, args: &[&str]) {
        self.out.write(self.renderer);
        self.out.write(".");
        self.out.write(method);
        self.out.write("(");
        self.out.write(&args.join(", "));
        self.out.write(");");
    }

    fn emit_text(&mut self, text: SourceSpan<'_>, end: SourceSpan<'_>) {
        self.out.map(text.position(), Features::NONE);
        self.out.write(self.renderer);
        self.out.write(".Write(");
        self.out.write(&quote(text.text()));
        self.out.map(end.position(), Features::NONE);
        let at = self.location(text.position());
        self.out
            .write(&format!(", {}, {});", at, Features::NONE.bits()));
    }

    fn emit_expression(&mut self, expr: SourceSpan<'_>, end: SourceSpan<'_>) {
        self.out.map(expr.position(), Features::NONE);
        self.out.write(self.renderer);
        self.out.write(".Write(");
        self.out.map(expr.position(), Features::VERBATIM);
        self.out.write(expr.text());
        self.out.map(end.position(), Features::NONE);
        let at = self.location(expr.position());
        self.out
            .write(&format!(", {}, {});", at, Features::MULTILINE.bits()));
    }

    fn emit_statement(&mut self, code: SourceSpan<'_>, end: SourceSpan<'_>) {
        self.out.map(code.position(), Features::NONE);
        let at = self.location(code.position());
        self.call("PushCaller", &[at.as_str()]);
        self.out.write(" ");
        self.out.map(code.position(), Features::VERBATIM);
        self.out.write(code.text());
        self.out.map(end.position(), Features::NONE);
        self.out.write(" ");
        self.call("PopCaller", &[]);
    }

    fn emit_script(&mut self, code: SourceSpan<'_>, end: SourceSpan<'_>) {
        self.out.map(code.position(), Features::VERBATIM);
        self.out.write(code.text());
        if !code.is_empty() {
            self.out.map(end.position(), Features::NONE);
        }
    }

    fn emit_pragma(
        &mut self,
        name: SourceSpan<'_>,
        argument: SourceSpan<'_>,
        line: SourceSpan<'_>,
    ) {
        self.out.map(line.position(), Features::NONE);
        match name.text() {
            "include" if argument.is_empty() => {
                self.warn(argument.position(), "empty include ignored")
            }
            "include" => self.includes.push(argument.text().to_string()),
            other => self.warn(
                name.position(),
                format!("unknown pragma `{}` ignored", other),
            ),
        }
    }

    fn warn(&mut self, position: Position, message: impl Into<String>) {
        self.diagnostics.push(ParseDiagnostic {
            severity: Severity::Warning,
            position,
            message: message.into(),
        });
    }
}
