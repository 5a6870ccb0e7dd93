use super::types::SourceSpan;

/// One unit of parser output. Every variant carries its payload span(s) and an
/// `end` span marking where the payload stops, used to map emitted suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand<'a> {
    /// Literal output text.
    Text {
        text: SourceSpan<'a>,
        end: SourceSpan<'a>,
    },
    /// Target-language expression whose value is written to the output.
    Expression {
        expr: SourceSpan<'a>,
        end: SourceSpan<'a>,
    },
    /// Target-language statement evaluated for its effects at a call site.
    Statement {
        code: SourceSpan<'a>,
        end: SourceSpan<'a>,
    },
    /// Target-language line copied verbatim.
    Script {
        code: SourceSpan<'a>,
        end: SourceSpan<'a>,
    },
    /// `#pragma <name> "<argument>"`.
    Pragma {
        name: SourceSpan<'a>,
        argument: SourceSpan<'a>,
        line: SourceSpan<'a>,
        end: SourceSpan<'a>,
    },
    PushIndentation {
        indent: SourceSpan<'a>,
        end: SourceSpan<'a>,
    },
    PopIndentation {
        end: SourceSpan<'a>,
    },
    NewLine {
        end: SourceSpan<'a>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Text,
    Expression,
    Statement,
    Script,
    Pragma,
    PushIndentation,
    PopIndentation,
    NewLine,
}

impl<'a> RenderCommand<'a> {
    pub fn kind(&self) -> CommandKind {
        match self {
            RenderCommand::Text { .. } => CommandKind::Text,
            RenderCommand::Expression { .. } => CommandKind::Expression,
            RenderCommand::Statement { .. } => CommandKind::Statement,
            RenderCommand::Script { .. } => CommandKind::Script,
            RenderCommand::Pragma { .. } => CommandKind::Pragma,
            RenderCommand::PushIndentation { .. } => CommandKind::PushIndentation,
            RenderCommand::PopIndentation { .. } => CommandKind::PopIndentation,
            RenderCommand::NewLine { .. } => CommandKind::NewLine,
        }
    }

    /// The span the command is "about": its payload, or its end marker for
    /// commands without one. Pragmas report their argument.
    pub fn payload(&self) -> SourceSpan<'a> {
        match *self {
            RenderCommand::Text { text, .. } => text,
            RenderCommand::Expression { expr, .. } => expr,
            RenderCommand::Statement { code, .. } | RenderCommand::Script { code, .. } => code,
            RenderCommand::Pragma { argument, .. } => argument,
            RenderCommand::PushIndentation { indent, .. } => indent,
            RenderCommand::PopIndentation { end } | RenderCommand::NewLine { end } => end,
        }
    }

    pub fn end(&self) -> SourceSpan<'a> {
        match *self {
            RenderCommand::Text { end, .. }
            | RenderCommand::Expression { end, .. }
            | RenderCommand::Statement { end, .. }
            | RenderCommand::Script { end, .. }
            | RenderCommand::Pragma { end, .. }
            | RenderCommand::PushIndentation { end, .. }
            | RenderCommand::PopIndentation { end }
            | RenderCommand::NewLine { end } => end,
        }
    }
}
