use crate::parser::FilePosition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One reported stack frame, in template coordinates when it could be mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub method: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}", self.method)?;
        if let Some(file) = &self.file {
            write!(f, " in {}", file)?;
            if let Some(line) = self.line {
                write!(f, "({}", line)?;
                if let Some(column) = self.column {
                    write!(f, ",{}", column)?;
                }
                write!(f, ")")?;
            }
        }
        Ok(())
    }
}

/// Where user-facing messages go.
pub trait MessageSink {
    fn report(&mut self, severity: Severity, text: &str, source: Option<&FilePosition>);
    fn report_call_stack(&mut self, frames: &[StackFrame]);
}

/// `file(line,col): severity: text` on stderr.
#[derive(Default)]
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn report(&mut self, severity: Severity, text: &str, source: Option<&FilePosition>) {
        match source {
            Some(at) => eprintln!("{}: {}: {}", at, severity, text),
            None => eprintln!("{}: {}", severity, text),
        }
    }

    fn report_call_stack(&mut self, frames: &[StackFrame]) {
        for frame in frames {
            eprintln!("   {}", frame);
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum SinkRecord<'a> {
    Message {
        severity: Severity,
        text: &'a str,
        source: Option<&'a FilePosition>,
    },
    CallStack {
        frames: &'a [StackFrame],
    },
}

/// One JSON object per line, for tools.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, record: &SinkRecord<'_>) {
        if let Ok(json) = serde_json::to_string(record) {
            writeln!(self.out, "{}", json).ok();
            self.out.flush().ok();
        }
    }
}

impl<W: Write> MessageSink for JsonSink<W> {
    fn report(&mut self, severity: Severity, text: &str, source: Option<&FilePosition>) {
        self.emit(&SinkRecord::Message {
            severity,
            text,
            source,
        });
    }

    fn report_call_stack(&mut self, frames: &[StackFrame]) {
        self.emit(&SinkRecord::CallStack { frames });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
    pub source: Option<FilePosition>,
}

/// Keeps everything it is given.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub messages: Vec<Message>,
    pub call_stacks: Vec<Vec<StackFrame>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }
}

impl MessageSink for MemorySink {
    fn report(&mut self, severity: Severity, text: &str, source: Option<&FilePosition>) {
        self.messages.push(Message {
            severity,
            text: text.to_string(),
            source: source.cloned(),
        });
    }

    fn report_call_stack(&mut self, frames: &[StackFrame]) {
        self.call_stacks.push(frames.to_vec());
    }
}
