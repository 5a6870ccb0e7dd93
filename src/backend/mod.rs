//! Collaborators the pipeline drives but does not implement: where template
//! text comes from, and how generated source is compiled and run.

mod loader;
mod process;
mod protocol;

use crate::error::{EntryPointError, LoadError, RenderError};
use crate::remap::Severity;
use crate::runtime::Renderer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;

pub use loader::{FileSystemLoader, MemoryLoader};
pub use process::{ProcessBackend, ProcessEntry, ProcessUnit};
pub use protocol::RenderEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTemplate {
    pub resolved_path: PathBuf,
    pub text: String,
}

pub trait TemplateLoader {
    fn load(&self, name: &str) -> Result<LoadedTemplate, LoadError>;
}

/// One generated file handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: String,
    pub text: String,
}

/// A compiler message in generated-source coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileDiagnostic {
    pub severity: Severity,
    pub generated_path: String,
    pub generated_line: u32,
    pub generated_column: u32,
    pub message: String,
}

#[derive(Debug)]
pub struct CompileOutput<U> {
    /// `None` when compilation produced errors.
    pub unit: Option<U>,
    pub diagnostics: Vec<CompileDiagnostic>,
}

pub trait CompileBackend {
    type Unit;

    fn compile(&mut self, units: &[SourceUnit]) -> io::Result<CompileOutput<Self::Unit>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionFrame {
    pub method: String,
    #[serde(default)]
    pub generated_path: Option<String>,
    #[serde(default)]
    pub generated_line: Option<u32>,
    #[serde(default)]
    pub generated_column: Option<u32>,
}

/// An uncaught failure raised while the entry point ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeException {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub frames: Vec<ExceptionFrame>,
}

impl RuntimeException {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            frames: Vec::new(),
        }
    }
}

impl fmt::Display for RuntimeException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<RenderError> for RuntimeException {
    fn from(err: RenderError) -> Self {
        RuntimeException::new("RenderError", err.to_string())
    }
}

/// Locates and runs the entry point of a compiled unit.
///
/// The renderer is handed to every invocation; implementations must route all
/// output through it.
pub trait InvokeBackend: CompileBackend {
    type Entry;

    fn resolve_entry_point(&mut self, unit: &Self::Unit) -> Result<Self::Entry, EntryPointError>;

    fn invoke(
        &mut self,
        entry: &Self::Entry,
        renderer: &mut Renderer,
        args: &[String],
    ) -> Result<(), RuntimeException>;
}
