//! Translating compiler diagnostics and runtime stack frames from generated
//! coordinates back to template coordinates.

mod sink;

use crate::backend::{CompileDiagnostic, ExceptionFrame, RuntimeException};
use crate::mapping::Mapping;
use crate::parser::{FilePosition, Position};
use std::path::Path;

pub use sink::{ConsoleSink, JsonSink, MemorySink, Message, MessageSink, Severity, StackFrame};

const UNMAPPED_NOTE: &str = "(could not map generated position back to a template)";

/// Error and warning totals from one batch of compiler diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticCounts {
    pub errors: usize,
    pub warnings: usize,
}

pub struct Remapper<'a> {
    units: Vec<(&'a str, &'a Mapping)>,
    internal_frame_prefixes: &'a [String],
}

impl<'a> Remapper<'a> {
    /// `internal_frame_prefixes` name renderer methods that are left out of
    /// reported traces.
    pub fn new(internal_frame_prefixes: &'a [String]) -> Self {
        Self {
            units: Vec::new(),
            internal_frame_prefixes,
        }
    }

    pub fn add_unit(&mut self, generated_path: &'a str, mapping: &'a Mapping) {
        self.units.push((generated_path, mapping));
    }

    /// The mapping registered under `generated_path`. Compilers often report
    /// absolute paths, so a path ending in a registered path matches too, but
    /// only when no registered path matches exactly.
    pub fn mapping_for(&self, generated_path: &str) -> Option<&'a Mapping> {
        let reported = Path::new(generated_path);
        self.units
            .iter()
            .find(|(path, _)| *path == generated_path)
            .or_else(|| self.units.iter().find(|(path, _)| reported.ends_with(path)))
            .map(|(_, mapping)| *mapping)
    }

    fn lookup(&self, path: &str, line: u32, column: u32) -> Option<FilePosition> {
        self.mapping_for(path)?
            .resolve(Position::new(line, column.max(1)))
    }

    pub fn report_diagnostics(
        &self,
        diagnostics: &[CompileDiagnostic],
        sink: &mut dyn MessageSink,
    ) -> DiagnosticCounts {
        let mut counts = DiagnosticCounts::default();
        for diag in diagnostics {
            match diag.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => {}
            }

            match self.lookup(
                &diag.generated_path,
                diag.generated_line,
                diag.generated_column,
            ) {
                Some(at) => sink.report(diag.severity, &diag.message, Some(&at)),
                None => {
                    let raw = FilePosition::new(
                        diag.generated_path.as_str(),
                        diag.generated_line,
                        diag.generated_column,
                    );
                    let text = format!("{} {}", diag.message, UNMAPPED_NOTE);
                    sink.report(diag.severity, &text, Some(&raw));
                }
            }
        }
        counts
    }

    fn is_internal(&self, frame: &ExceptionFrame) -> bool {
        self.internal_frame_prefixes
            .iter()
            .any(|prefix| frame.method.starts_with(prefix.as_str()))
    }

    fn remap_frame(&self, frame: &ExceptionFrame) -> (StackFrame, bool) {
        let mapped = match (&frame.generated_path, frame.generated_line) {
            (Some(path), Some(line)) => {
                self.lookup(path, line, frame.generated_column.unwrap_or(1))
            }
            _ => None,
        };
        match mapped {
            Some(at) => (
                StackFrame {
                    method: frame.method.clone(),
                    file: Some(at.file),
                    line: Some(at.position.line),
                    column: Some(at.position.column),
                },
                true,
            ),
            None => (
                StackFrame {
                    method: frame.method.clone(),
                    file: frame.generated_path.clone(),
                    line: frame.generated_line,
                    column: frame.generated_column,
                },
                false,
            ),
        }
    }

    /// Map each frame into template coordinates, dropping renderer internals.
    /// Frames that cannot be mapped keep their generated coordinates.
    pub fn remap_frames(&self, frames: &[ExceptionFrame]) -> Vec<StackFrame> {
        frames
            .iter()
            .filter(|frame| !self.is_internal(frame))
            .map(|frame| self.remap_frame(frame).0)
            .collect()
    }

    /// Report an uncaught exception and its remapped call stack.
    ///
    /// `live_call_sites` is the renderer's caller stack at the time of the
    /// failure (innermost first). When no frame could be mapped, those sites
    /// follow the raw frames as `<template>` frames and the innermost one
    /// becomes the reported location.
    pub fn report_exception(
        &self,
        exception: &RuntimeException,
        live_call_sites: &[FilePosition],
        sink: &mut dyn MessageSink,
    ) {
        let (mut frames, mapped): (Vec<StackFrame>, Vec<bool>) = exception
            .frames
            .iter()
            .filter(|frame| !self.is_internal(frame))
            .map(|frame| self.remap_frame(frame))
            .unzip();

        let mut origin_index = mapped.iter().position(|&m| m);
        if origin_index.is_none() && !live_call_sites.is_empty() {
            origin_index = Some(frames.len());
            frames.extend(live_call_sites.iter().map(|site| StackFrame {
                method: "<template>".to_string(),
                file: Some(site.file.clone()),
                line: Some(site.position.line),
                column: Some(site.position.column),
            }));
        }

        let located = |frame: &StackFrame| {
            Some(FilePosition::new(
                frame.file.clone()?,
                frame.line?,
                frame.column.unwrap_or(1),
            ))
        };
        let origin = match origin_index {
            Some(i) => located(&frames[i]),
            None => frames.iter().find_map(located),
        };
        sink.report(Severity::Error, &exception.to_string(), origin.as_ref());
        sink.report_call_stack(&frames);
    }
}
