use super::{
    CompileBackend, CompileDiagnostic, CompileOutput, InvokeBackend, RenderEvent,
    RuntimeException, SourceUnit,
};
use crate::config::Config;
use crate::error::{ConfigError, EntryPointError};
use crate::logging::SessionLog;
use crate::remap::Severity;
use crate::runtime::Renderer;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};

const EXPECTED_ENTRY: &str =
    "a `runCommand` whose stdout streams render events (`{\"op\":\"write\",...}` per line)";

/// Generated units written to disk and accepted by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessUnit {
    pub work_dir: PathBuf,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub argv: Vec<String>,
    pub work_dir: PathBuf,
}

/// Compiles and runs generated code with external commands.
///
/// The compile command gets the generated file paths appended and may print
/// diagnostics as JSON lines. The run command gets the user arguments
/// appended and streams [`RenderEvent`]s on stdout.
pub struct ProcessBackend {
    compile_command: Vec<String>,
    run_command: Vec<String>,
    work_dir: PathBuf,
    log: SessionLog,
}

fn split_command(line: Option<&str>) -> Result<Vec<String>, ConfigError> {
    match line {
        None => Ok(Vec::new()),
        Some(line) => shlex::split(line).ok_or_else(|| ConfigError::Command(line.to_string())),
    }
}

impl ProcessBackend {
    pub fn new(
        compile_command: Vec<String>,
        run_command: Vec<String>,
        work_dir: PathBuf,
        log: SessionLog,
    ) -> Self {
        Self {
            compile_command,
            run_command,
            work_dir,
            log,
        }
    }

    pub fn from_config(config: &Config, log: SessionLog) -> Result<Self, ConfigError> {
        Ok(Self::new(
            split_command(config.compile_command.as_deref())?,
            split_command(config.run_command.as_deref())?,
            config.work_dir.clone(),
            log,
        ))
    }

    fn write_units(&self, units: &[SourceUnit]) -> io::Result<Vec<String>> {
        fs::create_dir_all(&self.work_dir)?;
        let mut written = Vec::with_capacity(units.len());
        for unit in units {
            let path = self.work_dir.join(&unit.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &unit.text)?;
            written.push(unit.path.clone());
        }
        Ok(written)
    }
}

impl CompileBackend for ProcessBackend {
    type Unit = ProcessUnit;

    fn compile(&mut self, units: &[SourceUnit]) -> io::Result<CompileOutput<ProcessUnit>> {
        let sources = self.write_units(units)?;
        let unit = ProcessUnit {
            work_dir: self.work_dir.clone(),
            sources: sources.clone(),
        };

        let Some((program, fixed_args)) = self.compile_command.split_first() else {
            self.log.line("No compile command configured, using sources as-is");
            return Ok(CompileOutput {
                unit: Some(unit),
                diagnostics: Vec::new(),
            });
        };

        self.log.line(format!(
            "Compiling {} unit(s) with `{}`",
            sources.len(),
            program
        ));
        let output = Command::new(program)
            .args(fixed_args)
            .args(&sources)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .output()?;

        let mut diagnostics = Vec::new();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            match serde_json::from_str::<CompileDiagnostic>(line.trim()) {
                Ok(diag) => diagnostics.push(diag),
                Err(_) if line.trim().is_empty() => {}
                Err(_) => self.log.line(format!("compiler: {}", line)),
            }
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            self.log.line(format!("compiler stderr: {}", line));
        }

        let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
        if !output.status.success() && !has_errors {
            diagnostics.push(CompileDiagnostic {
                severity: Severity::Error,
                generated_path: String::new(),
                generated_line: 0,
                generated_column: 0,
                message: format!("compiler exited with {}", output.status),
            });
        }
        let failed = !output.status.success() || has_errors;

        Ok(CompileOutput {
            unit: (!failed).then_some(unit),
            diagnostics,
        })
    }
}

impl InvokeBackend for ProcessBackend {
    type Entry = ProcessEntry;

    fn resolve_entry_point(&mut self, unit: &ProcessUnit) -> Result<ProcessEntry, EntryPointError> {
        if self.run_command.is_empty() {
            return Err(EntryPointError::NotFound {
                expected: EXPECTED_ENTRY.to_string(),
            });
        }
        Ok(ProcessEntry {
            argv: self.run_command.clone(),
            work_dir: unit.work_dir.clone(),
        })
    }

    fn invoke(
        &mut self,
        entry: &ProcessEntry,
        renderer: &mut Renderer,
        args: &[String],
    ) -> Result<(), RuntimeException> {
        let process_error = |what: &str, err: io::Error| {
            RuntimeException::new("ProcessError", format!("{}: {}", what, err))
        };

        let (program, fixed_args) = entry.argv.split_first().ok_or_else(|| {
            RuntimeException::new("ProcessError", "empty run command")
        })?;
        let mut child = Command::new(program)
            .args(fixed_args)
            .args(args)
            .current_dir(&entry.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| process_error(&format!("failed to start `{}`", program), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RuntimeException::new("ProcessError", "no stdout"))?;

        let mut failure = None;
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    failure = Some(process_error("failed to read render events", e));
                    break;
                }
            };
            let trimmed = line.trim();
            if !trimmed.starts_with('{') {
                if !trimmed.is_empty() {
                    self.log.line(format!("entry point: {}", trimmed));
                }
                continue;
            }
            let applied = RenderEvent::parse(trimmed)
                .map_err(|e| RuntimeException::new("ProtocolError", e.to_string()))
                .and_then(|event| event.apply(renderer));
            if let Err(exception) = applied {
                failure = Some(exception);
                break;
            }
        }

        if let Some(exception) = failure {
            child.kill().ok();
            child.wait().ok();
            return Err(exception);
        }

        let status = child
            .wait()
            .map_err(|e| process_error("failed to wait for entry point", e))?;
        if !status.success() {
            return Err(RuntimeException::new(
                "ProcessExit",
                format!("entry point exited with {}", status),
            ));
        }
        Ok(())
    }
}
