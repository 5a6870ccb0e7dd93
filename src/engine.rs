use crate::backend::{
    CompileBackend, InvokeBackend, RuntimeException, SourceUnit, TemplateLoader,
};
use crate::codegen::Generator;
use crate::config::Config;
use crate::error::EngineError;
use crate::logging::SessionLog;
use crate::mapping::Mapping;
use crate::parser::{FilePosition, Position};
use crate::remap::{DiagnosticCounts, MessageSink, Remapper, Severity};
use crate::runtime::{Renderer, Rendered};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

/// Generated source for one template, with the mapping built alongside it.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub name: String,
    pub resolved_path: PathBuf,
    pub generated_path: String,
    pub code: String,
    pub mapping: Mapping,
}

pub struct Compiled<U> {
    pub units: Vec<GeneratedUnit>,
    pub unit: U,
    pub counts: DiagnosticCounts,
}

/// Result of one render. A runtime exception is data here, already reported.
#[derive(Debug)]
pub struct RenderOutcome {
    pub output: String,
    pub mapping: Mapping,
    pub units: Vec<GeneratedUnit>,
    pub exception: Option<RuntimeException>,
}

impl RenderOutcome {
    pub fn succeeded(&self) -> bool {
        self.exception.is_none()
    }

    /// Template call chain behind an output position, innermost first.
    pub fn trace_output(&self, position: Position) -> Vec<FilePosition> {
        self.mapping.caller_chain(position)
    }
}

// Compilers honouring the `#line` directive report the template name instead
// of the generated path, so each unit answers to both.
fn remapper<'a>(prefixes: &'a [String], units: &'a [GeneratedUnit]) -> Remapper<'a> {
    let mut remapper = Remapper::new(prefixes);
    for unit in units {
        remapper.add_unit(&unit.generated_path, &unit.mapping);
    }
    for unit in units {
        remapper.add_unit(&unit.name, &unit.mapping);
    }
    remapper
}

pub struct Engine<L, B> {
    loader: L,
    backend: B,
    generator: Generator,
    config: Config,
    log: SessionLog,
}

impl<L: TemplateLoader, B> Engine<L, B> {
    pub fn new(loader: L, backend: B, config: Config, log: SessionLog) -> Self {
        let generator = Generator::new(config.conventions.clone());
        Self {
            loader,
            backend,
            generator,
            config,
            log,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Generate `root` and everything it includes, breadth-first. Each name is
    /// generated once, so include cycles terminate.
    pub fn generate_all(
        &self,
        root: &str,
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<GeneratedUnit>, EngineError> {
        let mut pending = VecDeque::from([root.to_string()]);
        let mut seen = HashSet::from([root.to_string()]);
        let mut units = Vec::new();

        while let Some(name) = pending.pop_front() {
            let loaded = self.loader.load(&name)?;
            let generated = self.generator.generate(&name, &loaded.text);

            for diag in &generated.diagnostics {
                let at = FilePosition::at(name.as_str(), diag.position);
                sink.report(diag.severity, &diag.message, Some(&at));
            }
            self.log.line(format!(
                "Generated {} ({} commands, includes: {:?})",
                name, generated.command_count, generated.includes
            ));

            for include in &generated.includes {
                if seen.insert(include.clone()) {
                    pending.push_back(include.clone());
                }
            }

            units.push(GeneratedUnit {
                generated_path: self.config.generated_path(&name),
                name,
                resolved_path: loaded.resolved_path,
                code: generated.code,
                mapping: generated.mapping,
            });
        }

        Ok(units)
    }
}

impl<L: TemplateLoader, B: CompileBackend> Engine<L, B> {
    /// Generate and compile; compiler diagnostics are reported in template
    /// coordinates. Fails when the compiler produced no unit.
    pub fn compile(
        &mut self,
        root: &str,
        sink: &mut dyn MessageSink,
    ) -> Result<Compiled<B::Unit>, EngineError> {
        let units = self.generate_all(root, sink)?;
        let sources: Vec<SourceUnit> = units
            .iter()
            .map(|unit| SourceUnit {
                path: unit.generated_path.clone(),
                text: unit.code.clone(),
            })
            .collect();

        self.log.line(format!("Compiling {} unit(s)", sources.len()));
        let output = self.backend.compile(&sources)?;

        let counts = remapper(&self.config.internal_frame_prefixes, &units)
            .report_diagnostics(&output.diagnostics, sink);
        self.log.line(format!(
            "Compile finished: {} error(s), {} warning(s)",
            counts.errors, counts.warnings
        ));

        match output.unit {
            Some(unit) => Ok(Compiled {
                units,
                unit,
                counts,
            }),
            None => Err(EngineError::Compile {
                errors: counts.errors,
            }),
        }
    }
}

impl<L: TemplateLoader, B: InvokeBackend> Engine<L, B> {
    /// Compile `root`, then run its entry point with a fresh renderer.
    pub fn render(
        &mut self,
        root: &str,
        args: &[String],
        sink: &mut dyn MessageSink,
    ) -> Result<RenderOutcome, EngineError> {
        let compiled = self.compile(root, sink)?;

        let entry = match self.backend.resolve_entry_point(&compiled.unit) {
            Ok(entry) => entry,
            Err(err) => {
                sink.report(Severity::Error, &err.to_string(), None);
                return Err(err.into());
            }
        };
        self.log.line(format!("Invoking {} with {:?}", root, args));

        let mut renderer = Renderer::new(self.config.newline.as_str());
        renderer.attach();
        let result = self.backend.invoke(&entry, &mut renderer, args);
        let live_call_sites = renderer.call_sites();
        let Rendered { output, mapping } = renderer.detach().unwrap_or_default();

        let exception = match result {
            Ok(()) => {
                self.log.line(format!("Rendered {} chars", output.chars().count()));
                None
            }
            Err(exception) => {
                self.log.line(format!("Runtime exception: {}", exception));
                remapper(&self.config.internal_frame_prefixes, &compiled.units).report_exception(
                    &exception,
                    &live_call_sites,
                    sink,
                );
                Some(exception)
            }
        };

        Ok(RenderOutcome {
            output,
            mapping,
            units: compiled.units,
            exception,
        })
    }
}
