use linetpl::backend::{FileSystemLoader, ProcessBackend};
use linetpl::logging::SessionLog;
use linetpl::remap::{ConsoleSink, JsonSink, MessageSink};
use linetpl::{Config, Engine, EngineError};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str =
    "usage: linetpl [--config FILE] [--generate] [--map] [--json] TEMPLATE [ARGS...]";

struct Options {
    config: Option<PathBuf>,
    generate: bool,
    map: bool,
    json: bool,
    template: String,
    args: Vec<String>,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut config = None;
    let mut generate = false;
    let mut map = false;
    let mut json = false;
    let mut rest = args.iter();

    let template = loop {
        match rest.next().map(String::as_str) {
            Some("--config") => {
                let path = rest.next().ok_or("--config needs a file")?;
                config = Some(PathBuf::from(path));
            }
            Some("--generate") => generate = true,
            Some("--map") => map = true,
            Some("--json") => json = true,
            Some(flag) if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            Some(template) => break template.to_string(),
            None => return Err("no template given".to_string()),
        }
    };

    Ok(Options {
        config,
        generate: generate || map,
        map,
        json,
        template,
        args: rest.cloned().collect(),
    })
}

fn run_generate(
    options: &Options,
    config: Config,
    log: SessionLog,
    sink: &mut dyn MessageSink,
) -> Result<(), EngineError> {
    let loader = FileSystemLoader::new(config.template_roots.clone());
    let engine = Engine::new(loader, (), config, log);
    let units = engine.generate_all(&options.template, sink)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for unit in &units {
        writeln!(out, "// ---- {} ----", unit.generated_path)?;
        out.write_all(unit.code.as_bytes())?;
        if options.map {
            writeln!(out, "// mapping: {}", unit.mapping.encode())?;
        }
    }
    out.flush()?;
    Ok(())
}

fn run_render(
    options: &Options,
    config: Config,
    log: SessionLog,
    sink: &mut dyn MessageSink,
) -> Result<bool, EngineError> {
    let loader = FileSystemLoader::new(config.template_roots.clone());
    let backend = ProcessBackend::from_config(&config, log.clone())?;
    let mut engine = Engine::new(loader, backend, config, log);
    let outcome = engine.render(&options.template, &options.args, sink)?;

    print!("{}", outcome.output);
    io::stdout().flush()?;
    Ok(outcome.succeeded())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_options(&args) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let config = match &options.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::from(2);
            }
        },
        None => Config::default(),
    };

    let log = SessionLog::new(config.log_file.clone(), config.verbose);
    log.banner(&format!("linetpl started, args {:?}", args));

    let mut sink: Box<dyn MessageSink> = if options.json {
        Box::new(JsonSink::new(io::stderr()))
    } else {
        Box::new(ConsoleSink)
    };

    let result = if options.generate {
        run_generate(&options, config, log.clone(), sink.as_mut()).map(|()| true)
    } else {
        run_render(&options, config, log.clone(), sink.as_mut())
    };

    let code = match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            sink.report(linetpl::remap::Severity::Error, &err.to_string(), None);
            ExitCode::FAILURE
        }
    };
    log.banner("linetpl exiting");
    code
}
