use std::io;
use std::path::PathBuf;

/// Template loader failures.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("template `{0}` not found")]
    NotFound(String),
    #[error("failed to read template `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Errors decoding a compact mapping.
#[derive(thiserror::Error, Debug)]
pub enum MappingError {
    #[error("invalid VLQ digit {0:?}")]
    InvalidDigit(char),
    #[error("VLQ stream ends in the middle of a value")]
    Truncated,
    #[error("VLQ value does not fit in 64 bits")]
    Overflow,
    #[error("mapping field out of range: {0}")]
    OutOfRange(&'static str),
    #[error("malformed mapping envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

/// Stack discipline violations in the runtime renderer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("popIndentation called with no indentation pushed")]
    IndentationUnderflow,
    #[error("popCaller called with no caller pushed")]
    CallerUnderflow,
}

/// The compiled unit has no usable entry point.
#[derive(thiserror::Error, Debug)]
pub enum EntryPointError {
    #[error("no entry point found, expected {expected}")]
    NotFound { expected: String },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid command line `{0}`")]
    Command(String),
}

/// Fatal failures of one compile or render request.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("compilation failed with {errors} error(s)")]
    Compile { errors: usize },
    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
