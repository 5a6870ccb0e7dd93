use crate::codegen::TargetConventions;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one run, read from a JSON file. Every key is optional.
///
/// ```json
/// {
///   "templateRoots": ["templates"],
///   "compileCommand": "csc-json -out:Templates.dll",
///   "runCommand": "dotnet run-template Templates.dll",
///   "logFile": "linetpl.log"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub template_roots: Vec<PathBuf>,
    /// Newline sequence the renderer emits for line breaks.
    pub newline: String,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
    /// Where generated units are written for the compiler.
    pub work_dir: PathBuf,
    pub compile_command: Option<String>,
    pub run_command: Option<String>,
    /// Appended to a template name to form its generated file name.
    pub generated_suffix: String,
    /// Stack frames whose method starts with one of these are renderer
    /// internals and are left out of reported traces.
    pub internal_frame_prefixes: Vec<String>,
    pub conventions: TargetConventions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_roots: vec![PathBuf::from(".")],
            newline: "\n".to_string(),
            log_file: None,
            verbose: false,
            work_dir: PathBuf::from("linetpl-out"),
            compile_command: None,
            run_command: None,
            generated_suffix: ".g.cs".to_string(),
            internal_frame_prefixes: vec!["LineTemplates.Runtime.".to_string()],
            conventions: TargetConventions::default(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Config, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn generated_path(&self, template: &str) -> String {
        format!("{}{}", template, self.generated_suffix)
    }
}
