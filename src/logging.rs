use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Progress log: appended to an optional file, echoed to stderr when verbose.
///
/// The file is reopened for every line so a crashed run still leaves a
/// complete log behind, and clones can be handed to backends freely.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    path: Option<PathBuf>,
    echo: bool,
}

impl SessionLog {
    pub fn new(path: Option<PathBuf>, echo: bool) -> Self {
        Self { path, echo }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn line(&self, message: impl Display) {
        if self.echo {
            eprintln!("{}", message);
        }
        let Some(path) = &self.path else {
            return;
        };
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
            writeln!(f, "[{}] {}", timestamp(), message).ok();
            f.flush().ok();
        }
    }

    /// Session banner, written once per run.
    pub fn banner(&self, title: &str) {
        self.line(format!("=== {} ===", title));
    }
}

fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("{}.{:03}", d.as_secs(), d.subsec_millis()),
        Err(_) => "0.000".to_string(),
    }
}
