use super::{LoadedTemplate, TemplateLoader};
use crate::error::LoadError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Looks a template name up under each root directory in order.
pub struct FileSystemLoader {
    roots: Vec<PathBuf>,
}

impl FileSystemLoader {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let roots = if roots.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            roots
        };
        Self { roots }
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> Result<LoadedTemplate, LoadError> {
        for root in &self.roots {
            let candidate = root.join(name);
            if !candidate.is_file() {
                continue;
            }
            return match fs::read_to_string(&candidate) {
                Ok(text) => Ok(LoadedTemplate {
                    resolved_path: candidate,
                    text,
                }),
                Err(source) => Err(LoadError::Io {
                    name: name.to_string(),
                    source,
                }),
            };
        }
        Err(LoadError::NotFound(name.to_string()))
    }
}

/// Templates held in memory, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, text: &str) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: &str, text: &str) {
        self.templates.insert(name.to_string(), text.to_string());
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<LoadedTemplate, LoadError> {
        self.templates
            .get(name)
            .map(|text| LoadedTemplate {
                resolved_path: PathBuf::from(name),
                text: text.clone(),
            })
            .ok_or_else(|| LoadError::NotFound(name.to_string()))
    }
}

