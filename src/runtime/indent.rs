use crate::mapping::Features;
use crate::parser::FilePosition;

struct IndentLevel {
    fragment: String,
    /// All enclosing fragments followed by this one.
    full: String,
    origin: FilePosition,
    features: Features,
}

/// Indentation levels; the full indentation string is precomputed per level.
#[derive(Default)]
pub struct IndentStack {
    levels: Vec<IndentLevel>,
}

impl IndentStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str, origin: &FilePosition, features: Features) {
        let mut full = String::with_capacity(self.current().len() + fragment.len());
        full.push_str(self.current());
        full.push_str(fragment);
        self.levels.push(IndentLevel {
            fragment: fragment.to_string(),
            full,
            origin: origin.clone(),
            features,
        });
    }

    /// Remove the innermost level, returning its fragment.
    pub fn pop(&mut self) -> Option<String> {
        self.levels.pop().map(|level| level.fragment)
    }

    pub fn current(&self) -> &str {
        self.levels.last().map_or("", |level| level.full.as_str())
    }

    /// Full indentation of the innermost level and where that level was pushed.
    pub fn innermost(&self) -> Option<(&str, &FilePosition, Features)> {
        self.levels
            .last()
            .map(|level| (level.full.as_str(), &level.origin, level.features))
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
