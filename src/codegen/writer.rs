use crate::mapping::{Features, Mapping};
use crate::parser::{FilePosition, Position};

/// Generated text plus the current write position and the mapping being built.
pub struct CodeWriter {
    code: String,
    position: Position,
    mapping: Mapping,
    file: String,
}

impl CodeWriter {
    pub fn new(file: &str) -> Self {
        Self {
            code: String::new(),
            position: Position::new(1, 1),
            mapping: Mapping::new(),
            file: file.to_string(),
        }
    }

    pub fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
        self.code.push_str(text);
    }

    pub fn newline(&mut self) {
        self.write("\n");
    }

    /// Number subsequent lines from 1 again, as a `#line 1` directive does.
    pub fn restart_numbering(&mut self) {
        self.position = Position::new(1, 1);
    }

    /// Map the current write position to `source` in this writer's template.
    pub fn map(&mut self, source: Position, features: Features) {
        let at = FilePosition::at(self.file.as_str(), source);
        self.mapping.add_entry(self.position, &at, None, features);
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn finish(self) -> (String, Mapping) {
        (self.code, self.mapping)
    }
}
