//! Generated-position to source-position tables.
//!
//! A [`Mapping`] is built append-only while text is emitted (by the code
//! generator for generated source, by the runtime renderer for output) and is
//! only queried afterwards. Entries are kept in non-decreasing generated
//! order, so lookups are a binary search for the nearest preceding entry.
//!
//! Callers form a forest: each call site points at the call site that was
//! active when it was entered. Chains are reported innermost-first.

mod vlq;

use crate::error::MappingError;
use crate::parser::{FilePosition, Position};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Per-entry flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features(u8);

impl Features {
    pub const NONE: Features = Features(0);
    /// The emitted text may contain newlines; column tracking must inspect it.
    pub const MULTILINE: Features = Features(1);
    /// The emitted text is a character-for-character copy of the source.
    pub const VERBATIM: Features = Features(2);

    pub fn from_bits(bits: u8) -> Self {
        Features(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        Features(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub generated: Position,
    pub source: Position,
    pub file: u32,
    pub caller: Option<u32>,
    pub features: Features,
}

/// One call site; `parent` is the call site active when it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub source: Position,
    pub file: u32,
    pub parent: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    files: Vec<String>,
    entries: Vec<MappingEntry>,
    callers: Vec<Caller>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    files: Vec<String>,
    callers: String,
    entries: String,
}

const ENCODING_VERSION: u32 = 1;

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn callers(&self) -> &[Caller] {
        &self.callers
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    fn intern(&mut self, file: &str) -> u32 {
        match self.files.iter().position(|f| f == file) {
            Some(i) => i as u32,
            None => {
                self.files.push(file.to_string());
                (self.files.len() - 1) as u32
            }
        }
    }

    fn file_position(&self, file: u32, position: Position) -> FilePosition {
        let name = self.files.get(file as usize).cloned().unwrap_or_default();
        FilePosition::at(name, position)
    }

    /// Record that text emitted at `generated` came from `source`.
    ///
    /// Generated positions must be non-decreasing; a later entry at the same
    /// position shadows the earlier one.
    pub fn add_entry(
        &mut self,
        generated: Position,
        source: &FilePosition,
        caller: Option<usize>,
        features: Features,
    ) {
        debug_assert!(self
            .entries
            .last()
            .map_or(true, |last| last.generated <= generated));
        debug_assert!(caller.map_or(true, |c| c < self.callers.len()));
        let file = self.intern(&source.file);
        self.entries.push(MappingEntry {
            generated,
            source: source.position,
            file,
            caller: caller.map(|c| c as u32),
            features,
        });
    }

    /// Register a call site and return its index for nested entries.
    pub fn add_caller(&mut self, source: &FilePosition, parent: Option<usize>) -> usize {
        debug_assert!(parent.map_or(true, |p| p < self.callers.len()));
        let file = self.intern(&source.file);
        self.callers.push(Caller {
            source: source.position,
            file,
            parent: parent.map(|p| p as u32),
        });
        self.callers.len() - 1
    }

    /// Last entry whose generated position is `<= pos`.
    pub fn entry_at(&self, pos: Position) -> Option<&MappingEntry> {
        let after = self.entries.partition_point(|e| e.generated <= pos);
        after.checked_sub(1).map(|i| &self.entries[i])
    }

    /// Source position of the nearest preceding entry.
    pub fn find_source_by_generated(&self, pos: Position) -> Option<FilePosition> {
        let entry = self.entry_at(pos)?;
        Some(self.file_position(entry.file, entry.source))
    }

    /// Like [`Mapping::find_source_by_generated`], but inside verbatim copies on
    /// the same line the column offset is carried over to the source.
    pub fn resolve(&self, pos: Position) -> Option<FilePosition> {
        let entry = self.entry_at(pos)?;
        let mut source = entry.source;
        if entry.features.contains(Features::VERBATIM) && entry.generated.line == pos.line {
            source.column += pos.column - entry.generated.column;
        }
        Some(self.file_position(entry.file, source))
    }

    /// The entry's own source position followed by each enclosing call site,
    /// innermost first. Empty when nothing precedes `pos`.
    pub fn caller_chain(&self, pos: Position) -> Vec<FilePosition> {
        let Some(entry) = self.entry_at(pos) else {
            return Vec::new();
        };
        let mut chain = vec![self.file_position(entry.file, entry.source)];
        chain.extend(self.call_sites(entry.caller));
        chain
    }

    /// Walk from `caller` up to its root.
    pub fn call_sites(&self, mut caller: Option<u32>) -> Vec<FilePosition> {
        let mut sites = Vec::new();
        while let Some(node) = caller.and_then(|c| self.callers.get(c as usize)) {
            sites.push(self.file_position(node.file, node.source));
            caller = node.parent;
        }
        sites
    }

    pub fn encode(&self) -> String {
        let mut callers = String::new();
        let mut prev = (0i64, 0i64, 0i64);
        for caller in &self.callers {
            let cur = (
                caller.source.line as i64,
                caller.source.column as i64,
                caller.file as i64,
            );
            vlq::encode(cur.0 - prev.0, &mut callers);
            vlq::encode(cur.1 - prev.1, &mut callers);
            vlq::encode(cur.2 - prev.2, &mut callers);
            vlq::encode(caller.parent.map_or(0, |p| p as i64 + 1), &mut callers);
            prev = cur;
        }

        let mut entries = String::new();
        let mut prev = [0i64; 6];
        for entry in &self.entries {
            let cur = [
                entry.generated.line as i64,
                entry.generated.column as i64,
                entry.file as i64,
                entry.source.line as i64,
                entry.source.column as i64,
                entry.caller.map_or(0, |c| c as i64 + 1),
            ];
            for (c, p) in cur.iter().zip(prev.iter()) {
                vlq::encode(c - p, &mut entries);
            }
            vlq::encode(entry.features.bits() as i64, &mut entries);
            prev = cur;
        }

        let envelope = Envelope {
            version: ENCODING_VERSION,
            files: self.files.clone(),
            callers,
            entries,
        };
        // Strings and integers only; serialization cannot fail.
        serde_json::to_string(&envelope).unwrap_or_default()
    }

    pub fn decode(input: &str) -> Result<Mapping, MappingError> {
        let envelope: Envelope = serde_json::from_str(input)?;
        if envelope.version != ENCODING_VERSION {
            return Err(MappingError::OutOfRange("version"));
        }
        let file_count = envelope.files.len() as i64;

        let mut callers = Vec::new();
        let mut reader = vlq::Decoder::new(&envelope.callers);
        let mut prev = (0i64, 0i64, 0i64);
        while !reader.is_empty() {
            let cur = (
                advance(prev.0, &mut reader)?,
                advance(prev.1, &mut reader)?,
                advance(prev.2, &mut reader)?,
            );
            let parent = reader.read()?;
            if !(0..file_count).contains(&cur.2) {
                return Err(MappingError::OutOfRange("caller file"));
            }
            if parent < 0 || parent > callers.len() as i64 {
                return Err(MappingError::OutOfRange("caller parent"));
            }
            callers.push(Caller {
                source: position(cur.0, cur.1)?,
                file: cur.2 as u32,
                parent: (parent > 0).then(|| (parent - 1) as u32),
            });
            prev = cur;
        }

        let mut entries: Vec<MappingEntry> = Vec::new();
        let mut reader = vlq::Decoder::new(&envelope.entries);
        let mut prev = [0i64; 6];
        while !reader.is_empty() {
            let mut cur = [0i64; 6];
            for (c, &p) in cur.iter_mut().zip(prev.iter()) {
                *c = advance(p, &mut reader)?;
            }
            let features = reader.read()?;
            if !(0..file_count).contains(&cur[2]) {
                return Err(MappingError::OutOfRange("entry file"));
            }
            if cur[5] < 0 || cur[5] > callers.len() as i64 {
                return Err(MappingError::OutOfRange("entry caller"));
            }
            let features =
                u8::try_from(features).map_err(|_| MappingError::OutOfRange("features"))?;
            let generated = position(cur[0], cur[1])?;
            if entries.last().is_some_and(|last| last.generated > generated) {
                return Err(MappingError::OutOfRange("entry order"));
            }
            entries.push(MappingEntry {
                generated,
                source: position(cur[3], cur[4])?,
                file: cur[2] as u32,
                caller: (cur[5] > 0).then(|| (cur[5] - 1) as u32),
                features: Features::from_bits(features),
            });
            prev = cur;
        }

        Ok(Mapping {
            files: envelope.files,
            entries,
            callers,
        })
    }
}

/// Apply the next delta from `reader` to `previous`.
fn advance(previous: i64, reader: &mut vlq::Decoder<'_>) -> Result<i64, MappingError> {
    previous
        .checked_add(reader.read()?)
        .ok_or(MappingError::Overflow)
}

fn position(line: i64, column: i64) -> Result<Position, MappingError> {
    let line = u32::try_from(line).map_err(|_| MappingError::OutOfRange("line"))?;
    let column = u32::try_from(column).map_err(|_| MappingError::OutOfRange("column"))?;
    Ok(Position::new(line, column))
}
