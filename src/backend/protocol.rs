use super::RuntimeException;
use crate::mapping::Features;
use crate::parser::FilePosition;
use crate::runtime::Renderer;
use serde::{Deserialize, Serialize};

/// One renderer call forwarded by an out-of-process entry point, one JSON
/// object per line: `{"op":"write","text":"Hi","file":"a.tpl","line":1,"column":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum RenderEvent {
    Write {
        text: String,
        file: String,
        line: u32,
        column: u32,
        #[serde(default)]
        features: u8,
    },
    WriteLine {
        file: String,
        line: u32,
        column: u32,
    },
    PushIndentation {
        text: String,
        file: String,
        line: u32,
        column: u32,
        #[serde(default)]
        features: u8,
    },
    PopIndentation,
    PushCaller {
        file: String,
        line: u32,
        column: u32,
    },
    PopCaller,
    Exception(RuntimeException),
}

impl RenderEvent {
    pub fn parse(line: &str) -> Result<RenderEvent, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Replay the call on `renderer`. An `exception` event comes back as `Err`.
    pub fn apply(self, renderer: &mut Renderer) -> Result<(), RuntimeException> {
        match self {
            RenderEvent::Write {
                text,
                file,
                line,
                column,
                features,
            } => {
                let at = FilePosition::new(file, line, column);
                renderer.write(&text, &at, Features::from_bits(features));
            }
            RenderEvent::WriteLine { file, line, column } => {
                renderer.write_line(&FilePosition::new(file, line, column));
            }
            RenderEvent::PushIndentation {
                text,
                file,
                line,
                column,
                features,
            } => {
                let at = FilePosition::new(file, line, column);
                renderer.push_indentation(&text, &at, Features::from_bits(features));
            }
            RenderEvent::PopIndentation => renderer.pop_indentation()?,
            RenderEvent::PushCaller { file, line, column } => {
                renderer.push_caller(&FilePosition::new(file, line, column));
            }
            RenderEvent::PopCaller => renderer.pop_caller()?,
            RenderEvent::Exception(exception) => return Err(exception),
        }
        Ok(())
    }
}
