//! Line-oriented template compiler.
//!
//! Templates mix literal text with target-language code, one directive per
//! line, selected by the line's first non-space character:
//!
//! ```text
//! #pragma include "footer.tpl"
//! \Hello #{user.Name}, you have #{count} new ##messages
//! |   (this line ends with a newline)
//! = Footer.Render(__r);
//! foreach (var item in items) {
//! ```
//!
//! The pipeline is scanner → rules → [`parser::RenderCommand`]s → generated
//! source plus a [`mapping::Mapping`] → external compile and invoke → output
//! plus a runtime mapping. Compiler diagnostics and runtime stack frames are
//! translated back to template positions through those mappings.

pub mod backend;
pub mod codegen;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod parser;
pub mod remap;
pub mod runtime;

pub use codegen::{Generated, Generator, TargetConventions};
pub use config::Config;
pub use engine::{Compiled, Engine, GeneratedUnit, RenderOutcome};
pub use error::EngineError;
pub use mapping::{Features, Mapping};
pub use parser::{FilePosition, Parser, Position};
pub use runtime::Renderer;
