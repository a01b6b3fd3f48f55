// Loading
mod parser;
pub use parser::AsmParser;
mod image;
pub use image::{DataSegment, Program, DATA_SIZE};
mod error;
mod span;
pub mod symbol;

// Running
mod fault;
pub use fault::ExecFault;
mod ops;
pub use ops::Op;
pub mod state;
mod runtime;
pub use runtime::{Engine, Status, STEP_BUDGET};
pub mod driver;

#[macro_use]
pub mod log;
pub mod output;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
