//! Diagnostic stream recorded by the parser and the engine.

use std::fmt;

/// Severity of a diagnostic line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Effect of a single instruction.
    Trace,
    Info,
    /// Something odd that did not stop the machine.
    Warn,
    /// A fault. The machine is halted.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Trace => write!(f, "TRACE"),
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Diagnostic {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Record a formatted diagnostic into anything with a `Vec<Diagnostic>`.
#[macro_export]
macro_rules! diag {
    ( $log:expr, $level:ident, $fmt:literal $($tt:tt)* ) => {{
        $log.push($crate::log::Diagnostic::new(
            $crate::log::Level::$level,
            format!($fmt $($tt)*),
        ));
    }};
}
