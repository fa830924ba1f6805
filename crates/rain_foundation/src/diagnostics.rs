//! Advisory diagnostics.
//!
//! Warnings and hints are produced by `warning` and `hint` statements (usually
//! emitted by macros). They are collected here and logged; compilation
//! continues. Errors never pass through this sink; they abort via
//! [`crate::Error`].

use std::fmt;

use tracing::{info, warn};

use crate::span::Span;

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Something is probably wrong.
    Warning,
    /// A suggestion.
    Hint,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Hint => "hint",
        })
    }
}

/// A single advisory message.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
    /// Module the message came from.
    pub source: Option<String>,
    /// Position of the statement that produced it.
    pub span: Span,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "{source}:")?;
        }
        if !self.span.is_synthetic() {
            write!(f, "{}:{}:", self.span.line, self.span.column)?;
        }
        write!(f, " {}: {}", self.level, self.message)
    }
}

/// Collected diagnostics for one compilation session.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and logs it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Warning => warn!(target: "rain", "{diagnostic}"),
            Level::Hint => info!(target: "rain", "{diagnostic}"),
        }
        self.items.push(diagnostic);
    }

    /// Records a warning.
    pub fn warning(&mut self, message: impl Into<String>, source: Option<&str>, span: Span) {
        self.push(Diagnostic {
            level: Level::Warning,
            message: message.into(),
            source: source.map(str::to_string),
            span,
        });
    }

    /// Records a hint.
    pub fn hint(&mut self, message: impl Into<String>, source: Option<&str>, span: Span) {
        self.push(Diagnostic {
            level: Level::Hint,
            message: message.into(),
            source: source.map(str::to_string),
            span,
        });
    }

    /// Iterates over recorded diagnostics in order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of recorded diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut diags = Diagnostics::new();
        diags.warning("first", Some("main"), Span::new(0, 1, 1, 1));
        diags.hint("second", None, Span::synthetic());

        let levels: Vec<Level> = diags.iter().map(|d| d.level).collect();
        assert_eq!(levels, vec![Level::Warning, Level::Hint]);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn display_format() {
        let mut diags = Diagnostics::new();
        diags.warning("shadowed", Some("main"), Span::new(0, 1, 4, 2));
        let text = diags.iter().next().unwrap().to_string();
        assert_eq!(text, "main:4:2: warning: shadowed");
    }
}
