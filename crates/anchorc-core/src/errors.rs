//! The compiler's diagnostic sink.
//!
//! This is deliberately not a `Result`-based error type: the compiler
//! never unwinds on a semantic or syntax problem. Every pass records a
//! diagnostic here and continues, so a single invocation surfaces as many
//! problems as possible. Rust-level fallibility (missing files, a
//! malformed manifest, a failed subprocess) is modeled separately with
//! `thiserror`/`anyhow` in the driver crate — see SPEC_FULL.md.

use crate::span::Span;

/// Diagnostic messages are formatted into a bounded buffer before being
/// stored, mirroring the original C implementation's `vsnprintf` into a
/// fixed stack buffer: a message that would overflow is silently
/// truncated rather than treated as a correctness hazard.
const MAX_MESSAGE_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

/// Append-only list of diagnostics produced by one compiler invocation.
#[derive(Debug, Default)]
pub struct Errors {
    diagnostics: Vec<Diagnostic>,
}

impl Errors {
    pub fn new() -> Self {
        Errors::default()
    }

    pub fn push(&mut self, severity: Severity, span: Span, message: impl Into<String>) {
        let mut message = message.into();
        if message.len() > MAX_MESSAGE_LEN {
            message.truncate(MAX_MESSAGE_LEN);
        }
        self.diagnostics.push(Diagnostic {
            severity,
            span,
            message,
        });
    }

    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.push(Severity::Error, span, message);
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.push(Severity::Warning, span, message);
    }

    pub fn hint(&mut self, span: Span, message: impl Into<String>) {
        self.push(Severity::Hint, span, message);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_sets_has_errors() {
        let mut errors = Errors::new();
        errors.warning(Span::synthetic(), "just a warning");
        assert!(!errors.has_errors());
        errors.error(Span::synthetic(), "a real problem");
        assert!(errors.has_errors());
        assert_eq!(errors.count(), 2);
    }

    #[test]
    fn overlong_message_is_truncated_not_rejected() {
        let mut errors = Errors::new();
        let long = "x".repeat(MAX_MESSAGE_LEN + 500);
        errors.error(Span::synthetic(), long);
        assert_eq!(errors.iter().next().unwrap().message.len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn passes_continue_after_errors_are_recorded() {
        // The sink itself never aborts a pass — pushing repeatedly is the
        // whole contract.
        let mut errors = Errors::new();
        for i in 0..5 {
            errors.error(Span::new(i, 1, 1, i + 1), format!("problem {i}"));
        }
        assert_eq!(errors.count(), 5);
    }
}
