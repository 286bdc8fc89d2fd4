//! Diagnostic context threaded through every engine entry point.
//!
//! A [`Context`] carries the verbosity switch and records every notice and
//! warning it emits, so callers and tests can inspect mapping decisions after
//! the fact. Events are also forwarded to `tracing`: notices at `info` level
//! (only when verbose), warnings at `warn` level (always).

use std::cell::RefCell;

/// Severity of a recorded [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Progress or mapping decision, visible only in verbose mode.
    Notice,
    /// Non-fatal inconsistency, always reported.
    Warning,
}

/// One recorded diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the event.
    pub severity: Severity,
    /// Rendered message.
    pub message: String,
}

/// Explicit logging context passed into engine operations.
#[derive(Debug, Default)]
pub struct Context {
    verbose: bool,
    events: RefCell<Vec<Diagnostic>>,
}

impl Context {
    /// Create a context with the given verbosity.
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self {
            verbose,
            events: RefCell::new(Vec::new()),
        }
    }

    /// Whether verbose notices are enabled.
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Record a verbose-only notice.
    pub fn note(&self, message: impl Into<String>) {
        if !self.verbose {
            return;
        }
        let text = message.into();
        tracing::info!("{text}");
        self.push(Severity::Notice, text);
    }

    /// Record a warning; emitted regardless of verbosity.
    pub fn warn(&self, message: impl Into<String>) {
        let text = message.into();
        tracing::warn!("{text}");
        self.push(Severity::Warning, text);
    }

    /// Snapshot of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }

    /// Messages of recorded warnings, in emission order.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.severity == Severity::Warning)
            .map(|event| event.message.clone())
            .collect()
    }

    fn push(&self, severity: Severity, message: String) {
        self.events.borrow_mut().push(Diagnostic { severity, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, 0)]
    #[case(true, 1)]
    fn notices_follow_verbosity(#[case] verbose: bool, #[case] expected: usize) {
        let ctx = Context::new(verbose);
        ctx.note("Unknown key FOO with value \"bar\"");
        assert_eq!(ctx.events().len(), expected);
    }

    #[rstest]
    fn warnings_are_always_recorded() {
        let ctx = Context::new(false);
        ctx.warn("values differ");
        ctx.note("hidden");
        assert_eq!(ctx.warnings(), vec![String::from("values differ")]);
        assert_eq!(ctx.events().len(), 1);
    }
}
