//! Human-readable progress reporting.
//!
//! The pipeline announces each milestone through a [`ProgressSink`].
//! Callers that pass no sink get [`ConsoleProgress`].

/// Receives progress messages at pipeline milestones.
pub trait ProgressSink {
    /// Report one status line.
    fn report(&self, message: &str);
}

/// Writes every message to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&self, message: &str) {
        println!("{message}");
    }
}

impl<F: Fn(&str)> ProgressSink for F {
    fn report(&self, message: &str) {
        self(message);
    }
}

/// Report through `sink`, or to the console if there is none.
pub fn report(sink: Option<&dyn ProgressSink>, message: &str) {
    match sink {
        Some(sink) => sink.report(message),
        None => ConsoleProgress.report(message),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn closures_are_sinks() {
        let seen = RefCell::new(Vec::new());
        let sink = |m: &str| seen.borrow_mut().push(m.to_string());
        report(Some(&sink), "first");
        report(Some(&sink), "second");
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn missing_sink_is_not_an_error() {
        report(None, "to the console");
    }
}
