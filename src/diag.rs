//! Injected diagnostic sink capability
//!
//! The engine emits free-form, human-readable progress and warning lines
//! rather than a structured protocol. Instead of writing to global output
//! streams, the lines go through an injected [`DiagnosticSink`] so the core
//! stays testable without capturing real console output.
//!
//! [`TracingSink`] is the default and forwards to the `tracing` macros;
//! [`MemorySink`] buffers lines for test assertions.

use std::sync::Arc;

use parking_lot::Mutex;

/// Capability for receiving human-readable diagnostic lines
pub trait DiagnosticSink: Send {
    /// Progress and debug output
    fn note(&mut self, message: &str);

    /// Non-fatal failures (snapshot writes, directory creation)
    fn warn(&mut self, message: &str);
}

/// Default sink forwarding to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn note(&mut self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Test sink buffering lines in memory
///
/// Clones share the same buffer, so a test can keep one clone and hand the
/// other to the engine.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded lines, in order
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Whether any recorded line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }

    /// Number of recorded lines
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn note(&mut self, message: &str) {
        self.lines.lock().push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.lines.lock().push(format!("warning: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let mut sink = MemorySink::new();
        sink.note("first");
        sink.warn("second");
        sink.note("third");

        assert_eq!(sink.lines(), vec![
            "first".to_string(),
            "warning: second".to_string(),
            "third".to_string(),
        ]);
    }

    #[test]
    fn test_memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.note("shared");

        assert!(sink.contains("shared"));
        assert_eq!(sink.len(), 1);
        assert!(!sink.is_empty());
    }
}
