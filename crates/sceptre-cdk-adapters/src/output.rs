//! Output sink adapters.

use std::sync::{Arc, PoisonError, RwLock};

use sceptre_cdk_core::application::ports::{OutputSink, StreamKind};
use tracing::info;

/// Emits each subprocess line as an `info` event on the
/// `sceptre_cdk::subprocess` target.
#[derive(Debug, Clone, Default)]
pub struct TracingOutputSink {
    label: Option<String>,
}

impl TracingOutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every event with `label`, for example the stack name.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

impl OutputSink for TracingOutputSink {
    fn line(&self, stream: StreamKind, line: &str) {
        match &self.label {
            Some(label) => {
                info!(target: "sceptre_cdk::subprocess", %stream, label = %label, "{line}")
            }
            None => info!(target: "sceptre_cdk::subprocess", %stream, "{line}"),
        }
    }
}

/// In-memory sink for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutputSink {
    inner: Arc<RwLock<Vec<(StreamKind, String)>>>,
}

impl MemoryOutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received on `stream`, in order.
    pub fn lines(&self, stream: StreamKind) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for MemoryOutputSink {
    fn line(&self, stream: StreamKind, line: &str) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((stream, line.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order_per_stream() {
        let sink = MemoryOutputSink::new();
        sink.line(StreamKind::Stdout, "a");
        sink.line(StreamKind::Stderr, "b");
        sink.line(StreamKind::Stdout, "c");
        assert_eq!(sink.lines(StreamKind::Stdout), vec!["a", "c"]);
        assert_eq!(sink.lines(StreamKind::Stderr), vec!["b"]);
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn clones_share_lines() {
        let sink = MemoryOutputSink::new();
        let clone = sink.clone();
        clone.line(StreamKind::Stdout, "shared");
        assert!(!sink.is_empty());
    }

    #[test]
    fn tracing_sink_accepts_lines_without_subscriber() {
        TracingOutputSink::labelled("vpc").line(StreamKind::Stderr, "Publishing asset");
    }
}
