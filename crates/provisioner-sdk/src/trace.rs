/// Diagnostic sink for the process invoker and the layers above it.
///
/// The common crate implements this over `tracing` with secret masking, so
/// nothing in the SDK logs an unmasked argument list.
pub trait TraceWriter: Send + Sync {
    fn info(&self, message: &str);

    /// Detail that is only emitted at debug level.
    fn verbose(&self, message: &str);

    fn warning(&self, message: &str) {
        self.info(&format!("[warning] {message}"));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::TraceWriter;
    use parking_lot::Mutex;

    /// Discards everything.
    pub(crate) struct NullTraceWriter;

    impl TraceWriter for NullTraceWriter {
        fn info(&self, _message: &str) {}
        fn verbose(&self, _message: &str) {}
    }

    /// Keeps every line so a test can look for a specific message.
    #[derive(Default)]
    pub(crate) struct CollectingTraceWriter {
        lines: Mutex<Vec<String>>,
    }

    impl CollectingTraceWriter {
        pub(crate) fn contains(&self, needle: &str) -> bool {
            self.lines.lock().iter().any(|line| line.contains(needle))
        }

        pub(crate) fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    impl TraceWriter for CollectingTraceWriter {
        fn info(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }

        fn verbose(&self, message: &str) {
            self.lines.lock().push(format!("[verbose] {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CollectingTraceWriter;
    use super::TraceWriter;

    #[test]
    fn warning_defaults_to_tagged_info() {
        let writer = CollectingTraceWriter::default();
        writer.warning("kill failed");
        writer.verbose("cwd");
        assert_eq!(writer.lines(), vec!["[warning] kill failed", "[verbose] cwd"]);
    }
}
