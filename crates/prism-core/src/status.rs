//! User-facing status log

/// Separator printed after every status entry.
pub const SEPARATOR: &str = "--------------------------------------------------";

/// Append-only sink for human-readable status entries: connection attempts,
/// sign-in results, color updates. Implementations terminate each entry with
/// [`SEPARATOR`].
pub trait StatusSink {
    fn publish(&mut self, entry: &str);
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish(&mut self, _entry: &str) {}
}
