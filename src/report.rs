//! User-facing outcome reporting
//!
//! Every create, skip and failure during a mapping run is reported
//! through a [`Messenger`]. Reporting is fire-and-forget: the mapping
//! core never reads anything back, so implementations are free to print,
//! log or buffer.

use std::cell::RefCell;

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// Sink for user-facing outcome messages.
pub trait Messenger {
    fn report(&self, level: Level, message: &str);
}

/// Messenger that forwards to the `tracing` subscriber.
///
/// The binaries install this together with a `tracing-subscriber`
/// writing to stderr.
#[derive(Debug, Default)]
pub struct TracingMessenger;

impl Messenger for TracingMessenger {
    fn report(&self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!("{message}"),
            Level::Warning => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
        }
    }
}

/// Messenger that buffers messages for inspection.
#[derive(Debug, Default)]
pub struct BufferMessenger {
    entries: RefCell<Vec<(Level, String)>>,
}

impl BufferMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages reported so far, in order.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    /// Messages at one level, in order.
    pub fn at_level(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Messenger for BufferMessenger {
    fn report(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_preserves_order_and_levels() {
        let messenger = BufferMessenger::new();
        messenger.report(Level::Info, "created");
        messenger.report(Level::Warning, "skipped");
        messenger.report(Level::Info, "created again");

        assert_eq!(messenger.messages().len(), 3);
        assert_eq!(messenger.at_level(Level::Warning), vec!["skipped"]);
        assert_eq!(messenger.messages()[0].1, "created");
    }
}
