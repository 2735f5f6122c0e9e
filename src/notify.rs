//! Output-only notification surface.
//!
//! The core reports outcomes through a single injected [`NotificationSink`];
//! nothing it returns is consulted.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Map a variant name to a severity. `danger` is an alias for `error`;
    /// anything unrecognized becomes `Info`.
    pub fn normalize(variant: &str) -> Self {
        match variant.trim().to_ascii_lowercase().as_str() {
            "success" => Severity::Success,
            "error" | "danger" => Severity::Error,
            "warning" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display surface for notifications.
/// `append` keeps earlier notifications visible instead of replacing them.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str, severity: Severity, append: bool);
}

/// Sink that writes notifications to the log. Used when no display is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, title: &str, message: &str, severity: Severity, append: bool) {
        match severity {
            Severity::Error | Severity::Warning => {
                warn!(severity = %severity, append, "{}: {}", title, message)
            }
            Severity::Success | Severity::Info => {
                info!(severity = %severity, append, "{}: {}", title, message)
            }
        }
    }
}

/// Convenience front for a sink.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Show a notification with a free-form variant name.
    pub fn show(&self, title: &str, message: &str, variant: &str, append: bool) {
        self.sink
            .notify(title, message, Severity::normalize(variant), append);
    }

    pub fn success(&self, title: &str, message: &str) {
        self.sink.notify(title, message, Severity::Success, false);
    }

    pub fn error(&self, title: &str, message: &str) {
        self.sink.notify(title, message, Severity::Error, false);
    }

    pub fn warning(&self, title: &str, message: &str) {
        self.sink.notify(title, message, Severity::Warning, false);
    }

    pub fn info(&self, title: &str, message: &str) {
        self.sink.notify(title, message, Severity::Info, false);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
