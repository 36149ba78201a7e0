//! Transient user notifications.

use std::fmt;

use tracing::{error, info, warn};

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl Severity {
    /// Lowercase name, as used for styling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shows short messages to the user.
pub trait Notifier: Send + Sync {
    /// Show `message`. A new alert replaces any alert still on screen.
    fn show_alert(&self, message: &str, severity: Severity);
}

/// Notifier that writes alerts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_alert(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(target: "fastbite::alert", %severity, "{message}"),
            Severity::Warning => warn!(target: "fastbite::alert", %severity, "{message}"),
            Severity::Success | Severity::Info => {
                info!(target: "fastbite::alert", %severity, "{message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity_is_info() {
        assert_eq!(Severity::default(), Severity::Info);
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
