//! Observable events
//!
//! Events are explicit and typed. Each one has a fixed name and a default
//! severity.

use std::fmt;

use super::logger::Severity;

/// Observable events in a dirql process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded
    ConfigLoaded,
    /// Pipeline wired and started
    QueryStart,
    /// Result stream fully consumed
    QueryComplete,
    /// Result stream ended with an error
    QueryFailed,
    /// Run stopped by the cancel token
    QueryCancelled,
    /// A pipeline stage emitted a terminal error
    StageFailed,
    /// Filesystem traversal failed
    WalkFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryStart => "QUERY_BEGIN",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryFailed => "QUERY_FAILED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::StageFailed => "STAGE_FAILED",
            Event::WalkFailed => "WALK_FAILED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded | Event::QueryStart | Event::QueryComplete => Severity::Info,
            Event::QueryCancelled => Severity::Warn,
            Event::StageFailed => Severity::Trace,
            Event::QueryFailed | Event::WalkFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::QueryStart,
            Event::QueryComplete,
            Event::QueryFailed,
            Event::QueryCancelled,
            Event::StageFailed,
            Event::WalkFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failures_are_errors() {
        assert_eq!(Event::QueryFailed.severity(), Severity::Error);
        assert_eq!(Event::WalkFailed.severity(), Severity::Error);
        assert_eq!(Event::QueryStart.severity(), Severity::Info);
    }
}
