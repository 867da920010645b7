//! Observability for schema building and record lifecycle
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on construction or assignment
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use datamodel::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! log_event_with_fields(Event::SchemaBuilt, &[("type", "User")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // verifies no panic
        log_event(Event::SchemasLoaded);
        log_event_with_fields(Event::RecordRejected, &[("type", "User"), ("errors", "2")]);
    }

    #[test]
    fn test_default_threshold_drops_trace() {
        assert!(!Logger::enabled(Severity::Trace) || Logger::min_severity() == Severity::Trace);
        assert!(Logger::enabled(Severity::Fatal));
    }
}
