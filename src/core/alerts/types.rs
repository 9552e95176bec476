//! Domain types for the alerting subsystem: a [`Severity`] level and the
//! normalised [`AlertMessage`] every formatter produces and every channel
//! consumes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Ordered so `>=` comparisons work naturally when filtering by minimum
/// severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

/// A normalised alert, ready for dispatch to a [`super::channels::NotificationChannel`].
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub fields: HashMap<String, String>,
    pub source_event_type: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertMessage {
    #[must_use]
    pub fn new(severity: Severity, title: impl Into<String>, source_event_type: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            body: String::new(),
            fields: HashMap::new(),
            source_event_type: source_event_type.into(),
            timestamp: Utc::now(),
        }
    }
}
