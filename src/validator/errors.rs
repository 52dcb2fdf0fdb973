//! Diagnostic collection

use crate::ast::SourceLocation;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// A user-facing problem found in a configuration tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Where the problem is, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// What is wrong
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic
    pub fn new(location: Option<SourceLocation>, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{loc}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Sink for diagnostics produced during a validation pass
pub trait ErrorCollector {
    /// Records a diagnostic
    fn error(&mut self, location: Option<SourceLocation>, message: String);

    /// Number of diagnostics recorded so far
    fn error_count(&self) -> usize;

    /// Rendered diagnostics in recording order
    fn errors_as_strings(&self) -> Vec<String>;

    /// Diagnostics as a JSON array of `{line, column, message}` objects
    fn as_json(&self) -> serde_json::Value;
}

/// Collector that keeps diagnostics in memory
#[derive(Debug, Default, Clone)]
pub struct SimpleErrorCollector {
    diagnostics: Vec<Diagnostic>,
}

impl SimpleErrorCollector {
    /// Creates an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded diagnostics
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drains the recorded diagnostics
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl ErrorCollector for SimpleErrorCollector {
    fn error(&mut self, location: Option<SourceLocation>, message: String) {
        tracing::debug!(?location, %message, "diagnostic");
        self.diagnostics.push(Diagnostic { location, message });
    }

    fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    fn errors_as_strings(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    fn as_json(&self) -> serde_json::Value {
        self.diagnostics
            .iter()
            .map(|d| {
                json!({
                    "line": d.location.map(|l| l.line),
                    "column": d.location.map(|l| l.column),
                    "message": d.message,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collector_records_in_order() {
        let mut collector = SimpleErrorCollector::new();
        collector.error(Some(SourceLocation::new(4, 2)), "No stages specified".to_string());
        collector.error(None, "Missing required section 'agent'".to_string());

        assert_eq!(collector.error_count(), 2);
        assert_eq!(
            collector.errors_as_strings(),
            vec![
                "line 4, column 2: No stages specified".to_string(),
                "Missing required section 'agent'".to_string(),
            ]
        );
    }

    #[test]
    fn test_collector_as_json() {
        let mut collector = SimpleErrorCollector::new();
        collector.error(Some(SourceLocation::new(1, 5)), "boom".to_string());
        assert_eq!(
            collector.as_json(),
            json!([{"line": 1, "column": 5, "message": "boom"}])
        );
    }

    #[test]
    fn test_take_drains() {
        let mut collector = SimpleErrorCollector::new();
        collector.error(None, "x".to_string());
        assert_eq!(collector.take().len(), 1);
        assert_eq!(collector.error_count(), 0);
    }
}
