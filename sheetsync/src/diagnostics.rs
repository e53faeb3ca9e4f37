//! Per-item failure reporting.
//!
//! A failure on one net or one component never aborts a run; it is turned
//! into a [`Diagnostic`] and the run moves on to the next item.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No session or no active view; the run stops before mutating anything
    HostUnavailable,
    /// A segment, component or label creation call returned no handle
    CreationFailure,
    /// A property read/write failed through every known alias
    AttributeAccessFailure,
    /// Every label placement tier was exhausted
    GeometryUnresolvable,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::HostUnavailable => write!(f, "host"),
            DiagnosticKind::CreationFailure => write!(f, "create"),
            DiagnosticKind::AttributeAccessFailure => write!(f, "attribute"),
            DiagnosticKind::GeometryUnresolvable => write!(f, "geometry"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Identifier of the construct that failed (refdes, net name, row...)
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn creation(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::CreationFailure, subject, message)
    }

    pub fn attribute(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::AttributeAccessFailure, subject, message)
    }

    pub fn geometry(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::GeometryUnresolvable, subject, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_short_line() {
        let d = Diagnostic::geometry("net2.5v", "no placement tier succeeded");
        assert_eq!(d.to_string(), "[geometry] net2.5v: no placement tier succeeded");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&DiagnosticKind::AttributeAccessFailure).unwrap();
        assert_eq!(json, "\"attribute_access_failure\"");
    }
}
