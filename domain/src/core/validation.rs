//! Configuration validation issues.
//!
//! Adapters that read user-supplied settings report problems as
//! [`ConfigIssue`]s instead of failing outright, so a warning can be shown
//! while the default is used.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: a default is used instead.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A string field did not parse into its enum.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A numeric field is outside its allowed range.
    OutOfRange { field: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Check whether any issues are errors (i.e. fatal).
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(ConfigIssue::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors() {
        let warning = ConfigIssue {
            severity: Severity::Warning,
            code: ConfigIssueCode::OutOfRange {
                field: "session.quorum".to_string(),
            },
            message: "out of range".to_string(),
        };
        assert!(!has_errors(std::slice::from_ref(&warning)));

        let error = ConfigIssue {
            severity: Severity::Error,
            ..warning.clone()
        };
        assert!(has_errors(&[warning, error]));
    }
}
