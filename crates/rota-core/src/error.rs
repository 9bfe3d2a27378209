use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ambiguous ID: multiple matches found")]
    AmbiguousId(Vec<(String, String)>),

    /// A store read failed while resolving. Transient; the caller may retry.
    #[error("Schedule unavailable: {0}")]
    ScheduleUnavailable(String),

    /// Write-time rejection of an override batch. Nothing was persisted.
    #[error("Invalid override: {0}")]
    InvalidOverride(OverrideViolation),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

impl CoreError {
    /// Collapses any store-side failure into `ScheduleUnavailable`, keeping
    /// the original message for logs.
    pub fn unavailable(err: CoreError) -> Self {
        match err {
            CoreError::ScheduleUnavailable(_) => err,
            other => CoreError::ScheduleUnavailable(error_chain(&other)),
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Field of a `TaskOverride` that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideField {
    WeekStartDate,
    TaskOverrides,
    AssignedDate,
    TaskId,
    Action,
    OriginalMemberId,
    NewMemberId,
    OverrideTime,
    OverrideDuration,
}

impl fmt::Display for OverrideField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverrideField::WeekStartDate => "weekStartDate",
            OverrideField::TaskOverrides => "taskOverrides",
            OverrideField::AssignedDate => "assignedDate",
            OverrideField::TaskId => "taskId",
            OverrideField::Action => "action",
            OverrideField::OriginalMemberId => "originalMemberId",
            OverrideField::NewMemberId => "newMemberId",
            OverrideField::OverrideTime => "overrideTime",
            OverrideField::OverrideDuration => "overrideDuration",
        };
        f.write_str(name)
    }
}

/// Names the offending override in a batch so the admin UI can highlight it.
/// `index` is `None` when the problem concerns the whole request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideViolation {
    pub index: Option<usize>,
    pub field: OverrideField,
    pub reason: String,
}

impl OverrideViolation {
    pub fn at(index: usize, field: OverrideField, reason: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            field,
            reason: reason.into(),
        }
    }

    pub fn request(field: OverrideField, reason: impl Into<String>) -> Self {
        Self {
            index: None,
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for OverrideViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "override #{} {}: {}", index + 1, self.field, self.reason),
            None => write!(f, "{}: {}", self.field, self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display_is_one_based() {
        let violation = OverrideViolation::at(0, OverrideField::AssignedDate, "outside week");
        assert_eq!(violation.to_string(), "override #1 assignedDate: outside week");
    }

    #[test]
    fn test_unavailable_wraps_once() {
        let err = CoreError::unavailable(CoreError::NotFound("week template".into()));
        assert!(matches!(err, CoreError::ScheduleUnavailable(ref m) if m.contains("week template")));

        let again = CoreError::unavailable(err);
        assert!(matches!(again, CoreError::ScheduleUnavailable(ref m) if !m.contains("Schedule unavailable")));
    }
}
