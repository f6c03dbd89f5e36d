use std::fmt;

use chrono::NaiveDate;

use crate::store::StoreError;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    Unauthenticated,
    ValidationFailed,
    UnknownProblem,
    UserNotFound,
    DuplicateSolve,
    OutOfOrderActivity,
    StorageUnavailable,
    CorruptRecord,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::Unauthenticated => "E1003",
            Self::ValidationFailed => "E2001",
            Self::UnknownProblem => "E2002",
            Self::UserNotFound => "E2003",
            Self::DuplicateSolve => "E3001",
            Self::OutOfOrderActivity => "E3002",
            Self::StorageUnavailable => "E5001",
            Self::CorruptRecord => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Tracker not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::Unauthenticated => "No user identity",
            Self::ValidationFailed => "Invalid input",
            Self::UnknownProblem => "Problem not found",
            Self::UserNotFound => "User not found",
            Self::DuplicateSolve => "Problem already solved",
            Self::OutOfOrderActivity => "Activity date precedes last recorded activity",
            Self::StorageUnavailable => "Storage unavailable",
            Self::CorruptRecord => "Corrupt stored record",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `cstreak init` to create the tracker database."),
            Self::ConfigParseError => Some("Fix syntax in .codestreak/config.toml and retry."),
            Self::Unauthenticated => Some("Pass --user or set CODESTREAK_USER."),
            Self::ValidationFailed => {
                Some("Provide a problem id, a title and one of easy/moderate/hard/difficult.")
            }
            Self::UnknownProblem => Some("Check the problem id against the catalog."),
            Self::UserNotFound | Self::DuplicateSolve => None,
            Self::OutOfOrderActivity => {
                Some("Check the system clock; activity dates must not go backwards.")
            }
            Self::StorageUnavailable => Some("Retry the request; no partial solve was recorded."),
            Self::CorruptRecord => Some("Inspect the stored document or restore from backup."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// HTTP status a request boundary should answer with for this code.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::ValidationFailed | Self::ConfigParseError => 400,
            Self::Unauthenticated => 401,
            Self::UnknownProblem | Self::UserNotFound => 404,
            Self::DuplicateSolve | Self::OutOfOrderActivity => 409,
            Self::NotInitialized
            | Self::StorageUnavailable
            | Self::CorruptRecord
            | Self::InternalUnexpected => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the progress engine.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// A solve for this (user, problem) pair is already in the ledger.
    #[error("problem {problem_id} already solved by {user_id}")]
    DuplicateSolve { user_id: String, problem_id: String },

    /// Input rejected before any write.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The activity date is earlier than the last recorded activity.
    #[error("activity on {attempted} for {user_id} precedes last activity on {last}")]
    OutOfOrderActivity {
        user_id: String,
        last: NaiveDate,
        attempted: NaiveDate,
    },

    #[error("unknown problem {0}")]
    UnknownProblem(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl TrackerError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateSolve { .. } => ErrorCode::DuplicateSolve,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::OutOfOrderActivity { .. } => ErrorCode::OutOfOrderActivity,
            Self::UnknownProblem(_) => ErrorCode::UnknownProblem,
            Self::UserNotFound(_) => ErrorCode::UserNotFound,
            Self::Storage(StoreError::Corrupt { .. }) => ErrorCode::CorruptRecord,
            Self::Storage(_) => ErrorCode::StorageUnavailable,
        }
    }

    /// Remediation suggestion, falling back to the code's short message.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.code();
        code.hint().unwrap_or(code.message()).to_string()
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
