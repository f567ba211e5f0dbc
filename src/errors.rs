//! Unified error types and result handling.
//!
//! Every core operation returns [`Result`]; the HTTP layer turns each variant into a
//! status code and a one-line message, so callers never need to inspect database errors.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by the workforce service.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced row does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up (e.g. "employee")
        entity: &'static str,
        /// Identifier that was not found
        id: i64,
    },

    /// The acting user's role or site assignments do not cover the target row
    #[error("Not authorized to {action}")]
    NotAuthorized {
        /// Human-readable description of the refused action
        action: String,
    },

    /// A required field is missing or malformed
    #[error("{message}")]
    Validation {
        /// Message shown to the user
        message: String,
    },

    /// Payroll aggregation found no attendance for the employee (or anyone) on that date
    #[error("{}", no_attendance_message(*employee_id, date))]
    NoAttendance {
        /// Employee whose attendance was summed; `None` when a whole day was looked at
        employee_id: Option<i64>,
        /// Date that had no attendance rows
        date: NaiveDate,
    },

    /// No acting user was supplied with the request
    #[error("Authentication required")]
    Unauthenticated,

    /// The acting user exists but has been deactivated
    #[error("Account {user_id} is inactive")]
    InactiveAccount {
        /// Id of the inactive user
        user_id: i64,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (binding the listener, reading files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for [`Error::NotAuthorized`].
    pub fn not_authorized(action: impl Into<String>) -> Self {
        Self::NotAuthorized {
            action: action.into(),
        }
    }

    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn no_attendance_message(employee_id: Option<i64>, date: &NaiveDate) -> String {
    match employee_id {
        Some(id) => format!("No attendance found for employee {id} on {date}"),
        None => format!("No attendance found on {date}"),
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
