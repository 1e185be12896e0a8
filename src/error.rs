//! Error types.
//!
//! [`BackendError`] covers everything that can go wrong talking to the
//! backend; [`ConsoleError`] is what console operations return.

use crate::models::HierarchyLevel;
use crate::split::{SplitError, SplitField};
use thiserror::Error;

/// Failures talking to the PayBazaar backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Non-success status.  `message` is the backend's own message when
    /// the body carried one.
    #[error("backend returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A 2xx reply whose envelope reports a failure.
    #[error("backend rejected the request: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// The message the backend sent along with the failure, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. } | BackendError::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

/// Errors returned by console operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("invalid split: {0}")]
    Split(#[from] SplitError),

    #[error("invalid selection: {0}")]
    Selection(String),

    #[error("{0} is locked by the selected hierarchy level")]
    FieldLocked(SplitField),

    #[error("cannot {action} while {from}")]
    InvalidTransition { from: &'static str, action: &'static str },

    #[error("commission form is not open; configure the commission first")]
    FormNotVisible,

    #[error("no {0} is selected")]
    NothingSelected(HierarchyLevel),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;
