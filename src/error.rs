use thiserror::Error;

use crate::domain::RequestStatus;
use crate::store::{StoreError, Table};

/// Errors returned by repository operations. These are expected to be shown
/// to the end user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RepositoryError {
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("This email is already registered: {0}")]
    DuplicateEmail(String),
    #[error("Request not found: {0}")]
    RequestNotFound(String),
    #[error("Request {id} is {status}, not OPEN")]
    RequestNotOpen { id: String, status: RequestStatus },
    #[error("User {user_id} may not cancel request {request_id}")]
    NotRequestOwner { request_id: String, user_id: String },
    #[error("Donor is not eligible: {0}")]
    DonorIneligible(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// A table could not be saved after all write attempts.
///
/// Non-fatal: the in-memory state stays authoritative for the rest of the
/// process, but it may not survive a restart.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Failed to persist {table}: {source}")]
pub struct PersistenceWriteFailure {
    pub table: Table,
    pub source: StoreError,
}

/// Result of a committed mutation.
///
/// `value` is always committed in memory. `write_failure` records the first
/// table that could not be made durable, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Written<T> {
    pub value: T,
    pub write_failure: Option<PersistenceWriteFailure>,
}

impl<T> Written<T> {
    pub fn durable(value: T) -> Self {
        Self {
            value,
            write_failure: None,
        }
    }

    /// Collects the outcome of every table write performed for one mutation.
    pub fn from_writes(
        value: T,
        writes: impl IntoIterator<Item = Result<(), PersistenceWriteFailure>>,
    ) -> Self {
        let write_failure = writes.into_iter().find_map(Result::err);
        Self { value, write_failure }
    }

    pub fn is_durable(&self) -> bool {
        self.write_failure.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Written<U> {
        Written {
            value: f(self.value),
            write_failure: self.write_failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_keeps_first_failure() {
        let first = PersistenceWriteFailure {
            table: Table::Requests,
            source: StoreError::Io("disk full".to_string()),
        };
        let second = PersistenceWriteFailure {
            table: Table::History,
            source: StoreError::Io("disk full".to_string()),
        };

        let written = Written::from_writes(7, [Ok(()), Err(first.clone()), Err(second)]);

        assert!(!written.is_durable());
        assert_eq!(written.write_failure, Some(first));
        assert_eq!(written.into_value(), 7);
    }

    #[test]
    fn test_written_durable_when_all_writes_succeed() {
        let written = Written::from_writes("ok", [Ok(()), Ok(())]);
        assert!(written.is_durable());
        assert_eq!(written.map(str::len).value, 2);
    }

    #[test]
    fn test_error_messages() {
        let err = RepositoryError::RequestNotOpen {
            id: "r1".to_string(),
            status: RequestStatus::Fulfilled,
        };
        assert_eq!(err.to_string(), "Request r1 is FULFILLED, not OPEN");
        assert_eq!(
            RepositoryError::UserNotFound("nobody@college.edu".to_string()).to_string(),
            "User not found: nobody@college.edu"
        );
    }
}
