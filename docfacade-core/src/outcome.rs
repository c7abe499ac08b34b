//! Result type returned by CRUD operations on the facade.
//!
//! A plain `Option` cannot tell "nothing matched" apart from "the server is
//! gone" or "the insert failed twice". [`Outcome`] keeps those cases apart
//! while still offering the boolean view through [`Outcome::is_success`].

use crate::error::{FacadeError, FacadeResult};


#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation completed and produced a value.
    Success(T),
    /// The operation completed but no document matched the filter.
    NotFound,
    /// The liveness check failed and reconnecting did not help.
    ConnectionUnavailable(FacadeError),
    /// The driver call failed on every attempt, or the facade had no collection selected.
    OperationFailed(FacadeError),
    /// The named operation has no implementation.
    NotImplemented(&'static str),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::NotFound)
    }

    /// Returns the value on success, discarding the failure reason otherwise.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the error carried by a failed outcome.
    pub fn error(&self) -> Option<&FacadeError> {
        match self {
            Outcome::ConnectionUnavailable(err) | Outcome::OperationFailed(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::ConnectionUnavailable(err) => Outcome::ConnectionUnavailable(err),
            Outcome::OperationFailed(err) => Outcome::OperationFailed(err),
            Outcome::NotImplemented(operation) => Outcome::NotImplemented(operation),
        }
    }

    /// Converts into a `Result`, mapping `NotFound` to `Ok(None)`.
    ///
    /// `NotImplemented` becomes [`FacadeError::NotImplemented`] naming the operation.
    pub fn into_result(self) -> FacadeResult<Option<T>> {
        match self {
            Outcome::Success(value) => Ok(Some(value)),
            Outcome::NotFound => Ok(None),
            Outcome::ConnectionUnavailable(err) | Outcome::OperationFailed(err) => Err(err),
            Outcome::NotImplemented(operation) => Err(FacadeError::NotImplemented(operation)),
        }
    }
}

impl<T> From<FacadeResult<Option<T>>> for Outcome<T> {
    /// Treats `Ok(None)` as `NotFound` and any error as an operation failure.
    fn from(result: FacadeResult<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Outcome::Success(value),
            Ok(None) => Outcome::NotFound,
            Err(err) => Outcome::OperationFailed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_result_distinguishes_missing_and_failed() {
        assert_eq!(Outcome::from(Ok(Some(1))), Outcome::Success(1));
        assert_eq!(Outcome::<i32>::from(Ok(None)), Outcome::NotFound);
        assert_eq!(
            Outcome::<i32>::from(Err(FacadeError::Driver("boom".into()))),
            Outcome::OperationFailed(FacadeError::Driver("boom".into())),
        );
    }

    #[test]
    fn into_result_reports_not_implemented() {
        let outcome: Outcome<()> = Outcome::NotImplemented("insert_many");

        let err = outcome.into_result().unwrap_err();

        assert_eq!(err, FacadeError::NotImplemented("insert_many"));
        assert_eq!(err.to_string(), "insert_many is not implemented");
    }

    #[test]
    fn failures_are_not_successes() {
        let unavailable: Outcome<u64> = Outcome::ConnectionUnavailable(FacadeError::NotConnected);
        let failed: Outcome<u64> = Outcome::OperationFailed(FacadeError::Driver("x".into()));

        assert!(!unavailable.is_success());
        assert!(!failed.is_success());
        assert_ne!(unavailable, failed);
        assert_eq!(unavailable.error(), Some(&FacadeError::NotConnected));
    }

    #[test]
    fn map_preserves_failure_variants() {
        assert_eq!(Outcome::Success(2).map(|v| v * 2), Outcome::Success(4));
        assert_eq!(Outcome::<i32>::NotFound.map(|v| v * 2), Outcome::NotFound);
    }
}
