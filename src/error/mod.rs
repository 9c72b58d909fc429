//! Error conditions shared by the generators, the PCA wrapper and the evaluators.
//!
//! Every fallible function in the crate returns [`anyhow::Result`]. Argument
//! violations are raised as an [`InvalidArgument`] wrapped in the
//! [`anyhow::Error`], so callers that need to tell them apart from numerical
//! failures can use `err.downcast_ref::<InvalidArgument>()`.

use std::fmt;

/// A caller supplied a parameter outside of the accepted domain.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidArgument {
    argument: &'static str,
    reason: String,
}

impl InvalidArgument {
    pub fn new(argument: &'static str, reason: impl Into<String>) -> Self {
        Self {
            argument,
            reason: reason.into(),
        }
    }

    /// Name of the offending parameter.
    pub fn argument(&self) -> &'static str {
        self.argument
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid argument `{}`: {}", self.argument, self.reason)
    }
}

impl std::error::Error for InvalidArgument {}

pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> anyhow::Error {
    InvalidArgument::new(argument, reason).into()
}

/// Returns the [`InvalidArgument`] carried by `err`, if that is what it is.
pub fn as_invalid_argument(err: &anyhow::Error) -> Option<&InvalidArgument> {
    err.downcast_ref::<InvalidArgument>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_roundtrips_through_anyhow() {
        let err = invalid_argument("n_samples", "must be positive");
        let inner = as_invalid_argument(&err).unwrap();
        assert_eq!(inner.argument(), "n_samples");
        assert_eq!(inner.reason(), "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid argument `n_samples`: must be positive"
        );
    }

    #[test]
    fn test_other_errors_are_not_invalid_arguments() {
        let err = anyhow::anyhow!("PCA has not been fitted yet");
        assert!(as_invalid_argument(&err).is_none());
    }
}
