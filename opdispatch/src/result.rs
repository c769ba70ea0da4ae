//! Dispatch outcomes and errors.

use thiserror::Error;

use crate::value::Value;

/// Outcome of calling a dispatch table.
///
/// `NoMatch` is an ordinary outcome, not a failure: it means no rule
/// applies to the arguments. Failures raised by a handler are carried inside
/// `R` exactly as the handler returned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum DispatchResult<R> {
    /// A rule matched and its handler returned this value.
    Handled(R),
    /// No rule matched.
    NoMatch,
}

impl<R> DispatchResult<R> {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchResult::Handled(_))
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, DispatchResult::NoMatch)
    }

    /// The handler's return value, if a rule matched.
    pub fn handled(self) -> Option<R> {
        match self {
            DispatchResult::Handled(value) => Some(value),
            DispatchResult::NoMatch => None,
        }
    }

    pub fn map<U, F: FnOnce(R) -> U>(self, f: F) -> DispatchResult<U> {
        match self {
            DispatchResult::Handled(value) => DispatchResult::Handled(f(value)),
            DispatchResult::NoMatch => DispatchResult::NoMatch,
        }
    }

    /// Treat `NoMatch` as an error for callers that require a rule to apply.
    pub fn into_result(self, operation: &str, args: &[Value]) -> Result<R, DispatchError> {
        match self {
            DispatchResult::Handled(value) => Ok(value),
            DispatchResult::NoMatch => Err(DispatchError::no_match(operation, args)),
        }
    }
}

impl<R> From<DispatchResult<R>> for Option<R> {
    fn from(result: DispatchResult<R>) -> Self {
        result.handled()
    }
}

/// Errors reported by callers that do not accept a missing rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no rule of `{operation}` matches argument types ({})", .arg_types.join(", "))]
    NoMatch {
        operation: String,
        arg_types: Vec<String>,
    },

    #[error("unknown operation `{name}`")]
    UnknownOperation { name: String },
}

impl DispatchError {
    /// Build a `NoMatch` error describing the argument tags.
    pub fn no_match(operation: &str, args: &[Value]) -> Self {
        DispatchError::NoMatch {
            operation: operation.to_string(),
            arg_types: args.iter().map(|a| a.type_tag().name().to_string()).collect(),
        }
    }
}
