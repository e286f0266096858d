use crate::ActionError;

/// Outcome of an action: a value or a typed failure.
///
/// `map` and `and_then` come straight from [`std::result::Result`]; both
/// leave a failure untouched and never call their closure on it.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Build a result from a two-channel completion (optional error, optional value).
///
/// An error always wins. A missing value without an error is a
/// `DecodingFailure`, never a default.
pub fn from_parts<T>(error: Option<ActionError>, value: Option<T>) -> ActionResult<T> {
    match (error, value) {
        (Some(error), _) => Err(error),
        (None, Some(value)) => Ok(value),
        (None, None) => Err(ActionError::decoding(
            "completion carried neither a value nor an error",
        )),
    }
}
