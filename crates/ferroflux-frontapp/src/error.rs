use thiserror::Error;

/// Failures that can occur while turning one input item into an API call.
///
/// None of these ever escape a batch: the [`Dispatcher`](crate::Dispatcher)
/// catches them at the item boundary and renders them as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required parameter was absent or empty.
    #[error("Missing required parameter \"{name}\"")]
    MissingParameter { name: String },

    /// A parameter was present but could not be interpreted
    /// (invalid JSON, wrong value type).
    #[error("Malformed parameter \"{name}\": {reason}")]
    MalformedInput { name: String, reason: String },

    /// The remote call failed and the retry policy gave up.
    #[error("{message}")]
    Transport { message: String, attempts: u32 },

    /// A configuration value could not be parsed.
    #[error("Invalid configuration value for {key}: {reason}")]
    Config { key: String, reason: String },
}

impl DispatchError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn malformed(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedInput {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
