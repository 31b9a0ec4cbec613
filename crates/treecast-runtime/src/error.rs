#![forbid(unsafe_code)]

//! Runtime error types.

/// Failure to apply an action to a [`Store`](crate::Store).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// `dispatch` was called while the reducer was running.
    Reentrant,
    /// The store has been closed.
    Closed,
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reentrant => write!(f, "reducers may not dispatch actions"),
            Self::Closed => write!(f, "store is closed"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Invalid configuration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A recognised key carried a value that could not be parsed.
    InvalidValue { key: String, value: String },
    /// A configuration document could not be parsed.
    Parse(String),
    /// The logging backend could not be installed.
    Logging(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value '{value}' for '{key}'")
            }
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Logging(msg) => write!(f, "logging setup failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
