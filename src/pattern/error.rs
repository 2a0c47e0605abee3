use thiserror::Error;

/// Validation errors raised while parsing a pattern string.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{pattern}' is empty")]
    Empty { pattern: String },

    #[error("pattern '{pattern}' must start with '/' or 'host/path'")]
    MissingPath { pattern: String },

    #[error("pattern '{pattern}' has an unbalanced '{{' starting at byte {offset}")]
    UnbalancedBrace { pattern: String, offset: usize },

    #[error("pattern '{pattern}' has an empty parameter name at byte {offset}")]
    EmptyName { pattern: String, offset: usize },

    #[error(
        "pattern '{pattern}' has an invalid parameter name '{name}' at byte {offset}; names must match [A-Za-z_][A-Za-z0-9_$]*"
    )]
    InvalidName {
        pattern: String,
        name: String,
        offset: usize,
    },

    #[error("pattern '{pattern}' declares parameter '{name}' more than once")]
    DuplicateParam { pattern: String, name: String },

    #[error("pattern '{pattern}' has an invalid regex constraint for '{name}': {source}")]
    InvalidRegex {
        pattern: String,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("method '{method}' is not a valid HTTP method token")]
    InvalidMethod { method: String },
}

pub type PatternResult<T> = Result<T, PatternError>;
