//! Error taxonomy for the router: one `thiserror` enum with structured
//! fields over string-only messages.

use crate::pattern::PatternError;
use thiserror::Error;

/// All errors the router's public surface can return.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Malformed pattern, bad method token, duplicate parameter name, etc.
    #[error(transparent)]
    InvalidRoute(#[from] PatternError),

    /// Insert attempted over an existing leaf.
    #[error("route already exists: method={method} pattern='{pattern}'")]
    RouteExist { method: String, pattern: String },

    /// Update or delete targeted a route that does not exist.
    #[error("route not found: method={method} pattern='{pattern}'")]
    RouteNotFound { method: String, pattern: String },

    /// A mid-edge split would fuse a parameter/wildcard token with a static
    /// one, or would end inside an escape sequence.
    #[error("route conflict inserting '{pattern}': {reason}")]
    RouteConflict { pattern: String, reason: String },

    /// Mutation attempted on a read-only (snapshot) `Txn`.
    #[error("operation not permitted on a read-only transaction")]
    ReadOnlyTxn,

    /// Operation attempted on a `Txn` that already committed or aborted.
    #[error("operation attempted on a settled (committed or aborted) transaction")]
    SettledTxn,
}

pub type RouterResult<T> = Result<T, RouterError>;
