//! A concurrent, immutable radix-tree HTTP request router.
//!
//! Given a method, host, and path, [`Router::lookup`] selects the best
//! matching registered route and extracts its named parameters. Reads are
//! wait-free against a published, immutable tree snapshot; writes go
//! through a [`Txn`] that path-copies only the nodes it touches and
//! publishes a new tree generation atomically on commit.
//!
//! ```
//! use radix_router::{Router, RouterOptions, Handler};
//!
//! let router = Router::new(RouterOptions::default());
//! {
//!     let mut txn = router.txn();
//!     txn.insert("GET", "/users/{id}", Handler::new("get_user")).unwrap();
//!     txn.commit().unwrap();
//! }
//!
//! let found = router.lookup("GET", "", "/users/42").unwrap();
//! assert_eq!(found.params[0].1.as_ref(), "42");
//! ```

mod context;
mod errors;
mod lookup;
mod node;
mod pattern;
mod route;
mod router;
mod tree;
mod txn;

pub use errors::{RouterError, RouterResult};
pub use lookup::LookupOutcome;
pub use pattern::{PatternError, PatternResult, Token, TokenKind};
pub use route::{Handler, Route};
pub use router::{DEFAULT_PARAM_PATTERN, Router, RouterOptions};
pub use tree::ITree;
pub use txn::{RootMap, Txn, TreeStats};
