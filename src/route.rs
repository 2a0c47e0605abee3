//! Route: the immutable value a leaf node carries.

use crate::pattern::Token;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque handler/metadata the tree stores but never interprets. Stands in
/// for the request-handling plumbing that lives above the routing tree.
#[derive(Clone)]
pub struct Handler(Arc<dyn Any + Send + Sync>);

impl Handler {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Handler(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// An immutable route value. Shared by `Arc` across tree versions once
/// published; never mutated after a `Txn` builds it.
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: Box<str>,
    pub tokens: Arc<[Token]>,
    pub ps_len: usize,
    pub host_split: usize,
    pub handler: Handler,
}

impl Route {
    pub fn new(pattern: Box<str>, tokens: Vec<Token>, ps_len: usize, host_split: usize, handler: Handler) -> Self {
        Route {
            pattern,
            tokens: Arc::from(tokens),
            ps_len,
            host_split,
            handler,
        }
    }
}
