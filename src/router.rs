//! Router shell: the thin public surface around the transactional radix
//! tree.
//!
//! A lock-guarded inner state plus a small public wrapper: rather than a
//! one-shot `seal()` that freezes a mutable registry into a read-only
//! snapshot, this publishes a brand-new immutable generation on every
//! commit, swapped atomically into place via `arc_swap::ArcSwap`.

use crate::context::ContextPool;
use crate::errors::RouterResult;
use crate::lookup::{self, LookupOutcome};
use crate::route::Route;
use crate::tree::ITree;
use crate::txn::{RootMap, Txn, TreeStats};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::Arc;

/// The regex source applied to a `{name}` parameter that declares no
/// explicit constraint. Segment boundaries already stop a capture at the
/// next `/` or `.`, so this mostly guards against an empty capture.
pub const DEFAULT_PARAM_PATTERN: &str = "[^/.]+";

/// Construction-time configuration for a `Router`.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Soft capacity hint for the root-map allocation; not an enforced cap
    /// (the error taxonomy has no "too many routes" kind).
    pub max_routes: usize,
    /// Informational sizing hint for the `Txn` write-cache. The write-cache
    /// itself is realized through `Arc::try_unwrap` (see `txn` module docs)
    /// rather than a bounded LRU, so this field is currently unused by the
    /// implementation; it is kept on the struct so callers migrating from a
    /// bounded-cache design have somewhere to put the value, and so a future
    /// bounded-cache variant has a stable option to read.
    pub write_cache_capacity: usize,
    /// Default constraint applied to an unconstrained `{name}` parameter.
    /// `None` disables the default (bare segment-boundary capture only).
    pub default_param_regex: Option<Arc<Regex>>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        RouterOptions {
            max_routes: 4096,
            write_cache_capacity: 4096,
            default_param_regex: None,
        }
    }
}

impl RouterOptions {
    /// Builds options with the default parameter pattern applied to
    /// unconstrained `{name}` tokens.
    pub fn with_default_param_pattern() -> Self {
        let re = Regex::new(&format!("^(?:{DEFAULT_PARAM_PATTERN})$"))
            .expect("default param pattern compiles");
        RouterOptions {
            default_param_regex: Some(Arc::new(re)),
            ..Default::default()
        }
    }

    /// Clamps nonsensical values (zero capacities) rather than erroring:
    /// there is no `RouterError` variant for a bad option, so construction
    /// never fails.
    fn normalized(mut self) -> Self {
        if self.max_routes == 0 {
            self.max_routes = 1;
        }
        if self.write_cache_capacity == 0 {
            self.write_cache_capacity = 1;
        }
        self
    }
}

/// The router shell: holds the current tree under an atomic pointer and
/// serializes writers with a mutex.
#[derive(Debug)]
pub struct Router {
    tree: ArcSwap<ITree>,
    writer_lock: Mutex<()>,
    options: RouterOptions,
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        let options = options.normalized();
        Router {
            tree: ArcSwap::new(Arc::new(ITree::empty(options.clone()))),
            writer_lock: Mutex::new(()),
            options,
        }
    }

    /// Opens a writable transaction, blocking on the writer mutex until any
    /// other in-progress `Txn` commits or aborts. This is the only
    /// suspension point in the whole write path.
    pub fn txn(&self) -> Txn<'_> {
        let guard = self.writer_lock.lock();
        let cur = self.tree.load();
        Txn::new_writable(self, cur.roots.clone(), cur.stats, guard)
    }

    /// A read-only `Txn` bound to the currently published tree, for
    /// `has`/`route`/`reverse` callers that want the `Txn`-shaped API
    /// without taking the writer lock.
    pub fn reader(&self) -> Txn<'_> {
        let cur = self.tree.load();
        Txn::new_readonly(self, cur.roots.clone(), cur.stats)
    }

    /// Publishes a new tree generation and releases the writer lock (called
    /// from `Txn::commit`, never directly).
    pub(crate) fn publish(&self, roots: RootMap, stats: TreeStats) {
        let next = Arc::new(ITree::new(roots, stats, self.options.clone()));
        self.tree.store(next);
    }

    /// The direct hot-path lookup entry point: loads the current tree via
    /// the atomic pointer and calls the lookup engine directly, bypassing
    /// `Txn` entirely.
    #[tracing::instrument(level = "trace", skip(self), fields(%method, %host, %path))]
    pub fn lookup(&self, method: &str, host: &str, path: &str) -> Option<LookupOutcome> {
        let cur = self.tree.load();
        lookup::lookup(&cur, method, host, path, false)
    }

    pub fn has(&self, method: &str, pattern: &str) -> bool {
        self.reader().has(method, pattern)
    }

    pub fn route(&self, method: &str, pattern: &str) -> RouterResult<Arc<Route>> {
        self.reader().route(method, pattern)
    }

    /// Reverse/existence-style lookup: the same backtracking walk as
    /// `lookup`, run with the scratch context's `lazy` flag set so no
    /// parameter vector is allocated.
    #[tracing::instrument(level = "trace", skip(self), fields(%method, %host, %path))]
    pub fn reverse(&self, method: &str, host: &str, path: &str) -> (Option<Arc<Route>>, bool) {
        let cur = self.tree.load();
        match lookup::lookup(&cur, method, host, path, true) {
            Some(outcome) => (Some(outcome.route), outcome.tsr),
            None => (None, false),
        }
    }

    /// Current tree statistics.
    pub fn stats(&self) -> TreeStats {
        self.tree.load().stats
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new(RouterOptions::default())
    }
}
