//! `iTree`: the immutable, per-method root map plus the pooled lookup-scratch
//! contexts and aggregate statistics it owns.
//!
//! One `ITree` is one published version of the routing tree. It is reached
//! only through `Router`'s `ArcSwap` (see `router` module); readers clone the
//! `Arc<ITree>` out of the atomic pointer and then traverse its immutable
//! `roots` map directly, never touching the pointer again for the duration
//! of one lookup.

use crate::context::ContextPool;
use crate::router::RouterOptions;
use crate::txn::{RootMap, TreeStats};

/// One immutable tree generation: a per-method root map, the aggregate
/// statistics `Txn` maintained while building it, and a scratch-context pool
/// pre-sized to this generation's `max_params` so contexts don't grow
/// during matching.
#[derive(Debug)]
pub struct ITree {
    pub(crate) roots: RootMap,
    pub(crate) stats: TreeStats,
    pub(crate) context_pool: ContextPool,
    pub(crate) options: RouterOptions,
}

impl ITree {
    pub fn empty(options: RouterOptions) -> Self {
        ITree {
            roots: RootMap::with_capacity(options.max_routes.min(64)),
            stats: TreeStats::default(),
            context_pool: ContextPool::new(0),
            options,
        }
    }

    pub fn new(roots: RootMap, stats: TreeStats, options: RouterOptions) -> Self {
        ITree {
            roots,
            stats,
            context_pool: ContextPool::new(stats.max_params),
            options,
        }
    }

    /// Aggregate statistics for this tree generation.
    pub fn stats(&self) -> TreeStats {
        self.stats
    }
}
