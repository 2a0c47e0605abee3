//! Pooled lookup-scratch contexts. The lookup path itself is wait-free and
//! allocation-free: a `Context`'s capture buffer is checked out from a
//! small free-list guarded by its own lock, pre-sized to the owning tree's
//! `maxParams`, and returned (with its length reset, capacity retained)
//! when the guard drops.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Reusable scratch state for one lookup: the parameter-capture buffer.
/// Rust's own call stack carries the backtracking state during a lookup
/// (see the `lookup` module), so this only needs to carry the capture
/// buffer.
#[derive(Debug, Default)]
pub struct Context {
    pub(crate) spans: Vec<(usize, usize)>,
}

impl Context {
    fn with_capacity(cap: usize) -> Self {
        Context {
            spans: Vec::with_capacity(cap),
        }
    }

    fn reset(&mut self) {
        self.spans.clear();
    }
}

/// A small free-list of `Context`s, sized to a tree generation's
/// `maxParams`. Bounded informally by the number of concurrent lookups;
/// there is no hard cap, since a lookup never waits for a free context — it
/// just allocates a fresh one on a pool miss.
#[derive(Debug)]
pub struct ContextPool {
    free: Mutex<Vec<Context>>,
    capacity_hint: usize,
}

impl ContextPool {
    pub fn new(capacity_hint: usize) -> Self {
        ContextPool {
            free: Mutex::new(Vec::new()),
            capacity_hint,
        }
    }

    pub fn checkout(&self) -> PooledContext<'_> {
        let ctx = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Context::with_capacity(self.capacity_hint));
        PooledContext {
            ctx: Some(ctx),
            pool: self,
        }
    }
}

pub struct PooledContext<'a> {
    ctx: Option<Context>,
    pool: &'a ContextPool,
}

impl Deref for PooledContext<'_> {
    type Target = Context;
    fn deref(&self) -> &Context {
        self.ctx.as_ref().expect("context checked out")
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx.as_mut().expect("context checked out")
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            ctx.reset();
            self.pool.free.lock().push(ctx);
        }
    }
}
