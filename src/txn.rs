//! Transaction (`Txn`): the path-copying mutation protocol over a
//! point-in-time root-map snapshot.
//!
//! Rust's ownership system gives a write-cache almost for free: `write_node`
//! takes an owned `Arc<Node>` and uses `Arc::try_unwrap` to recover the node
//! without cloning whenever this `Txn` holds the only strong reference (i.e.
//! the node was already cloned earlier in the same transaction and nothing
//! published has observed it yet). Otherwise it clones. This is the same
//! cache-hit/cache-miss contract a bounded LRU would give, just realized
//! through refcounting instead of a hand-rolled table.

use crate::errors::{RouterError, RouterResult};
use crate::node::Node;
use crate::pattern::{Token, TokenKind, parse_pattern};
use crate::route::{Handler, Route};
use hashbrown::HashMap;
use std::sync::Arc;

pub type RootMap = HashMap<Box<str>, Arc<Node>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeStats {
    pub size: usize,
    pub max_params: usize,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Insert,
    Update,
}

/// Validates `method` as an HTTP token and returns its canonical
/// upper-cased form.
fn normalize_method(method: &str) -> RouterResult<Box<str>> {
    crate::pattern::validate_method(method)?;
    Ok(method.to_ascii_uppercase().into_boxed_str())
}

/// A mutable builder over a snapshot of the root map. Read-only transactions
/// (`writable = false`) reject every mutating call with `ReadOnlyTxn`.
///
/// A writable `Txn` holds the router's writer-lock guard for its whole
/// lifetime, from open to commit/abort; dropping the `Txn` without calling
/// `commit`/`abort` releases the lock without publishing anything, same as
/// an explicit `abort`.
pub struct Txn<'r> {
    pub(crate) router: &'r crate::router::Router,
    pub(crate) roots: RootMap,
    pub(crate) stats: TreeStats,
    pub(crate) writable: bool,
    pub(crate) settled: bool,
    pub(crate) cache_hits: usize,
    pub(crate) cache_misses: usize,
    _lock: Option<parking_lot::MutexGuard<'r, ()>>,
}

impl<'r> Txn<'r> {
    pub(crate) fn new_writable(
        router: &'r crate::router::Router,
        roots: RootMap,
        stats: TreeStats,
        lock: parking_lot::MutexGuard<'r, ()>,
    ) -> Self {
        Txn {
            router,
            roots,
            stats,
            writable: true,
            settled: false,
            cache_hits: 0,
            cache_misses: 0,
            _lock: Some(lock),
        }
    }

    pub(crate) fn new_readonly(router: &'r crate::router::Router, roots: RootMap, stats: TreeStats) -> Self {
        Txn {
            router,
            roots,
            stats,
            writable: false,
            settled: false,
            cache_hits: 0,
            cache_misses: 0,
            _lock: None,
        }
    }

    fn check_writable(&self) -> RouterResult<()> {
        if self.settled {
            return Err(RouterError::SettledTxn);
        }
        if !self.writable {
            return Err(RouterError::ReadOnlyTxn);
        }
        Ok(())
    }

    /// The write-cache lookup/insert, implemented via `Arc::try_unwrap`
    /// (see module docs).
    fn write_node(&mut self, node: Arc<Node>) -> Node {
        match Arc::try_unwrap(node) {
            Ok(owned) => {
                self.cache_hits += 1;
                owned
            }
            Err(shared) => {
                self.cache_misses += 1;
                (*shared).clone()
            }
        }
    }

    /// Current tree statistics.
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn has(&self, method: &str, pattern: &str) -> bool {
        self.route(method, pattern).is_ok()
    }

    /// Looks up the route registered for exactly this pattern (not a
    /// request lookup; `crate::router::Router::lookup` is the hot path).
    pub fn route(&self, method: &str, pattern: &str) -> RouterResult<Arc<Route>> {
        let parsed = crate::pattern::parse_pattern(pattern)?;
        let method = normalize_method(method)?;
        let root = self
            .roots
            .get(&method)
            .ok_or_else(|| RouterError::RouteNotFound {
                method: method.to_string(),
                pattern: pattern.to_string(),
            })?;
        find_exact(root, &parsed.tokens).ok_or_else(|| RouterError::RouteNotFound {
            method: method.to_string(),
            pattern: pattern.to_string(),
        })
    }

    /// Inserts a brand-new route. Fails with `RouteExist` if one already
    /// occupies this exact position.
    #[tracing::instrument(level = "debug", skip(self, handler), fields(%method, %pattern))]
    pub fn insert(&mut self, method: &str, pattern: &str, handler: Handler) -> RouterResult<()> {
        self.put(method, pattern, handler, Mode::Insert)
    }

    /// Replaces the handler of an existing route. Fails with
    /// `RouteNotFound` if the destination does not exist.
    #[tracing::instrument(level = "debug", skip(self, handler), fields(%method, %pattern))]
    pub fn update(&mut self, method: &str, pattern: &str, handler: Handler) -> RouterResult<()> {
        self.put(method, pattern, handler, Mode::Update)
    }

    fn put(&mut self, method: &str, pattern: &str, handler: Handler, mode: Mode) -> RouterResult<()> {
        self.check_writable()?;
        let parsed = parse_pattern(pattern)?;
        let route = Arc::new(Route::new(
            pattern.into(),
            parsed.tokens,
            parsed.ps_len,
            parsed.host_split,
            handler,
        ));

        let method_key = normalize_method(method)?;
        let root = match self.roots.get(&method_key).cloned() {
            Some(r) => r,
            None => {
                if mode == Mode::Update {
                    return Err(RouterError::RouteNotFound {
                        method: method_key.to_string(),
                        pattern: pattern.to_string(),
                    });
                }
                Arc::new(Node::default())
            }
        };

        let ctx = InsertCtx {
            method: &method_key,
            pattern,
            mode,
        };
        let new_root = insert_into(self, root, &route.tokens, &route, &ctx)?;
        let depth = compute_path_depth(&new_root, &route.tokens);

        if mode == Mode::Insert {
            self.stats.size += 1;
        }
        self.stats.max_params = self.stats.max_params.max(route.ps_len);
        self.stats.max_depth = self.stats.max_depth.max(depth);
        self.roots.insert(method_key, new_root);
        Ok(())
    }

    /// Deletes the route registered for exactly this pattern.
    #[tracing::instrument(level = "debug", skip(self), fields(%method, %pattern))]
    pub fn delete(&mut self, method: &str, pattern: &str) -> RouterResult<Arc<Route>> {
        self.check_writable()?;
        let parsed = parse_pattern(pattern)?;
        let method_key = normalize_method(method)?;
        let root = self
            .roots
            .get(&method_key)
            .cloned()
            .ok_or_else(|| RouterError::RouteNotFound {
                method: method_key.to_string(),
                pattern: pattern.to_string(),
            })?;

        let (new_root, deleted) = delete_from(self, root, &parsed.tokens)
            .map_err(|_| RouterError::RouteNotFound {
                method: method_key.to_string(),
                pattern: pattern.to_string(),
            })?;

        match new_root {
            Some(r) => {
                self.roots.insert(method_key, r);
            }
            None => {
                self.roots.remove(&method_key);
            }
        }
        self.stats.size = self.stats.size.saturating_sub(1);
        self.recompute_stats();
        Ok(deleted)
    }

    /// Clears specific method roots, or the entire root map when `methods`
    /// is empty. Empty method roots are pruned eagerly rather than left
    /// dangling.
    #[tracing::instrument(level = "debug", skip(self, methods))]
    pub fn truncate(&mut self, methods: &[&str]) -> RouterResult<()> {
        self.check_writable()?;
        if methods.is_empty() {
            self.roots.clear();
            self.stats = TreeStats::default();
        } else {
            for m in methods {
                self.roots.remove(&normalize_method(m)?);
            }
            self.recompute_stats();
        }
        Ok(())
    }

    fn recompute_stats(&mut self) {
        let mut stats = TreeStats::default();
        for root in self.roots.values() {
            walk_stats(root, 0, &mut stats);
        }
        self.stats = stats;
    }

    /// A read-only `Txn` bound to this transaction's current (possibly
    /// uncommitted) root map. It never observes writes that land after
    /// this call.
    pub fn snapshot(&self) -> Txn<'r> {
        Txn::new_readonly(self.router, self.roots.clone(), self.stats)
    }

    /// Publishes this transaction's root map as the router's new tree and
    /// releases the writer lock.
    pub fn commit(mut self) -> RouterResult<()> {
        self.check_writable()?;
        self.settled = true;
        let roots = std::mem::take(&mut self.roots);
        self.router.publish(roots, self.stats);
        Ok(())
    }

    /// Discards this transaction without publishing anything.
    pub fn abort(mut self) {
        self.settled = true;
    }
}

struct InsertCtx<'a> {
    method: &'a str,
    pattern: &'a str,
    mode: Mode,
}

impl<'a> InsertCtx<'a> {
    fn not_found(&self) -> RouterError {
        RouterError::RouteNotFound {
            method: self.method.to_string(),
            pattern: self.pattern.to_string(),
        }
    }

    fn exists(&self) -> RouterError {
        RouterError::RouteExist {
            method: self.method.to_string(),
            pattern: self.pattern.to_string(),
        }
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .take_while(|(x, y)| x == y)
        .count()
}

fn insert_into(
    txn: &mut Txn,
    node: Arc<Node>,
    tokens: &[Token],
    route: &Arc<Route>,
    ctx: &InsertCtx,
) -> RouterResult<Arc<Node>> {
    if tokens.is_empty() {
        let mut owned = txn.write_node(node);
        match ctx.mode {
            Mode::Insert => {
                if owned.is_leaf() {
                    return Err(ctx.exists());
                }
            }
            Mode::Update => {
                if !owned.is_leaf() {
                    return Err(ctx.not_found());
                }
            }
        }
        owned.route = Some(route.clone());
        return Ok(Arc::new(owned));
    }

    match tokens[0].kind {
        TokenKind::Static => insert_static(txn, node, &tokens[0].value, tokens[0].hsplit, &tokens[1..], route, ctx),
        TokenKind::Param => insert_dynamic(txn, node, false, &tokens[0], &tokens[1..], route, ctx),
        TokenKind::Wildcard => insert_dynamic(txn, node, true, &tokens[0], &tokens[1..], route, ctx),
    }
}

fn insert_dynamic(
    txn: &mut Txn,
    node: Arc<Node>,
    is_wildcard: bool,
    tok: &Token,
    rest: &[Token],
    route: &Arc<Route>,
    ctx: &InsertCtx,
) -> RouterResult<Arc<Node>> {
    let canon = tok.canonical_key();
    let mut owned = txn.write_node(node);
    let existing_idx = if is_wildcard {
        owned.get_wildcard_edge(&canon)
    } else {
        owned.get_param_edge(&canon)
    };

    let edge_arc = match existing_idx {
        Some(idx) => {
            if is_wildcard {
                owned.wildcards[idx].clone()
            } else {
                owned.params[idx].clone()
            }
        }
        None => {
            if ctx.mode == Mode::Update {
                return Err(ctx.not_found());
            }
            let n = if is_wildcard {
                Node::new_wildcard(canon.clone(), tok.regex.clone())
            } else {
                Node::new_param(canon.clone(), tok.regex.clone())
            };
            Arc::new(n)
        }
    };

    let mut edge_owned = txn.write_node(edge_arc);
    if tok.hsplit {
        edge_owned.set_hsplit(true);
    }
    let new_edge = insert_into(txn, Arc::new(edge_owned), rest, route, ctx)?;

    match existing_idx {
        Some(idx) => {
            if is_wildcard {
                owned.wildcards[idx] = new_edge;
            } else {
                owned.params[idx] = new_edge;
            }
        }
        None => {
            if is_wildcard {
                owned.add_wildcard_edge(new_edge);
            } else {
                owned.add_param_edge(new_edge);
            }
        }
    }
    Ok(Arc::new(owned))
}

fn insert_static(
    txn: &mut Txn,
    node: Arc<Node>,
    search: &str,
    tok_hsplit: bool,
    rest: &[Token],
    route: &Arc<Route>,
    ctx: &InsertCtx,
) -> RouterResult<Arc<Node>> {
    if search.is_empty() {
        let mut owned = txn.write_node(node);
        if tok_hsplit {
            owned.set_hsplit(true);
        }
        return insert_into(txn, Arc::new(owned), rest, route, ctx);
    }

    let label = search.as_bytes()[0];
    let mut owned = txn.write_node(node);

    match owned.get_static_edge(label) {
        None => {
            if ctx.mode == Mode::Update {
                return Err(ctx.not_found());
            }
            let mut child = Node::new_static(search);
            if tok_hsplit {
                child.set_hsplit(true);
            }
            let child_arc = insert_into(txn, Arc::new(child), rest, route, ctx)?;
            owned.add_static_edge(child_arc);
            Ok(Arc::new(owned))
        }
        Some(idx) => {
            let edge = owned.statics[idx].clone();
            let edge_key: Box<str> = edge.key.clone();
            let common = common_prefix_len(&edge_key, search);

            if common == edge_key.len() && common == search.len() {
                let mut child_owned = txn.write_node(edge);
                if tok_hsplit {
                    child_owned.set_hsplit(true);
                }
                let new_child = insert_into(txn, Arc::new(child_owned), rest, route, ctx)?;
                owned.replace_static_edge(idx, new_child);
                Ok(Arc::new(owned))
            } else if common == edge_key.len() {
                let tail = &search[common..];
                let new_child = insert_static(txn, edge, tail, tok_hsplit, rest, route, ctx)?;
                owned.replace_static_edge(idx, new_child);
                Ok(Arc::new(owned))
            } else if common == search.len() {
                if ctx.mode == Mode::Update {
                    return Err(ctx.not_found());
                }
                let suffix: Box<str> = edge_key[common..].into();
                let mut rekeyed = (*edge).clone();
                rekeyed.key = suffix;
                rekeyed.label = rekeyed.key.as_bytes()[0];

                let mut new_mid = Node::new_static(search);
                if tok_hsplit {
                    new_mid.set_hsplit(true);
                }
                new_mid.add_static_edge(Arc::new(rekeyed));
                let mid_arc = insert_into(txn, Arc::new(new_mid), rest, route, ctx)?;
                owned.replace_static_edge(idx, mid_arc);
                Ok(Arc::new(owned))
            } else {
                if ctx.mode == Mode::Update {
                    return Err(ctx.not_found());
                }
                let common_prefix: Box<str> = edge_key[..common].into();
                let mut rekeyed = (*edge).clone();
                rekeyed.key = edge_key[common..].into();
                rekeyed.label = rekeyed.key.as_bytes()[0];

                let mut new_mid = Node::new_static(common_prefix);
                new_mid.add_static_edge(Arc::new(rekeyed));

                let tail = &search[common..];
                let mut leaf_chain = Node::new_static(tail);
                if tok_hsplit {
                    leaf_chain.set_hsplit(true);
                }
                let leaf_arc = insert_into(txn, Arc::new(leaf_chain), rest, route, ctx)?;
                new_mid.add_static_edge(leaf_arc);
                owned.replace_static_edge(idx, Arc::new(new_mid));
                Ok(Arc::new(owned))
            }
        }
    }
}

/// Walks the just-inserted route's own path to recompute `maxDepth`
/// incrementally, rather than re-walking the whole tree.
fn compute_path_depth(root: &Arc<Node>, tokens: &[Token]) -> usize {
    let mut cur: &Arc<Node> = root;
    let mut total = cur.params.len() + cur.wildcards.len();

    for tok in tokens {
        match tok.kind {
            TokenKind::Static => {
                let mut remaining: &str = &tok.value;
                while !remaining.is_empty() {
                    let label = remaining.as_bytes()[0];
                    let idx = match cur.get_static_edge(label) {
                        Some(i) => i,
                        None => return total,
                    };
                    cur = &cur.statics[idx];
                    let take = cur.key.len().min(remaining.len());
                    remaining = &remaining[take..];
                    total += cur.params.len() + cur.wildcards.len();
                }
            }
            TokenKind::Param => {
                let canon = tok.canonical_key();
                match cur.get_param_edge(&canon) {
                    Some(idx) => cur = &cur.params[idx],
                    None => return total,
                }
                total += cur.params.len() + cur.wildcards.len();
            }
            TokenKind::Wildcard => {
                let canon = tok.canonical_key();
                match cur.get_wildcard_edge(&canon) {
                    Some(idx) => cur = &cur.wildcards[idx],
                    None => return total,
                }
                total += cur.params.len() + cur.wildcards.len();
            }
        }
    }
    total
}

fn walk_stats(node: &Arc<Node>, running: usize, stats: &mut TreeStats) {
    let here = running + node.params.len() + node.wildcards.len();
    if let Some(route) = &node.route {
        stats.size += 1;
        stats.max_params = stats.max_params.max(route.ps_len);
        stats.max_depth = stats.max_depth.max(here);
    }
    for c in &node.statics {
        walk_stats(c, here, stats);
    }
    for c in &node.params {
        walk_stats(c, here, stats);
    }
    for c in &node.wildcards {
        walk_stats(c, here, stats);
    }
}

fn find_exact(root: &Arc<Node>, tokens: &[Token]) -> Option<Arc<Route>> {
    let mut cur: &Arc<Node> = root;
    for tok in tokens {
        match tok.kind {
            TokenKind::Static => {
                let mut remaining: &str = &tok.value;
                while !remaining.is_empty() {
                    let label = remaining.as_bytes()[0];
                    let idx = cur.get_static_edge(label)?;
                    cur = &cur.statics[idx];
                    if !remaining.starts_with(&*cur.key) {
                        return None;
                    }
                    remaining = &remaining[cur.key.len()..];
                }
            }
            TokenKind::Param => {
                let idx = cur.get_param_edge(&tok.canonical_key())?;
                cur = &cur.params[idx];
            }
            TokenKind::Wildcard => {
                let idx = cur.get_wildcard_edge(&tok.canonical_key())?;
                cur = &cur.wildcards[idx];
            }
        }
    }
    cur.route.clone()
}

/// Merges a node with its single static child after a delete, when doing
/// so is safe. Forbidden across an `hsplit` boundary.
fn try_merge(txn: &mut Txn, node: Arc<Node>) -> Arc<Node> {
    if node.is_leaf() || node.hsplit() || !node.params.is_empty() || !node.wildcards.is_empty() || node.statics.len() != 1
    {
        return node;
    }
    if node.statics[0].hsplit() {
        return node;
    }

    let mut owned = txn.write_node(node);
    let child_arc = owned.statics.remove(0);
    let child = txn.write_node(child_arc);
    let merged_key = format!("{}{}", owned.key, child.key).into_boxed_str();

    Arc::new(Node {
        label: owned.label,
        key: merged_key,
        route: child.route,
        regex: None,
        statics: child.statics,
        params: child.params,
        wildcards: child.wildcards,
        flags: crate::node::NodeFlags::empty(),
    })
}

/// Internal sentinel: the exact route being deleted does not exist along
/// this descent. `Txn::delete` turns this into `RouterError::RouteNotFound`
/// with full method/pattern context.
struct NotFoundInternal;

type DeleteOutcome = Result<(Option<Arc<Node>>, Arc<Route>), NotFoundInternal>;

fn delete_from(txn: &mut Txn, node: Arc<Node>, tokens: &[Token]) -> DeleteOutcome {
    if tokens.is_empty() {
        let mut owned = txn.write_node(node);
        let deleted = owned.route.take().ok_or(NotFoundInternal)?;
        let keep = if owned.is_empty_node() {
            None
        } else {
            Some(Arc::new(owned))
        };
        return Ok((keep, deleted));
    }

    match tokens[0].kind {
        TokenKind::Static => delete_static(txn, node, &tokens[0].value, &tokens[1..]),
        TokenKind::Param => delete_dynamic(txn, node, false, &tokens[0].canonical_key(), &tokens[1..]),
        TokenKind::Wildcard => delete_dynamic(txn, node, true, &tokens[0].canonical_key(), &tokens[1..]),
    }
}

fn delete_dynamic(txn: &mut Txn, node: Arc<Node>, is_wildcard: bool, canon: &str, rest: &[Token]) -> DeleteOutcome {
    let mut owned = txn.write_node(node);
    let idx = if is_wildcard {
        owned.get_wildcard_edge(canon)
    } else {
        owned.get_param_edge(canon)
    }
    .ok_or(NotFoundInternal)?;

    let edge = if is_wildcard {
        owned.wildcards[idx].clone()
    } else {
        owned.params[idx].clone()
    };

    let (new_child, deleted) = delete_from(txn, edge, rest)?;
    match new_child {
        Some(c) => {
            if is_wildcard {
                owned.wildcards[idx] = c;
            } else {
                owned.params[idx] = c;
            }
        }
        None => {
            if is_wildcard {
                owned.wildcards.remove(idx);
            } else {
                owned.params.remove(idx);
            }
        }
    }
    let keep = if owned.is_empty_node() {
        None
    } else {
        Some(Arc::new(owned))
    };
    Ok((keep, deleted))
}

fn delete_static(txn: &mut Txn, node: Arc<Node>, search: &str, rest: &[Token]) -> DeleteOutcome {
    let mut owned = txn.write_node(node);
    let label = search.as_bytes()[0];
    let idx = owned.get_static_edge(label).ok_or(NotFoundInternal)?;
    let edge = owned.statics[idx].clone();

    if search.len() < edge.key.len() || !search.starts_with(&*edge.key) {
        return Err(NotFoundInternal);
    }
    let tail = &search[edge.key.len()..];

    let (new_child, deleted) = if tail.is_empty() {
        delete_from(txn, edge, rest)?
    } else {
        delete_static(txn, edge, tail, rest)?
    };

    match new_child {
        Some(c) => {
            let merged = try_merge(txn, c);
            owned.replace_static_edge(idx, merged);
        }
        None => {
            owned.del_static_edge(idx);
        }
    }

    let keep = if owned.is_empty_node() {
        None
    } else {
        Some(Arc::new(owned))
    };
    Ok((keep, deleted))
}
