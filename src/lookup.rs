//! Lookup engine: the backtracking matcher.
//!
//! Recursive, try-static-then-param-then-wildcard, early-return on the
//! first exact match, generalized to a three-way edge split, per-node
//! regex constraints, host/path composition, and trailing-slash
//! recommendations. Rust's own call stack carries the backtracking state:
//! each recursive call is one point the search can resume from, and a
//! failed branch's `captures.truncate(checkpoint)` resumes matching at the
//! next sibling alternative.

use crate::node::Node;
use crate::pattern::TokenKind;
use crate::route::Route;
use crate::tree::ITree;
use memchr::{memchr, memrchr_iter};
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;

/// The outcome of a successful lookup: the matched route, its captured
/// parameters in declaration order, and whether this is an exact match or a
/// trailing-slash recommendation ("tsr").
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub route: Arc<Route>,
    pub params: SmallVec<[(Box<str>, Box<str>); 4]>,
    pub tsr: bool,
}

/// A capture-span snapshot taken when a match attempt succeeds; cloned out
/// of the pooled `Context`'s live buffer so the buffer can keep backtracking
/// (pop further entries) after the snapshot is taken.
type SpanSnapshot = SmallVec<[(usize, usize); 8]>;

/// One node's match attempt, propagated up the recursive call stack. `Exact`
/// always wins outright; `Tsr` is remembered but matching keeps searching
/// for a better `Exact` elsewhere — the first trailing-slash candidate
/// found is kept, and the search continues for an exact match.
enum Attempt {
    Exact(Arc<Route>, SpanSnapshot),
    Tsr(Arc<Route>, SpanSnapshot),
    None,
}

/// Per-lookup context threaded through the recursion: whether parameter
/// captures are being recorded at all (`lazy`, used for existence/reverse
/// checks where no parameter vector is needed) and the default regex
/// applied to an unconstrained `{name}` parameter (`RouterOptions`).
struct LookupCtx<'a> {
    lazy: bool,
    default_param_regex: Option<&'a Regex>,
}

/// Runs the full lookup protocol for one request: host+path composition,
/// the host-then-path-only fallback, and exact-over-tsr selection across
/// both attempts.
#[tracing::instrument(level = "trace", skip(tree), fields(%method, %host, %path, lazy))]
pub fn lookup(tree: &ITree, method: &str, host: &str, path: &str, lazy: bool) -> Option<LookupOutcome> {
    let method_key = method.to_ascii_uppercase();
    let root = tree.roots.get(method_key.as_str())?;
    let ctx = LookupCtx {
        lazy,
        default_param_regex: tree.options.default_param_regex.as_deref(),
    };

    let combined = if host.is_empty() {
        None
    } else {
        Some(format!("{}{}", host.to_ascii_lowercase(), path))
    };

    let host_attempt = combined.as_ref().map(|buf| {
        let mut scratch = tree.context_pool.checkout();
        let attempt = find_from(root, buf, 0, false, &ctx, &mut scratch.spans);
        (attempt, buf.as_str())
    });

    let path_attempt = {
        let mut scratch = tree.context_pool.checkout();
        let attempt = find_from(root, path, 0, false, &ctx, &mut scratch.spans);
        (attempt, path)
    };

    let mut best_tsr: Option<(Arc<Route>, SpanSnapshot, &str)> = None;

    if let Some((attempt, buf)) = host_attempt {
        match attempt {
            Attempt::Exact(route, spans) => return Some(build_outcome(&route, buf, &spans, false)),
            Attempt::Tsr(route, spans) => best_tsr = Some((route, spans, buf)),
            Attempt::None => {}
        }
    }

    match path_attempt {
        (Attempt::Exact(route, spans), buf) => return Some(build_outcome(&route, buf, &spans, false)),
        (Attempt::Tsr(route, spans), buf) if best_tsr.is_none() => {
            best_tsr = Some((route, spans, buf));
        }
        _ => {}
    }

    best_tsr.map(|(route, spans, buf)| build_outcome(&route, buf, &spans, true))
}

fn build_outcome(route: &Arc<Route>, buf: &str, spans: &[(usize, usize)], tsr: bool) -> LookupOutcome {
    let mut params = SmallVec::new();
    let mut spans_iter = spans.iter();
    for tok in route.tokens.iter() {
        if tok.kind == TokenKind::Static {
            continue;
        }
        if let Some(&(start, end)) = spans_iter.next() {
            params.push((tok.value.clone(), buf[start..end].into()));
        }
    }
    LookupOutcome {
        route: route.clone(),
        params,
        tsr,
    }
}

/// Descends from `node`, matching `buf[idx..]` against its edges in
/// static-then-param-then-wildcard priority order.
/// `past_hsplit` tracks whether the walk has already crossed the host/path
/// boundary, which selects the segment-boundary byte (`.` before, `/`
/// after) for parameter/wildcard capture.
fn find_from(
    node: &Arc<Node>,
    buf: &str,
    idx: usize,
    past_hsplit: bool,
    ctx: &LookupCtx,
    captures: &mut Vec<(usize, usize)>,
) -> Attempt {
    let remaining = &buf[idx..];
    let mut tsr_candidate: Option<(Arc<Route>, SpanSnapshot)> = None;

    if remaining.is_empty() {
        if let Some(route) = &node.route {
            return Attempt::Exact(route.clone(), captures.iter().copied().collect());
        }
    } else if remaining == "/" {
        // Symmetric trailing-slash case: the input carries one more slash
        // than the registered pattern, and this node (reached with the
        // pattern fully consumed) is itself a leaf.
        if let Some(route) = &node.route {
            tsr_candidate = Some((route.clone(), captures.iter().copied().collect()));
        }
    }

    if !remaining.is_empty() {
        let label = remaining.as_bytes()[0];
        if let Some(edge_idx) = node.get_static_edge(label) {
            let edge = &node.statics[edge_idx];
            let common = common_prefix_len(remaining, &edge.key);
            if common == edge.key.len() {
                let new_past = past_hsplit || edge.hsplit();
                match find_from(edge, buf, idx + common, new_past, ctx, captures) {
                    Attempt::Exact(r, c) => return Attempt::Exact(r, c),
                    Attempt::Tsr(r, c) => {
                        if tsr_candidate.is_none() {
                            tsr_candidate = Some((r, c));
                        }
                    }
                    Attempt::None => {}
                }
            } else if common == remaining.len() {
                // Input ran out partway through this edge's key. If exactly
                // one trailing byte remains and it's the path separator,
                // the leaf below would match with one more slash supplied.
                let suffix = &edge.key[common..];
                if suffix == "/" && tsr_candidate.is_none() {
                    if let Some(route) = &edge.route {
                        tsr_candidate = Some((route.clone(), captures.iter().copied().collect()));
                    }
                }
            }
        }
    }

    let boundary = if past_hsplit { b'/' } else { b'.' };

    if !remaining.is_empty() && !node.params.is_empty() {
        let seg_len = memchr(boundary, remaining.as_bytes()).unwrap_or(remaining.len());
        if seg_len > 0 {
            let seg = &remaining[..seg_len];
            for p in node.params.iter() {
                if !segment_satisfies(seg, p.regex.as_deref(), ctx.default_param_regex) {
                    continue;
                }
                if !ctx.lazy {
                    captures.push((idx, idx + seg_len));
                }
                let new_past = past_hsplit || p.hsplit();
                let outcome = find_from(p, buf, idx + seg_len, new_past, ctx, captures);
                if !ctx.lazy {
                    captures.pop();
                }
                match outcome {
                    Attempt::Exact(r, c) => return Attempt::Exact(r, c),
                    Attempt::Tsr(r, c) => {
                        if tsr_candidate.is_none() {
                            tsr_candidate = Some((r, c));
                        }
                    }
                    Attempt::None => {}
                }
            }
        }
    }

    if !node.wildcards.is_empty() {
        for w in node.wildcards.iter() {
            let has_continuation = !w.statics.is_empty() || !w.params.is_empty() || !w.wildcards.is_empty();
            if has_continuation {
                for end in boundary_positions_desc(remaining, boundary) {
                    let cap = &remaining[..end];
                    if let Some(re) = &w.regex {
                        if !re.is_match(cap) {
                            continue;
                        }
                    }
                    if !ctx.lazy {
                        captures.push((idx, idx + end));
                    }
                    let new_past = past_hsplit || w.hsplit();
                    let outcome = find_from(w, buf, idx + end, new_past, ctx, captures);
                    if !ctx.lazy {
                        captures.pop();
                    }
                    match outcome {
                        Attempt::Exact(r, c) => return Attempt::Exact(r, c),
                        Attempt::Tsr(r, c) => {
                            if tsr_candidate.is_none() {
                                tsr_candidate = Some((r, c));
                            }
                        }
                        Attempt::None => {}
                    }
                }
            } else {
                if let Some(re) = &w.regex {
                    if !re.is_match(remaining) {
                        continue;
                    }
                }
                if !ctx.lazy {
                    captures.push((idx, buf.len()));
                }
                let new_past = past_hsplit || w.hsplit();
                let outcome = find_from(w, buf, buf.len(), new_past, ctx, captures);
                if !ctx.lazy {
                    captures.pop();
                }
                match outcome {
                    Attempt::Exact(r, c) => return Attempt::Exact(r, c),
                    Attempt::Tsr(r, c) => {
                        if tsr_candidate.is_none() {
                            tsr_candidate = Some((r, c));
                        }
                    }
                    Attempt::None => {}
                }
            }
        }
    }

    match tsr_candidate {
        Some((r, c)) => Attempt::Tsr(r, c),
        None => Attempt::None,
    }
}

fn segment_satisfies(seg: &str, explicit: Option<&Regex>, default: Option<&Regex>) -> bool {
    match explicit.or(default) {
        Some(re) => re.is_match(seg),
        None => true,
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Candidate wildcard-capture end offsets (relative to `s`'s start),
/// greedy-longest first, then each earlier boundary-char position, down to
/// zero (a wildcard may match zero or more characters, so an empty capture
/// is a valid last resort). Enumerates split points greedily but restarts
/// at each boundary until a working suffix match is found.
fn boundary_positions_desc(s: &str, boundary: u8) -> Vec<usize> {
    let mut v = Vec::with_capacity(4);
    v.push(s.len());
    v.extend(memrchr_iter(boundary, s.as_bytes()));
    if *v.last().unwrap() != 0 {
        v.push(0);
    }
    v
}
