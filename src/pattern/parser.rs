use super::error::{PatternError, PatternResult};
use super::token::{Token, TokenKind};
use hashbrown::HashSet;
use regex::Regex;
use std::sync::Arc;

/// The result of parsing one pattern string: its token sequence plus the
/// derived parameter count and host/path split offset (the caller attaches
/// the opaque handler separately to build a full `Route`).
pub struct ParsedPattern {
    pub tokens: Vec<Token>,
    pub ps_len: usize,
    pub host_split: usize,
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// A method is a valid HTTP token (RFC 7230 §3.2.6): one or more `tchar`
/// bytes. Case is not normalized here; callers upper-case for storage.
fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// Validates a method token synchronously, before any tree mutation.
/// Does not require membership in a fixed verb set — any HTTP token is
/// accepted, matching this router's treatment of `method` as an opaque
/// routing key rather than a closed enum.
pub fn validate_method(method: &str) -> PatternResult<()> {
    if !method.is_empty() && method.as_bytes().iter().all(|&b| is_tchar(b)) {
        Ok(())
    } else {
        Err(PatternError::InvalidMethod {
            method: method.to_string(),
        })
    }
}

/// Scans from `start` (the byte right after the opening `{`) to the matching
/// `}`, honoring nested braces so a regex like `\d{3}` doesn't terminate the
/// scan early. Returns the index of the closing `}`.
fn find_matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 1i32;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parses a pattern string into a flat token sequence.
///
/// The whole pattern is scanned in a single left-to-right pass. Literal runs
/// accumulate into a `Static` token until a `{` or `*{` escape is found.
/// Because `path` always begins with a literal `/`, the host/path boundary
/// (the first top-level `/`) always falls at the start of some literal run,
/// so `hsplit` never needs a synthetic zero-width token.
pub fn parse_pattern(pattern: &str) -> PatternResult<ParsedPattern> {
    if pattern.is_empty() {
        return Err(PatternError::Empty {
            pattern: pattern.to_string(),
        });
    }

    let bytes = pattern.as_bytes();

    // Host/path boundary: the first '/' at brace depth 0. If that's byte 0,
    // there is no host portion.
    let mut depth = 0i32;
    let mut host_split = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'/' if depth == 0 => {
                host_split = Some(i);
                break;
            }
            _ => {}
        }
    }
    let host_split = match host_split {
        Some(p) => p,
        None => {
            return Err(PatternError::MissingPath {
                pattern: pattern.to_string(),
            });
        }
    };

    let mut tokens = Vec::new();
    let mut names: HashSet<Box<str>> = HashSet::new();
    let mut ps_len = 0usize;

    let mut literal_start = 0usize;
    let mut literal_buf = String::new();
    let mut i = 0usize;

    // Emits the buffered literal run as Static token(s). If the host/path
    // boundary falls strictly inside the run, it is split in two so the
    // boundary always lands exactly at the end of some token (never
    // mid-run), letting tree insertion mark `hsplit` on a single node
    // instead of scanning for it.
    macro_rules! flush_literal {
        () => {
            if !literal_buf.is_empty() {
                let span_end = literal_start + literal_buf.len();
                if host_split > 0 && literal_start < host_split && host_split < span_end {
                    let cut = host_split - literal_start;
                    let head = literal_buf[..cut].to_string();
                    let tail = literal_buf[cut..].to_string();
                    let mut head_tok = Token::static_lit(head);
                    head_tok.hsplit = true;
                    tokens.push(head_tok);
                    tokens.push(Token::static_lit(tail));
                } else {
                    let mut tok = Token::static_lit(literal_buf.clone());
                    tok.hsplit = host_split > 0 && span_end == host_split;
                    tokens.push(tok);
                }
                literal_buf.clear();
            }
        };
    }

    while i < bytes.len() {
        let is_wildcard = bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'{';
        let is_param = bytes[i] == b'{';

        if is_wildcard || is_param {
            // lower-case host-portion literal text before folding into a token
            if literal_buf.is_empty() {
                literal_start = i;
            }
            flush_literal!();

            let brace_at = if is_wildcard { i + 1 } else { i };
            let name_start = brace_at + 1;
            let close = find_matching_brace(bytes, name_start).ok_or(
                PatternError::UnbalancedBrace {
                    pattern: pattern.to_string(),
                    offset: brace_at,
                },
            )?;

            let body = &pattern[name_start..close];
            let (name_part, regex_part) = match body.find(':') {
                Some(colon) => (&body[..colon], Some(&body[colon + 1..])),
                None => (body, None),
            };

            if name_part.is_empty() {
                return Err(PatternError::EmptyName {
                    pattern: pattern.to_string(),
                    offset: name_start,
                });
            }
            let nb = name_part.as_bytes();
            if !is_name_start(nb[0]) || !nb.iter().all(|&b| is_name_continue(b)) {
                return Err(PatternError::InvalidName {
                    pattern: pattern.to_string(),
                    name: name_part.to_string(),
                    offset: name_start,
                });
            }
            if !names.insert(name_part.into()) {
                return Err(PatternError::DuplicateParam {
                    pattern: pattern.to_string(),
                    name: name_part.to_string(),
                });
            }

            let regex = match regex_part {
                Some(src) if !src.is_empty() => {
                    let anchored = format!("^(?:{src})$");
                    let re = Regex::new(&anchored).map_err(|e| PatternError::InvalidRegex {
                        pattern: pattern.to_string(),
                        name: name_part.to_string(),
                        source: e,
                    })?;
                    Some(Arc::new(re))
                }
                _ => None,
            };

            let mut tok = if is_wildcard {
                Token::wildcard(name_part, regex)
            } else {
                Token::param(name_part, regex)
            };
            // A param/wildcard can be the last host label, immediately
            // followed by path's leading '/' — the boundary then falls
            // exactly at the end of this token.
            tok.hsplit = host_split > 0 && close + 1 == host_split;
            tokens.push(tok);
            ps_len += 1;

            i = close + 1;
            literal_start = i;
            continue;
        }

        if literal_buf.is_empty() {
            literal_start = i;
        }
        let ch = bytes[i];
        // Host-portion literal bytes are case-folded at parse time.
        let folded = if i < host_split && ch.is_ascii_uppercase() {
            ch.to_ascii_lowercase()
        } else {
            ch
        };
        literal_buf.push(folded as char);
        i += 1;
    }
    flush_literal!();

    Ok(ParsedPattern {
        tokens,
        ps_len,
        host_split,
    })
}
