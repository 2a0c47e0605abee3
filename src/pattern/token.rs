use regex::Regex;
use std::sync::Arc;

/// The three shapes a pattern segment can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Static,
    Param,
    Wildcard,
}

/// One element of a parsed pattern's token sequence.
///
/// `value` is the literal text for `Static` tokens, or the placeholder
/// name for `Param`/`Wildcard`. `hsplit` is true when this token is the
/// last one whose pattern-source span ends exactly at the host/path
/// boundary; the parser guarantees some token always satisfies this when a
/// host portion is present (splitting a literal run in two if needed), so
/// tree insertion never has to scan for the boundary.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Box<str>,
    pub regex: Option<Arc<Regex>>,
    pub hsplit: bool,
}

impl Token {
    pub fn static_lit(value: impl Into<Box<str>>) -> Self {
        Token {
            kind: TokenKind::Static,
            value: value.into(),
            regex: None,
            hsplit: false,
        }
    }

    pub fn param(name: impl Into<Box<str>>, regex: Option<Arc<Regex>>) -> Self {
        Token {
            kind: TokenKind::Param,
            value: name.into(),
            regex,
            hsplit: false,
        }
    }

    pub fn wildcard(name: impl Into<Box<str>>, regex: Option<Arc<Regex>>) -> Self {
        Token {
            kind: TokenKind::Wildcard,
            value: name.into(),
            regex,
            hsplit: false,
        }
    }

    /// The canonical key used to identify a param/wildcard edge at a node:
    /// the regex source when constrained, or `?`/`*` otherwise.
    pub fn canonical_key(&self) -> Box<str> {
        match (&self.kind, &self.regex) {
            (TokenKind::Param, Some(re)) => re.as_str().into(),
            (TokenKind::Param, None) => "?".into(),
            (TokenKind::Wildcard, Some(re)) => re.as_str().into(),
            (TokenKind::Wildcard, None) => "*".into(),
            (TokenKind::Static, _) => unreachable!("static tokens have no canonical key"),
        }
    }
}
