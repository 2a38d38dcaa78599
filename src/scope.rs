//! Scope resolution
//!
//! Maps a byte range to the innermost contract-like definition (contract,
//! interface, library or struct) that contains it. The index is built once per
//! file; lookups are a binary search followed by a short backwards scan.

use crate::ast::{Node, Span};

/// A named contract-like region of the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeBoundary {
    pub name: String,
    pub span: Span,
}

/// Interval index over every scope-defining node of one file
#[derive(Debug, Clone, Default)]
pub struct ScopeIndex {
    /// Sorted by start ascending, then end descending, so that for equal starts
    /// the narrower scope comes later.
    scopes: Vec<ScopeBoundary>,
}

impl ScopeIndex {
    pub fn build(root: &Node) -> Self {
        let mut scopes = Vec::new();
        root.walk(&mut |node| {
            if let Some(name) = node.scope_name() {
                scopes.push(ScopeBoundary {
                    name: name.to_string(),
                    span: node.span,
                });
            }
        });
        scopes.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(b.span.end.cmp(&a.span.end))
        });
        Self { scopes }
    }

    /// Name of the innermost scope containing `span`
    ///
    /// `None` means the range is at file level (or the file has no scopes); callers
    /// treat that as "not applicable", never as an error.
    pub fn resolve(&self, span: Span) -> Option<&str> {
        let candidates = self.scopes.partition_point(|s| s.span.start <= span.start);
        // Scopes nest or are disjoint, so the containing scope with the largest
        // start is the innermost one.
        self.scopes[..candidates]
            .iter()
            .rev()
            .find(|s| s.span.contains(span))
            .map(|s| s.name.as_str())
    }

    /// Whether both ranges resolve to the same, existing scope
    pub fn same_scope(&self, a: Span, b: Span) -> bool {
        match (self.resolve(a), self.resolve(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Every scope name in the file
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|s| s.name.as_str())
    }

    pub fn boundaries(&self) -> &[ScopeBoundary] {
        &self.scopes
    }
}
