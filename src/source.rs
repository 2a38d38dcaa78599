//! Source units
//!
//! A [`SourceUnit`] pairs one file's pristine text with the AST the provider built
//! for it. Both are immutable for the whole mutation pass, so any number of
//! operators may read the same unit, one after another or from several threads.

use std::path::{Path, PathBuf};

use crate::ast::{LineRange, Node, Span};
use crate::error::{MutationError, Result};
use crate::scope::ScopeIndex;

/// Maps byte offsets to 1-based line numbers
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts }
    }

    /// Line containing `offset` (1-based)
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset).max(1)
    }

    /// Inclusive line range covered by `span`; an empty span sits on its start line
    pub fn lines_of(&self, span: Span) -> LineRange {
        let start = self.line_of(span.start);
        let end = if span.end > span.start {
            self.line_of(span.end - 1)
        } else {
            start
        };
        LineRange { start, end }
    }
}

/// Immutable text buffer plus AST root for one file
#[derive(Debug)]
pub struct SourceUnit {
    file: PathBuf,
    source: String,
    root: Node,
    lines: LineIndex,
    scopes: ScopeIndex,
}

impl SourceUnit {
    /// Build a unit from an already parsed tree
    pub fn new(file: impl Into<PathBuf>, source: impl Into<String>, root: Node) -> Result<Self> {
        let file = file.into();
        let source = source.into();

        if root.span.start > root.span.end || root.span.end > source.len() {
            return Err(MutationError::InvalidSpan {
                file,
                start: root.span.start,
                end: root.span.end,
                len: source.len(),
            });
        }

        let lines = LineIndex::new(&source);
        let scopes = ScopeIndex::build(&root);

        Ok(Self {
            file,
            source,
            root,
            lines,
            scopes,
        })
    }

    /// Build a unit from a JSON AST dump produced by the parser
    pub fn from_json(file: impl Into<PathBuf>, source: impl Into<String>, ast_json: &str) -> Result<Self> {
        let file = file.into();
        let root: Node =
            serde_json::from_str(ast_json).map_err(|e| MutationError::AstDecodeError {
                file: file.clone(),
                error: e.to_string(),
            })?;
        Self::new(file, source, root)
    }

    /// Read a source file and its AST dump from disk
    pub fn load(source_path: &Path, ast_path: &Path) -> Result<Self> {
        let source =
            std::fs::read_to_string(source_path).map_err(|e| MutationError::FileReadError {
                file: source_path.to_path_buf(),
                error: e.to_string(),
            })?;
        let ast_json =
            std::fs::read_to_string(ast_path).map_err(|e| MutationError::FileReadError {
                file: ast_path.to_path_buf(),
                error: e.to_string(),
            })?;
        Self::from_json(source_path, source, &ast_json)
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn scopes(&self) -> &ScopeIndex {
        &self.scopes
    }

    /// Exact source text of `span`, if it is in bounds and on char boundaries
    pub fn text(&self, span: Span) -> Option<&str> {
        if span.start > span.end {
            return None;
        }
        self.source.get(span.start..span.end)
    }

    /// Source text of `node`
    pub fn text_of(&self, node: &Node) -> Option<&str> {
        self.text(node.span)
    }

    pub fn lines_of(&self, span: Span) -> LineRange {
        self.lines.lines_of(span)
    }

    /// Pre-order walk over the whole file
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Node)) {
        self.root.walk(f);
    }

    /// All nodes in the file matching `pred`, in document order
    pub fn collect(&self, pred: impl Fn(&Node) -> bool) -> Vec<&Node> {
        self.root.collect(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nbc\n\nd");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(1), 1); // the newline itself
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(6), 4);
        assert_eq!(
            index.lines_of(Span::new(0, 4)),
            LineRange { start: 1, end: 2 }
        );
        assert_eq!(
            index.lines_of(Span::new(2, 2)),
            LineRange { start: 2, end: 2 }
        );
    }

    #[test]
    fn test_rejects_root_outside_source() {
        let root = Node::new(
            Span::new(0, 50),
            LineRange { start: 1, end: 1 },
            NodeKind::SourceUnit { children: vec![] },
        );
        let result = SourceUnit::new("a.sol", "contract A {}", root);
        assert!(matches!(result, Err(MutationError::InvalidSpan { end: 50, .. })));
    }

    #[test]
    fn test_from_json_reports_decode_errors() {
        let result = SourceUnit::from_json("a.sol", "", "{not json");
        assert!(matches!(result, Err(MutationError::AstDecodeError { .. })));
    }

    #[test]
    fn test_text_rejects_non_char_boundaries() {
        let root = Node::new(
            Span::new(0, 4),
            LineRange { start: 1, end: 1 },
            NodeKind::SourceUnit { children: vec![] },
        );
        let unit = SourceUnit::new("a.sol", "é;;", root).unwrap();
        assert_eq!(unit.text(Span::new(0, 2)), Some("é"));
        assert_eq!(unit.text(Span::new(1, 2)), None);
        assert_eq!(unit.text(Span::new(3, 9)), None);
    }
}
