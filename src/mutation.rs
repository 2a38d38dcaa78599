//! Mutation value object
//!
//! A [`Mutation`] is one candidate edit: replace `source[start_offset..end_offset]`
//! with `replacement_text`. It carries everything the external materializer
//! needs to apply it to the pristine source and to attribute it to an operator.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ast::{Node, Span};
use crate::source::SourceUnit;

/// One candidate edit plus provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutation {
    pub file: PathBuf,
    /// Byte offsets, half-open
    pub start_offset: usize,
    pub end_offset: usize,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
    pub original_text: String,
    pub replacement_text: String,
    pub operator_id: String,
}

/// Identity of a mutation for deduplication
///
/// Lines and original text follow from the offsets, so they are not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationKey<'a> {
    pub file: &'a Path,
    pub start_offset: usize,
    pub end_offset: usize,
    pub replacement_text: &'a str,
    pub operator_id: &'a str,
}

impl Mutation {
    pub fn key(&self) -> MutationKey<'_> {
        MutationKey {
            file: &self.file,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            replacement_text: &self.replacement_text,
            operator_id: &self.operator_id,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start_offset, self.end_offset)
    }

    /// Replacement identical to the text it replaces
    pub fn is_noop(&self) -> bool {
        self.original_text == self.replacement_text
    }

    /// Build the mutant: `source[..start] + replacement + source[end..]`
    ///
    /// Returns `None` when the offsets do not fit `source`.
    pub fn apply_to(&self, source: &str) -> Option<String> {
        if self.start_offset > self.end_offset {
            return None;
        }
        let head = source.get(..self.start_offset)?;
        let tail = source.get(self.end_offset..)?;
        let mut mutant =
            String::with_capacity(head.len() + self.replacement_text.len() + tail.len());
        mutant.push_str(head);
        mutant.push_str(&self.replacement_text);
        mutant.push_str(tail);
        Some(mutant)
    }
}

impl PartialEq for Mutation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Mutation {}

impl Hash for Mutation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} [{}] {:?} -> {:?}",
            self.file.display(),
            self.start_line,
            self.operator_id,
            self.original_text,
            self.replacement_text
        )
    }
}

/// Drop repeated mutations, keeping the first occurrence of each key
pub fn dedup(mutations: Vec<Mutation>) -> Vec<Mutation> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        mutations.iter().map(|m| seen.insert(m.key())).collect()
    };
    mutations
        .into_iter()
        .zip(keep)
        .filter_map(|(m, keep)| keep.then_some(m))
        .collect()
}

/// Accumulates the mutations of one operator invocation
///
/// Edits whose span does not slice the source cleanly, and edits that would
/// not change the text, are dropped here so no operator can emit them.
pub struct Emitter<'u> {
    unit: &'u SourceUnit,
    operator_id: &'static str,
    mutations: Vec<Mutation>,
}

impl<'u> Emitter<'u> {
    pub fn new(unit: &'u SourceUnit, operator_id: &'static str) -> Self {
        Self {
            unit,
            operator_id,
            mutations: Vec::new(),
        }
    }

    pub fn unit(&self) -> &'u SourceUnit {
        self.unit
    }

    /// Propose replacing `span` with `replacement`; returns whether it was kept
    pub fn replace(&mut self, span: Span, replacement: impl Into<String>) -> bool {
        let replacement = replacement.into();
        let Some(original) = self.unit.text(span) else {
            log::trace!(
                "{}: span {}..{} does not slice {}",
                self.operator_id,
                span.start,
                span.end,
                self.unit.file().display()
            );
            return false;
        };
        if original == replacement {
            log::trace!("{}: no-op edit at {}..{}", self.operator_id, span.start, span.end);
            return false;
        }

        let lines = self.unit.lines_of(span);
        self.mutations.push(Mutation {
            file: self.unit.file().to_path_buf(),
            start_offset: span.start,
            end_offset: span.end,
            start_line: lines.start,
            end_line: lines.end,
            original_text: original.to_string(),
            replacement_text: replacement,
            operator_id: self.operator_id.to_string(),
        });
        true
    }

    /// Replace the whole text of `node`
    pub fn replace_node(&mut self, node: &Node, replacement: impl Into<String>) -> bool {
        self.replace(node.span, replacement)
    }

    /// Insert `text` at `offset` (an empty-range edit)
    pub fn insert(&mut self, offset: usize, text: impl Into<String>) -> bool {
        self.replace(Span::new(offset, offset), text)
    }

    /// Delete `span`
    pub fn delete(&mut self, span: Span) -> bool {
        self.replace(span, String::new())
    }

    pub fn finish(self) -> Vec<Mutation> {
        self.mutations
    }
}
