//! Nearest-preceding-declaration index
//!
//! A line-order approximation of def-use resolution: the type of `name` at a
//! use site is the type of the closest declaration of `name` on an earlier
//! line. Block-level shadowing and nested-scope visibility are ignored, so a
//! variable declared in an inner block on an earlier line wins over an outer
//! declaration. Rules are defined relative to this behaviour; do not replace it
//! with full scope resolution.

use crate::ast::NodeKind;
use crate::source::SourceUnit;

/// One `VariableDeclaration` of the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationRecord {
    pub name: String,
    /// Source text of the declared type, trimmed (`uint`, `mapping(address => uint)`)
    pub type_text: String,
    pub line: usize,
}

/// Per-invocation declaration table, built by one forward pass
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    records: Vec<DeclarationRecord>,
}

impl DeclarationIndex {
    pub fn build(unit: &SourceUnit) -> Self {
        let mut records = Vec::new();
        unit.visit(&mut |node| {
            let NodeKind::VariableDeclaration {
                name: Some(name),
                type_name: Some(type_name),
                ..
            } = &node.kind
            else {
                return;
            };
            if let Some(text) = unit.text_of(type_name) {
                records.push(DeclarationRecord {
                    name: name.clone(),
                    type_text: text.trim().to_string(),
                    line: node.lines.start,
                });
            }
        });
        Self { records }
    }

    /// Declared type of `name` as seen from `at_line`
    ///
    /// Picks the record with the greatest line strictly before `at_line`; when
    /// two declarations share that line, the first in document order wins.
    pub fn type_of(&self, name: &str, at_line: usize) -> Option<&str> {
        let mut best: Option<&DeclarationRecord> = None;
        for record in self.records.iter().filter(|r| r.name == name && r.line < at_line) {
            if best.map_or(true, |b| record.line > b.line) {
                best = Some(record);
            }
        }
        best.map(|r| r.type_text.as_str())
    }

    pub fn records(&self) -> &[DeclarationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
