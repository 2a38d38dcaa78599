//! Inheritance rules (SKD, SKI)
//!
//! Both only look inside contracts that inherit from something, walking each
//! such contract on its own.

use crate::ast::{Node, NodeKind, Span};
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::source::SourceUnit;

/// Contracts with at least one base contract
fn derived_contracts(unit: &SourceUnit) -> Vec<&Node> {
    unit.collect(|n| {
        matches!(&n.kind, NodeKind::ContractDefinition { base_contracts, .. } if !base_contracts.is_empty())
    })
}

/// Deletes `super.` so the call dispatches to the current contract
pub struct SuperKeywordDeletion;

impl Operator for SuperKeywordDeletion {
    fn id(&self) -> &'static str {
        "SKD"
    }

    fn name(&self) -> &'static str {
        "super-keyword-deletion"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        for contract in derived_contracts(unit) {
            contract.walk(&mut |node| {
                let Some((receiver, _)) = node.member_access() else {
                    return;
                };
                if receiver.identifier() != Some("super") {
                    return;
                }
                let span = Span::new(receiver.span.start, receiver.span.end + 1);
                if unit.text(span) == Some("super.") {
                    out.delete(span);
                }
            });
        }
        out.finish()
    }
}

/// Routes calls of overriding functions to the base implementation
pub struct SuperKeywordInsertion;

impl Operator for SuperKeywordInsertion {
    fn id(&self) -> &'static str {
        "SKI"
    }

    fn name(&self) -> &'static str {
        "super-keyword-insertion"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        for contract in derived_contracts(unit) {
            let overriding: Vec<&str> = contract
                .functions()
                .into_iter()
                .filter_map(Node::as_function)
                .filter(|def| def.overrides.is_some())
                .filter_map(|def| def.name.as_deref())
                .collect();
            if overriding.is_empty() {
                continue;
            }

            contract.walk(&mut |node| {
                let Some((callee, _)) = node.call() else {
                    return;
                };
                if let Some(name) = callee.identifier().filter(|name| overriding.contains(name)) {
                    out.replace_node(callee, format!("super.{name}"));
                }
            });
        }
        out.finish()
    }
}
