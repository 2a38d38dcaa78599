//! Control flow and exception rules (BCRD, LSC, CBD, EHC, AVR)
//!
//! Statement spans include the terminating `;`, so deleting a statement's span
//! removes the statement completely.

use crate::ast::NodeKind;
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::source::SourceUnit;

/// Swaps `break` and `continue`, and deletes either
pub struct BreakContinueReplacement;

impl Operator for BreakContinueReplacement {
    fn id(&self) -> &'static str {
        "BCRD"
    }

    fn name(&self) -> &'static str {
        "break-continue-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let (keyword, swapped) = match node.kind {
                NodeKind::BreakStatement => ("break", "continue"),
                NodeKind::ContinueStatement => ("continue", "break"),
                _ => return,
            };
            let Some(text) = unit.text_of(node) else {
                return;
            };
            if text.starts_with(keyword) {
                out.replace_node(node, text.replacen(keyword, swapped, 1));
                out.delete(node.span);
            }
        });
        out.finish()
    }
}

/// Forces loop conditions to `true` and to `false`
pub struct LoopConditionChange;

impl Operator for LoopConditionChange {
    fn id(&self) -> &'static str {
        "LSC"
    }

    fn name(&self) -> &'static str {
        "loop-statement-change"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        // all `for` loops first, then all `while` loops
        unit.visit(&mut |node| {
            if let NodeKind::ForStatement {
                condition_expression: Some(condition),
                ..
            } = &node.kind
            {
                out.replace_node(condition, "true");
                out.replace_node(condition, "false");
            }
        });
        unit.visit(&mut |node| {
            if let NodeKind::WhileStatement { condition, .. } = &node.kind {
                out.replace_node(condition, "true");
                out.replace_node(condition, "false");
            }
        });
        out.finish()
    }
}

/// Deletes catch clauses of a `try` that has more than one
pub struct CatchBlockDeletion;

impl Operator for CatchBlockDeletion {
    fn id(&self) -> &'static str {
        "CBD"
    }

    fn name(&self) -> &'static str {
        "catch-block-deletion"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            if let NodeKind::TryStatement { catch_clauses, .. } = &node.kind {
                if catch_clauses.len() > 1 {
                    for clause in catch_clauses {
                        out.delete(clause.span);
                    }
                }
            }
        });
        out.finish()
    }
}

/// Comments out `require`, `assert` and `revert` statements
pub struct ExceptionHandlingChange;

impl Operator for ExceptionHandlingChange {
    fn id(&self) -> &'static str {
        "EHC"
    }

    fn name(&self) -> &'static str {
        "exception-handling-change"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let is_exception = match &node.kind {
                NodeKind::ExpressionStatement {
                    expression: Some(expr),
                } => matches!(expr.called_name(), Some("require" | "assert" | "revert")),
                NodeKind::RevertStatement { .. } => true,
                _ => false,
            };
            if !is_exception {
                return;
            }
            match unit.text_of(node) {
                // a nested block comment would end early
                Some(text) if !text.contains("*/") => {
                    out.replace_node(node, format!("/* {text} */"));
                }
                _ => {}
            }
        });
        out.finish()
    }
}

/// Swaps `assert` and `require`
pub struct AssertViolation;

impl Operator for AssertViolation {
    fn id(&self) -> &'static str {
        "AVR"
    }

    fn name(&self) -> &'static str {
        "assert-violation"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let Some((callee, arguments)) = node.call() else {
                return;
            };
            let Some(condition) = arguments.first() else {
                return;
            };
            match callee.identifier() {
                Some("assert") => {
                    out.replace_node(callee, "require");
                }
                // `assert` takes no message, so the call is rebuilt from its condition
                Some("require") => {
                    if let Some(condition) = unit.text_of(condition) {
                        out.replace_node(node, format!("assert({condition})"));
                    }
                }
                _ => {}
            }
        });
        out.finish()
    }
}
