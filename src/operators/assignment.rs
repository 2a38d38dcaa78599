//! Assignment and unary operator rules (AOR, ICM, UORD)

use crate::ast::{Node, NodeKind, Span};
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::source::SourceUnit;

/// Compound assignment operator and the operator it is swapped for
const ASSIGNMENT_SWAPS: &[(&str, &str)] = &[
    ("+=", "-="),
    ("-=", "+="),
    ("*=", "/="),
    ("/=", "*="),
    ("%=", "*="),
    ("<<=", ">>="),
    (">>=", "<<="),
    ("|=", "&="),
    ("&=", "|="),
    ("^=", "&="),
];

/// Whitespace-inclusive gap between the operands of a compound assignment,
/// provided it really holds the operator
fn operator_gap<'a>(unit: &'a SourceUnit, node: &Node) -> Option<(Span, &'a str, &'static str)> {
    let NodeKind::BinaryOperation {
        operator,
        left,
        right,
    } = &node.kind
    else {
        return None;
    };
    let op = ASSIGNMENT_SWAPS
        .iter()
        .map(|(op, _)| *op)
        .find(|op| *op == operator.as_str())?;
    let span = Span::new(left.span.end, right.span.start);
    let text = unit.text(span)?;
    text.contains(op).then_some((span, text, op))
}

/// Swaps a compound assignment for its opposite and for a plain `=`
pub struct AssignmentReplacement;

impl Operator for AssignmentReplacement {
    fn id(&self) -> &'static str {
        "AOR"
    }

    fn name(&self) -> &'static str {
        "assignment-operator-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let Some((span, text, op)) = operator_gap(unit, node) else {
                return;
            };
            let Some((_, swapped)) = ASSIGNMENT_SWAPS.iter().find(|(from, _)| *from == op) else {
                return;
            };
            out.replace(span, text.replacen(op, swapped, 1));
            out.replace(span, text.replacen(op, "=", 1));
        });
        out.finish()
    }
}

/// `a -= b` becomes `a =- b`
pub struct IncrementsMirror;

impl Operator for IncrementsMirror {
    fn id(&self) -> &'static str {
        "ICM"
    }

    fn name(&self) -> &'static str {
        "increments-mirror"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            if let Some((span, text, "-=")) = operator_gap(unit, node) {
                out.replace(span, text.replacen("-=", "=-", 1));
            }
        });
        out.finish()
    }
}

/// Replaces or deletes unary operators
pub struct UnaryReplacement;

impl UnaryReplacement {
    fn replacements(operator: &str) -> &'static [&'static str] {
        match operator {
            "++" => &["--", ""],
            "--" => &["++", ""],
            "-" | "~" | "!" => &[""],
            _ => &[],
        }
    }
}

impl Operator for UnaryReplacement {
    fn id(&self) -> &'static str {
        "UORD"
    }

    fn name(&self) -> &'static str {
        "unary-operator-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let NodeKind::UnaryOperation {
                operator,
                is_prefix,
                ..
            } = &node.kind
            else {
                return;
            };
            let span = if *is_prefix {
                Span::new(node.span.start, node.span.start + operator.len())
            } else {
                Span::new(node.span.end.saturating_sub(operator.len()), node.span.end)
            };
            if unit.text(span) != Some(operator.as_str()) {
                log::trace!("UORD: operator '{}' not found at {}..{}", operator, span.start, span.end);
                return;
            }
            for replacement in Self::replacements(operator) {
                out.replace(span, *replacement);
            }
        });
        out.finish()
    }
}
