//! Arithmetic safety rules (IUO, SFR)
//!
//! IUO picks its strategy from the `pragma solidity` version. Files pinned
//! below 0.8.18 that use a SafeMath-style helper library get the helper calls
//! inlined back into raw operators. Everything else has arithmetic statements
//! wrapped in `unchecked` blocks. The 0.8.18 cutoff is a chosen threshold;
//! the compiler has checked arithmetic since 0.8.0.

use std::sync::LazyLock;
use regex::Regex;

use crate::ast::{Node, NodeKind, Span};
use crate::declarations::DeclarationIndex;
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::patterns::is_guard_call;
use crate::source::SourceUnit;
use crate::visit::{contains, walk_node, Descent, Visit};

/// Helper-library functions and the operator each one guards
const SAFEMATH_OPERATORS: &[(&str, &str)] = &[
    ("add", "+"),
    ("sub", "-"),
    ("mul", "*"),
    ("div", "/"),
    ("mod", "%"),
];

const SAFEMATH_SWAPS: &[(&str, &[&str])] = &[
    ("add", &["sub", "div", "mul", "mod"]),
    ("sub", &["add", "div", "mul", "mod"]),
    ("mul", &["add", "div", "sub", "mod"]),
    ("div", &["mul", "add", "sub", "mod"]),
    ("mod", &["mul", "add", "sub", "div"]),
];

const ARITHMETIC_OPERATORS: &[&str] = &["+", "-", "*", "/", "%", "+=", "-=", "*=", "/=", "%="];

/// Oldest compiler version handled by wrapping in `unchecked`
const UNCHECKED_SINCE: (u32, u32, u32) = (0, 8, 18);

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid version pattern"));

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)//[^\n]*|/\*.*?\*/").expect("valid comment pattern"));

static INTEGER_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^u?int\d*$").expect("valid integer type pattern"));

/// First `x.y.z` version named by a `pragma solidity` directive
fn compiler_version(unit: &SourceUnit) -> Option<(u32, u32, u32)> {
    unit.collect(|n| matches!(&n.kind, NodeKind::PragmaDirective { name, .. } if name == "solidity"))
        .into_iter()
        .find_map(|pragma| {
            let NodeKind::PragmaDirective { value, .. } = &pragma.kind else {
                return None;
            };
            let caps = VERSION.captures(value)?;
            Some((
                caps[1].parse::<u32>().ok()?,
                caps[2].parse::<u32>().ok()?,
                caps[3].parse::<u32>().ok()?,
            ))
        })
}

/// Whether the helper library is named anywhere outside comments
fn mentions_safemath(source: &str) -> bool {
    COMMENTS.replace_all(source, "").contains("SafeMath")
}

/// `(receiver, operator, argument)` of a helper call such as `a.add(b)`
///
/// Calls made on the library itself (`SafeMath.add(a, b)`) are not matched.
fn safemath_call<'a>(unit: &SourceUnit, node: &'a Node) -> Option<(&'a Node, &'static str, &'a Node)> {
    let (callee, arguments) = node.call()?;
    let (receiver, member) = callee.member_access()?;
    let (_, operator) = SAFEMATH_OPERATORS.iter().find(|(name, _)| *name == member)?;
    if unit.text_of(receiver)? == "SafeMath" {
        return None;
    }
    Some((receiver, operator, arguments.first()?))
}

/// Rebuild `node` with every helper call replaced by its raw operator
fn inline(unit: &SourceUnit, node: &Node) -> Option<String> {
    if let Some((receiver, operator, argument)) = safemath_call(unit, node) {
        return Some(format!(
            "({} {} {})",
            inline(unit, receiver)?,
            operator,
            inline(unit, argument)?
        ));
    }
    match &node.kind {
        NodeKind::BinaryOperation {
            operator,
            left,
            right,
        } => Some(format!(
            "{} {} {}",
            inline(unit, left)?,
            operator,
            inline(unit, right)?
        )),
        _ => unit.text_of(node).map(str::to_string),
    }
}

/// Identifiers used as operands of the arithmetic `inline` rewrites
fn operand_names<'a>(unit: &SourceUnit, node: &'a Node, names: &mut Vec<&'a str>) {
    if let Some((receiver, _, argument)) = safemath_call(unit, node) {
        operand_names(unit, receiver, names);
        operand_names(unit, argument, names);
        return;
    }
    match &node.kind {
        NodeKind::BinaryOperation { left, right, .. } => {
            operand_names(unit, left, names);
            operand_names(unit, right, names);
        }
        NodeKind::Identifier { name } => names.push(name),
        _ => {}
    }
}

fn is_arithmetic(node: &Node) -> bool {
    matches!(&node.kind, NodeKind::BinaryOperation { operator, .. }
        if ARITHMETIC_OPERATORS.contains(&operator.as_str()))
}

/// Removes overflow protection: inlines helper calls or adds `unchecked`
pub struct IntegerOverflow;

impl IntegerOverflow {
    fn inline_safemath(&self, unit: &SourceUnit, out: &mut Emitter<'_>) {
        let declarations = DeclarationIndex::build(unit);

        unit.visit(&mut |node| {
            let expression = match &node.kind {
                NodeKind::ExpressionStatement {
                    expression: Some(expression),
                }
                | NodeKind::ReturnStatement {
                    expression: Some(expression),
                }
                | NodeKind::VariableDeclarationStatement {
                    initial_value: Some(expression),
                    ..
                } => expression,
                _ => return,
            };
            if is_guard_call(expression)
                || !contains(expression, Descent::Operands, &|n| safemath_call(unit, n).is_some())
            {
                return;
            }

            let mut names = Vec::new();
            operand_names(unit, expression, &mut names);
            let all_integers = names.iter().all(|name| {
                declarations
                    .type_of(name, node.lines.start)
                    .is_some_and(|ty| INTEGER_TYPE.is_match(ty))
            });
            if !all_integers {
                log::trace!("IUO: operand of unknown type on line {}", node.lines.start);
                return;
            }
            if let Some(inlined) = inline(unit, expression) {
                out.replace_node(expression, inlined);
            }
        });
    }
}

/// Wraps arithmetic expression statements that are not already unchecked
struct UncheckedWrapper<'o, 'u> {
    out: &'o mut Emitter<'u>,
}

impl<'ast> Visit<'ast> for UncheckedWrapper<'_, '_> {
    fn visit_node(&mut self, node: &'ast Node) {
        match &node.kind {
            NodeKind::UncheckedStatement { .. } => return,
            // a for header cannot hold a block, so only the condition and body are walked
            NodeKind::ForStatement {
                condition_expression,
                body,
                ..
            } => {
                if let Some(condition) = condition_expression {
                    self.visit_node(condition);
                }
                self.visit_node(body);
                return;
            }
            NodeKind::ExpressionStatement {
                expression: Some(expression),
            } if !is_guard_call(expression) && contains(expression, Descent::Operands, &is_arithmetic) => {
                let unit = self.out.unit();
                if let Some(text) = unit.text_of(node) {
                    let body = text.trim().trim_end_matches(';').trim_end();
                    self.out.replace_node(node, format!("unchecked {{ {body}; }}"));
                }
            }
            _ => {}
        }
        walk_node(self, node);
    }
}

impl Operator for IntegerOverflow {
    fn id(&self) -> &'static str {
        "IUO"
    }

    fn name(&self) -> &'static str {
        "integer-underflow-overflow"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        match compiler_version(unit) {
            Some(version) if version < UNCHECKED_SINCE => {
                if mentions_safemath(unit.source()) {
                    self.inline_safemath(unit, &mut out);
                }
            }
            _ => UncheckedWrapper { out: &mut out }.visit_node(unit.root()),
        }
        out.finish()
    }
}

/// Swaps one SafeMath function for another
pub struct SafeMathReplacement;

impl Operator for SafeMathReplacement {
    fn id(&self) -> &'static str {
        "SFR"
    }

    fn name(&self) -> &'static str {
        "safemath-function-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        let imports_safemath = !unit
            .collect(|n| matches!(&n.kind, NodeKind::ImportDirective { path } if path.contains("SafeMath")))
            .is_empty();
        if !imports_safemath {
            return out.finish();
        }

        unit.visit(&mut |node| {
            let Some((_, member)) = node.member_access() else {
                return;
            };
            let Some((_, swaps)) = SAFEMATH_SWAPS.iter().find(|(name, _)| *name == member) else {
                return;
            };
            // the member name is the tail of the access expression
            let span = Span::new(node.span.end.saturating_sub(member.len()), node.span.end);
            if unit.text(span) != Some(member) {
                return;
            }
            for swap in swaps.iter() {
                out.replace(span, *swap);
            }
        });
        out.finish()
    }
}
