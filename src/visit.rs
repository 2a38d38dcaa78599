//! AST traversal
//!
//! Rules receive matching nodes in document order, nested occurrences included.
//! A rule may traverse as often as it likes, and may restrict a traversal to a
//! subtree it already holds (one function body, one contract). Traversal never
//! mutates anything.

use crate::ast::{Node, NodeKind};

/// Stateful visitor: override `visit_node` and call [`walk_node`] to keep
/// descending.
pub trait Visit<'ast> {
    fn visit_node(&mut self, node: &'ast Node) {
        walk_node(self, node);
    }
}

/// Visit every child of `node` in document order
pub fn walk_node<'ast, V>(visitor: &mut V, node: &'ast Node)
where
    V: Visit<'ast> + ?Sized,
{
    for child in node.children() {
        visitor.visit_node(child);
    }
}

impl Node {
    /// Pre-order walk over this node and all of its descendants
    pub fn walk<'ast>(&'ast self, f: &mut dyn FnMut(&'ast Node)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// All descendants (self included) matching `pred`, in document order
    pub fn collect<'ast>(&'ast self, pred: impl Fn(&Node) -> bool) -> Vec<&'ast Node> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if pred(node) {
                found.push(node);
            }
        });
        found
    }

    /// All `FunctionDefinition` nodes under this node
    pub fn functions(&self) -> Vec<&Node> {
        self.collect(|n| matches!(n.kind, NodeKind::FunctionDefinition(_)))
    }
}

/// Which child slots a predicate search may descend into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descent {
    /// Expression operands only: unary and binary operands, member-access
    /// receivers, call callees and arguments, call options and tuple components.
    Operands,
    /// Operands plus the arguments of calls only, not the callee chain
    Arguments,
    /// Statement structure (bodies, conditions, initial values) plus operands
    Statements,
}

impl Descent {
    /// Children of `node` this policy descends into
    pub fn slots<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match (self, &node.kind) {
            (_, NodeKind::UnaryOperation { sub_expression, .. }) => vec![sub_expression.as_ref()],
            (_, NodeKind::BinaryOperation { left, right, .. }) => {
                vec![left.as_ref(), right.as_ref()]
            }
            (_, NodeKind::TupleExpression { components, .. }) => {
                components.iter().flatten().collect()
            }
            (Descent::Arguments, NodeKind::FunctionCall { arguments, .. }) => {
                arguments.iter().collect()
            }
            (
                _,
                NodeKind::FunctionCall {
                    expression,
                    arguments,
                    ..
                },
            ) => std::iter::once(expression.as_ref())
                .chain(arguments.iter())
                .collect(),
            (Descent::Arguments, _) => Vec::new(),
            (_, NodeKind::MemberAccess { expression, .. }) => vec![expression.as_ref()],
            (_, NodeKind::NameValueExpression { expression, .. }) => vec![expression.as_ref()],
            (Descent::Operands, _) => Vec::new(),
            (Descent::Statements, NodeKind::IndexAccess { base, index }) => {
                std::iter::once(base.as_ref()).chain(index.as_deref()).collect()
            }
            (Descent::Statements, _) => match &node.kind {
                NodeKind::Block { .. }
                | NodeKind::UncheckedStatement { .. }
                | NodeKind::ExpressionStatement { .. }
                | NodeKind::VariableDeclarationStatement { .. }
                | NodeKind::IfStatement { .. }
                | NodeKind::ForStatement { .. }
                | NodeKind::WhileStatement { .. }
                | NodeKind::DoWhileStatement { .. }
                | NodeKind::ReturnStatement { .. }
                | NodeKind::EmitStatement { .. }
                | NodeKind::RevertStatement { .. }
                | NodeKind::TryStatement { .. }
                | NodeKind::CatchClause { .. }
                | NodeKind::Conditional { .. } => node.children(),
                _ => Vec::new(),
            },
        }
    }
}

/// Does `node`, or anything reachable from it under `descent`, satisfy `pred`?
pub fn contains(node: &Node, descent: Descent, pred: &dyn Fn(&Node) -> bool) -> bool {
    if pred(node) {
        return true;
    }
    descent
        .slots(node)
        .into_iter()
        .any(|child| contains(child, descent, pred))
}

/// First node (pre-order) reachable under `descent` that satisfies `pred`
pub fn find<'a>(node: &'a Node, descent: Descent, pred: &dyn Fn(&Node) -> bool) -> Option<&'a Node> {
    if pred(node) {
        return Some(node);
    }
    descent
        .slots(node)
        .into_iter()
        .find_map(|child| find(child, descent, pred))
}
