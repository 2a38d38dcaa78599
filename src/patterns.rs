//! Shared rule primitives
//!
//! Predicates and tables that several operators rely on. Each exists once here
//! so that two rules can never disagree on, say, what counts as an external call.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{FunctionDefinition, Node, NodeKind, Span};
use crate::source::SourceUnit;
use crate::visit::{contains, Descent};

/// Members whose invocation hands control to another account
pub const EXTERNAL_CALL_MEMBERS: &[&str] = &["call", "delegatecall", "staticcall", "send", "transfer"];

fn is_external_member(node: &Node) -> bool {
    node.member_access()
        .is_some_and(|(_, member)| EXTERNAL_CALL_MEMBERS.contains(&member))
}

/// Does `expr` invoke an external call anywhere in its operand tree?
///
/// Covers direct calls (`a.call(d)`), call options (`a.call{value: v}(d)`),
/// the legacy value chain (`a.call.value(v)(d)`) and calls wrapped in unary,
/// binary or tuple expressions.
pub fn invokes_external_call(expr: &Node) -> bool {
    contains(expr, Descent::Operands, &is_external_member)
}

/// Statement-level variant: also looks through conditions, bodies and initial values
pub fn statement_invokes_external_call(stmt: &Node) -> bool {
    contains(stmt, Descent::Statements, &is_external_member)
}

/// `require(...)` / `assert(...)` call expression
pub fn is_guard_call(expr: &Node) -> bool {
    matches!(expr.called_name(), Some("require" | "assert"))
}

/// Expression statement consisting of a `require` or `assert` call
pub fn is_guard(stmt: &Node) -> bool {
    match &stmt.kind {
        NodeKind::ExpressionStatement {
            expression: Some(expr),
        } => is_guard_call(expr),
        _ => false,
    }
}

/// Signature of a function with a body: from `function` up to the opening brace
pub fn signature_span(function: &Node) -> Option<Span> {
    let body = function.as_function()?.body.as_deref()?;
    (function.span.start <= body.span.start).then(|| Span::new(function.span.start, body.span.start))
}

/// Offset of the `returns` keyword of a function that declares return parameters
pub fn returns_offset(unit: &SourceUnit, function: &Node) -> Option<usize> {
    let first_return = function
        .as_function()?
        .return_parameters
        .as_ref()?
        .first()?;
    let head = unit.text(Span::new(function.span.start, first_return.span.start))?;
    head.rfind("returns").map(|i| function.span.start + i)
}

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid word pattern"));

/// Whole-word occurrences of `word`, which must itself be a single word
fn word_matches<'t>(text: &'t str, word: &str) -> Vec<regex::Match<'t>> {
    WORD.find_iter(text).filter(|m| m.as_str() == word).collect()
}

/// Span of the first whole-word `word` inside `span`
pub fn word_span(unit: &SourceUnit, span: Span, word: &str) -> Option<Span> {
    let text = unit.text(span)?;
    let m = word_matches(text, word).into_iter().next()?;
    Some(Span::new(span.start + m.start(), span.start + m.end()))
}

/// Span of the last whole-word `word` inside `span`
pub fn last_word_span(unit: &SourceUnit, span: Span, word: &str) -> Option<Span> {
    let text = unit.text(span)?;
    let m = word_matches(text, word).into_iter().last()?;
    Some(Span::new(span.start + m.start(), span.start + m.end()))
}

/// A modifier invocation that could be attached to another function
#[derive(Debug, Clone)]
pub struct ModifierCandidate<'a> {
    pub node: &'a Node,
    /// Exact invocation text, e.g. `onlyRole(role)`
    pub text: &'a str,
    /// Argument names; `None` when some argument is not a plain identifier
    pub arguments: Option<Vec<&'a str>>,
}

impl<'a> ModifierCandidate<'a> {
    /// Whether the invocation's arguments are a positional prefix of the
    /// function's parameter names
    pub fn fits(&self, function: &FunctionDefinition) -> bool {
        let Some(arguments) = &self.arguments else {
            return false;
        };
        let parameters = function.parameter_names();
        arguments.len() <= parameters.len()
            && arguments
                .iter()
                .zip(&parameters)
                .all(|(arg, param)| *param == Some(*arg))
    }
}

/// Every distinct modifier invocation of the file, in document order
///
/// Invocations attached to constructors are left out: those are usually base
/// constructor calls rather than access modifiers.
#[derive(Debug, Clone, Default)]
pub struct ModifierTable<'a> {
    candidates: Vec<ModifierCandidate<'a>>,
}

impl<'a> ModifierTable<'a> {
    pub fn build(unit: &'a SourceUnit) -> Self {
        let mut candidates: Vec<ModifierCandidate<'a>> = Vec::new();
        for function in unit.root().functions() {
            let Some(def) = function.as_function() else {
                continue;
            };
            if def.is_constructor {
                continue;
            }
            for modifier in &def.modifiers {
                let NodeKind::ModifierInvocation { arguments, .. } = &modifier.kind else {
                    continue;
                };
                let Some(text) = unit.text_of(modifier) else {
                    continue;
                };
                if candidates.iter().any(|c| c.text == text) {
                    continue;
                }
                let arguments = arguments
                    .iter()
                    .flatten()
                    .map(Node::identifier)
                    .collect::<Option<Vec<_>>>();
                candidates.push(ModifierCandidate {
                    node: modifier,
                    text,
                    arguments,
                });
            }
        }
        Self { candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModifierCandidate<'a>> {
        self.candidates.iter()
    }

    /// Candidates that fit `function` and sit in the same scope as it
    pub fn applicable_to<'t>(
        &'t self,
        unit: &'t SourceUnit,
        function: &'t Node,
        def: &'t FunctionDefinition,
    ) -> impl Iterator<Item = &'t ModifierCandidate<'a>> + 't {
        self.candidates.iter().filter(move |candidate| {
            candidate.fits(def) && unit.scopes().same_scope(function.span, candidate.node.span)
        })
    }
}
