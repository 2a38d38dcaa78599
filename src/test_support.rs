//! Test-only tree building
//!
//! Builds provider-shaped trees for unit tests by locating snippets in the test
//! source, so no test ever hand-computes a byte offset.

use crate::ast::{FunctionDefinition, Node, NodeKind, Span};
use crate::source::{LineIndex, SourceUnit};

/// Something that can be located in the test source
pub trait Locate {
    fn locate(&self, source: &str) -> Span;
}

/// First whole-token occurrence of the snippet
impl Locate for &str {
    fn locate(&self, source: &str) -> Span {
        (*self, 0).locate(source)
    }
}

/// `n`-th (0-based) whole-token occurrence of the snippet
impl Locate for (&str, usize) {
    fn locate(&self, source: &str) -> Span {
        let (snippet, nth) = *self;
        let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
        let bounded_start = snippet.chars().next().is_some_and(is_word);
        let bounded_end = snippet.chars().last().is_some_and(is_word);

        source
            .match_indices(snippet)
            .map(|(i, _)| Span::new(i, i + snippet.len()))
            .filter(|span| {
                let before = source[..span.start].chars().last();
                let after = source[span.end..].chars().next();
                !(bounded_start && before.is_some_and(is_word))
                    && !(bounded_end && after.is_some_and(is_word))
            })
            .nth(nth)
            .unwrap_or_else(|| panic!("snippet {snippet:?} #{nth} not found in {source:?}"))
    }
}

impl Locate for Span {
    fn locate(&self, _source: &str) -> Span {
        *self
    }
}

pub struct TreeBuilder<'s> {
    source: &'s str,
    lines: LineIndex,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
        }
    }

    pub fn span(&self, at: impl Locate) -> Span {
        at.locate(self.source)
    }

    pub fn text(&self, at: impl Locate) -> &'s str {
        let span = self.span(at);
        &self.source[span.start..span.end]
    }

    pub fn node(&self, at: impl Locate, kind: NodeKind) -> Node {
        let span = self.span(at);
        Node::new(span, self.lines.lines_of(span), kind)
    }

    /// Root node spanning the whole source
    pub fn source_unit(&self, children: Vec<Node>) -> Node {
        self.node(
            Span::new(0, self.source.len()),
            NodeKind::SourceUnit { children },
        )
    }

    /// Wrap `children` in a root and build a [`SourceUnit`]
    pub fn unit(&self, children: Vec<Node>) -> SourceUnit {
        SourceUnit::new("Test.sol", self.source, self.source_unit(children))
            .expect("test tree fits its source")
    }

    pub fn ident(&self, at: impl Locate) -> Node {
        let span = self.span(at);
        let name = self.source[span.start..span.end].to_string();
        self.node(span, NodeKind::Identifier { name })
    }

    pub fn number(&self, at: impl Locate) -> Node {
        let span = self.span(at);
        let number = self.source[span.start..span.end].to_string();
        self.node(
            span,
            NodeKind::NumberLiteral {
                number,
                subdenomination: None,
            },
        )
    }

    pub fn string(&self, at: impl Locate, value: &str) -> Node {
        self.node(
            at,
            NodeKind::StringLiteral {
                value: value.to_string(),
            },
        )
    }

    pub fn elementary(&self, at: impl Locate) -> Node {
        let span = self.span(at);
        let name = self.source[span.start..span.end].to_string();
        self.node(span, NodeKind::ElementaryTypeName { name })
    }

    pub fn binary(&self, at: impl Locate, op: &str, left: Node, right: Node) -> Node {
        self.node(
            at,
            NodeKind::BinaryOperation {
                operator: op.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    pub fn unary(&self, at: impl Locate, op: &str, sub: Node, is_prefix: bool) -> Node {
        self.node(
            at,
            NodeKind::UnaryOperation {
                operator: op.to_string(),
                sub_expression: Box::new(sub),
                is_prefix,
            },
        )
    }

    pub fn member(&self, at: impl Locate, expression: Node, member: &str) -> Node {
        self.node(
            at,
            NodeKind::MemberAccess {
                expression: Box::new(expression),
                member_name: member.to_string(),
            },
        )
    }

    pub fn index(&self, at: impl Locate, base: Node, index: Node) -> Node {
        self.node(
            at,
            NodeKind::IndexAccess {
                base: Box::new(base),
                index: Some(Box::new(index)),
            },
        )
    }

    pub fn call(&self, at: impl Locate, callee: Node, arguments: Vec<Node>) -> Node {
        self.node(
            at,
            NodeKind::FunctionCall {
                expression: Box::new(callee),
                arguments,
                names: vec![],
            },
        )
    }

    /// `callee{name: value, ...}` call options
    pub fn with_options(
        &self,
        at: impl Locate,
        callee: Node,
        list_at: impl Locate,
        options: Vec<(&str, Node)>,
    ) -> Node {
        let (names, arguments): (Vec<String>, Vec<Node>) = options
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        let list = self.node(list_at, NodeKind::NameValueList { names, arguments });
        self.node(
            at,
            NodeKind::NameValueExpression {
                expression: Box::new(callee),
                arguments: Box::new(list),
            },
        )
    }

    pub fn tuple(&self, at: impl Locate, components: Vec<Option<Node>>) -> Node {
        self.node(
            at,
            NodeKind::TupleExpression {
                components,
                is_array: false,
            },
        )
    }

    pub fn var_decl(&self, at: impl Locate, name: &str, type_name: Node) -> Node {
        self.node(
            at,
            NodeKind::VariableDeclaration {
                name: Some(name.to_string()),
                type_name: Some(Box::new(type_name)),
                visibility: Default::default(),
                is_state_var: false,
                storage_location: None,
            },
        )
    }

    pub fn expr_stmt(&self, at: impl Locate, expression: Node) -> Node {
        self.node(
            at,
            NodeKind::ExpressionStatement {
                expression: Some(Box::new(expression)),
            },
        )
    }

    pub fn var_stmt(&self, at: impl Locate, variables: Vec<Option<Node>>, init: Option<Node>) -> Node {
        self.node(
            at,
            NodeKind::VariableDeclarationStatement {
                variables,
                initial_value: init.map(Box::new),
            },
        )
    }

    pub fn return_stmt(&self, at: impl Locate, expression: Option<Node>) -> Node {
        self.node(
            at,
            NodeKind::ReturnStatement {
                expression: expression.map(Box::new),
            },
        )
    }

    pub fn emit(&self, at: impl Locate, event_call: Node) -> Node {
        self.node(
            at,
            NodeKind::EmitStatement {
                event_call: Box::new(event_call),
            },
        )
    }

    pub fn block(&self, at: impl Locate, statements: Vec<Node>) -> Node {
        self.node(at, NodeKind::Block { statements })
    }

    pub fn if_stmt(&self, at: impl Locate, condition: Node, then: Node, otherwise: Option<Node>) -> Node {
        self.node(
            at,
            NodeKind::IfStatement {
                condition: Box::new(condition),
                true_body: Box::new(then),
                false_body: otherwise.map(Box::new),
            },
        )
    }

    pub fn function(&self, at: impl Locate, def: FunctionDefinition) -> Node {
        self.node(at, NodeKind::FunctionDefinition(def))
    }

    pub fn modifier(&self, at: impl Locate, name: &str, arguments: Option<Vec<Node>>) -> Node {
        self.node(
            at,
            NodeKind::ModifierInvocation {
                name: name.to_string(),
                arguments,
            },
        )
    }

    pub fn contract(&self, at: impl Locate, name: &str, sub_nodes: Vec<Node>) -> Node {
        self.contract_with_bases(at, name, vec![], sub_nodes)
    }

    pub fn contract_with_bases(
        &self,
        at: impl Locate,
        name: &str,
        base_contracts: Vec<Node>,
        sub_nodes: Vec<Node>,
    ) -> Node {
        self.node(
            at,
            NodeKind::ContractDefinition {
                name: name.to_string(),
                kind: Default::default(),
                base_contracts,
                sub_nodes,
            },
        )
    }

    pub fn pragma(&self, at: impl Locate, value: &str) -> Node {
        self.node(
            at,
            NodeKind::PragmaDirective {
                name: "solidity".to_string(),
                value: value.to_string(),
            },
        )
    }
}
