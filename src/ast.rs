//! Solidity AST model
//!
//! The parser is an external collaborator: it builds this tree and supplies the
//! byte/line coordinates. Node shapes follow the kinds and field names emitted by
//! the common Solidity JSON parsers (`type` tag, camelCase fields), so a provider
//! can hand a tree over as JSON. Anything the model does not know about
//! deserializes as [`NodeKind::Other`] and is simply never matched by a rule.

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into the source text (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely within this span
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Inclusive 1-based line range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// A single AST element. Owned by the [`SourceUnit`](crate::source::SourceUnit) and
/// read-only to every operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub span: Span,
    pub lines: LineRange,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Default,
    Public,
    External,
    Internal,
    Private,
}

impl Visibility {
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Visibility::Default => None,
            Visibility::Public => Some("public"),
            Visibility::External => Some("external"),
            Visibility::Internal => Some("internal"),
            Visibility::Private => Some("private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Constant,
    Payable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    #[default]
    Contract,
    Interface,
    Library,
    Abstract,
}

/// Function-like definition (functions, constructors, fallback and receive)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Node>,
    #[serde(default)]
    pub return_parameters: Option<Vec<Node>>,
    #[serde(default)]
    pub body: Option<Box<Node>>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub modifiers: Vec<Node>,
    #[serde(default, rename = "override")]
    pub overrides: Option<Vec<Node>>,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default)]
    pub is_receive_ether: bool,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub state_mutability: Option<StateMutability>,
}

impl FunctionDefinition {
    /// Constructors, fallback and receive functions
    pub fn is_special(&self) -> bool {
        self.is_constructor || self.is_receive_ether || self.is_fallback
    }

    pub fn is_pure_or_view(&self) -> bool {
        matches!(
            self.state_mutability,
            Some(StateMutability::Pure | StateMutability::View | StateMutability::Constant)
        )
    }

    pub fn has_return_parameters(&self) -> bool {
        self.return_parameters
            .as_ref()
            .is_some_and(|params| !params.is_empty())
    }

    /// Parameter names in declaration order (unnamed parameters yield `None`)
    pub fn parameter_names(&self) -> Vec<Option<&str>> {
        self.parameters
            .iter()
            .map(|p| match &p.kind {
                NodeKind::VariableDeclaration { name, .. } => name.as_deref(),
                _ => None,
            })
            .collect()
    }
}

/// Kind-specific payload of a [`Node`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NodeKind {
    // Top level and definitions
    SourceUnit {
        children: Vec<Node>,
    },
    PragmaDirective {
        name: String,
        value: String,
    },
    ImportDirective {
        path: String,
    },
    ContractDefinition {
        name: String,
        #[serde(default)]
        kind: ContractKind,
        #[serde(default)]
        base_contracts: Vec<Node>,
        #[serde(default)]
        sub_nodes: Vec<Node>,
    },
    InheritanceSpecifier {
        base_name: String,
        #[serde(default)]
        arguments: Vec<Node>,
    },
    UsingForDeclaration {
        #[serde(default)]
        library_name: Option<String>,
        #[serde(default)]
        type_name: Option<Box<Node>>,
    },
    StructDefinition {
        name: String,
        #[serde(default)]
        members: Vec<Node>,
    },
    EventDefinition {
        name: String,
        #[serde(default)]
        parameters: Vec<Node>,
    },
    ModifierDefinition {
        name: String,
        #[serde(default)]
        parameters: Option<Vec<Node>>,
        #[serde(default)]
        body: Option<Box<Node>>,
    },
    FunctionDefinition(FunctionDefinition),
    ModifierInvocation {
        name: String,
        #[serde(default)]
        arguments: Option<Vec<Node>>,
    },
    StateVariableDeclaration {
        variables: Vec<Node>,
        #[serde(default)]
        initial_value: Option<Box<Node>>,
    },
    VariableDeclaration {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        type_name: Option<Box<Node>>,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        is_state_var: bool,
        #[serde(default)]
        storage_location: Option<String>,
    },

    // Type names
    ElementaryTypeName {
        name: String,
    },
    UserDefinedTypeName {
        name_path: String,
    },
    Mapping {
        key_type: Box<Node>,
        value_type: Box<Node>,
    },
    ArrayTypeName {
        base_type: Box<Node>,
        #[serde(default)]
        length: Option<Box<Node>>,
    },

    // Statements
    Block {
        statements: Vec<Node>,
    },
    UncheckedStatement {
        block: Box<Node>,
    },
    ExpressionStatement {
        #[serde(default)]
        expression: Option<Box<Node>>,
    },
    VariableDeclarationStatement {
        variables: Vec<Option<Node>>,
        #[serde(default)]
        initial_value: Option<Box<Node>>,
    },
    IfStatement {
        condition: Box<Node>,
        true_body: Box<Node>,
        #[serde(default)]
        false_body: Option<Box<Node>>,
    },
    ForStatement {
        #[serde(default)]
        init_expression: Option<Box<Node>>,
        #[serde(default)]
        condition_expression: Option<Box<Node>>,
        #[serde(default)]
        loop_expression: Option<Box<Node>>,
        body: Box<Node>,
    },
    WhileStatement {
        condition: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        condition: Box<Node>,
        body: Box<Node>,
    },
    ReturnStatement {
        #[serde(default)]
        expression: Option<Box<Node>>,
    },
    EmitStatement {
        event_call: Box<Node>,
    },
    RevertStatement {
        revert_call: Box<Node>,
    },
    TryStatement {
        expression: Box<Node>,
        #[serde(default)]
        return_parameters: Option<Vec<Node>>,
        body: Box<Node>,
        #[serde(default)]
        catch_clauses: Vec<Node>,
    },
    CatchClause {
        #[serde(default)]
        parameters: Option<Vec<Node>>,
        body: Box<Node>,
    },
    ThrowStatement,
    BreakStatement,
    ContinueStatement,

    // Expressions
    BinaryOperation {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOperation {
        operator: String,
        sub_expression: Box<Node>,
        #[serde(default)]
        is_prefix: bool,
    },
    FunctionCall {
        expression: Box<Node>,
        #[serde(default)]
        arguments: Vec<Node>,
        #[serde(default)]
        names: Vec<String>,
    },
    NameValueExpression {
        expression: Box<Node>,
        arguments: Box<Node>,
    },
    NameValueList {
        names: Vec<String>,
        arguments: Vec<Node>,
    },
    MemberAccess {
        expression: Box<Node>,
        member_name: String,
    },
    IndexAccess {
        base: Box<Node>,
        #[serde(default)]
        index: Option<Box<Node>>,
    },
    TupleExpression {
        components: Vec<Option<Node>>,
        #[serde(default)]
        is_array: bool,
    },
    Conditional {
        condition: Box<Node>,
        true_expression: Box<Node>,
        false_expression: Box<Node>,
    },
    NewExpression {
        type_name: Box<Node>,
    },
    Identifier {
        name: String,
    },
    NumberLiteral {
        number: String,
        #[serde(default)]
        subdenomination: Option<String>,
    },
    BooleanLiteral {
        value: bool,
    },
    StringLiteral {
        value: String,
    },
    HexLiteral {
        value: String,
    },

    /// Any node kind this model does not describe
    #[serde(other)]
    Other,
}

impl Node {
    pub fn new(span: Span, lines: LineRange, kind: NodeKind) -> Self {
        Self { span, lines, kind }
    }

    /// Direct children in document order
    pub fn children(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::SourceUnit { children } => out.extend(children),
            NodeKind::ContractDefinition {
                base_contracts,
                sub_nodes,
                ..
            } => {
                out.extend(base_contracts);
                out.extend(sub_nodes);
            }
            NodeKind::InheritanceSpecifier { arguments, .. } => out.extend(arguments),
            NodeKind::UsingForDeclaration { type_name, .. } => out.extend(type_name.as_deref()),
            NodeKind::StructDefinition { members, .. } => out.extend(members),
            NodeKind::EventDefinition { parameters, .. } => out.extend(parameters),
            NodeKind::ModifierDefinition {
                parameters, body, ..
            } => {
                out.extend(parameters.iter().flatten());
                out.extend(body.as_deref());
            }
            NodeKind::FunctionDefinition(func) => {
                out.extend(&func.parameters);
                out.extend(&func.modifiers);
                out.extend(func.return_parameters.iter().flatten());
                out.extend(func.body.as_deref());
            }
            NodeKind::ModifierInvocation { arguments, .. } => {
                out.extend(arguments.iter().flatten())
            }
            NodeKind::StateVariableDeclaration {
                variables,
                initial_value,
            } => {
                out.extend(variables);
                out.extend(initial_value.as_deref());
            }
            NodeKind::VariableDeclaration { type_name, .. } => out.extend(type_name.as_deref()),
            NodeKind::Mapping {
                key_type,
                value_type,
            } => {
                out.push(key_type);
                out.push(value_type);
            }
            NodeKind::ArrayTypeName { base_type, length } => {
                out.push(base_type);
                out.extend(length.as_deref());
            }
            NodeKind::Block { statements } => out.extend(statements),
            NodeKind::UncheckedStatement { block } => out.push(block),
            NodeKind::ExpressionStatement { expression } => out.extend(expression.as_deref()),
            NodeKind::VariableDeclarationStatement {
                variables,
                initial_value,
            } => {
                out.extend(variables.iter().flatten());
                out.extend(initial_value.as_deref());
            }
            NodeKind::IfStatement {
                condition,
                true_body,
                false_body,
            } => {
                out.push(condition);
                out.push(true_body);
                out.extend(false_body.as_deref());
            }
            NodeKind::ForStatement {
                init_expression,
                condition_expression,
                loop_expression,
                body,
            } => {
                out.extend(init_expression.as_deref());
                out.extend(condition_expression.as_deref());
                out.extend(loop_expression.as_deref());
                out.push(body);
            }
            NodeKind::WhileStatement { condition, body } => {
                out.push(condition);
                out.push(body);
            }
            NodeKind::DoWhileStatement { condition, body } => {
                out.push(body);
                out.push(condition);
            }
            NodeKind::ReturnStatement { expression } => out.extend(expression.as_deref()),
            NodeKind::EmitStatement { event_call } => out.push(event_call),
            NodeKind::RevertStatement { revert_call } => out.push(revert_call),
            NodeKind::TryStatement {
                expression,
                return_parameters,
                body,
                catch_clauses,
            } => {
                out.push(expression);
                out.extend(return_parameters.iter().flatten());
                out.push(body);
                out.extend(catch_clauses);
            }
            NodeKind::CatchClause { parameters, body } => {
                out.extend(parameters.iter().flatten());
                out.push(body);
            }
            NodeKind::BinaryOperation { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::UnaryOperation { sub_expression, .. } => out.push(sub_expression),
            NodeKind::FunctionCall {
                expression,
                arguments,
                ..
            } => {
                out.push(expression);
                out.extend(arguments);
            }
            NodeKind::NameValueExpression {
                expression,
                arguments,
            } => {
                out.push(expression);
                out.push(arguments);
            }
            NodeKind::NameValueList { arguments, .. } => out.extend(arguments),
            NodeKind::MemberAccess { expression, .. } => out.push(expression),
            NodeKind::IndexAccess { base, index } => {
                out.push(base);
                out.extend(index.as_deref());
            }
            NodeKind::TupleExpression { components, .. } => out.extend(components.iter().flatten()),
            NodeKind::Conditional {
                condition,
                true_expression,
                false_expression,
            } => {
                out.push(condition);
                out.push(true_expression);
                out.push(false_expression);
            }
            NodeKind::NewExpression { type_name } => out.push(type_name),
            NodeKind::PragmaDirective { .. }
            | NodeKind::ImportDirective { .. }
            | NodeKind::ElementaryTypeName { .. }
            | NodeKind::UserDefinedTypeName { .. }
            | NodeKind::ThrowStatement
            | NodeKind::BreakStatement
            | NodeKind::ContinueStatement
            | NodeKind::Identifier { .. }
            | NodeKind::NumberLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::HexLiteral { .. }
            | NodeKind::Other => {}
        }
        out
    }

    /// Name of an `Identifier` node
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name.as_str()),
            _ => None,
        }
    }

    /// `(receiver, member)` of a `MemberAccess` node
    pub fn member_access(&self) -> Option<(&Node, &str)> {
        match &self.kind {
            NodeKind::MemberAccess {
                expression,
                member_name,
            } => Some((expression.as_ref(), member_name.as_str())),
            _ => None,
        }
    }

    /// `(callee, arguments)` of a `FunctionCall` node
    pub fn call(&self) -> Option<(&Node, &[Node])> {
        match &self.kind {
            NodeKind::FunctionCall {
                expression,
                arguments,
                ..
            } => Some((expression.as_ref(), arguments.as_slice())),
            _ => None,
        }
    }

    /// Name of the function called when the callee is a bare identifier
    pub fn called_name(&self) -> Option<&str> {
        self.call().and_then(|(callee, _)| callee.identifier())
    }

    pub fn as_function(&self) -> Option<&FunctionDefinition> {
        match &self.kind {
            NodeKind::FunctionDefinition(func) => Some(func),
            _ => None,
        }
    }

    /// Name of a contract-like definition (contract, interface, library, struct)
    pub fn scope_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::ContractDefinition { name, .. } | NodeKind::StructDefinition { name, .. } => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    /// Statements of a `Block` (or of the block wrapped by `unchecked`)
    pub fn statements(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Block { statements } => Some(statements.as_slice()),
            NodeKind::UncheckedStatement { block } => block.statements(),
            _ => None,
        }
    }
}
