//! Low-level call rules (ETR, US, GB, UR)

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Node, NodeKind, Span};
use crate::declarations::DeclarationIndex;
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::patterns::is_guard_call;
use crate::source::SourceUnit;
use crate::visit::{find, Descent};

/// Gas stipend the gas bomb forces onto low-level calls
const GAS_BOMB: &str = "10000";

/// `(receiver, member, options)` of a call target such as `to.call` or
/// `to.call{value: v}`
fn call_target(callee: &Node) -> Option<(&Node, &str, Option<&Node>)> {
    match &callee.kind {
        NodeKind::NameValueExpression {
            expression,
            arguments,
        } => {
            let (receiver, member) = expression.member_access()?;
            Some((receiver, member, Some(arguments.as_ref())))
        }
        _ => {
            let (receiver, member) = callee.member_access()?;
            Some((receiver, member, None))
        }
    }
}

/// `(names, values)` of a `{name: value, ...}` option list
fn options(list: &Node) -> Option<(&[String], &[Node])> {
    match &list.kind {
        NodeKind::NameValueList { names, arguments } if names.len() == arguments.len() => {
            Some((names.as_slice(), arguments.as_slice()))
        }
        _ => None,
    }
}

fn joined_texts(unit: &SourceUnit, nodes: &[Node]) -> Option<String> {
    let texts = nodes
        .iter()
        .map(|n| unit.text_of(n))
        .collect::<Option<Vec<_>>>()?;
    Some(texts.join(", "))
}

/// Swaps ether transfer primitives for one another
pub struct EtherTransferReplacement;

impl EtherTransferReplacement {
    fn alternatives(member: &str) -> &'static [&'static str] {
        match member {
            "call" => &["delegatecall", "staticcall"],
            "delegatecall" => &["call", "staticcall"],
            "staticcall" => &["call", "delegatecall"],
            "send" => &["transfer"],
            "transfer" => &["send"],
            _ => &[],
        }
    }
}

impl Operator for EtherTransferReplacement {
    fn id(&self) -> &'static str {
        "ETR"
    }

    fn name(&self) -> &'static str {
        "ether-transfer-function-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let Some((callee, arguments)) = node.call() else {
                return;
            };
            let Some((receiver, member, options_list)) = call_target(callee) else {
                return;
            };
            let Some(receiver_text) = unit.text_of(receiver) else {
                return;
            };
            let alternatives = Self::alternatives(member);

            match (member, options_list) {
                ("send" | "transfer", None) => {
                    let [amount] = arguments else {
                        return;
                    };
                    for alternative in alternatives {
                        out.replace_node(callee, format!("{receiver_text}.{alternative}"));
                    }
                    if let Some(amount) = unit.text_of(amount) {
                        out.replace_node(node, format!("{receiver_text}.call{{value: {amount}}}(\"\")"));
                    }
                }
                ("call", Some(list)) => {
                    // value cannot be forwarded by delegatecall or staticcall; gas can
                    let Some((names, values)) = options(list) else {
                        return;
                    };
                    let gas = names
                        .iter()
                        .position(|name| name == "gas")
                        .and_then(|i| unit.text_of(&values[i]));
                    let Some(args) = joined_texts(unit, arguments) else {
                        return;
                    };
                    for alternative in alternatives {
                        let replacement = match gas {
                            Some(gas) => format!("{receiver_text}.{alternative}{{gas: {gas}}}({args})"),
                            None => format!("{receiver_text}.{alternative}({args})"),
                        };
                        out.replace_node(node, replacement);
                    }
                }
                ("call" | "delegatecall" | "staticcall", _) => {
                    let target = match &callee.kind {
                        NodeKind::NameValueExpression { expression, .. } => expression.as_ref(),
                        _ => callee,
                    };
                    for alternative in alternatives {
                        out.replace_node(target, format!("{receiver_text}.{alternative}"));
                    }
                }
                _ => {}
            }
        });
        out.finish()
    }
}

fn is_send_call(node: &Node) -> bool {
    node.call()
        .and_then(|(callee, _)| callee.member_access())
        .is_some_and(|(_, member)| member == "send")
}

/// Statements that abort on a failed send
fn is_abort(stmt: &Node) -> bool {
    match &stmt.kind {
        NodeKind::ThrowStatement | NodeKind::RevertStatement { .. } => true,
        NodeKind::ExpressionStatement {
            expression: Some(expr),
        } => expr.called_name() == Some("revert"),
        _ => false,
    }
}

/// Drops the check on a `send` result
pub struct UncheckedSend;

impl Operator for UncheckedSend {
    fn id(&self) -> &'static str {
        "US"
    }

    fn name(&self) -> &'static str {
        "unchecked-send"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| match &node.kind {
            NodeKind::ExpressionStatement {
                expression: Some(expr),
            } if is_guard_call(expr) => {
                let Some(send) = expr
                    .call()
                    .and_then(|(_, arguments)| arguments.first())
                    .and_then(|condition| find(condition, Descent::Operands, &is_send_call))
                else {
                    return;
                };
                if let Some(send) = unit.text_of(send) {
                    out.replace_node(node, format!("{send};"));
                }
            }
            NodeKind::IfStatement {
                condition,
                true_body,
                ..
            } => {
                let send = match &condition.kind {
                    NodeKind::UnaryOperation {
                        operator,
                        sub_expression,
                        ..
                    } if operator == "!" => sub_expression.as_ref(),
                    _ => condition.as_ref(),
                };
                if !is_send_call(send) {
                    return;
                }
                // any else branch is dropped
                let kept: Vec<&Node> = match true_body.statements() {
                    Some(statements) => statements.iter().collect(),
                    None => vec![true_body.as_ref()],
                };
                let mut parts = Vec::new();
                match unit.text_of(send) {
                    Some(text) => parts.push(format!("{text};")),
                    None => return,
                }
                for stmt in kept.into_iter().filter(|s| !is_abort(s)) {
                    match unit.text_of(stmt) {
                        Some(text) => parts.push(text.to_string()),
                        None => return,
                    }
                }
                out.replace_node(node, parts.join(" "));
            }
            _ => {}
        });
        out.finish()
    }
}

/// Caps the gas forwarded by low-level calls
pub struct GasBomb;

impl GasBomb {
    /// `{name: value, ...}` with the gas option forced to the bomb value
    fn with_gas(unit: &SourceUnit, list: &Node) -> Option<String> {
        let (names, values) = options(list)?;
        let mut entries = Vec::with_capacity(names.len() + 1);
        for (name, value) in names.iter().zip(values) {
            if name == "gas" {
                entries.push(format!("gas: {GAS_BOMB}"));
            } else {
                entries.push(format!("{name}: {}", unit.text_of(value)?));
            }
        }
        if !names.iter().any(|name| name == "gas") {
            entries.push(format!("gas: {GAS_BOMB}"));
        }
        Some(format!("{{{}}}", entries.join(", ")))
    }
}

impl Operator for GasBomb {
    fn id(&self) -> &'static str {
        "GB"
    }

    fn name(&self) -> &'static str {
        "gas-bomb"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let Some((callee, arguments)) = node.call() else {
                return;
            };
            if let NodeKind::NameValueExpression {
                expression,
                arguments: list,
            } = &callee.kind
            {
                if expression.member_access().is_some_and(|(_, m)| m == "call") {
                    if let Some(list_text) = Self::with_gas(unit, list) {
                        out.replace_node(list, list_text);
                    }
                }
                return;
            }

            let Some((receiver, member)) = callee.member_access() else {
                return;
            };
            let legacy_call = receiver.member_access().is_some_and(|(_, m)| m == "call");
            match member {
                "call" => {
                    out.insert(callee.span.end, format!("{{gas: {GAS_BOMB}}}"));
                }
                // `to.call.gas(n)`
                "gas" if legacy_call => {
                    if let [amount] = arguments {
                        out.replace_node(amount, GAS_BOMB);
                    }
                }
                // `to.call.value(v)`
                "value" if legacy_call => {
                    out.insert(receiver.span.end, format!(".gas({GAS_BOMB})"));
                }
                _ => {}
            }
        });
        out.finish()
    }
}

static SIZED_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(u?int\d*|bytes\d+)$").expect("valid sized type pattern"));

/// Zero value a local of the given declared type can be reset to
fn default_value(type_text: &str) -> Option<String> {
    match type_text {
        t if SIZED_TYPE.is_match(t) && t.starts_with("bytes") => Some(format!("{t}(0)")),
        t if SIZED_TYPE.is_match(t) => Some("0".to_string()),
        "bytes" => Some("new bytes(0)".to_string()),
        "bool" => Some("false".to_string()),
        "string" => Some("\"\"".to_string()),
        "address" | "address payable" => Some("address(0)".to_string()),
        _ => None,
    }
}

/// Discards the value returned by a call: `x = f()` becomes `x = 0; f()`
pub struct UnusedReturn;

impl Operator for UnusedReturn {
    fn id(&self) -> &'static str {
        "UR"
    }

    fn name(&self) -> &'static str {
        "unused-return"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        let declarations = DeclarationIndex::build(unit);

        unit.visit(&mut |node| {
            let NodeKind::ExpressionStatement {
                expression: Some(expr),
            } = &node.kind
            else {
                return;
            };
            let NodeKind::BinaryOperation {
                operator,
                left,
                right,
            } = &expr.kind
            else {
                return;
            };
            if operator != "=" || right.call().is_none() {
                return;
            }

            let targets: Vec<&Node> = match &left.kind {
                NodeKind::Identifier { .. } => vec![left.as_ref()],
                NodeKind::TupleExpression { components, .. } => components.iter().flatten().collect(),
                _ => return,
            };
            let mut resets = Vec::with_capacity(targets.len());
            // member and index targets keep whatever the call wrote to them
            for name in targets.into_iter().filter_map(Node::identifier) {
                let Some(value) = declarations
                    .type_of(name, node.lines.start)
                    .and_then(default_value)
                else {
                    log::trace!("UR: no default for '{}' on line {}", name, node.lines.start);
                    return;
                };
                resets.push(format!("{name} = {value};"));
            }
            if let (false, Some(call)) = (resets.is_empty(), unit.text_of(right)) {
                out.replace_node(expr, format!("{} {call}", resets.join(" ")));
            }
        });
        out.finish()
    }
}
