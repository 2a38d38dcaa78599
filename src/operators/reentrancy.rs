//! Reentrancy rules (ROS, RE)
//!
//! Both move an external call ahead of the state update that should follow
//! it, recreating the classic reentrancy ordering.

use crate::ast::{FunctionDefinition, Node, NodeKind, Span, StateMutability};
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::patterns::{is_guard, statement_invokes_external_call};
use crate::source::SourceUnit;

/// Statement classes, in the order a reordered block emits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Declaration,
    Guard,
    ExternalCall,
    StateChange,
    Trailing,
}

impl Bucket {
    fn of(stmt: &Node) -> Self {
        match &stmt.kind {
            NodeKind::ReturnStatement { .. } => Bucket::Trailing,
            NodeKind::EmitStatement { .. } => Bucket::StateChange,
            NodeKind::VariableDeclarationStatement { .. } => {
                if statement_invokes_external_call(stmt) {
                    Bucket::ExternalCall
                } else {
                    Bucket::Declaration
                }
            }
            _ if statement_invokes_external_call(stmt) => Bucket::ExternalCall,
            _ if is_guard(stmt) => Bucket::Guard,
            _ => Bucket::StateChange,
        }
    }
}

/// Blocks of every function body `accept` lets through
fn function_blocks<'a>(
    unit: &'a SourceUnit,
    accept: impl Fn(&FunctionDefinition) -> bool,
) -> Vec<&'a Node> {
    let mut blocks = Vec::new();
    for function in unit.root().functions() {
        let Some(def) = function.as_function() else {
            continue;
        };
        if !accept(def) {
            continue;
        }
        if let Some(body) = def.body.as_deref() {
            blocks.extend(body.collect(|n| matches!(n.kind, NodeKind::Block { .. })));
        }
    }
    blocks
}

/// Regroups a block so external calls precede state changes
pub struct ReentrancyOrderSwap;

impl ReentrancyOrderSwap {
    fn reorder(out: &mut Emitter<'_>, block: &Node) {
        let Some(statements) = block.statements() else {
            return;
        };
        let (Some(first), Some(last)) = (statements.first(), statements.last()) else {
            return;
        };

        let mut ordered: Vec<(Bucket, &Node)> = statements.iter().map(|s| (Bucket::of(s), s)).collect();
        let has = |bucket: Bucket| ordered.iter().any(|(b, _)| *b == bucket);
        if !(has(Bucket::StateChange) && has(Bucket::ExternalCall)) {
            return;
        }
        ordered.sort_by_key(|(bucket, _)| *bucket);

        let unit = out.unit();
        let Some(texts) = ordered
            .iter()
            .map(|(_, stmt)| unit.text_of(stmt))
            .collect::<Option<Vec<_>>>()
        else {
            return;
        };
        out.replace(Span::new(first.span.start, last.span.end), texts.join("\n"));
    }
}

impl Operator for ReentrancyOrderSwap {
    fn id(&self) -> &'static str {
        "ROS"
    }

    fn name(&self) -> &'static str {
        "reentrancy-order-swap"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        let blocks = function_blocks(unit, |def| {
            !def.is_constructor && def.state_mutability != Some(StateMutability::Pure)
        });
        for block in blocks {
            Self::reorder(&mut out, block);
        }
        out.finish()
    }
}

/// Assignment operators that can zero or reduce a balance
const UPDATE_OPERATORS: &[&str] = &["=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>="];

fn elementary_name(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::ElementaryTypeName { name } => Some(name.as_str()),
        _ => None,
    }
}

/// State mappings from addresses to balances or flags
fn balance_mappings(unit: &SourceUnit) -> Vec<&str> {
    let mut names = Vec::new();
    for state in unit.collect(|n| matches!(n.kind, NodeKind::StateVariableDeclaration { .. })) {
        let NodeKind::StateVariableDeclaration { variables, .. } = &state.kind else {
            continue;
        };
        for variable in variables {
            let NodeKind::VariableDeclaration {
                name: Some(name),
                type_name: Some(ty),
                ..
            } = &variable.kind
            else {
                continue;
            };
            let NodeKind::Mapping {
                key_type,
                value_type,
            } = &ty.kind
            else {
                continue;
            };
            let by_address = elementary_name(key_type) == Some("address");
            let balance = elementary_name(value_type).is_some_and(|v| v.contains("uint") || v.contains("bool"));
            if by_address && balance {
                names.push(name.as_str());
            }
        }
    }
    names
}

/// `balances[msg.sender] = ...` that does not credit the sender
fn is_balance_update(stmt: &Node, mappings: &[&str]) -> bool {
    let NodeKind::ExpressionStatement {
        expression: Some(expr),
    } = &stmt.kind
    else {
        return false;
    };
    let NodeKind::BinaryOperation {
        operator,
        left,
        right,
    } = &expr.kind
    else {
        return false;
    };
    if !UPDATE_OPERATORS.contains(&operator.as_str())
        || matches!(&right.kind, NodeKind::BinaryOperation { operator, .. } if operator == "+")
    {
        return false;
    }
    let NodeKind::IndexAccess {
        base,
        index: Some(index),
    } = &left.kind
    else {
        return false;
    };
    let by_sender = index
        .member_access()
        .is_some_and(|(receiver, member)| member == "sender" && receiver.identifier() == Some("msg"));
    by_sender && base.identifier().is_some_and(|name| mappings.contains(&name))
}

/// Moves the first external call after a sender balance update in front of it
pub struct Reentrancy;

impl Operator for Reentrancy {
    fn id(&self) -> &'static str {
        "RE"
    }

    fn name(&self) -> &'static str {
        "reentrancy"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        let mappings = balance_mappings(unit);
        if mappings.is_empty() {
            return out.finish();
        }

        for block in function_blocks(unit, |_| true) {
            let Some(statements) = block.statements() else {
                continue;
            };
            let Some(update) = statements.iter().position(|s| is_balance_update(s, &mappings)) else {
                continue;
            };
            let Some(call) = statements[update + 1..]
                .iter()
                .find(|s| statement_invokes_external_call(s))
            else {
                continue;
            };
            let update = &statements[update];

            let texts = (
                unit.text_of(update),
                unit.text(Span::new(update.span.end, call.span.start)),
                unit.text_of(call),
            );
            if let (Some(update_text), Some(between), Some(call_text)) = texts {
                out.replace(
                    Span::new(update.span.start, call.span.end),
                    format!("{call_text}{between}{update_text}"),
                );
            }
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Visibility;
    use crate::operators::testing::{edits, pairs};
    use crate::test_support::TreeBuilder;
    use pretty_assertions::assert_eq;

    fn body_span(src: &str) -> Span {
        Span::new(src.find('{').unwrap(), src.len())
    }

    const WITHDRAW: &str = "function withdraw(uint amt) public {\n    \
                            balances[msg.sender] += amt;\n    \
                            (bool ok,) = msg.sender.call{value:amt}(\"\");\n}";

    fn withdraw(def: FunctionDefinition) -> SourceUnit {
        let src = WITHDRAW;
        let b = TreeBuilder::new(src);
        let sender = |i: usize| b.member(("msg.sender", i), b.ident(("msg", i)), "sender");

        let credit = b.expr_stmt(
            "balances[msg.sender] += amt;",
            b.binary(
                "balances[msg.sender] += amt",
                "+=",
                b.index("balances[msg.sender]", b.ident("balances"), sender(0)),
                b.ident(("amt", 1)),
            ),
        );
        let callee = b.with_options(
            "msg.sender.call{value:amt}",
            b.member("msg.sender.call", sender(1), "call"),
            "{value:amt}",
            vec![("value", b.ident(("amt", 2)))],
        );
        let call = b.call(
            "msg.sender.call{value:amt}(\"\")",
            callee,
            vec![b.string("\"\"", "")],
        );
        let send = b.var_stmt(
            "(bool ok,) = msg.sender.call{value:amt}(\"\");",
            vec![Some(b.var_decl("bool ok", "ok", b.elementary("bool"))), None],
            Some(call),
        );

        let def = FunctionDefinition {
            name: Some("withdraw".to_string()),
            parameters: vec![b.var_decl("uint amt", "amt", b.elementary("uint"))],
            visibility: Visibility::Public,
            body: Some(Box::new(b.block(body_span(src), vec![credit, send]))),
            ..def
        };
        b.unit(vec![b.function(src, def)])
    }

    #[test]
    fn test_call_is_moved_before_balance_update() {
        let unit = withdraw(FunctionDefinition::default());
        assert_eq!(
            edits(&ReentrancyOrderSwap, &unit),
            pairs(&[(
                "balances[msg.sender] += amt;\n    (bool ok,) = msg.sender.call{value:amt}(\"\");",
                "(bool ok,) = msg.sender.call{value:amt}(\"\");\nbalances[msg.sender] += amt;"
            )])
        );
    }

    #[test]
    fn test_constructors_and_pure_functions_are_left_alone() {
        let constructor = withdraw(FunctionDefinition {
            is_constructor: true,
            ..Default::default()
        });
        assert!(ReentrancyOrderSwap.generate(&constructor).is_empty());

        let pure = withdraw(FunctionDefinition {
            state_mutability: Some(StateMutability::Pure),
            ..Default::default()
        });
        assert!(ReentrancyOrderSwap.generate(&pure).is_empty());
    }

    #[test]
    fn test_credit_is_not_a_balance_update() {
        // `+=` credits the sender, and the file declares no balance mapping anyway
        assert!(Reentrancy.generate(&withdraw(FunctionDefinition::default())).is_empty());
    }

    const DRAIN: &str = "mapping(address => uint) balances;\n\
                         function drain() public {\n    \
                         uint amount = balances[msg.sender];\n    \
                         balances[msg.sender] = 0;\n    \
                         msg.sender.transfer(amount);\n}";

    fn drain() -> SourceUnit {
        let src = DRAIN;
        let b = TreeBuilder::new(src);
        let sender = |i: usize| b.member(("msg.sender", i), b.ident(("msg", i)), "sender");

        let mapping = b.node(
            "mapping(address => uint)",
            NodeKind::Mapping {
                key_type: Box::new(b.elementary("address")),
                value_type: Box::new(b.elementary(("uint", 0))),
            },
        );
        let balances = b.node(
            "mapping(address => uint) balances;",
            NodeKind::StateVariableDeclaration {
                variables: vec![b.node(
                    "mapping(address => uint) balances",
                    NodeKind::VariableDeclaration {
                        name: Some("balances".to_string()),
                        type_name: Some(Box::new(mapping)),
                        visibility: Visibility::Default,
                        is_state_var: true,
                        storage_location: None,
                    },
                )],
                initial_value: None,
            },
        );

        let read = b.var_stmt(
            "uint amount = balances[msg.sender];",
            vec![Some(b.var_decl("uint amount", "amount", b.elementary(("uint", 1))))],
            Some(b.index(("balances[msg.sender]", 0), b.ident(("balances", 1)), sender(0))),
        );
        let reset = b.expr_stmt(
            "balances[msg.sender] = 0;",
            b.binary(
                "balances[msg.sender] = 0",
                "=",
                b.index(("balances[msg.sender]", 1), b.ident(("balances", 2)), sender(1)),
                b.number("0"),
            ),
        );
        let pay = b.expr_stmt(
            "msg.sender.transfer(amount);",
            b.call(
                "msg.sender.transfer(amount)",
                b.member("msg.sender.transfer", sender(2), "transfer"),
                vec![b.ident(("amount", 1))],
            ),
        );

        let body = b.block(body_span(src), vec![read, reset, pay]);
        let function = b.function(
            Span::new(src.find("function").unwrap(), src.len()),
            FunctionDefinition {
                name: Some("drain".to_string()),
                visibility: Visibility::Public,
                body: Some(Box::new(body)),
                ..Default::default()
            },
        );
        b.unit(vec![balances, function])
    }

    #[test]
    fn test_reentrancy_swaps_update_and_call() {
        let unit = drain();
        assert_eq!(
            edits(&Reentrancy, &unit),
            pairs(&[(
                "balances[msg.sender] = 0;\n    msg.sender.transfer(amount);",
                "msg.sender.transfer(amount);\n    balances[msg.sender] = 0;"
            )])
        );
    }

    #[test]
    fn test_buckets_keep_declarations_first() {
        let unit = drain();
        assert_eq!(
            edits(&ReentrancyOrderSwap, &unit),
            pairs(&[(
                "uint amount = balances[msg.sender];\n    \
                 balances[msg.sender] = 0;\n    \
                 msg.sender.transfer(amount);",
                "uint amount = balances[msg.sender];\n\
                 msg.sender.transfer(amount);\n\
                 balances[msg.sender] = 0;"
            )])
        );
    }
}
