//! Builtin and literal rules (MCR, ECS, HLR, VUR, GVR)

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Node, NodeKind};
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::patterns::last_word_span;
use crate::source::SourceUnit;

/// Swaps math and hashing builtins for their siblings
pub struct MathCryptoReplacement;

impl MathCryptoReplacement {
    fn alternative(name: &str) -> Option<&'static str> {
        match name {
            "addmod" => Some("mulmod"),
            "mulmod" => Some("addmod"),
            "keccak256" => Some("sha256"),
            "sha256" => Some("keccak256"),
            "ripemd160" => Some("sha256"),
            _ => None,
        }
    }
}

impl Operator for MathCryptoReplacement {
    fn id(&self) -> &'static str {
        "MCR"
    }

    fn name(&self) -> &'static str {
        "math-and-crypto-function-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let Some((callee, _)) = node.call() else {
                return;
            };
            if let Some(replacement) = callee.identifier().and_then(Self::alternative) {
                out.replace_node(callee, replacement);
            }
        });
        out.finish()
    }
}

/// Narrows explicit conversions to the smallest type of their family
pub struct ExplicitConversionSmaller;

/// Sized type families and the narrowest member of each
static FAMILIES: LazyLock<[(Regex, &'static str); 3]> = LazyLock::new(|| {
    [
        (r"^uint\d*$", "uint8"),
        (r"^int\d*$", "int8"),
        (r"^bytes\d+$", "bytes1"),
    ]
    .map(|(pattern, narrowest)| (Regex::new(pattern).expect("valid type family pattern"), narrowest))
});

impl ExplicitConversionSmaller {
    fn narrowest(type_name: &str) -> Option<&'static str> {
        FAMILIES.iter().find_map(|(family, narrowest)| {
            (family.is_match(type_name) && type_name != *narrowest).then_some(*narrowest)
        })
    }
}

impl Operator for ExplicitConversionSmaller {
    fn id(&self) -> &'static str {
        "ECS"
    }

    fn name(&self) -> &'static str {
        "explicit-conversion-to-smaller-type"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let Some((callee, _)) = node.call() else {
                return;
            };
            if let NodeKind::ElementaryTypeName { name } = &callee.kind {
                if let Some(narrowest) = Self::narrowest(name) {
                    out.replace_node(callee, narrowest);
                }
            }
        });
        out.finish()
    }
}

/// Moves hex literals one up and one down
pub struct HexLiteralReplacement;

impl HexLiteralReplacement {
    fn to_hex(value: u128) -> String {
        let digits = format!("{value:x}");
        if digits.len() % 2 == 0 {
            digits
        } else {
            format!("0{digits}")
        }
    }

    fn neighbours(value: &str) -> Vec<String> {
        let Ok(parsed) = u128::from_str_radix(value, 16) else {
            return Vec::new();
        };
        [parsed.checked_add(1), parsed.checked_sub(1)]
            .into_iter()
            .flatten()
            .map(Self::to_hex)
            .collect()
    }
}

impl Operator for HexLiteralReplacement {
    fn id(&self) -> &'static str {
        "HLR"
    }

    fn name(&self) -> &'static str {
        "hexadecimal-literal-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let NodeKind::HexLiteral { value } = &node.kind else {
                return;
            };
            let Some(text) = unit.text_of(node) else {
                return;
            };
            if value.is_empty() || !text.contains(value.as_str()) {
                return;
            }
            for neighbour in Self::neighbours(value) {
                out.replace_node(node, text.replacen(value.as_str(), &neighbour, 1));
            }
        });
        out.finish()
    }
}

/// Swaps ether and time sub-denominations
pub struct UnitReplacement;

impl UnitReplacement {
    const TIME_UNITS: [&'static str; 5] = ["seconds", "minutes", "hours", "days", "weeks"];

    fn alternatives(unit: &str) -> Vec<&'static str> {
        match unit {
            "wei" => vec!["ether"],
            "gwei" | "finney" | "szabo" | "ether" => vec!["wei"],
            "years" => Self::TIME_UNITS.to_vec(),
            time if Self::TIME_UNITS.contains(&time) => Self::TIME_UNITS
                .into_iter()
                .filter(|other| *other != time)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Operator for UnitReplacement {
    fn id(&self) -> &'static str {
        "VUR"
    }

    fn name(&self) -> &'static str {
        "variable-unit-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let NodeKind::NumberLiteral {
                subdenomination: Some(denomination),
                ..
            } = &node.kind
            else {
                return;
            };
            let Some(span) = last_word_span(unit, node.span, denomination) else {
                return;
            };
            for alternative in Self::alternatives(denomination) {
                out.replace(span, alternative);
            }
        });
        out.finish()
    }
}

/// Swaps block and transaction globals for other environment values
pub struct GlobalVariableReplacement;

impl GlobalVariableReplacement {
    fn member_alternatives(object: &str, member: &str) -> &'static [&'static str] {
        match (object, member) {
            ("msg", "value") => &["tx.gasprice"],
            ("block", "difficulty") => &["block.number", "block.timestamp"],
            ("block", "number") => &["block.difficulty", "block.timestamp"],
            ("block", "timestamp") => &["block.difficulty", "block.number"],
            ("block", "coinbase") => &["tx.origin", "msg.sender"],
            ("block", "gaslimit") => &["tx.gasprice", "gasleft()"],
            ("tx", "gasprice") => &["gasleft()", "block.gaslimit"],
            _ => &[],
        }
    }

    fn call_alternatives(name: &str) -> &'static [&'static str] {
        match name {
            "gasleft" => &["tx.gasprice", "block.gaslimit"],
            "blockhash" => &["msg.sig"],
            _ => &[],
        }
    }

    fn alternatives(node: &Node) -> &'static [&'static str] {
        if let Some((object, member)) = node.member_access() {
            return object
                .identifier()
                .map(|object| Self::member_alternatives(object, member))
                .unwrap_or_default();
        }
        if let Some((callee, _)) = node.call() {
            return callee
                .identifier()
                .map(Self::call_alternatives)
                .unwrap_or_default();
        }
        match node.identifier() {
            Some("now") => &["block.difficulty", "block.number"],
            _ => &[],
        }
    }
}

impl Operator for GlobalVariableReplacement {
    fn id(&self) -> &'static str {
        "GVR"
    }

    fn name(&self) -> &'static str {
        "global-variable-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            for replacement in Self::alternatives(node) {
                out.replace_node(node, *replacement);
            }
        });
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testing::{edits, mutants, pairs};
    use crate::test_support::TreeBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_math_and_hash_builtins_are_swapped() {
        let src = "bytes32 h = keccak256(data); uint m = addmod(a, b, n);";
        let b = TreeBuilder::new(src);
        let hash = b.call("keccak256(data)", b.ident("keccak256"), vec![b.ident("data")]);
        let modulo = b.call(
            "addmod(a, b, n)",
            b.ident("addmod"),
            vec![b.ident("a"), b.ident("b"), b.ident("n")],
        );
        let unit = b.unit(vec![
            b.expr_stmt("keccak256(data);", hash),
            b.expr_stmt("addmod(a, b, n);", modulo),
        ]);

        assert_eq!(
            edits(&MathCryptoReplacement, &unit),
            pairs(&[("keccak256", "sha256"), ("addmod", "mulmod")])
        );
    }

    #[test]
    fn test_conversions_narrow_to_smallest_type() {
        let src = "x = uint128(y); z = bytes4(w); v = uint8(u); s = bytes(t);";
        let b = TreeBuilder::new(src);
        let conversion = |at: &str, ty: &str, arg: &str| {
            b.expr_stmt(at, b.call(at.trim_end_matches(';'), b.elementary(ty), vec![b.ident(arg)]))
        };
        let unit = b.unit(vec![
            conversion("uint128(y);", "uint128", "y"),
            conversion("bytes4(w);", "bytes4", "w"),
            conversion("uint8(u);", "uint8", "u"),
            conversion("bytes(t);", "bytes", "t"),
        ]);

        assert_eq!(
            edits(&ExplicitConversionSmaller, &unit),
            pairs(&[("uint128", "uint8"), ("bytes4", "bytes1")])
        );
    }

    #[test]
    fn test_hex_literal_moves_by_one() {
        let src = "bytes2 a = hex\"00ff\"; bytes1 b = hex\"00\";";
        let b = TreeBuilder::new(src);
        let literal = |at: &str, value: &str| {
            b.node(
                at,
                NodeKind::HexLiteral {
                    value: value.to_string(),
                },
            )
        };
        let unit = b.unit(vec![
            b.expr_stmt("hex\"00ff\";", literal("hex\"00ff\"", "00ff")),
            b.expr_stmt("hex\"00\";", literal("hex\"00\"", "00")),
        ]);

        assert_eq!(
            edits(&HexLiteralReplacement, &unit),
            pairs(&[
                ("hex\"00ff\"", "hex\"0100\""),
                ("hex\"00ff\"", "hex\"fe\""),
                ("hex\"00\"", "hex\"01\""),
            ])
        );
    }

    #[test]
    fn test_units_are_replaced() {
        let src = "uint fee = 1 ether; uint delay = 2 days;";
        let b = TreeBuilder::new(src);
        let literal = |at: &str, number: &str, unit: &str| {
            b.node(
                at,
                NodeKind::NumberLiteral {
                    number: number.to_string(),
                    subdenomination: Some(unit.to_string()),
                },
            )
        };
        let unit = b.unit(vec![
            b.expr_stmt("1 ether;", literal("1 ether", "1", "ether")),
            b.expr_stmt("2 days;", literal("2 days", "2", "days")),
        ]);

        assert_eq!(
            edits(&UnitReplacement, &unit),
            pairs(&[
                ("ether", "wei"),
                ("days", "seconds"),
                ("days", "minutes"),
                ("days", "hours"),
                ("days", "weeks"),
            ])
        );
        assert_eq!(
            mutants(&UnitReplacement, &unit)[0],
            "uint fee = 1 wei; uint delay = 2 days;"
        );
    }

    #[test]
    fn test_globals_are_replaced() {
        let src = "if (block.timestamp > now) { pay(msg.value, gasleft()); }";
        let b = TreeBuilder::new(src);
        let timestamp = b.member("block.timestamp", b.ident("block"), "timestamp");
        let value = b.member("msg.value", b.ident("msg"), "value");
        let gas = b.call("gasleft()", b.ident("gasleft"), vec![]);
        let pay = b.call("pay(msg.value, gasleft())", b.ident("pay"), vec![value, gas]);
        let unit = b.unit(vec![b.if_stmt(
            src,
            b.binary("block.timestamp > now", ">", timestamp, b.ident("now")),
            b.block(
                "{ pay(msg.value, gasleft()); }",
                vec![b.expr_stmt("pay(msg.value, gasleft());", pay)],
            ),
            None,
        )]);

        assert_eq!(
            edits(&GlobalVariableReplacement, &unit),
            pairs(&[
                ("block.timestamp", "block.difficulty"),
                ("block.timestamp", "block.number"),
                ("now", "block.difficulty"),
                ("now", "block.number"),
                ("msg.value", "tx.gasprice"),
                ("gasleft()", "tx.gasprice"),
                ("gasleft()", "block.gaslimit"),
            ])
        );
    }

    #[test]
    fn test_unrelated_members_are_left_alone() {
        let src = "token.value;";
        let b = TreeBuilder::new(src);
        let unit = b.unit(vec![b.expr_stmt(
            src,
            b.member("token.value", b.ident("token"), "value"),
        )]);
        assert!(GlobalVariableReplacement.generate(&unit).is_empty());
    }
}
