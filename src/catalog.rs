//! Operator catalog and the generation pass
//!
//! The catalog runs its operators in a fixed order over one [`SourceUnit`],
//! concatenates what they emit and drops repeated mutations. The same unit and
//! catalog always give the same list in the same order.

use std::time::{Duration, Instant};

use crate::config::GeneratorConfig;
use crate::error::{MutationError, Result};
use crate::mutation::{self, Mutation};
use crate::operators::*;
use crate::source::SourceUnit;

/// Per-operator statistics of one generation pass
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTiming {
    pub id: &'static str,
    /// Mutations the operator emitted, before deduplication
    pub count: usize,
    pub elapsed: Duration,
}

/// Ordered set of operators
pub struct Catalog {
    operators: Vec<Box<dyn Operator>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// A catalog with no operators
    pub fn empty() -> Self {
        Self {
            operators: Vec::new(),
        }
    }

    /// Every built-in operator, pattern-class rules first
    pub fn standard() -> Self {
        let operators: Vec<Box<dyn Operator>> = vec![
            Box::new(IntegerOverflow),
            Box::new(ReentrancyOrderSwap),
            Box::new(Reentrancy),
            Box::new(ModifierInsertion),
            Box::new(ModifierReplacement),
            Box::new(EtherTransferReplacement),
            Box::new(AssignmentReplacement),
            Box::new(IncrementsMirror),
            Box::new(UnaryReplacement),
            Box::new(BreakContinueReplacement),
            Box::new(LoopConditionChange),
            Box::new(CatchBlockDeletion),
            Box::new(ExceptionHandlingChange),
            Box::new(AssertViolation),
            Box::new(MathCryptoReplacement),
            Box::new(ExplicitConversionSmaller),
            Box::new(ModifierOrderChange),
            Box::new(ModifierDeletion),
            Box::new(PayableDeletion),
            Box::new(FunctionVisibility),
            Box::new(VariableVisibility),
            Box::new(SafeMathReplacement),
            Box::new(HexLiteralReplacement),
            Box::new(UnitReplacement),
            Box::new(GlobalVariableReplacement),
            Box::new(SuperKeywordDeletion),
            Box::new(SuperKeywordInsertion),
            Box::new(UncheckedSend),
            Box::new(GasBomb),
            Box::new(UnusedReturn),
        ];
        Self { operators }
    }

    /// The standard catalog narrowed to what `config` selects
    ///
    /// Every id the configuration mentions must exist in the standard catalog.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let standard = Self::standard();
        let available = standard.ids();

        let selection = &config.operators;
        if let Some(unknown) = selection.mentioned().find(|id| !available.contains(id)) {
            return Err(MutationError::UnknownOperator {
                id: unknown.to_string(),
                available: available.iter().map(|id| id.to_string()).collect(),
            });
        }

        let operators = standard
            .operators
            .into_iter()
            .filter(|op| selection.includes(op.id()))
            .collect();
        Ok(Self { operators })
    }

    /// Append an operator; it runs after all operators already present
    pub fn register(&mut self, operator: Box<dyn Operator>) -> &mut Self {
        self.operators.push(operator);
        self
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.id()).collect()
    }

    pub fn operators(&self) -> impl Iterator<Item = &dyn Operator> {
        self.operators.iter().map(|op| op.as_ref())
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// All distinct mutations for `unit`, in catalog order
    pub fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        self.generate_with_stats(unit).0
    }

    /// Like [`Catalog::generate`], plus what each operator contributed
    pub fn generate_with_stats(&self, unit: &SourceUnit) -> (Vec<Mutation>, Vec<OperatorTiming>) {
        let mut all = Vec::new();
        let mut timings = Vec::with_capacity(self.operators.len());

        for operator in &self.operators {
            let start = Instant::now();
            let emitted = operator.generate(unit);
            let elapsed = start.elapsed();

            log::debug!(
                "{}: {} mutation(s) for {} in {:?}",
                operator.id(),
                emitted.len(),
                unit.file().display(),
                elapsed
            );
            timings.push(OperatorTiming {
                id: operator.id(),
                count: emitted.len(),
                elapsed,
            });
            all.extend(emitted);
        }

        let total = all.len();
        let unique = mutation::dedup(all);
        if unique.len() < total {
            log::debug!(
                "dropped {} duplicate mutation(s) for {}",
                total - unique.len(),
                unit.file().display()
            );
        }
        (unique, timings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDefinition, Node, NodeKind, Span, StateMutability, Visibility};
    use crate::mutation::Emitter;
    use crate::operators::testing::assert_well_formed;
    use crate::test_support::TreeBuilder;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn compound_assignment() -> SourceUnit {
        let src = "x += 1;";
        let b = TreeBuilder::new(src);
        let assignment = b.binary("x += 1", "+=", b.ident("x"), b.number("1"));
        b.unit(vec![b.expr_stmt(src, assignment)])
    }

    const WITHDRAW: &str = "function withdraw(uint amount) public onlyOwner {\n        \
                            require(amount > 0);\n        \
                            for (uint i = 0; i < amount; i++) {\n            \
                            total += i;\n        \
                            }\n        \
                            (bool ok, ) = msg.sender.call{value: amount}(\"\");\n        \
                            balance -= amount;\n    \
                            }";

    const DEPOSIT: &str = "function deposit() public payable {\n        \
                           balance = balance + msg.value;\n    \
                           }";

    /// Function body: everything from the first opening brace
    fn body_of(function: &str) -> &str {
        &function[function.find('{').unwrap()..]
    }

    fn withdraw(b: &TreeBuilder) -> Node {
        let guard = b.expr_stmt(
            "require(amount > 0);",
            b.call(
                "require(amount > 0)",
                b.ident("require"),
                vec![b.binary("amount > 0", ">", b.ident(("amount", 1)), b.number(("0", 1)))],
            ),
        );
        let counter = b.var_stmt(
            "uint i = 0;",
            vec![Some(b.var_decl("uint i", "i", b.elementary(("uint", 1))))],
            Some(b.number(("0", 2))),
        );
        let accumulate = b.expr_stmt(
            "total += i;",
            b.binary("total += i", "+=", b.ident("total"), b.ident(("i", 3))),
        );
        let for_loop = b.node(
            "for (uint i = 0; i < amount; i++) {\n            total += i;\n        }",
            NodeKind::ForStatement {
                init_expression: Some(Box::new(counter)),
                condition_expression: Some(Box::new(b.binary(
                    "i < amount",
                    "<",
                    b.ident(("i", 1)),
                    b.ident(("amount", 2)),
                ))),
                loop_expression: Some(Box::new(
                    b.expr_stmt("i++", b.unary("i++", "++", b.ident(("i", 2)), false)),
                )),
                body: Box::new(b.block("{\n            total += i;\n        }", vec![accumulate])),
            },
        );
        let sender = b.member("msg.sender", b.ident("msg"), "sender");
        let callee = b.with_options(
            "msg.sender.call{value: amount}",
            b.member("msg.sender.call", sender, "call"),
            "{value: amount}",
            vec![("value", b.ident(("amount", 3)))],
        );
        let payout = b.var_stmt(
            "(bool ok, ) = msg.sender.call{value: amount}(\"\");",
            vec![Some(b.var_decl("bool ok", "ok", b.elementary("bool"))), None],
            Some(b.call(
                "msg.sender.call{value: amount}(\"\")",
                callee,
                vec![b.string("\"\"", "")],
            )),
        );
        let debit = b.expr_stmt(
            "balance -= amount;",
            b.binary("balance -= amount", "-=", b.ident("balance"), b.ident(("amount", 4))),
        );

        b.function(
            WITHDRAW,
            FunctionDefinition {
                name: Some("withdraw".to_string()),
                parameters: vec![b.var_decl("uint amount", "amount", b.elementary("uint"))],
                visibility: Visibility::Public,
                modifiers: vec![b.modifier("onlyOwner", "onlyOwner", None)],
                body: Some(Box::new(b.block(
                    body_of(WITHDRAW),
                    vec![guard, for_loop, payout, debit],
                ))),
                ..Default::default()
            },
        )
    }

    fn deposit(b: &TreeBuilder) -> Node {
        let credit = b.binary(
            "balance = balance + msg.value",
            "=",
            b.ident(("balance", 1)),
            b.binary(
                "balance + msg.value",
                "+",
                b.ident(("balance", 2)),
                b.member("msg.value", b.ident(("msg", 1)), "value"),
            ),
        );
        b.function(
            DEPOSIT,
            FunctionDefinition {
                name: Some("deposit".to_string()),
                visibility: Visibility::Public,
                state_mutability: Some(StateMutability::Payable),
                body: Some(Box::new(b.block(
                    body_of(DEPOSIT),
                    vec![b.expr_stmt("balance = balance + msg.value;", credit)],
                ))),
                ..Default::default()
            },
        )
    }

    /// Emits the same edit twice
    struct Stutter;

    impl Operator for Stutter {
        fn id(&self) -> &'static str {
            "STU"
        }

        fn name(&self) -> &'static str {
            "stutter"
        }

        fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
            let mut out = Emitter::new(unit, self.id());
            out.replace(Span::new(0, 1), "y");
            out.replace(Span::new(0, 1), "y");
            out.finish()
        }
    }

    #[test]
    fn test_standard_ids_are_unique_and_ordered() {
        let ids = Catalog::standard().ids();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(ids.len(), 30);
        assert_eq!(&ids[..6], &["IUO", "ROS", "RE", "MOI", "MOR", "ETR"]);
        assert_eq!(ids.last(), Some(&"UR"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let unit = compound_assignment();
        let catalog = Catalog::standard();

        let first = catalog.generate(&unit);
        let second = catalog.generate(&unit);
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|m| m.operator_id.as_str()).collect::<Vec<_>>(),
            vec!["IUO", "AOR", "AOR"]
        );
    }

    #[test]
    fn test_standard_catalog_emits_valid_distinct_edits() {
        let contract = format!("contract Vault {{\n    {WITHDRAW}\n    {DEPOSIT}\n}}");
        let src = format!("pragma solidity 0.8.20;\n{contract}\n");
        let b = TreeBuilder::new(&src);
        let unit = b.unit(vec![
            b.pragma("pragma solidity 0.8.20;", "0.8.20"),
            b.contract(contract.as_str(), "Vault", vec![withdraw(&b), deposit(&b)]),
        ]);

        let catalog = Catalog::standard();
        let mutations = catalog.generate(&unit);
        assert_well_formed(&unit, &mutations);

        let keys: HashSet<_> = mutations.iter().map(|m| m.key()).collect();
        assert_eq!(keys.len(), mutations.len());

        let ids = catalog.ids();
        assert!(mutations.iter().all(|m| ids.contains(&m.operator_id.as_str())));
        for expected in ["IUO", "AOR"] {
            assert!(
                mutations.iter().any(|m| m.operator_id == expected),
                "no {expected} mutation"
            );
        }
        // the for header stays intact
        assert!(!mutations
            .iter()
            .any(|m| m.operator_id == "IUO" && m.original_text.starts_with("i++")));
    }

    #[test]
    fn test_empty_unit_gives_nothing() {
        let src = "";
        let b = TreeBuilder::new(src);
        let unit = b.unit(vec![]);
        let (mutations, timings) = Catalog::standard().generate_with_stats(&unit);

        assert!(mutations.is_empty());
        assert_eq!(timings.len(), 30);
        assert!(timings.iter().all(|t| t.count == 0));
    }

    #[test]
    fn test_duplicates_are_dropped_keeping_first() {
        let unit = compound_assignment();
        let mut catalog = Catalog::empty();
        catalog.register(Box::new(Stutter));

        let (mutations, timings) = catalog.generate_with_stats(&unit);
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].replacement_text, "y");
        assert_eq!(timings[0].count, 2);
    }

    #[test]
    fn test_from_config_filters_in_catalog_order() {
        let config = GeneratorConfig::from_yaml("operators:\n  enabled: [UR, AOR, IUO]\n  disabled: [IUO]\n").unwrap();
        let catalog = Catalog::from_config(&config).unwrap();
        assert_eq!(catalog.ids(), vec!["AOR", "UR"]);

        let mutations = catalog.generate(&compound_assignment());
        assert!(mutations.iter().all(|m| m.operator_id == "AOR"));
    }

    #[test]
    fn test_from_config_rejects_unknown_ids() {
        let config = GeneratorConfig::from_yaml("operators:\n  disabled: [NOPE]\n").unwrap();
        let err = Catalog::from_config(&config).err().unwrap();
        match err {
            MutationError::UnknownOperator { id, available } => {
                assert_eq!(id, "NOPE");
                assert_eq!(available.len(), 30);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
