//! Modifier rules (MOI, MOR, MOC, MOD)
//!
//! MOI and MOR pair functions with modifier invocations seen elsewhere in the
//! file. A pairing needs both ends in the same contract and the modifier's
//! arguments to be a positional prefix of the function's parameters.

use crate::ast::Span;
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::patterns::{returns_offset, signature_span, ModifierTable};
use crate::source::SourceUnit;

/// Adds a known modifier to a function that has none
pub struct ModifierInsertion;

impl Operator for ModifierInsertion {
    fn id(&self) -> &'static str {
        "MOI"
    }

    fn name(&self) -> &'static str {
        "modifier-insertion"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        let table = ModifierTable::build(unit);
        if table.is_empty() {
            return out.finish();
        }

        for function in unit.root().functions() {
            let Some(def) = function.as_function() else {
                continue;
            };
            if !def.modifiers.is_empty() || def.is_special() || def.is_pure_or_view() {
                continue;
            }
            let Some(signature) = signature_span(function) else {
                continue;
            };
            let Some(text) = unit.text(signature) else {
                continue;
            };
            // split point: the `returns` clause, or the end of the signature
            let at = returns_offset(unit, function)
                .filter(|offset| def.has_return_parameters() && signature.start <= *offset)
                .map(|offset| offset - signature.start);
            let (head, tail) = match at.map(|at| (text.get(..at), text.get(at..))) {
                Some((Some(head), Some(tail))) => (head, tail),
                _ => (text, ""),
            };

            for candidate in table.applicable_to(unit, function, def) {
                let replacement = if tail.is_empty() {
                    format!("{head}{} ", candidate.text)
                } else {
                    format!("{head}{} {tail}", candidate.text)
                };
                out.replace(signature, replacement);
            }
        }
        out.finish()
    }
}

/// Swaps a function's first modifier for another known one
pub struct ModifierReplacement;

impl Operator for ModifierReplacement {
    fn id(&self) -> &'static str {
        "MOR"
    }

    fn name(&self) -> &'static str {
        "modifier-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        let table = ModifierTable::build(unit);

        for function in unit.root().functions() {
            let Some(def) = function.as_function() else {
                continue;
            };
            if def.body.is_none() || def.is_special() {
                continue;
            }
            let Some(first) = def.modifiers.first() else {
                continue;
            };
            let own: Vec<&str> = def.modifiers.iter().filter_map(|m| unit.text_of(m)).collect();
            for candidate in table.applicable_to(unit, function, def) {
                if !own.contains(&candidate.text) {
                    out.replace_node(first, candidate.text);
                }
            }
        }
        out.finish()
    }
}

/// Swaps adjacent modifiers
pub struct ModifierOrderChange;

impl Operator for ModifierOrderChange {
    fn id(&self) -> &'static str {
        "MOC"
    }

    fn name(&self) -> &'static str {
        "modifier-order-change"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        for function in unit.root().functions() {
            let Some(def) = function.as_function() else {
                continue;
            };
            for pair in def.modifiers.windows(2) {
                let [first, second] = pair else {
                    continue;
                };
                let texts = (
                    unit.text_of(first),
                    unit.text(Span::new(first.span.end, second.span.start)),
                    unit.text_of(second),
                );
                if let (Some(first_text), Some(between), Some(second_text)) = texts {
                    out.replace(
                        Span::new(first.span.start, second.span.end),
                        format!("{second_text}{between}{first_text}"),
                    );
                }
            }
        }
        out.finish()
    }
}

/// Removes modifiers one at a time
pub struct ModifierDeletion;

impl Operator for ModifierDeletion {
    fn id(&self) -> &'static str {
        "MOD"
    }

    fn name(&self) -> &'static str {
        "modifier-deletion"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        for function in unit.root().functions() {
            let Some(def) = function.as_function() else {
                continue;
            };
            // constructor "modifiers" are usually base constructor calls
            if def.is_constructor {
                continue;
            }
            for modifier in &def.modifiers {
                let span = modifier.span;
                let start = match unit.text(Span::new(span.start.saturating_sub(1), span.start)) {
                    Some(" ") => span.start - 1,
                    _ => span.start,
                };
                out.delete(Span::new(start, span.end));
            }
        }
        out.finish()
    }
}
