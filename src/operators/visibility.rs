//! Visibility and mutability rules (PKD, FVR, VVR)

use crate::ast::{NodeKind, Span, StateMutability, Visibility};
use crate::mutation::{Emitter, Mutation};
use crate::operators::Operator;
use crate::patterns::{last_word_span, signature_span, word_span};
use crate::source::SourceUnit;

/// Removes `payable` from function signatures
pub struct PayableDeletion;

impl Operator for PayableDeletion {
    fn id(&self) -> &'static str {
        "PKD"
    }

    fn name(&self) -> &'static str {
        "payable-deletion"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        for function in unit.root().functions() {
            let Some(def) = function.as_function() else {
                continue;
            };
            if def.state_mutability != Some(StateMutability::Payable)
                || def.is_receive_ether
                || def.is_virtual
                || def.overrides.is_some()
            {
                continue;
            }
            let signature = signature_span(function).unwrap_or(function.span);
            let Some(keyword) = last_word_span(unit, signature, "payable") else {
                continue;
            };
            // take the separating space along with the keyword
            let start = match unit.text(Span::new(keyword.start.saturating_sub(1), keyword.start)) {
                Some(" ") => keyword.start - 1,
                _ => keyword.start,
            };
            out.delete(Span::new(start, keyword.end));
        }
        out.finish()
    }
}

/// Replaces a function's visibility keyword
pub struct FunctionVisibility;

impl FunctionVisibility {
    fn alternatives(visibility: Visibility, constructor: bool, payable: bool) -> &'static [&'static str] {
        match (visibility, constructor) {
            (Visibility::Public, true) => &["internal"],
            (Visibility::Internal, true) => &["public"],
            (_, true) => &[],
            // payable functions must stay callable from outside
            (Visibility::Public, false) if payable => &["external"],
            (Visibility::Public, false) => &["external", "internal", "private"],
            (Visibility::External, false) if payable => &["public"],
            (Visibility::External, false) => &["public", "internal", "private"],
            (Visibility::Internal, false) => &["public", "external", "private"],
            (Visibility::Private, false) => &["public", "external", "internal"],
            (Visibility::Default, false) => &[],
        }
    }
}

impl Operator for FunctionVisibility {
    fn id(&self) -> &'static str {
        "FVR"
    }

    fn name(&self) -> &'static str {
        "function-visibility-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        for function in unit.root().functions() {
            let Some(def) = function.as_function() else {
                continue;
            };
            if def.is_receive_ether || def.is_fallback || def.is_virtual || def.overrides.is_some() {
                continue;
            }
            let (Some(signature), Some(keyword)) = (signature_span(function), def.visibility.keyword())
            else {
                continue;
            };
            let Some(span) = word_span(unit, signature, keyword) else {
                log::trace!("FVR: '{}' not spelled out in signature", keyword);
                continue;
            };
            let payable = def.state_mutability == Some(StateMutability::Payable);
            for alternative in Self::alternatives(def.visibility, def.is_constructor, payable) {
                out.replace(span, *alternative);
            }
        }
        out.finish()
    }
}

/// Replaces (or spells out) a state variable's visibility
pub struct VariableVisibility;

impl Operator for VariableVisibility {
    fn id(&self) -> &'static str {
        "VVR"
    }

    fn name(&self) -> &'static str {
        "variable-visibility-replacement"
    }

    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation> {
        let mut out = Emitter::new(unit, self.id());
        unit.visit(&mut |node| {
            let NodeKind::StateVariableDeclaration { variables, .. } = &node.kind else {
                return;
            };
            let Some(NodeKind::VariableDeclaration {
                type_name: Some(type_name),
                visibility,
                ..
            }) = variables.first().map(|v| &v.kind)
            else {
                return;
            };
            if matches!(type_name.kind, NodeKind::Mapping { .. }) {
                return;
            }

            // search after the type so a type name never matches
            let rest = Span::new(type_name.span.end, node.span.end);
            let alternatives: &[&str] = match visibility {
                Visibility::Public => &["internal", "private"],
                Visibility::Internal => &["public", "private"],
                Visibility::Private => &["public", "internal"],
                Visibility::External => &[],
                Visibility::Default => {
                    out.insert(type_name.span.end, " public");
                    out.insert(type_name.span.end, " private");
                    return;
                }
            };
            let Some(keyword) = visibility.keyword() else {
                return;
            };
            if let Some(span) = word_span(unit, rest, keyword) {
                for alternative in alternatives {
                    out.replace(span, *alternative);
                }
            }
        });
        out.finish()
    }
}
