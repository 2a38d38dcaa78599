//! Mutation operators
//!
//! Every operator is a stateless rule: it reads one [`SourceUnit`], never fails,
//! and returns its candidate edits in document order. A node whose fields do not
//! have the expected shape is skipped.

use crate::mutation::Mutation;
use crate::source::SourceUnit;

mod assignment;
mod builtins;
mod calls;
mod control;
mod inheritance;
mod modifiers;
mod reentrancy;
mod safemath;
mod visibility;

pub use assignment::{AssignmentReplacement, IncrementsMirror, UnaryReplacement};
pub use builtins::{
    ExplicitConversionSmaller, GlobalVariableReplacement, HexLiteralReplacement,
    MathCryptoReplacement, UnitReplacement,
};
pub use calls::{EtherTransferReplacement, GasBomb, UncheckedSend, UnusedReturn};
pub use control::{
    AssertViolation, BreakContinueReplacement, CatchBlockDeletion, ExceptionHandlingChange,
    LoopConditionChange,
};
pub use inheritance::{SuperKeywordDeletion, SuperKeywordInsertion};
pub use modifiers::{ModifierDeletion, ModifierInsertion, ModifierOrderChange, ModifierReplacement};
pub use reentrancy::{Reentrancy, ReentrancyOrderSwap};
pub use safemath::{IntegerOverflow, SafeMathReplacement};
pub use visibility::{FunctionVisibility, PayableDeletion, VariableVisibility};

/// A named rule that proposes mutants for one file
pub trait Operator: Send + Sync {
    /// Short uppercase code, unique within a catalog
    fn id(&self) -> &'static str;

    /// Human readable name
    fn name(&self) -> &'static str;

    /// Candidate edits for `unit`, in document order
    fn generate(&self, unit: &SourceUnit) -> Vec<Mutation>;
}
