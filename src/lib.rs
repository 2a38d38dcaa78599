//! Mutant generation for Solidity
//!
//! This library proposes mutants for Solidity smart contracts. A parser outside
//! the crate hands over one file's AST (usually as a JSON dump); a catalog of
//! operators walks it and returns a deduplicated list of byte-exact edits.
//! Writing mutants to disk and running test suites against them is left to the
//! caller.
//!
//! # Example Configuration
//!
//! ```yaml
//! version: "1.0"
//! operators:
//!   enabled: []       # empty: the whole catalog
//!   disabled: [GB]
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use solidity_mutation_engine::{Catalog, GeneratorConfig, SourceUnit};
//! use std::path::Path;
//!
//! let unit = SourceUnit::load(Path::new("Bank.sol"), Path::new("Bank.ast.json")).unwrap();
//! let config = GeneratorConfig::load(Path::new("solmut.yaml")).unwrap();
//! let catalog = Catalog::from_config(&config).unwrap();
//! for mutation in catalog.generate(&unit) {
//!     println!("{mutation}");
//! }
//! ```

pub mod ast;
pub mod catalog;
pub mod config;
pub mod declarations;
pub mod error;
pub mod mutation;
pub mod operators;
pub mod patterns;
pub mod report;
pub mod scope;
pub mod source;
pub mod visit;

#[cfg(test)]
mod test_support;

// Re-export main types at crate root
pub use ast::{Node, NodeKind, Span};
pub use catalog::{Catalog, OperatorTiming};
pub use config::{GeneratorConfig, OperatorSelection};
pub use declarations::DeclarationIndex;
pub use error::{MutationError, Result};
pub use mutation::{Mutation, MutationKey};
pub use operators::Operator;
pub use report::GenerationReport;
pub use scope::ScopeIndex;
pub use source::SourceUnit;
