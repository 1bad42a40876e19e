//! Reclassifies failures caused by infrastructure rather than code.
//!
//! Rules are data: a scope (category and/or check-name substring), a list of
//! output signatures, and the remediation shown to the operator. New
//! signatures are added to the table, not to the code.

mod classify;
mod rules;

pub use classify::{Classifier, CompiledRule};
pub use rules::{default_rules, ClassifierRule};
