use thiserror::Error;

use crate::check::CheckStatus;

/// Problems found while building the check registry or resolving a selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("check at position {0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate check name: {0}")]
    DuplicateName(String),

    #[error("check '{0}' has an empty command")]
    EmptyCommand(String),

    #[error("check '{0}' has a zero timeout")]
    ZeroTimeout(String),

    #[error("check '{0}' has an empty category")]
    EmptyCategory(String),

    #[error("unknown category '{category}' (known: {known})")]
    UnknownCategory { category: String, known: String },
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("rule '{rule}' has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("rule '{0}' has no patterns")]
    NoPatterns(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid status transition {from} -> {to}")]
pub struct TransitionError {
    pub from: CheckStatus,
    pub to: CheckStatus,
}
