use regex::Regex;

use crate::check::{Check, CheckResult};
use crate::config::ClassifierConfig;
use crate::error::ClassifierError;

use super::rules::ClassifierRule;

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub category: Option<String>,
    pub check_contains: Option<String>,
    pub patterns: Vec<Regex>,
    pub remediation: String,
}

impl CompiledRule {
    fn compile(rule: &ClassifierRule) -> Result<Self, ClassifierError> {
        if rule.patterns.is_empty() {
            return Err(ClassifierError::NoPatterns(rule.name.clone()));
        }
        let patterns = rule
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| ClassifierError::InvalidPattern {
                    rule: rule.name.clone(),
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: rule.name.clone(),
            category: rule.category.clone(),
            check_contains: rule.check_contains.clone(),
            patterns,
            remediation: rule.remediation.clone(),
        })
    }

    fn in_scope(&self, check: &Check) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| c == check.category);
        let name_ok = self
            .check_contains
            .as_deref()
            .map_or(true, |needle| check.name.contains(needle));
        category_ok && name_ok
    }

    fn matches(&self, haystack: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(haystack))
    }
}

/// Evaluates the rule table against failed results. First match wins.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Classifier {
    pub fn new(rules: &[ClassifierRule]) -> Result<Self, ClassifierError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn from_config(cfg: &ClassifierConfig) -> Result<Self, ClassifierError> {
        Self::new(&cfg.effective_rules())
    }

    /// A classifier that never reclassifies anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Rule that would downgrade `result`, if any.
    pub fn matching_rule(&self, check: &Check, result: &CheckResult) -> Option<&CompiledRule> {
        if !result.is_reclassifiable() || check.always_critical {
            return None;
        }
        let haystack = format!(
            "{}\n{}\n{}",
            result.stdout_tail,
            result.stderr_tail,
            result.error_detail.as_deref().unwrap_or_default()
        );
        self.rules
            .iter()
            .find(|rule| rule.in_scope(check) && rule.matches(&haystack))
    }

    /// Downgrade a `Failed` result to `Warning` when its output matches a
    /// known transient-failure signature; an advisory `Warning` that matches
    /// gets the rule's remediation. Anything else passes through.
    pub fn classify(&self, check: &Check, mut result: CheckResult) -> CheckResult {
        let Some(rule) = self.matching_rule(check, &result) else {
            return result;
        };
        let original = result.error_detail.clone().unwrap_or_default();
        if result.downgrade(&rule.name, &rule.remediation).is_ok() {
            tracing::warn!(
                check = %check.name,
                category = %check.category,
                rule = %rule.name,
                original = %original,
                "failure reclassified as environmental"
            );
        }
        result
    }
}
