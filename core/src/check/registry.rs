use std::collections::HashSet;

use crate::config::{AppConfig, QuickPreset};
use crate::error::RegistryError;

use super::defaults::default_checks;
use super::types::Check;

/// Ordered, validated list of every check known to this run.
///
/// Views never mutate the registry; they hand out references to the same
/// `Check` values in registration order.
#[derive(Debug, Clone)]
pub struct CheckRegistry {
    checks: Vec<Check>,
}

impl CheckRegistry {
    pub fn new(checks: Vec<Check>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for (idx, check) in checks.iter().enumerate() {
            if check.name.trim().is_empty() {
                return Err(RegistryError::EmptyName(idx));
            }
            if !seen.insert(check.name.as_str()) {
                return Err(RegistryError::DuplicateName(check.name.clone()));
            }
            if check.category.trim().is_empty() {
                return Err(RegistryError::EmptyCategory(check.name.clone()));
            }
            if check.command.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(RegistryError::EmptyCommand(check.name.clone()));
            }
            if check.timeout_secs == 0 {
                return Err(RegistryError::ZeroTimeout(check.name.clone()));
            }
        }
        Ok(Self { checks })
    }

    /// Checks declared in config, or the built-in pipeline when none are.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, RegistryError> {
        if cfg.checks.is_empty() {
            Self::new(default_checks())
        } else {
            Self::new(cfg.checks.clone())
        }
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn all(&self) -> Vec<&Check> {
        self.checks.iter().collect()
    }

    /// Distinct categories in registration order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.checks
            .iter()
            .map(|c| c.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn by_categories(&self, categories: &[String]) -> Result<Vec<&Check>, RegistryError> {
        let known = self.categories();
        for category in categories {
            if !known.contains(&category.as_str()) {
                return Err(RegistryError::UnknownCategory {
                    category: category.clone(),
                    known: known.join(", "),
                });
            }
        }
        Ok(self
            .checks
            .iter()
            .filter(|c| categories.contains(&c.category))
            .collect())
    }

    /// Fixed minimal subset for fast local iteration. Preset categories the
    /// registry does not know are ignored.
    pub fn quick(&self, preset: &QuickPreset) -> Vec<&Check> {
        self.checks
            .iter()
            .filter(|c| c.quick && preset.categories.contains(&c.category))
            .collect()
    }
}
