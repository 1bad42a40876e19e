use std::time::Duration;

use serde::Serialize;

use crate::check::{Check, CheckResult};
use crate::config::SchedulerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One check at a time, registration order.
    Sequential,
    /// All checks at once, bounded by the run-wide concurrency limit.
    Parallel,
    /// Sequential, but "still running after the grace period" counts as
    /// passed and the process is kept alive until the run ends.
    Service,
}

impl ExecutionMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Service => "service",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryPlan<'a> {
    pub name: String,
    pub mode: ExecutionMode,
    pub gate: bool,
    pub checks: Vec<&'a Check>,
}

/// One or more categories that run together. Waves run strictly one after
/// another.
#[derive(Debug, Clone)]
pub struct Wave<'a> {
    pub categories: Vec<CategoryPlan<'a>>,
}

impl<'a> Wave<'a> {
    /// True when the wave's checks are fanned out instead of run one by one.
    pub fn is_concurrent(&self) -> bool {
        self.categories.len() > 1
            || self
                .categories
                .first()
                .is_some_and(|c| c.mode == ExecutionMode::Parallel)
    }

    pub fn checks(&self) -> impl Iterator<Item = &'a Check> + '_ {
        self.categories.iter().flat_map(|c| c.checks.iter().copied())
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Orders categories along the fixed dependency chain and decides how each
/// one runs.
#[derive(Debug, Clone)]
pub struct CategoryScheduler {
    order: Vec<String>,
    parallel: Vec<String>,
    gates: Vec<String>,
    services: Vec<String>,
    service_grace: Duration,
}

impl CategoryScheduler {
    pub fn new(cfg: &SchedulerConfig) -> Self {
        Self {
            order: cfg.order.clone(),
            parallel: cfg.parallel_categories.clone(),
            gates: cfg.gate_categories.clone(),
            services: cfg.service_categories.clone(),
            service_grace: Duration::from_millis(cfg.service_grace_ms),
        }
    }

    pub fn service_grace(&self) -> Duration {
        self.service_grace
    }

    /// Fixed order filtered to `requested`; categories the fixed order does
    /// not know are appended in request order.
    pub fn order_categories<S: AsRef<str>>(&self, requested: &[S]) -> Vec<String> {
        let wanted = |name: &str| requested.iter().any(|r| r.as_ref() == name);
        let mut ordered: Vec<String> = self
            .order
            .iter()
            .filter(|c| wanted(c))
            .cloned()
            .collect();
        for r in requested {
            let r = r.as_ref();
            if !self.order.iter().any(|c| c == r) && !ordered.iter().any(|c| c == r) {
                ordered.push(r.to_string());
            }
        }
        ordered
    }

    pub fn mode_for(&self, category: &str) -> ExecutionMode {
        if self.services.iter().any(|c| c == category) {
            ExecutionMode::Service
        } else if self.parallel.iter().any(|c| c == category) {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        }
    }

    pub fn is_gate(&self, category: &str) -> bool {
        self.gates.iter().any(|c| c == category)
    }

    /// Group `selection` into waves following the category order.
    ///
    /// Categories without any selected check are dropped. With
    /// `cross_parallel`, runs of adjacent parallel, non-gate categories are
    /// merged into a single wave.
    pub fn plan<'a, S: AsRef<str>>(
        &self,
        requested: &[S],
        selection: &[&'a Check],
        cross_parallel: bool,
    ) -> Vec<Wave<'a>> {
        let mut waves: Vec<Wave<'a>> = Vec::new();
        for name in self.order_categories(requested) {
            let checks: Vec<&'a Check> = selection
                .iter()
                .copied()
                .filter(|c| c.category == name)
                .collect();
            if checks.is_empty() {
                continue;
            }
            let plan = CategoryPlan {
                mode: self.mode_for(&name),
                gate: self.is_gate(&name),
                name,
                checks,
            };

            let mergeable = cross_parallel && plan.mode == ExecutionMode::Parallel && !plan.gate;
            if mergeable {
                if let Some(last) = waves.last_mut() {
                    let tail_mergeable = last
                        .categories
                        .iter()
                        .all(|c| c.mode == ExecutionMode::Parallel && !c.gate);
                    if tail_mergeable {
                        last.categories.push(plan);
                        continue;
                    }
                }
            }
            waves.push(Wave {
                categories: vec![plan],
            });
        }
        waves
    }

    /// A gate category with at least one critical failure stops the run.
    pub fn should_halt(&self, category: &CategoryPlan<'_>, results: &[CheckResult]) -> bool {
        category.gate
            && results
                .iter()
                .any(|r| r.category == category.name && r.is_critical_failure())
    }
}
