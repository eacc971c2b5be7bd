use std::time::Instant;

use strata_dag::{DagError, DependencyGraph};
use strata_ledger::Ledger;
use tracing::{debug, info};

use crate::assets::AssetCheck;
use crate::rule::{Rule, RuleContext};
use crate::rules::default_rules;
use crate::validated::ValidatedLedger;
use crate::violation::{RuleId, ValidationResult, Violation, ViolationKind};

// ---------------------------------------------------------------------------
// ValidationEngine
// ---------------------------------------------------------------------------

/// A configurable pipeline of rules that every ledger must pass before it
/// is executed.
///
/// Unlike a fail-fast pipeline, every rule always runs and every violation
/// is collected.
pub struct ValidationEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl ValidationEngine {
    /// An engine with no rules. Use [`Self::add_rule`] to add some, or
    /// [`Self::with_default_rules`] for R0 through R6.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The standard pipeline:
    /// entry shape -> origin -> assets -> resolution -> acyclicity ->
    /// uniqueness -> remove integrity
    pub fn with_default_rules() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Append a rule to the end of the pipeline.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Number of rules in the pipeline.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run every rule and collect every violation.
    ///
    /// Pure: reads the ledger and, if given, the asset collaborator. Asset
    /// checks are skipped when `assets` is `None`.
    pub fn validate(&self, ledger: &Ledger, assets: Option<&dyn AssetCheck>) -> ValidationResult {
        let graph = DependencyGraph::build(ledger);
        self.validate_graph(ledger, &graph, assets)
    }

    fn validate_graph(
        &self,
        ledger: &Ledger,
        graph: &DependencyGraph,
        assets: Option<&dyn AssetCheck>,
    ) -> ValidationResult {
        let start = Instant::now();
        let context = RuleContext {
            ledger,
            graph,
            assets,
        };

        let mut violations = Vec::new();
        for rule in &self.rules {
            let before = violations.len();
            rule.check(&context, &mut violations);
            debug!(
                rule = rule.name(),
                found = violations.len() - before,
                "rule evaluated"
            );
        }

        info!(
            entries = ledger.len(),
            violations = violations.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "ledger validated"
        );
        ValidationResult::new(violations)
    }

    /// Validate and, if clean, hand out the token the executor requires.
    ///
    /// The application order is computed here once. A ledger that passes a
    /// reduced rule set but still has unresolved names, duplicate producers
    /// or a cycle is refused all the same.
    pub fn gate(
        &self,
        ledger: &Ledger,
        assets: Option<&dyn AssetCheck>,
    ) -> Result<ValidatedLedger, ValidationResult> {
        let graph = DependencyGraph::build(ledger);
        let result = self.validate_graph(ledger, &graph, assets);
        if !result.is_valid() {
            return Err(result);
        }

        let structural = structural_violations(&graph);
        if !structural.is_empty() {
            return Err(ValidationResult::new(structural));
        }

        let order = graph.topological_order().map_err(|e| {
            ValidationResult::new(vec![Violation::new(
                RuleId::Acyclicity,
                ViolationKind::Cycle,
                None,
                e.to_string(),
            )])
        })?;
        Ok(ValidatedLedger::new(ledger.clone(), graph, order))
    }
}

/// Build issues of the graph as violations, whether or not a rule in the
/// pipeline reported them.
fn structural_violations(graph: &DependencyGraph) -> Vec<Violation> {
    graph
        .issues()
        .iter()
        .filter_map(|issue| match issue {
            DagError::UnresolvedDependency { entry, tag } => Some(Violation::at(
                RuleId::Resolution,
                ViolationKind::UnresolvedDependency,
                entry,
                format!("depends on {tag}, which no entry emits"),
            )),
            DagError::DuplicateTag { tag, first, second } => Some(Violation::at(
                RuleId::Uniqueness,
                ViolationKind::DuplicateTag,
                second,
                format!("emits {tag}, which {first} already emits"),
            )),
            // Cycles surface when `gate` orders the graph.
            DagError::Cycle { .. } | DagError::UnknownEntry(_) => None,
        })
        .collect()
}
