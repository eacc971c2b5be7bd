use strata_dag::DagError;

use crate::rule::{Rule, RuleContext};
use crate::violation::{RuleId, Violation, ViolationKind};

/// R3: every `depends` name resolves to some entry's `emits`.
pub struct ResolutionRule;

impl Rule for ResolutionRule {
    fn id(&self) -> RuleId {
        RuleId::Resolution
    }

    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>) {
        for issue in context.graph.issues() {
            if let DagError::UnresolvedDependency { entry, tag } = issue {
                out.push(Violation::at(
                    RuleId::Resolution,
                    ViolationKind::UnresolvedDependency,
                    entry,
                    format!("depends on {tag}, which no entry emits"),
                ));
            }
        }
    }
}
