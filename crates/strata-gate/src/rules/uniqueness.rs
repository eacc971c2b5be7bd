use strata_dag::DagError;

use crate::rule::{Rule, RuleContext};
use crate::violation::{RuleId, Violation, ViolationKind};

/// R5: no tag name appears in two entries' `emits`.
pub struct UniquenessRule;

impl Rule for UniquenessRule {
    fn id(&self) -> RuleId {
        RuleId::Uniqueness
    }

    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>) {
        for issue in context.graph.issues() {
            if let DagError::DuplicateTag { tag, first, second } = issue {
                out.push(Violation::at(
                    RuleId::Uniqueness,
                    ViolationKind::DuplicateTag,
                    second,
                    format!("emits {tag}, which {first} already emits"),
                ));
            }
        }
    }
}
