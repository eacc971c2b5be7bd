use strata_dag::EdgeKind;

use crate::rule::{Rule, RuleContext};
use crate::violation::{RuleId, Violation, ViolationKind};

/// R6: every removed tag must be produced by an entry that runs strictly
/// before the remover.
///
/// Three ways to break it: the tag is never emitted, the entry removes its
/// own output, or the producer itself (transitively) depends on the remover
/// and can therefore only run after it.
pub struct RemoveIntegrityRule;

impl Rule for RemoveIntegrityRule {
    fn id(&self) -> RuleId {
        RuleId::RemoveIntegrity
    }

    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>) {
        for entry in context.ledger.iter().filter(|e| !e.removes().is_empty()) {
            let downstream = context.graph.descendants(entry.id(), &[EdgeKind::Depends]);

            for tag in entry.removes() {
                let message = match context.graph.producer(tag) {
                    None => format!("removes {tag}, which no entry emits"),
                    Some(producer) if producer == entry.id() => {
                        format!("removes {tag}, which it emits itself")
                    }
                    Some(producer) if downstream.contains(producer) => {
                        format!("removes {tag}, but its producer {producer} runs later")
                    }
                    Some(_) => continue,
                };
                out.push(Violation::at(
                    RuleId::RemoveIntegrity,
                    ViolationKind::RemoveIntegrity,
                    entry.id(),
                    message,
                ));
            }
        }
    }
}
