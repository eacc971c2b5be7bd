use strata_dag::format_cycle;

use crate::rule::{Rule, RuleContext};
use crate::violation::{RuleId, Violation, ViolationKind};

/// R4: the dependency graph has no cycles.
///
/// Each cycle is reported once, attributed to the entry the cycle starts
/// at, with the full path in the message.
pub struct AcyclicityRule;

impl Rule for AcyclicityRule {
    fn id(&self) -> RuleId {
        RuleId::Acyclicity
    }

    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>) {
        for cycle in context.graph.find_cycles() {
            let Some(start) = cycle.first() else {
                continue;
            };
            let message = if cycle.len() == 1 {
                format!("depends on its own output: {}", format_cycle(&cycle))
            } else {
                format!("dependency cycle: {}", format_cycle(&cycle))
            };
            out.push(Violation::at(RuleId::Acyclicity, ViolationKind::Cycle, start, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;

    #[test]
    fn acyclic_ledger_passes() {
        assert!(check(&AcyclicityRule, &ledger(city()), None).is_empty());
    }

    #[test]
    fn cycle_reports_full_path() {
        let out = check(
            &AcyclicityRule,
            &ledger(vec![
                script("1_origin", &[], &["root"]),
                script("2_a", &["root", "c"], &["a"]),
                script("3_b", &["a"], &["b"]),
                script("4_c", &["b"], &["c"]),
            ]),
            None,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entry_id, Some(id("2_a")));
        assert!(out[0].message.ends_with("2_a -> 3_b -> 4_c -> 2_a"));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let out = check(
            &AcyclicityRule,
            &ledger(vec![
                script("1_origin", &[], &["root"]),
                script("2_loop", &["root", "loop"], &["loop"]),
            ]),
            None,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ViolationKind::Cycle);
        assert!(out[0].message.contains("2_loop -> 2_loop"));
    }
}
