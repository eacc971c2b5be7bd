use strata_types::EntryKind;

use crate::rule::{Rule, RuleContext};
use crate::violation::{RuleId, Violation, ViolationKind};

/// R1: exactly one entry has no dependencies, and it is a Script.
///
/// An empty ledger has nothing to apply and is not a violation.
pub struct OriginRule;

impl Rule for OriginRule {
    fn id(&self) -> RuleId {
        RuleId::Origin
    }

    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>) {
        if context.ledger.is_empty() {
            return;
        }

        let origins: Vec<_> = context.ledger.iter().filter(|e| e.is_origin()).collect();
        let Some(first) = origins.first() else {
            out.push(Violation::new(
                RuleId::Origin,
                ViolationKind::MissingOrigin,
                None,
                "no entry has an empty depends list; the ledger needs exactly one origin",
            ));
            return;
        };

        for extra in &origins[1..] {
            out.push(Violation::at(
                RuleId::Origin,
                ViolationKind::MultipleOrigins,
                extra.id(),
                format!("has no dependencies, but {} is already the origin", first.id()),
            ));
        }

        for origin in &origins {
            if origin.kind() != EntryKind::Script {
                out.push(Violation::at(
                    RuleId::Origin,
                    ViolationKind::OriginNotScript,
                    origin.id(),
                    format!("origin must be a script entry, found {}", origin.kind()),
                ));
            }
        }
    }
}
