use strata_types::EntryKind;

use crate::rule::{Rule, RuleContext};
use crate::violation::{RuleId, Violation, ViolationKind};

/// R0: an entry must contribute something.
///
/// Every entry emits at least one tag, unless it is a Remove entry with at
/// least one removal. Only Asset and Remove entries may remove.
pub struct EntryShapeRule;

impl Rule for EntryShapeRule {
    fn id(&self) -> RuleId {
        RuleId::EntryShape
    }

    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>) {
        for entry in context.ledger {
            let removes_something = entry.kind() == EntryKind::Remove && !entry.removes().is_empty();
            if entry.emits().is_empty() && !removes_something {
                out.push(Violation::at(
                    RuleId::EntryShape,
                    ViolationKind::EmptyEntry,
                    entry.id(),
                    format!("{} entry emits nothing", entry.kind()),
                ));
            }
            if !entry.kind().can_remove() && !entry.removes().is_empty() {
                out.push(Violation::at(
                    RuleId::EntryShape,
                    ViolationKind::RemovesOnScript,
                    entry.id(),
                    "only asset and remove entries may declare removes",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_types::{Entry, EntryKind};

    use super::*;
    use crate::rules::fixtures::*;

    #[test]
    fn well_formed_entries_pass() {
        let mut entries = city();
        entries.push(remove("0005_cleanup", &["root"], &["trees"]));
        assert!(check(&EntryShapeRule, &ledger(entries), None).is_empty());
    }

    #[test]
    fn entry_without_emits_is_empty() {
        let mut entries = city();
        entries.push(script("0005_noop", &["root"], &[]));
        let out = check(&EntryShapeRule, &ledger(entries), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ViolationKind::EmptyEntry);
        assert_eq!(out[0].entry_id, Some(id("0005_noop")));
    }

    #[test]
    fn remove_entry_without_removals_is_empty() {
        let mut entries = city();
        entries.push(remove("0005_cleanup", &["root"], &[]));
        let out = check(&EntryShapeRule, &ledger(entries), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ViolationKind::EmptyEntry);
    }

    #[test]
    fn script_may_not_remove() {
        let bad = Entry::builder(id("0005_bad"), EntryKind::Script, "bad.luau")
            .depends(tags(&["root"]))
            .emits(tags(&["bad"]))
            .removes(tags(&["trees"]))
            .build();
        let mut entries = city();
        entries.push(bad);
        let out = check(&EntryShapeRule, &ledger(entries), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ViolationKind::RemovesOnScript);
    }
}
