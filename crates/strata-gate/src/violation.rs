use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::EntryId;

// ---------------------------------------------------------------------------
// RuleId
// ---------------------------------------------------------------------------

/// The rule a violation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// R0: every entry emits something, or removes something if it is a
    /// Remove entry.
    EntryShape,
    /// R1: exactly one origin, and it is a Script.
    Origin,
    /// R2: asset entries point at existing assets, and no asset is orphaned.
    Assets,
    /// R3: every dependency resolves.
    Resolution,
    /// R4: no dependency cycles.
    Acyclicity,
    /// R5: every tag has one producer.
    Uniqueness,
    /// R6: removals target tags produced strictly earlier.
    RemoveIntegrity,
}

impl RuleId {
    /// Short code used in reports (`R0` to `R6`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntryShape => "R0",
            Self::Origin => "R1",
            Self::Assets => "R2",
            Self::Resolution => "R3",
            Self::Acyclicity => "R4",
            Self::Uniqueness => "R5",
            Self::RemoveIntegrity => "R6",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EntryShape => "entry-shape",
            Self::Origin => "origin",
            Self::Assets => "assets",
            Self::Resolution => "resolution",
            Self::Acyclicity => "acyclicity",
            Self::Uniqueness => "uniqueness",
            Self::RemoveIntegrity => "remove-integrity",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.name())
    }
}

// ---------------------------------------------------------------------------
// ViolationKind
// ---------------------------------------------------------------------------

/// What exactly went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    EmptyEntry,
    RemovesOnScript,
    MissingOrigin,
    MultipleOrigins,
    OriginNotScript,
    MissingAsset,
    OrphanAsset,
    UnresolvedDependency,
    Cycle,
    DuplicateTag,
    RemoveIntegrity,
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// One rule violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleId,
    pub kind: ViolationKind,
    /// The offending entry. `None` for ledger-wide problems such as a missing
    /// origin or an orphaned asset.
    pub entry_id: Option<EntryId>,
    pub message: String,
}

impl Violation {
    pub fn new(
        rule: RuleId,
        kind: ViolationKind,
        entry_id: Option<EntryId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule,
            kind,
            entry_id,
            message: message.into(),
        }
    }

    /// A violation attributed to one entry.
    pub fn at(rule: RuleId, kind: ViolationKind, entry: &EntryId, message: impl Into<String>) -> Self {
        Self::new(rule, kind, Some(entry.clone()), message)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry_id {
            Some(id) => write!(f, "[{}] {}: {}", self.rule.code(), id, self.message),
            None => write!(f, "[{}] {}", self.rule.code(), self.message),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// Every violation found in one validation pass. Empty means valid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("ledger has {} violation(s)", .violations.len())]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns `true` if no rule was violated.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Violations of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    /// Violations reported by one rule.
    pub fn by_rule(&self, rule: RuleId) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.rule == rule)
    }

    /// Violations attributed to `entry`.
    pub fn for_entry<'a>(&'a self, entry: &'a EntryId) -> impl Iterator<Item = &'a Violation> {
        self.violations
            .iter()
            .filter(move |v| v.entry_id.as_ref() == Some(entry))
    }
}

impl<'a> IntoIterator for &'a ValidationResult {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_is_valid() {
        let result = ValidationResult::default();
        assert!(result.is_valid());
        assert_eq!(result.to_string(), "ledger has 0 violation(s)");
    }

    #[test]
    fn display_includes_rule_code_and_entry() {
        let id = EntryId::new("0004_d").unwrap();
        let v = Violation::at(
            RuleId::Resolution,
            ViolationKind::UnresolvedDependency,
            &id,
            "depends on ghost, which no entry emits",
        );
        assert_eq!(v.to_string(), "[R3] 0004_d: depends on ghost, which no entry emits");

        let ledger_wide = Violation::new(RuleId::Origin, ViolationKind::MissingOrigin, None, "no origin");
        assert_eq!(ledger_wide.to_string(), "[R1] no origin");
    }

    #[test]
    fn filters_by_kind_rule_and_entry() {
        let a = EntryId::new("1_a").unwrap();
        let result = ValidationResult::new(vec![
            Violation::at(RuleId::Uniqueness, ViolationKind::DuplicateTag, &a, "dup"),
            Violation::new(RuleId::Assets, ViolationKind::OrphanAsset, None, "orphan"),
        ]);
        assert_eq!(result.of_kind(ViolationKind::DuplicateTag).count(), 1);
        assert_eq!(result.by_rule(RuleId::Assets).count(), 1);
        assert_eq!(result.for_entry(&a).count(), 1);
        assert!(!result.is_valid());
    }

    #[test]
    fn serializes_kebab_case() {
        let json = serde_json::to_string(&RuleId::RemoveIntegrity).unwrap();
        assert_eq!(json, "\"remove-integrity\"");
        let json = serde_json::to_string(&ViolationKind::OrphanAsset).unwrap();
        assert_eq!(json, "\"orphan-asset\"");
    }
}
