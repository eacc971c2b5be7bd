use strata_dag::DependencyGraph;
use strata_ledger::Ledger;

use crate::assets::AssetCheck;
use crate::violation::{RuleId, Violation};

// ---------------------------------------------------------------------------
// RuleContext
// ---------------------------------------------------------------------------

/// Everything a rule may look at. Built once per validation pass.
pub struct RuleContext<'a> {
    pub ledger: &'a Ledger,
    /// The graph built from `ledger`, including its collected issues.
    pub graph: &'a DependencyGraph,
    /// Asset-existence collaborator, if the caller supplied one.
    pub assets: Option<&'a dyn AssetCheck>,
}

// ---------------------------------------------------------------------------
// Rule trait
// ---------------------------------------------------------------------------

/// A single validation rule.
///
/// Rules are pure: they read the context and append violations, never
/// stopping early. The trait is object-safe and `Send + Sync` so rules can be
/// stored in a `Vec<Box<dyn Rule>>`.
pub trait Rule: Send + Sync {
    /// Which rule this is.
    fn id(&self) -> RuleId;

    /// Human-readable name (e.g. "origin", "acyclicity").
    fn name(&self) -> &str {
        self.id().name()
    }

    /// Append every violation of this rule to `out`.
    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>);
}
