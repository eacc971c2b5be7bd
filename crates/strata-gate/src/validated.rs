use strata_dag::DependencyGraph;
use strata_ledger::Ledger;
use strata_types::EntryId;

/// A ledger that has passed every validation rule.
///
/// There is no public constructor: the only way to obtain one is
/// [`ValidationEngine::gate`](crate::ValidationEngine::gate). The executor
/// accepts nothing else, so execution cannot bypass validation.
#[derive(Clone, Debug)]
pub struct ValidatedLedger {
    ledger: Ledger,
    graph: DependencyGraph,
    order: Vec<EntryId>,
}

impl ValidatedLedger {
    pub(crate) fn new(ledger: Ledger, graph: DependencyGraph, order: Vec<EntryId>) -> Self {
        Self {
            ledger,
            graph,
            order,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The full application order, applied entries included.
    pub fn order(&self) -> &[EntryId] {
        &self.order
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}
