use std::collections::HashSet;

use strata_types::EntryKind;

use crate::rule::{Rule, RuleContext};
use crate::violation::{RuleId, Violation, ViolationKind};

/// R2: asset entries must point at existing assets, and every asset the host
/// knows about must be referenced by some asset entry.
///
/// Skipped entirely when the caller supplies no asset collaborator.
pub struct AssetRule;

impl Rule for AssetRule {
    fn id(&self) -> RuleId {
        RuleId::Assets
    }

    fn check(&self, context: &RuleContext<'_>, out: &mut Vec<Violation>) {
        let Some(assets) = context.assets else {
            return;
        };

        let mut referenced = HashSet::new();
        for entry in context.ledger.iter().filter(|e| e.kind() == EntryKind::Asset) {
            referenced.insert(entry.source());
            if !assets.exists(entry.source()) {
                out.push(Violation::at(
                    RuleId::Assets,
                    ViolationKind::MissingAsset,
                    entry.id(),
                    format!("asset {} does not exist", entry.source()),
                ));
            }
        }

        let mut inventory = assets.inventory();
        inventory.sort();
        for asset in inventory {
            if !referenced.contains(asset.as_str()) {
                out.push(Violation::new(
                    RuleId::Assets,
                    ViolationKind::OrphanAsset,
                    None,
                    format!("asset {asset} is not referenced by any asset entry"),
                ));
            }
        }
    }
}
