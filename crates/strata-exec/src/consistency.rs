//! Load-time verification of the applied record.

use std::collections::HashMap;

use strata_gate::ValidatedLedger;
use strata_ledger::AppliedRecord;
use strata_types::EntryId;
use tracing::error;

use crate::error::{ConsistencyError, ExecError, ExecResult};

/// Check that `applied` could have been produced by running `validated`.
///
/// - every applied id is in the ledger, exactly once;
/// - the applied set is downward closed: every producer an applied entry
///   waits on was applied earlier in the sequence;
/// - no applied entry was edited since (fingerprints match, where recorded);
/// - the tag snapshot matches the applied entries: each tag is credited to
///   an applied entry that declares it, each applied entry's declared tags
///   are all present, and a removal mark names an applied entry that
///   removes the tag.
///
/// A violation is fatal. Nothing is repaired.
pub fn verify_applied(validated: &ValidatedLedger, applied: &AppliedRecord) -> ExecResult<()> {
    check(validated, applied).map_err(|err| {
        error!(error = %err, "applied record failed verification");
        ExecError::Consistency(err)
    })
}

fn check(validated: &ValidatedLedger, applied: &AppliedRecord) -> Result<(), ConsistencyError> {
    let ledger = validated.ledger();
    let graph = validated.graph();

    let mut position: HashMap<&EntryId, usize> = HashMap::with_capacity(applied.len());
    for (i, id) in applied.applied_ids().iter().enumerate() {
        if !ledger.contains(id) {
            return Err(ConsistencyError::UnknownApplied(id.clone()));
        }
        if position.insert(id, i).is_some() {
            return Err(ConsistencyError::DuplicateApplied(id.clone()));
        }
    }

    for (i, id) in applied.applied_ids().iter().enumerate() {
        let Some(node) = graph.node(id) else {
            return Err(ConsistencyError::UnknownApplied(id.clone()));
        };
        // Both depends and removes edges order the producer first.
        for edge in &node.parents {
            match position.get(&edge.producer) {
                Some(&p) if p < i => {}
                _ => {
                    return Err(ConsistencyError::NotDownwardClosed {
                        entry: id.clone(),
                        producer: edge.producer.clone(),
                        tag: edge.tag.clone(),
                    })
                }
            }
        }

        if let (Some(recorded), Some(entry)) = (applied.fingerprint(id), ledger.get(id)) {
            if entry.fingerprint().map_or(true, |current| current != recorded) {
                return Err(ConsistencyError::EntryModified(id.clone()));
            }
        }
    }

    for (tag, record) in applied.tags() {
        if !position.contains_key(&record.produced_by) {
            return Err(ConsistencyError::UnknownProducer {
                tag: tag.clone(),
                producer: record.produced_by.clone(),
            });
        }
        let declares = ledger
            .get(&record.produced_by)
            .is_some_and(|entry| entry.emits().contains(tag));
        if !declares {
            return Err(ConsistencyError::UndeclaredTag {
                tag: tag.clone(),
                producer: record.produced_by.clone(),
            });
        }
        if let Some(remover) = &record.removed_by {
            let removes = position.contains_key(remover)
                && ledger
                    .get(remover)
                    .is_some_and(|entry| entry.removes().contains(tag));
            if !removes {
                return Err(ConsistencyError::UnexpectedRemoval {
                    tag: tag.clone(),
                    remover: remover.clone(),
                });
            }
        }
    }

    for id in applied.applied_ids() {
        let Some(entry) = ledger.get(id) else { continue };
        for tag in entry.emits() {
            let recorded = applied.tag(tag).is_some_and(|r| &r.produced_by == id);
            if !recorded {
                return Err(ConsistencyError::MissingTag {
                    entry: id.clone(),
                    tag: tag.clone(),
                });
            }
        }
    }

    Ok(())
}
