//! Built-in validation rules.

pub mod assets;
pub mod cycles;
pub mod origin;
pub mod removal;
pub mod resolution;
pub mod shape;
pub mod uniqueness;

pub use assets::AssetRule;
pub use cycles::AcyclicityRule;
pub use origin::OriginRule;
pub use removal::RemoveIntegrityRule;
pub use resolution::ResolutionRule;
pub use shape::EntryShapeRule;
pub use uniqueness::UniquenessRule;

use crate::rule::Rule;

/// The standard rule set, R0 through R6.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(EntryShapeRule),
        Box::new(OriginRule),
        Box::new(AssetRule),
        Box::new(ResolutionRule),
        Box::new(AcyclicityRule),
        Box::new(UniquenessRule),
        Box::new(RemoveIntegrityRule),
    ]
}
