//! Validation engine for strata ledgers.
//!
//! Every ledger must pass through the [`ValidationEngine`] before the
//! executor will touch it. The engine runs a pipeline of [`Rule`]s over the
//! ledger and its dependency graph and collects *every* violation instead of
//! stopping at the first, so one run reports everything that is wrong.
//!
//! The same engine backs the interactive `validate` command and the quiet
//! pre-submission `check`; no rule is implemented anywhere else.
//!
//! # Quick Start
//!
//! ```rust
//! use strata_gate::ValidationEngine;
//! use strata_ledger::Ledger;
//! use strata_types::{Entry, EntryId, EntryKind, TagName};
//!
//! let mut ledger = Ledger::new();
//! let origin = Entry::builder(EntryId::new("0001_origin").unwrap(), EntryKind::Script, "origin.luau")
//!     .emits([TagName::new("root").unwrap()])
//!     .build();
//! ledger.append(origin).unwrap();
//!
//! let engine = ValidationEngine::with_default_rules();
//! assert!(engine.validate(&ledger, None).is_valid());
//! ```

pub mod assets;
pub mod engine;
pub mod rule;
pub mod rules;
pub mod validated;
pub mod violation;

// Re-exports for convenience.
pub use assets::AssetCheck;
pub use engine::ValidationEngine;
pub use rule::{Rule, RuleContext};
pub use validated::ValidatedLedger;
pub use violation::{RuleId, ValidationResult, Violation, ViolationKind};
