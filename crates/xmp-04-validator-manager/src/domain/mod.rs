//! # Domain Module

pub mod entities;
pub mod errors;
pub mod invariants;

pub(crate) use entities::ValidatorSetSnapshot;
pub use entities::ValidatorManagerEvent;
pub use errors::ValidatorManagerError;
pub use invariants::{invariant_threshold_in_range, invariant_unenroll_keeps_quorum};
