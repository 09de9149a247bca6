//! # Domain Invariants
//!
//! `1 <= threshold <= |validators|` must hold after every mutation.

use super::errors::ValidatorManagerError;

/// Invariant: threshold within `1..=set_size`.
pub fn invariant_threshold_in_range(
    threshold: u32,
    set_size: usize,
) -> Result<(), ValidatorManagerError> {
    if threshold == 0 || threshold as usize > set_size {
        return Err(ValidatorManagerError::OutOfRange {
            threshold,
            set_size,
        });
    }
    Ok(())
}

/// Invariant: removing one validator keeps the set at or above threshold.
pub fn invariant_unenroll_keeps_quorum(
    set_size: usize,
    threshold: u32,
) -> Result<(), ValidatorManagerError> {
    let remaining = set_size.saturating_sub(1);
    if remaining < threshold as usize {
        return Err(ValidatorManagerError::QuorumViolation {
            set_size: remaining,
            threshold,
        });
    }
    Ok(())
}
