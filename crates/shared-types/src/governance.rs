//! # Access Control
//!
//! The admin capability that gates validator-set, threshold and outbox
//! lifecycle mutations.
//!
//! Two holders can own the capability: the `governor` during normal
//! operation, and the `recovery_manager` once a timelocked recovery has
//! become active.
//!
//! ```text
//! Normal ──initiate_recovery──→ RecoveryInitiated{active_at}
//!                                     │ now >= active_at
//!                                     ↓
//! Normal ←──exit_recovery──── RecoveryActive
//! ```
//!
//! Timestamps come from a `Clock` port and are only ever compared, never
//! read from ambient state.

use crate::errors::AccessError;
use parking_lot::RwLock;
use primitive_types::H160;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Default recovery timelock (7 days).
pub const DEFAULT_RECOVERY_TIMELOCK_SECS: u64 = 7 * 24 * 3600;

/// Abstract interface for time (for testability).
pub trait Clock: Send + Sync {
    /// Current timestamp in seconds. Must never decrease.
    fn now(&self) -> u64;
}

/// Clock backed by system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock reading `start` until moved.
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to `timestamp`. Moving backwards is ignored.
    pub fn set(&self, timestamp: u64) {
        self.now.fetch_max(timestamp, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Recovery phase of the access-control state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryState {
    /// Governor owns the capability.
    Normal,
    /// Recovery requested; governor keeps ownership until `active_at`.
    RecoveryInitiated { active_at: u64 },
    /// Recovery manager owns the capability.
    RecoveryActive,
}

/// Proof that the caller was the owner when it was issued.
///
/// Only `AccessControl::authorize` can create one.
#[derive(Debug)]
pub struct AdminCapability {
    holder: H160,
    issued_at: u64,
}

impl AdminCapability {
    /// Address the capability was issued to.
    pub fn holder(&self) -> H160 {
        self.holder
    }

    /// Timestamp at issuance.
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }
}

#[derive(Debug)]
struct AccessState {
    governor: H160,
    recovery: RecoveryState,
}

/// Governor / recovery-manager ownership with a timelocked handoff.
#[derive(Debug)]
pub struct AccessControl {
    recovery_manager: H160,
    recovery_timelock: u64,
    state: RwLock<AccessState>,
}

impl AccessControl {
    /// Governed by `governor`, with no recovery in progress.
    pub fn new(governor: H160, recovery_manager: H160, recovery_timelock: u64) -> Self {
        Self {
            recovery_manager,
            recovery_timelock,
            state: RwLock::new(AccessState {
                governor,
                recovery: RecoveryState::Normal,
            }),
        }
    }

    /// Current governor.
    pub fn governor(&self) -> H160 {
        self.state.read().governor
    }

    /// Address allowed to start recovery.
    pub fn recovery_manager(&self) -> H160 {
        self.recovery_manager
    }

    /// Seconds between initiating recovery and recovery becoming active.
    pub fn recovery_timelock(&self) -> u64 {
        self.recovery_timelock
    }

    /// Recovery phase as of `now`.
    pub fn recovery_state(&self, now: u64) -> RecoveryState {
        resolve(self.state.read().recovery, now)
    }

    /// Address holding the capability as of `now`.
    pub fn owner(&self, now: u64) -> H160 {
        let state = self.state.read();
        match resolve(state.recovery, now) {
            RecoveryState::RecoveryActive => self.recovery_manager,
            _ => state.governor,
        }
    }

    /// Issue an admin capability if `caller` is the current owner.
    pub fn authorize(&self, caller: H160, now: u64) -> Result<AdminCapability, AccessError> {
        if caller != self.owner(now) {
            warn!(?caller, "Rejected admin authorization");
            return Err(AccessError::Unauthorized { caller });
        }
        Ok(AdminCapability {
            holder: caller,
            issued_at: now,
        })
    }

    /// Start the recovery timelock. Returns the timestamp recovery becomes active.
    pub fn initiate_recovery(&self, caller: H160, now: u64) -> Result<u64, AccessError> {
        self.require_recovery_manager(caller)?;

        let mut state = self.state.write();
        match resolve(state.recovery, now) {
            RecoveryState::Normal => {
                let active_at = now.saturating_add(self.recovery_timelock);
                state.recovery = RecoveryState::RecoveryInitiated { active_at };
                info!(active_at, "Recovery initiated");
                Ok(active_at)
            }
            RecoveryState::RecoveryInitiated { active_at } => {
                Err(AccessError::RecoveryAlreadyInitiated { active_at })
            }
            RecoveryState::RecoveryActive => Err(AccessError::RecoveryAlreadyInitiated {
                active_at: now,
            }),
        }
    }

    /// Leave active recovery and hand ownership back to the governor.
    pub fn exit_recovery(&self, caller: H160, now: u64) -> Result<(), AccessError> {
        self.require_recovery_manager(caller)?;

        let mut state = self.state.write();
        if resolve(state.recovery, now) != RecoveryState::RecoveryActive {
            return Err(AccessError::NotInRecovery);
        }
        state.recovery = RecoveryState::Normal;
        info!("Recovery exited");
        Ok(())
    }

    /// Replace the governor. Requires the admin capability.
    pub fn transfer_governor(&self, _cap: &AdminCapability, new_governor: H160) {
        let mut state = self.state.write();
        info!(previous = ?state.governor, new = ?new_governor, "Governor transferred");
        state.governor = new_governor;
    }

    fn require_recovery_manager(&self, caller: H160) -> Result<(), AccessError> {
        if caller != self.recovery_manager {
            return Err(AccessError::NotRecoveryManager { caller });
        }
        Ok(())
    }
}

fn resolve(recovery: RecoveryState, now: u64) -> RecoveryState {
    match recovery {
        RecoveryState::RecoveryInitiated { active_at } if now >= active_at => {
            RecoveryState::RecoveryActive
        }
        other => other,
    }
}
