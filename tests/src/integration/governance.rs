//! # Governance
//!
//! Ownership, the recovery handoff, and validator-set changes observed
//! through the inbox.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        governor, multisig, recipient, recovery_manager, sender, Deployment, DESTINATION, ORIGIN,
        TIMELOCK,
    };
    use shared_types::{AccessError, Clock, RecoveryState, H160};
    use xmp_02_outbox::{OutboxError, OutboxState};
    use xmp_03_validator_signer::Validator;
    use xmp_04_validator_manager::{ValidatorManagerError, ValidatorManagerEvent};
    use xmp_05_inbox::InboxError;

    // =========================================================================
    // ACCESS CONTROL
    // =========================================================================

    #[test]
    fn test_only_owner_is_authorized() {
        let d = Deployment::new(1, 1);
        let now = d.clock.now();
        assert!(d.access.authorize(governor(), now).is_ok());
        assert!(matches!(
            d.access.authorize(recovery_manager(), now),
            Err(AccessError::Unauthorized { .. })
        ));
        assert!(matches!(
            d.access.initiate_recovery(governor(), now),
            Err(AccessError::NotRecoveryManager { .. })
        ));
    }

    #[test]
    fn test_recovery_handoff_and_exit() {
        let d = Deployment::new(1, 1);
        let start = d.clock.now();

        let active_at = d.access.initiate_recovery(recovery_manager(), start).unwrap();
        assert_eq!(active_at, start + TIMELOCK);
        assert_eq!(
            d.access.recovery_state(start),
            RecoveryState::RecoveryInitiated { active_at }
        );
        assert!(matches!(
            d.access.initiate_recovery(recovery_manager(), start + 1),
            Err(AccessError::RecoveryAlreadyInitiated { .. })
        ));
        assert!(matches!(
            d.access.exit_recovery(recovery_manager(), start + 1),
            Err(AccessError::NotInRecovery)
        ));

        // Governor stays owner for the whole timelock.
        assert_eq!(d.access.owner(active_at - 1), governor());

        d.clock.set(active_at);
        assert_eq!(d.access.owner(d.clock.now()), recovery_manager());
        assert!(d.access.authorize(governor(), d.clock.now()).is_err());

        d.access
            .exit_recovery(recovery_manager(), d.clock.now())
            .unwrap();
        assert_eq!(d.access.owner(d.clock.now()), governor());
    }

    #[test]
    fn test_governor_transfer() {
        let d = Deployment::new(1, 1);
        let successor = H160::repeat_byte(0x61);
        let cap = d.admin();
        d.access.transfer_governor(&cap, successor);

        assert_eq!(d.access.owner(d.clock.now()), successor);
        assert!(d.access.authorize(governor(), d.clock.now()).is_err());
    }

    // =========================================================================
    // OUTBOX
    // =========================================================================

    #[test]
    fn test_failed_outbox_rejects_dispatch() {
        let mut d = Deployment::new(1, 1);
        d.dispatch(b"before");
        let root = d.outbox.root();

        let cap = d.admin();
        d.outbox.fail(&cap);
        assert_eq!(d.outbox.state(), OutboxState::Failed);
        assert!(matches!(
            d.outbox
                .dispatch(sender(), DESTINATION, recipient(), b"after".to_vec()),
            Err(OutboxError::OutboxFailed)
        ));

        // Already committed messages stay provable.
        assert_eq!(d.outbox.root(), root);
        assert!(d.outbox.prove_against(0, 0).is_ok());
    }

    // =========================================================================
    // VALIDATOR SET
    // =========================================================================

    #[test]
    fn test_enrolled_validator_counts_toward_quorum() {
        let mut d = Deployment::new(1, 1);
        let newcomer = Validator::from_hex(&hex::encode([9u8; 32]), ORIGIN).unwrap();
        d.dispatch(b"x");
        let checkpoint = d.checkpoint();
        let signed = multisig(&[&newcomer], checkpoint);

        assert!(!d
            .manager
            .read()
            .is_quorum(&checkpoint, &signed.signatures)
            .unwrap());

        let event = d
            .manager
            .write()
            .enroll_validator(&d.admin(), newcomer.address())
            .unwrap();
        assert_eq!(
            event,
            ValidatorManagerEvent::ValidatorEnrolled {
                domain: ORIGIN,
                validator: newcomer.address()
            }
        );

        // The inbox shares the manager, so it sees the change immediately.
        d.inbox.submit_checkpoint(&signed).unwrap();
        assert!(d.inbox.is_proven(&checkpoint.root));
    }

    #[test]
    fn test_unenroll_keeps_quorum_reachable() {
        let d = Deployment::new(2, 2);
        let first = d.validators[0].address();

        assert!(matches!(
            d.manager.write().unenroll_validator(&d.admin(), first),
            Err(ValidatorManagerError::QuorumViolation { .. })
        ));

        d.manager
            .write()
            .set_quorum_threshold(&d.admin(), 1)
            .unwrap();
        d.manager
            .write()
            .unenroll_validator(&d.admin(), first)
            .unwrap();
        assert!(!d.manager.read().is_enrolled(&first));
        assert!(matches!(
            d.manager.write().unenroll_validator(&d.admin(), first),
            Err(ValidatorManagerError::NotEnrolled(_))
        ));
    }

    #[test]
    fn test_threshold_bounds() {
        let d = Deployment::new(3, 2);
        assert!(matches!(
            d.manager.write().set_quorum_threshold(&d.admin(), 0),
            Err(ValidatorManagerError::OutOfRange { .. })
        ));
        assert!(matches!(
            d.manager.write().set_quorum_threshold(&d.admin(), 4),
            Err(ValidatorManagerError::OutOfRange { .. })
        ));
        d.manager
            .write()
            .set_quorum_threshold(&d.admin(), 3)
            .unwrap();
        assert_eq!(d.manager.read().threshold(), 3);
    }

    #[test]
    fn test_raised_threshold_applies_to_new_checkpoints() {
        let mut d = Deployment::new(3, 1);
        d.dispatch(b"a");
        d.inbox.submit_checkpoint(&d.quorum(1)).unwrap();

        d.manager
            .write()
            .set_quorum_threshold(&d.admin(), 3)
            .unwrap();
        d.dispatch(b"b");

        assert!(matches!(
            d.inbox.submit_checkpoint(&d.quorum(2)),
            Err(InboxError::QuorumNotMet { index: 1 })
        ));
        d.inbox.submit_checkpoint(&d.quorum(3)).unwrap();
        assert_eq!(d.inbox.latest_proven_index(), Some(1));
    }
}
