//! # Quorum Verification
//!
//! Signatures produced by `Validator` checked by `ValidatorManager`, and the
//! inbox's reaction to each outcome.

#[cfg(test)]
mod tests {
    use crate::fixtures::{multisig, validators, Deployment, ORIGIN};
    use shared_types::{Checkpoint, H256};
    use xmp_03_validator_signer::{signing_hash, Validator};
    use xmp_04_validator_manager::{ValidatorManager, ValidatorManagerError};
    use xmp_05_inbox::InboxError;

    // =========================================================================
    // is_quorum
    // =========================================================================

    /// Three dispatches, checkpoint at index 2, validators {V0, V1, V2}, threshold 2.
    #[test]
    fn test_two_of_three_scenario() {
        let mut d = Deployment::new(3, 2);
        d.dispatch(b"a");
        d.dispatch(b"b");
        d.dispatch(b"c");
        let checkpoint = d.checkpoint();
        assert_eq!(checkpoint.index, 2);

        let [v0, v1, _] = [&d.validators[0], &d.validators[1], &d.validators[2]];
        let manager = d.manager.read();

        let both = multisig(&[v0, v1], checkpoint);
        assert!(manager.is_quorum(&checkpoint, &both.signatures).unwrap());

        let one = multisig(&[v0], checkpoint);
        assert!(!manager.is_quorum(&checkpoint, &one.signatures).unwrap());

        let reversed = multisig(&[v1, v0], checkpoint);
        assert!(matches!(
            manager.is_quorum(&checkpoint, &reversed.signatures),
            Err(ValidatorManagerError::UnsortedSigners { position: 1 })
        ));
    }

    #[test]
    fn test_duplicate_signer_is_unsorted() {
        let d = Deployment::new(2, 2);
        let checkpoint = Checkpoint::new(H256::repeat_byte(0x01), 0);
        let v0 = &d.validators[0];
        let doubled = multisig(&[v0, v0], checkpoint);

        assert!(matches!(
            d.manager.read().is_quorum(&checkpoint, &doubled.signatures),
            Err(ValidatorManagerError::UnsortedSigners { .. })
        ));
    }

    #[test]
    fn test_unenrolled_signers_do_not_count() {
        // Five keys, only the first two addresses enrolled.
        let all = validators(5);
        let manager =
            ValidatorManager::new(ORIGIN, all[..2].iter().map(Validator::address), 2).unwrap();
        let checkpoint = Checkpoint::new(H256::repeat_byte(0x02), 7);

        let outsiders: Vec<&Validator> = all[2..].iter().collect();
        let signed = multisig(&outsiders, checkpoint);
        assert!(!manager.is_quorum(&checkpoint, &signed.signatures).unwrap());

        let mixed: Vec<&Validator> = [&all[0], &all[3]].into_iter().collect();
        let signed = multisig(&mixed, checkpoint);
        assert!(!manager.is_quorum(&checkpoint, &signed.signatures).unwrap());

        let enrolled: Vec<&Validator> = all[..2].iter().collect();
        let signed = multisig(&enrolled, checkpoint);
        assert!(manager.is_quorum(&checkpoint, &signed.signatures).unwrap());
    }

    #[test]
    fn test_signature_bound_to_origin_domain() {
        let d = Deployment::new(1, 1);
        let checkpoint = Checkpoint::new(H256::repeat_byte(0x03), 0);
        assert_ne!(
            signing_hash(ORIGIN, &checkpoint),
            signing_hash(ORIGIN + 1, &checkpoint)
        );

        // A key configured for another origin signs a different payload.
        let elsewhere = Validator::from_hex(&hex::encode([1u8; 32]), ORIGIN + 1).unwrap();
        let signature = elsewhere.sign(checkpoint).unwrap().signature;
        assert!(!d
            .manager
            .read()
            .is_quorum(&checkpoint, &[signature])
            .unwrap());
    }

    #[test]
    fn test_signature_bound_to_checkpoint() {
        let d = Deployment::new(1, 1);
        let signed = d.validators[0]
            .sign(Checkpoint::new(H256::repeat_byte(0x04), 3))
            .unwrap();
        let other = Checkpoint::new(H256::repeat_byte(0x04), 4);

        assert!(!d
            .manager
            .read()
            .is_quorum(&other, &[signed.signature])
            .unwrap());
    }

    // =========================================================================
    // INBOX
    // =========================================================================

    #[test]
    fn test_inbox_rejects_below_threshold() {
        let mut d = Deployment::new(3, 2);
        d.dispatch(b"x");
        let signed = d.quorum(1);

        let err = d.inbox.submit_checkpoint(&signed).unwrap_err();
        assert!(matches!(err, InboxError::QuorumNotMet { index: 0 }));
        assert!(err.is_retryable());
        assert!(!d.inbox.is_proven(&signed.root()));
    }

    #[test]
    fn test_inbox_rejects_unsorted_as_permanent() {
        let mut d = Deployment::new(2, 2);
        d.dispatch(b"x");
        let checkpoint = d.checkpoint();
        let reversed = multisig(&[&d.validators[1], &d.validators[0]], checkpoint);

        let err = d.inbox.submit_checkpoint(&reversed).unwrap_err();
        assert!(matches!(
            err,
            InboxError::Quorum(ValidatorManagerError::UnsortedSigners { .. })
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_inbox_rejects_foreign_checkpoint_domain() {
        let mut d = Deployment::new(1, 1);
        d.dispatch(b"x");
        let mut signed = d.quorum(1);
        signed.outbox_domain = ORIGIN + 7;

        assert!(matches!(
            d.inbox.submit_checkpoint(&signed),
            Err(InboxError::CheckpointDomainMismatch { .. })
        ));
    }
}
