//! # Delivery Flow
//!
//! ```text
//! Outbox.dispatch → (root, index) → validators sign → Inbox.submit_checkpoint
//!                                                          ↓
//!                        Outbox.prove_against ──proof──→ Inbox.process → recipient
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{recipient, sender, Deployment, DESTINATION, ORIGIN};
    use shared_types::{Checkpoint, H256};
    use xmp_01_message_codec::Message;
    use xmp_05_inbox::{InboxError, MessageStatus};

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[test]
    fn test_nonces_follow_insertion_order() {
        let mut d = Deployment::new(3, 2);
        for expected in 0..3u32 {
            let committed = d.dispatch(format!("m{expected}").as_bytes());
            assert_eq!(committed.leaf_index, expected);
            assert_eq!(committed.message.nonce, expected);
            assert_eq!(committed.message.origin, ORIGIN);
        }
        assert_eq!(d.checkpoint(), Checkpoint::new(d.outbox.root(), 2));
    }

    #[test]
    fn test_proof_rejected_until_root_proven() {
        let mut d = Deployment::new(3, 2);
        d.dispatch(b"zero");
        d.dispatch(b"one");
        d.dispatch(b"two");
        let proof = d.proof(1, 2);
        let bytes = d.message_bytes(1);

        let err = d.inbox.process(&bytes, &proof.path, proof.index).unwrap_err();
        assert!(matches!(err, InboxError::ProofNotProven { .. }));
        assert!(err.is_retryable());

        d.inbox.submit_checkpoint(&d.quorum(2)).unwrap();
        let hash = d.inbox.process(&bytes, &proof.path, proof.index).unwrap();

        assert_eq!(hash, Message::decode(&bytes).unwrap().hash());
        assert_eq!(d.inbox.message_status(&hash), MessageStatus::Processed);
        let deliveries = d.recipient.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].origin, ORIGIN);
        assert_eq!(deliveries[0].sender, sender());
        assert_eq!(deliveries[0].body, b"one".to_vec());
    }

    #[test]
    fn test_message_processed_at_most_once() {
        let mut d = Deployment::new(1, 1);
        d.dispatch(b"once");
        let signed = d.quorum(1);
        let proof = d.proof(0, 0);
        let bytes = d.message_bytes(0);

        d.inbox.process_with_checkpoint(&signed, &bytes, &proof).unwrap();
        let err = d
            .inbox
            .process_with_checkpoint(&signed, &bytes, &proof)
            .unwrap_err();

        assert!(matches!(err, InboxError::AlreadyProcessed(_)));
        assert_eq!(d.recipient.deliveries().len(), 1);
    }

    #[test]
    fn test_old_leaf_proves_against_newer_checkpoint() {
        let mut d = Deployment::new(1, 1);
        d.dispatch(b"early");
        d.inbox.submit_checkpoint(&d.quorum(1)).unwrap();
        for i in 0..4u8 {
            d.dispatch(&[i]);
        }
        d.inbox.submit_checkpoint(&d.quorum(1)).unwrap();

        // Both the original and the newer root admit leaf 0.
        let against_old = d.proof(0, 0);
        let against_new = d.proof(0, 4);
        assert_ne!(against_old.root(), against_new.root());
        assert!(d.inbox.is_proven(&against_old.root()));
        assert!(d.inbox.is_proven(&against_new.root()));

        let bytes = d.message_bytes(0);
        d.inbox
            .process(&bytes, &against_new.path, against_new.index)
            .unwrap();
        assert_eq!(d.inbox.latest_proven_index(), Some(4));
    }

    // =========================================================================
    // REJECTIONS
    // =========================================================================

    #[test]
    fn test_tampered_body_does_not_prove() {
        let mut d = Deployment::new(1, 1);
        d.dispatch(b"honest");
        d.inbox.submit_checkpoint(&d.quorum(1)).unwrap();
        let proof = d.proof(0, 0);

        let mut message = d.outbox.message(0).unwrap().message.clone();
        message.body = b"forged".to_vec();
        let err = d
            .inbox
            .process(&message.encode(), &proof.path, proof.index)
            .unwrap_err();

        assert!(matches!(err, InboxError::ProofNotProven { .. }));
        assert!(d.recipient.deliveries().is_empty());
    }

    #[test]
    fn test_message_for_other_domain_rejected() {
        let mut d = Deployment::new(1, 1);
        d.outbox
            .dispatch(sender(), DESTINATION + 1, recipient(), b"elsewhere".to_vec())
            .unwrap();
        d.inbox.submit_checkpoint(&d.quorum(1)).unwrap();
        let proof = d.proof(0, 0);

        let err = d
            .inbox
            .process(&d.message_bytes(0), &proof.path, proof.index)
            .unwrap_err();
        assert!(matches!(err, InboxError::WrongDestination { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unenrolled_sender_rejected() {
        let mut d = Deployment::new(1, 1);
        let stranger = H256::repeat_byte(0x55);
        d.outbox
            .dispatch(stranger, DESTINATION, recipient(), b"spam".to_vec())
            .unwrap();
        d.inbox.submit_checkpoint(&d.quorum(1)).unwrap();
        let proof = d.proof(0, 0);

        let err = d
            .inbox
            .process(&d.message_bytes(0), &proof.path, proof.index)
            .unwrap_err();
        assert!(matches!(err, InboxError::UnauthorizedSender { .. }));
    }

    #[test]
    fn test_failed_handler_leaves_message_retryable() {
        let mut d = Deployment::new(1, 1);
        d.dispatch(b"retry me");
        let signed = d.quorum(1);
        let proof = d.proof(0, 0);
        let bytes = d.message_bytes(0);

        d.recipient.set_failing(true);
        let err = d
            .inbox
            .process_with_checkpoint(&signed, &bytes, &proof)
            .unwrap_err();
        assert!(matches!(err, InboxError::HandlerFailed(_)));
        assert!(err.is_retryable());

        let hash = Message::decode(&bytes).unwrap().hash();
        assert_eq!(d.inbox.message_status(&hash), MessageStatus::None);
        // The root stays proven even though delivery failed.
        assert!(d.inbox.is_proven(&signed.root()));

        d.recipient.set_failing(false);
        d.inbox.process_with_checkpoint(&signed, &bytes, &proof).unwrap();
        assert_eq!(d.inbox.message_status(&hash), MessageStatus::Processed);
    }
}
