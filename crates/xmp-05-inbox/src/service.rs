//! # Inbox Service
//!
//! Per-(origin, destination) delivery log.
//!
//! ## Processing Order
//!
//! 1. Decode the message and hash it.
//! 2. Fold the proof from the leaf to a candidate root.
//! 3. Candidate root must be proven (`ProofNotProven`).
//! 4. Status must be `None` (`AlreadyProcessed`).
//! 5. Destination, origin and sender enrollment are checked.
//! 6. Status becomes `Pending` and the recipient handler runs.
//! 7. Success moves to `Processed`; failure restores `None`.
//!
//! ## Persistence
//!
//! Every newly proven root and every processed message is queued as one
//! record in a write journal. `persist` flushes the journal as a single
//! atomic batch, so its cost follows the number of changes, not the size of
//! the inbox. A failed flush keeps the journal for the next attempt.
//!
//! ```text
//! inbox/{origin}/{destination}/root/{root}       -> (root, index)
//! inbox/{origin}/{destination}/processed/{leaf}  -> leaf
//! ```

use crate::domain::{InboxError, MessageStatus, ProvenRootRecord};
use crate::ports::{InboxApi, RecipientRegistry, SenderRegistry};
use shared_types::{BatchOperation, Domain, KeyValueStore, VersionedRecord, H256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use xmp_01_message_codec::Message;
use xmp_02_outbox::{IncrementalMerkle, MerkleProof, TREE_DEPTH};
use xmp_03_validator_signer::MultisigSignedCheckpoint;
use xmp_04_validator_manager::CheckpointVerifier;

const KEY_PREFIX: &str = "inbox/";

/// Inbox for messages from one origin to this domain.
pub struct Inbox<V: CheckpointVerifier> {
    local_domain: Domain,
    remote_domain: Domain,
    verifier: V,
    senders: Arc<dyn SenderRegistry>,
    recipients: RecipientRegistry,
    proven_roots: HashMap<H256, u32>,
    status: HashMap<H256, MessageStatus>,
    journal: Vec<Change>,
}

/// State change not yet written to the store.
#[derive(Debug, Clone, Copy)]
enum Change {
    Proven(ProvenRootRecord),
    Processed(H256),
}

impl<V: CheckpointVerifier> std::fmt::Debug for Inbox<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbox")
            .field("local_domain", &self.local_domain)
            .field("remote_domain", &self.remote_domain)
            .field("proven_roots", &self.proven_roots.len())
            .field("messages", &self.status.len())
            .field("unpersisted", &self.journal.len())
            .finish()
    }
}

impl<V: CheckpointVerifier> Inbox<V> {
    /// Inbox on `local_domain` for checkpoints verified by `verifier`.
    pub fn new(
        local_domain: Domain,
        verifier: V,
        senders: Arc<dyn SenderRegistry>,
        recipients: RecipientRegistry,
    ) -> Self {
        let remote_domain = verifier.outbox_domain();
        Self {
            local_domain,
            remote_domain,
            verifier,
            senders,
            recipients,
            proven_roots: HashMap::new(),
            status: HashMap::new(),
            journal: Vec::new(),
        }
    }

    /// Domain messages are delivered on.
    pub fn local_domain(&self) -> Domain {
        self.local_domain
    }

    /// Origin domain this inbox serves.
    pub fn remote_domain(&self) -> Domain {
        self.remote_domain
    }

    /// Quorum verifier.
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Replace the recipient handlers.
    pub fn set_recipients(&mut self, recipients: RecipientRegistry) {
        self.recipients = recipients;
    }

    /// Record a quorum-signed root as proven.
    pub fn submit_checkpoint(
        &mut self,
        signed: &MultisigSignedCheckpoint,
    ) -> Result<(), InboxError> {
        if signed.outbox_domain != self.remote_domain {
            return Err(InboxError::CheckpointDomainMismatch {
                expected: self.remote_domain,
                actual: signed.outbox_domain,
            });
        }

        if !self
            .verifier
            .is_quorum(&signed.checkpoint, &signed.signatures)?
        {
            warn!(
                origin = self.remote_domain,
                index = signed.index(),
                signatures = signed.signatures.len(),
                "Checkpoint rejected: quorum not met"
            );
            return Err(InboxError::QuorumNotMet {
                index: signed.index(),
            });
        }

        if !self.proven_roots.contains_key(&signed.root()) {
            self.proven_roots.insert(signed.root(), signed.index());
            self.journal.push(Change::Proven(ProvenRootRecord {
                root: signed.root(),
                index: signed.index(),
            }));
        }
        info!(
            origin = self.remote_domain,
            destination = self.local_domain,
            index = signed.index(),
            root = ?signed.root(),
            "Checkpoint proven"
        );
        Ok(())
    }

    /// Prove and deliver one message. Returns the message hash.
    pub fn process(
        &mut self,
        message_bytes: &[u8],
        proof: &[H256; TREE_DEPTH],
        proof_index: u32,
    ) -> Result<H256, InboxError> {
        let message = Message::decode(message_bytes)?;
        Message::check_body(&message.body)?;
        let leaf = message.hash();

        let root = IncrementalMerkle::branch_root(leaf, proof, proof_index);
        if !self.proven_roots.contains_key(&root) {
            return Err(InboxError::ProofNotProven { root });
        }

        if self.message_status(&leaf) != MessageStatus::None {
            return Err(InboxError::AlreadyProcessed(leaf));
        }

        if message.destination != self.local_domain {
            return Err(InboxError::WrongDestination {
                expected: self.local_domain,
                actual: message.destination,
            });
        }
        if message.origin != self.remote_domain {
            return Err(InboxError::WrongOrigin {
                expected: self.remote_domain,
                actual: message.origin,
            });
        }
        if !self.senders.is_enrolled(message.origin, message.sender) {
            return Err(InboxError::UnauthorizedSender {
                origin: message.origin,
                sender: message.sender,
            });
        }

        self.status.insert(leaf, MessageStatus::Pending);
        match self.deliver(&message) {
            Ok(()) => {
                self.status.insert(leaf, MessageStatus::Processed);
                self.journal.push(Change::Processed(leaf));
                info!(
                    origin = message.origin,
                    nonce = message.nonce,
                    leaf = ?leaf,
                    "Message processed"
                );
                Ok(leaf)
            }
            Err(reason) => {
                self.status.remove(&leaf);
                warn!(
                    origin = message.origin,
                    nonce = message.nonce,
                    leaf = ?leaf,
                    %reason,
                    "Handler failed, delivery reverted"
                );
                Err(InboxError::HandlerFailed(reason))
            }
        }
    }

    fn deliver(&self, message: &Message) -> Result<(), String> {
        let handler = self
            .recipients
            .resolve(&message.recipient)
            .ok_or_else(|| format!("no handler for recipient {:?}", message.recipient))?;
        handler.handle(message.origin, message.sender, &message.body)
    }

    /// Submit `signed` unless its root is already proven, then process.
    ///
    /// A proven checkpoint stays proven even if processing then fails.
    pub fn process_with_checkpoint(
        &mut self,
        signed: &MultisigSignedCheckpoint,
        message_bytes: &[u8],
        proof: &MerkleProof,
    ) -> Result<H256, InboxError> {
        if !self.is_proven(&signed.root()) {
            self.submit_checkpoint(signed)?;
        } else {
            debug!(index = signed.index(), "Checkpoint already proven");
        }
        self.process(message_bytes, &proof.path, proof.index)
    }

    /// Status of a message hash.
    pub fn message_status(&self, message_hash: &H256) -> MessageStatus {
        self.status.get(message_hash).copied().unwrap_or_default()
    }

    /// Whether `root` is proven.
    pub fn is_proven(&self, root: &H256) -> bool {
        self.proven_roots.contains_key(root)
    }

    /// Checkpoint index a proven root was submitted with.
    pub fn proven_index(&self, root: &H256) -> Option<u32> {
        self.proven_roots.get(root).copied()
    }

    /// Highest proven checkpoint index.
    pub fn latest_proven_index(&self) -> Option<u32> {
        self.proven_roots.values().copied().max()
    }

    /// Number of state changes not yet written to a store.
    pub fn unpersisted(&self) -> usize {
        self.journal.len()
    }

    /// Write every journaled change to `store` in one atomic batch.
    pub fn persist(&mut self, store: &mut dyn KeyValueStore) -> Result<(), InboxError> {
        if self.journal.is_empty() {
            return Ok(());
        }

        let mut operations = Vec::with_capacity(self.journal.len());
        for change in &self.journal {
            let operation = match change {
                Change::Proven(record) => BatchOperation::put(
                    self.key("root", &record.root),
                    VersionedRecord::encode(record)?,
                ),
                Change::Processed(leaf) => BatchOperation::put(
                    self.key("processed", leaf),
                    VersionedRecord::encode(leaf)?,
                ),
            };
            operations.push(operation);
        }
        store.atomic_batch_write(operations)?;

        debug!(
            origin = self.remote_domain,
            destination = self.local_domain,
            changes = self.journal.len(),
            "Inbox persisted"
        );
        self.journal.clear();
        Ok(())
    }

    /// Restore proven roots and processed messages from `store`.
    ///
    /// Returns `false` when nothing was stored.
    pub fn restore(&mut self, store: &dyn KeyValueStore) -> Result<bool, InboxError> {
        let roots = store.prefix_scan(self.prefix("root").as_bytes())?;
        let processed = store.prefix_scan(self.prefix("processed").as_bytes())?;
        if roots.is_empty() && processed.is_empty() {
            return Ok(false);
        }

        self.proven_roots = roots
            .iter()
            .map(|(_, bytes)| {
                VersionedRecord::decode::<ProvenRootRecord>(bytes)
                    .map(|record| (record.root, record.index))
            })
            .collect::<Result<_, _>>()?;
        self.status = processed
            .iter()
            .map(|(_, bytes)| {
                VersionedRecord::decode::<H256>(bytes).map(|leaf| (leaf, MessageStatus::Processed))
            })
            .collect::<Result<_, _>>()?;
        self.journal.clear();

        info!(
            origin = self.remote_domain,
            destination = self.local_domain,
            proven_roots = self.proven_roots.len(),
            processed = self.status.len(),
            "Inbox restored"
        );
        Ok(true)
    }

    fn prefix(&self, kind: &str) -> String {
        format!(
            "{KEY_PREFIX}{}/{}/{kind}/",
            self.remote_domain, self.local_domain
        )
    }

    fn key(&self, kind: &str, hash: &H256) -> String {
        format!("{}{hash:x}", self.prefix(kind))
    }
}

impl<V: CheckpointVerifier> InboxApi for Inbox<V> {
    fn submit_checkpoint(&mut self, signed: &MultisigSignedCheckpoint) -> Result<(), InboxError> {
        Inbox::submit_checkpoint(self, signed)
    }

    fn process(
        &mut self,
        message: &[u8],
        proof: &[H256; TREE_DEPTH],
        proof_index: u32,
    ) -> Result<H256, InboxError> {
        Inbox::process(self, message, proof, proof_index)
    }

    fn process_with_checkpoint(
        &mut self,
        signed: &MultisigSignedCheckpoint,
        message: &[u8],
        proof: &MerkleProof,
    ) -> Result<H256, InboxError> {
        Inbox::process_with_checkpoint(self, signed, message, proof)
    }

    fn message_status(&self, message_hash: &H256) -> MessageStatus {
        Inbox::message_status(self, message_hash)
    }

    fn is_proven(&self, root: &H256) -> bool {
        Inbox::is_proven(self, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InMemorySenderRegistry, RecordingRecipient};
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{InMemoryKVStore, StorageError};
    use xmp_01_message_codec::{CodecError, MAX_MESSAGE_BODY_BYTES};
    use xmp_02_outbox::Outbox;
    use xmp_03_validator_signer::Validator;
    use xmp_04_validator_manager::{ValidatorManager, ValidatorManagerError};

    const ORIGIN: Domain = 1000;
    const LOCAL: Domain = 2000;

    struct Harness {
        outbox: Outbox,
        validators: Vec<Validator>,
        inbox: Inbox<ValidatorManager>,
        recipient: Arc<RecordingRecipient>,
        senders: Arc<InMemorySenderRegistry>,
    }

    fn sender() -> H256 {
        H256::from_low_u64_be(0xaaaa)
    }

    fn recipient_address() -> H256 {
        H256::from_low_u64_be(0xbbbb)
    }

    impl Harness {
        fn new() -> Self {
            let mut validators: Vec<_> = (0..3)
                .map(|_| Validator::new(Secp256k1KeyPair::generate(), ORIGIN))
                .collect();
            validators.sort_by_key(|v| v.address());

            let manager =
                ValidatorManager::new(ORIGIN, validators.iter().map(|v| v.address()), 2).unwrap();

            let senders = Arc::new(InMemorySenderRegistry::new());
            senders.enroll(ORIGIN, sender());

            let recipient = Arc::new(RecordingRecipient::new());
            let mut recipients = RecipientRegistry::new();
            recipients.register(recipient_address(), recipient.clone());

            Self {
                outbox: Outbox::new(ORIGIN),
                validators,
                inbox: Inbox::new(LOCAL, manager, senders.clone(), recipients),
                recipient,
                senders,
            }
        }

        fn dispatch(&mut self, body: &[u8]) -> Vec<u8> {
            self.outbox
                .dispatch(sender(), LOCAL, recipient_address(), body.to_vec())
                .unwrap()
                .message
                .encode()
        }

        fn checkpoint(&self, signers: &[usize]) -> MultisigSignedCheckpoint {
            let checkpoint = self.outbox.latest_checkpoint().unwrap();
            MultisigSignedCheckpoint {
                outbox_domain: ORIGIN,
                checkpoint,
                signatures: signers
                    .iter()
                    .map(|i| self.validators[*i].sign(checkpoint).unwrap().signature)
                    .collect(),
            }
        }

        fn proof(&self, leaf_index: u32) -> MerkleProof {
            let index = self.outbox.latest_checkpoint().unwrap().index;
            self.outbox.prove_against(leaf_index, index).unwrap()
        }
    }

    #[test]
    fn test_proof_before_checkpoint_then_after() {
        let mut h = Harness::new();
        h.dispatch(b"zero");
        let message = h.dispatch(b"one");
        h.dispatch(b"two");
        let proof = h.proof(1);

        let early = h.inbox.process(&message, &proof.path, proof.index);
        assert!(matches!(early, Err(InboxError::ProofNotProven { .. })));

        let signed = h.checkpoint(&[0, 1]);

        h.inbox.submit_checkpoint(&signed).unwrap();
        let hash = h.inbox.process(&message, &proof.path, proof.index).unwrap();

        assert_eq!(h.inbox.message_status(&hash), MessageStatus::Processed);
        assert_eq!(h.recipient.deliveries().len(), 1);
        assert_eq!(h.recipient.deliveries()[0].body, b"one".to_vec());
    }

    #[test]
    fn test_exactly_once() {
        let mut h = Harness::new();
        let message = h.dispatch(b"once");
        let signed = h.checkpoint(&[0, 2]);
        h.inbox.submit_checkpoint(&signed).unwrap();
        let proof = h.proof(0);

        let hash = h.inbox.process(&message, &proof.path, proof.index).unwrap();
        let again = h.inbox.process(&message, &proof.path, proof.index);

        assert_eq!(again, Err(InboxError::AlreadyProcessed(hash)));
        assert_eq!(h.inbox.message_status(&hash), MessageStatus::Processed);
        assert_eq!(h.recipient.deliveries().len(), 1);
    }

    #[test]
    fn test_quorum_not_met_changes_nothing() {
        let mut h = Harness::new();
        h.dispatch(b"x");
        let signed = h.checkpoint(&[0]);

        assert_eq!(
            h.inbox.submit_checkpoint(&signed),
            Err(InboxError::QuorumNotMet { index: 0 })
        );
        assert!(!h.inbox.is_proven(&signed.root()));
        assert_eq!(h.inbox.latest_proven_index(), None);
    }

    #[test]
    fn test_unsorted_signatures_rejected() {
        let mut h = Harness::new();
        h.dispatch(b"x");

        let reversed = h.checkpoint(&[1, 0]);
        assert_eq!(
            h.inbox.submit_checkpoint(&reversed),
            Err(InboxError::Quorum(ValidatorManagerError::UnsortedSigners {
                position: 1
            }))
        );
    }

    #[test]
    fn test_checkpoint_from_other_domain_rejected() {
        let mut h = Harness::new();
        h.dispatch(b"x");
        let mut signed = h.checkpoint(&[0, 1]);
        signed.outbox_domain = 3000;

        assert_eq!(
            h.inbox.submit_checkpoint(&signed),
            Err(InboxError::CheckpointDomainMismatch {
                expected: ORIGIN,
                actual: 3000,
            })
        );
    }

    #[test]
    fn test_handler_failure_rolls_back() {
        let mut h = Harness::new();
        let message = h.dispatch(b"retry me");
        let signed = h.checkpoint(&[0, 1]);
        h.inbox.submit_checkpoint(&signed).unwrap();
        let proof = h.proof(0);
        let leaf = Message::decode(&message).unwrap().hash();

        h.recipient.set_failing(true);
        let failed = h.inbox.process(&message, &proof.path, proof.index);
        assert!(matches!(failed, Err(InboxError::HandlerFailed(_))));
        assert_eq!(h.inbox.message_status(&leaf), MessageStatus::None);

        h.recipient.set_failing(false);
        assert_eq!(h.inbox.process(&message, &proof.path, proof.index), Ok(leaf));
        assert_eq!(h.inbox.message_status(&leaf), MessageStatus::Processed);
    }

    #[test]
    fn test_unauthorized_sender() {
        let mut h = Harness::new();
        let message = h.dispatch(b"x");
        let signed = h.checkpoint(&[0, 1]);
        h.inbox.submit_checkpoint(&signed).unwrap();
        h.senders.unenroll(ORIGIN, sender());
        let proof = h.proof(0);

        assert_eq!(
            h.inbox.process(&message, &proof.path, proof.index),
            Err(InboxError::UnauthorizedSender {
                origin: ORIGIN,
                sender: sender(),
            })
        );
        assert!(h.recipient.deliveries().is_empty());
    }

    #[test]
    fn test_wrong_destination() {
        let mut h = Harness::new();
        let message = h
            .outbox
            .dispatch(sender(), 4000, recipient_address(), b"elsewhere".to_vec())
            .unwrap()
            .message
            .encode();
        let signed = h.checkpoint(&[0, 1]);
        h.inbox.submit_checkpoint(&signed).unwrap();
        let proof = h.proof(0);

        assert_eq!(
            h.inbox.process(&message, &proof.path, proof.index),
            Err(InboxError::WrongDestination {
                expected: LOCAL,
                actual: 4000,
            })
        );
    }

    #[test]
    fn test_malformed_message() {
        let mut h = Harness::new();
        let result = h.inbox.process(&[0u8; 10], &[H256::zero(); TREE_DEPTH], 0);
        assert_eq!(
            result,
            Err(InboxError::Codec(CodecError::MalformedMessage { len: 10, min: 76 }))
        );
    }

    #[test]
    fn test_tampered_proof_not_proven() {
        let mut h = Harness::new();
        let message = h.dispatch(b"a");
        h.dispatch(b"b");
        let signed = h.checkpoint(&[0, 1]);
        h.inbox.submit_checkpoint(&signed).unwrap();
        let mut proof = h.proof(0);
        proof.path[0] = H256::repeat_byte(0xff);

        assert!(matches!(
            h.inbox.process(&message, &proof.path, proof.index),
            Err(InboxError::ProofNotProven { .. })
        ));
    }

    #[test]
    fn test_process_with_checkpoint_single_call() {
        let mut h = Harness::new();
        h.dispatch(b"a");
        let message = h.dispatch(b"b");
        let signed = h.checkpoint(&[1, 2]);
        let proof = h.proof(1);

        let hash = h
            .inbox
            .process_with_checkpoint(&signed, &message, &proof)
            .unwrap();
        assert!(h.inbox.is_proven(&signed.root()));
        assert_eq!(h.inbox.proven_index(&signed.root()), Some(1));
        assert_eq!(h.inbox.message_status(&hash), MessageStatus::Processed);

        // Root already proven: the checkpoint is not re-verified.
        let stale = h.inbox.process_with_checkpoint(&signed, &message, &proof);
        assert_eq!(stale, Err(InboxError::AlreadyProcessed(hash)));
    }

    #[test]
    fn test_checkpoints_accepted_out_of_order() {
        let mut h = Harness::new();
        h.dispatch(b"a");
        let early = h.checkpoint(&[0, 1]);
        h.dispatch(b"b");
        let late = h.checkpoint(&[0, 1]);

        h.inbox.submit_checkpoint(&late).unwrap();
        h.inbox.submit_checkpoint(&early).unwrap();

        assert!(h.inbox.is_proven(&early.root()));
        assert!(h.inbox.is_proven(&late.root()));
        assert_eq!(h.inbox.latest_proven_index(), Some(1));
    }

    #[test]
    fn test_persist_and_restore() {
        let mut store = InMemoryKVStore::new();
        let mut h = Harness::new();
        let message = h.dispatch(b"persisted");
        let signed = h.checkpoint(&[0, 1]);
        let proof = h.proof(0);
        let hash = h
            .inbox
            .process_with_checkpoint(&signed, &message, &proof)
            .unwrap();
        assert_eq!(h.inbox.unpersisted(), 2);
        h.inbox.persist(&mut store).unwrap();
        assert_eq!(h.inbox.unpersisted(), 0);

        let mut fresh = Harness::new();
        assert!(fresh.inbox.restore(&store).unwrap());
        assert!(fresh.inbox.is_proven(&signed.root()));
        assert_eq!(fresh.inbox.proven_index(&signed.root()), Some(0));
        assert_eq!(fresh.inbox.message_status(&hash), MessageStatus::Processed);

        let empty = InMemoryKVStore::new();
        assert!(!fresh.inbox.restore(&empty).unwrap());
    }

    #[test]
    fn test_persist_writes_only_new_changes() {
        let mut store = InMemoryKVStore::new();
        let mut h = Harness::new();
        let first = h.dispatch(b"a");
        let signed = h.checkpoint(&[0, 1]);
        let proof = h.proof(0);
        h.inbox
            .process_with_checkpoint(&signed, &first, &proof)
            .unwrap();
        h.inbox.persist(&mut store).unwrap();
        assert_eq!(store.len(), 2);

        // Nothing new: no writes.
        h.inbox.persist(&mut store).unwrap();
        assert_eq!(store.len(), 2);

        let second = h.dispatch(b"b");
        let signed = h.checkpoint(&[0, 1]);
        let proof = h.proof(1);
        h.inbox
            .process_with_checkpoint(&signed, &second, &proof)
            .unwrap();
        assert_eq!(h.inbox.unpersisted(), 2);
        h.inbox.persist(&mut store).unwrap();
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_failed_handler_journals_only_the_root() {
        let mut h = Harness::new();
        let message = h.dispatch(b"x");
        let signed = h.checkpoint(&[0, 1]);
        let proof = h.proof(0);

        h.recipient.set_failing(true);
        assert!(h
            .inbox
            .process_with_checkpoint(&signed, &message, &proof)
            .is_err());
        assert_eq!(h.inbox.unpersisted(), 1);

        let mut store = InMemoryKVStore::new();
        h.inbox.persist(&mut store).unwrap();
        let mut fresh = Harness::new();
        fresh.inbox.restore(&store).unwrap();
        assert!(fresh.inbox.is_proven(&signed.root()));
        let leaf = Message::decode(&message).unwrap().hash();
        assert_eq!(fresh.inbox.message_status(&leaf), MessageStatus::None);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }
        fn put(&mut self, _: &[u8], _: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::DatabaseError("disk full".into()))
        }
        fn delete(&mut self, _: &[u8]) -> Result<(), StorageError> {
            Ok(())
        }
        fn atomic_batch_write(&mut self, _: Vec<BatchOperation>) -> Result<(), StorageError> {
            Err(StorageError::DatabaseError("disk full".into()))
        }
        fn exists(&self, _: &[u8]) -> Result<bool, StorageError> {
            Ok(false)
        }
        fn prefix_scan(&self, _: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_failed_persist_keeps_journal() {
        let mut h = Harness::new();
        let message = h.dispatch(b"x");
        let signed = h.checkpoint(&[0, 1]);
        let proof = h.proof(0);
        h.inbox
            .process_with_checkpoint(&signed, &message, &proof)
            .unwrap();

        let err = h.inbox.persist(&mut FailingStore).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(h.inbox.unpersisted(), 2);

        let mut store = InMemoryKVStore::new();
        h.inbox.persist(&mut store).unwrap();
        assert_eq!(h.inbox.unpersisted(), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_oversized_body_rejected() {
        let mut h = Harness::new();
        let message = Message {
            origin: ORIGIN,
            sender: sender(),
            nonce: 0,
            destination: LOCAL,
            recipient: recipient_address(),
            body: vec![0u8; MAX_MESSAGE_BODY_BYTES + 1],
        };

        let result = h
            .inbox
            .process(&message.encode(), &[H256::zero(); TREE_DEPTH], 0);
        assert_eq!(
            result,
            Err(InboxError::Codec(CodecError::BodyTooLong {
                len: MAX_MESSAGE_BODY_BYTES + 1,
                max: MAX_MESSAGE_BODY_BYTES,
            }))
        );
        assert!(h.recipient.deliveries().is_empty());
    }
}
