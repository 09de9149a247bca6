//! # Test Fixtures
//!
//! A single-process deployment of every component: one origin outbox, a
//! validator set, and one destination inbox verified by that set.

use parking_lot::RwLock;
use shared_types::{AccessControl, AdminCapability, Checkpoint, Clock, Domain, ManualClock, H160, H256};
use std::sync::Arc;
use xmp_01_message_codec::CommittedMessage;
use xmp_02_outbox::{MerkleProof, Outbox};
use xmp_03_validator_signer::{MultisigSignedCheckpoint, Validator};
use xmp_04_validator_manager::ValidatorManager;
use xmp_05_inbox::{InMemorySenderRegistry, Inbox, RecipientRegistry, RecordingRecipient};

/// Origin domain used throughout the suite.
pub const ORIGIN: Domain = 1000;

/// Destination domain used throughout the suite.
pub const DESTINATION: Domain = 2000;

/// Recovery timelock of the fixture's access control.
pub const TIMELOCK: u64 = 600;

pub type SharedManager = Arc<RwLock<ValidatorManager>>;

/// `count` validators with keys `[1; 32]`, `[2; 32]`, ... sorted by address.
pub fn validators(count: u8) -> Vec<Validator> {
    let mut validators: Vec<Validator> = (1..=count)
        .map(|byte| Validator::from_hex(&hex::encode([byte; 32]), ORIGIN).unwrap())
        .collect();
    validators.sort_by_key(Validator::address);
    validators
}

/// Enrolled sender.
pub fn sender() -> H256 {
    H256::from(H160::repeat_byte(0xaa))
}

/// Recipient address on the destination.
pub fn recipient() -> H256 {
    H256::repeat_byte(0xbb)
}

pub fn governor() -> H160 {
    H160::repeat_byte(0x60)
}

pub fn recovery_manager() -> H160 {
    H160::repeat_byte(0x70)
}

/// Checkpoint signed by `signers`, signatures in the given order.
pub fn multisig(signers: &[&Validator], checkpoint: Checkpoint) -> MultisigSignedCheckpoint {
    MultisigSignedCheckpoint {
        outbox_domain: ORIGIN,
        checkpoint,
        signatures: signers
            .iter()
            .map(|v| v.sign(checkpoint).unwrap().signature)
            .collect(),
    }
}

/// Outbox, validators and inbox wired together in memory.
pub struct Deployment {
    pub outbox: Outbox,
    pub validators: Vec<Validator>,
    pub manager: SharedManager,
    pub inbox: Inbox<SharedManager>,
    pub senders: Arc<InMemorySenderRegistry>,
    pub recipient: Arc<RecordingRecipient>,
    pub access: AccessControl,
    pub clock: Arc<ManualClock>,
}

impl Deployment {
    /// `count` validators, all enrolled, with quorum `threshold`.
    pub fn new(count: u8, threshold: u32) -> Self {
        let validators = validators(count);
        let manager = Arc::new(RwLock::new(
            ValidatorManager::new(ORIGIN, validators.iter().map(Validator::address), threshold)
                .unwrap(),
        ));
        let senders = Arc::new(InMemorySenderRegistry::new());
        senders.enroll(ORIGIN, sender());
        let recipient = Arc::new(RecordingRecipient::new());
        let inbox = Inbox::new(
            DESTINATION,
            manager.clone(),
            senders.clone(),
            RecipientRegistry::new().with_fallback(recipient.clone()),
        );

        Self {
            outbox: Outbox::new(ORIGIN),
            validators,
            manager,
            inbox,
            senders,
            recipient,
            access: AccessControl::new(governor(), recovery_manager(), TIMELOCK),
            clock: Arc::new(ManualClock::new(10_000)),
        }
    }

    /// Dispatch `body` from the enrolled sender to the destination.
    pub fn dispatch(&mut self, body: &[u8]) -> CommittedMessage {
        self.outbox
            .dispatch(sender(), DESTINATION, recipient(), body.to_vec())
            .unwrap()
    }

    /// Latest outbox checkpoint.
    pub fn checkpoint(&self) -> Checkpoint {
        self.outbox.latest_checkpoint().unwrap()
    }

    /// Latest checkpoint signed by the first `signers` validators.
    pub fn quorum(&self, signers: usize) -> MultisigSignedCheckpoint {
        let refs: Vec<&Validator> = self.validators[..signers].iter().collect();
        multisig(&refs, self.checkpoint())
    }

    /// Proof of `leaf_index` against checkpoint `checkpoint_index`.
    pub fn proof(&self, leaf_index: u32, checkpoint_index: u32) -> MerkleProof {
        self.outbox.prove_against(leaf_index, checkpoint_index).unwrap()
    }

    /// Encoded message at `leaf_index`.
    pub fn message_bytes(&self, leaf_index: u32) -> Vec<u8> {
        self.outbox.message(leaf_index).unwrap().message.encode()
    }

    /// Capability for the current owner.
    pub fn admin(&self) -> AdminCapability {
        let owner = self.access.owner(self.clock.now());
        self.access.authorize(owner, self.clock.now()).unwrap()
    }
}
