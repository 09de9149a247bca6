//! # Node Runtime
//!
//! Owns every component of one origin and the destinations it serves, and
//! the tasks that move data between them.
//!
//! ## Startup Sequence
//!
//! 1. Open the store and restore the outbox, validator set and inboxes
//! 2. Build one checkpoint syncer per local validator key
//! 3. `start()` spawns the validator agents, the checkpoint fetcher, one
//!    relayer per destination and the admin endpoint
//!
//! ## Shutdown Sequence
//!
//! 1. Flip the shutdown channel
//! 2. Wait (bounded) for every task to return
//! 3. Persist all component state
//!
//! ## Persistence
//!
//! Every state change reachable from the public API is written to the store
//! before the call returns: dispatches, deliveries, validator set and sender
//! registry changes. Component locks are always taken before the store lock.

use crate::adapters::{
    admin_router, in_memory_store, open_store, serve_admin, LoggingRecipient, NodeStatus,
    SharedStore, StatusSource,
};
use crate::agents::{CheckpointFetcher, MessageIndex, RelayerAgent, SharedInbox, ValidatorAgent};
use crate::config::{ConfigError, NodeConfig};
use parking_lot::{Mutex, RwLock};
use shared_types::{
    AccessControl, AccessError, AdminCapability, Clock, Domain, StorageError, SystemClock,
    VersionedRecord, H160, H256,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use xmp_01_message_codec::CommittedMessage;
use xmp_02_outbox::{MerkleProof, Outbox, OutboxError};
use xmp_03_validator_signer::{
    CheckpointSyncer, CheckpointSyncerConf, MultisigCheckpointSyncer, MultisigSignedCheckpoint,
    Validator,
};
use xmp_04_validator_manager::{ValidatorManager, ValidatorManagerError, ValidatorManagerEvent};
use xmp_05_inbox::{InMemorySenderRegistry, Inbox, InboxError, RecipientRegistry};
use xmp_telemetry::{metric_inc, MESSAGES_DISPATCHED};

/// How long shutdown waits for each task.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const SENDERS_KEY_PREFIX: &str = "senders/";

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Caller may not perform the operation.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Outbox rejected the operation.
    #[error(transparent)]
    Outbox(#[from] OutboxError),

    /// Validator set change rejected.
    #[error(transparent)]
    ValidatorManager(#[from] ValidatorManagerError),

    /// Inbox rejected the operation.
    #[error(transparent)]
    Inbox(#[from] InboxError),

    /// No inbox for the domain.
    #[error("Unknown destination domain {0}")]
    UnknownDestination(Domain),

    /// `start` was called twice.
    #[error("Runtime already started")]
    AlreadyStarted,
}

/// One origin, its destinations and their agents.
pub struct NodeRuntime {
    config: NodeConfig,
    access: Arc<AccessControl>,
    clock: Arc<dyn Clock>,
    store: SharedStore,
    outbox: Arc<RwLock<Outbox>>,
    validator_manager: Arc<RwLock<ValidatorManager>>,
    inboxes: BTreeMap<Domain, SharedInbox>,
    senders: BTreeMap<Domain, Arc<InMemorySenderRegistry>>,
    local_syncers: BTreeMap<H160, Arc<dyn CheckpointSyncer>>,
    started: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for NodeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRuntime")
            .field("origin", &self.config.origin.domain)
            .field("destinations", &self.inboxes.keys().collect::<Vec<_>>())
            .field("validators", &self.local_syncers.keys().collect::<Vec<_>>())
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish()
    }
}

impl NodeRuntime {
    /// Runtime backed by the configured store and the system clock.
    pub fn new(config: NodeConfig) -> Result<Self, RuntimeError> {
        let store = open_store(&config.storage)?;
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    /// Runtime over an in-memory store.
    pub fn in_memory(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, RuntimeError> {
        Self::with_store(config, in_memory_store(), clock)
    }

    /// Runtime over `store`, restoring whatever state it holds.
    pub fn with_store(
        config: NodeConfig,
        store: SharedStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;
        let origin = config.origin.domain;
        info!(origin, destinations = config.destinations.len(), "Creating XMP node runtime");

        let access = Arc::new(AccessControl::new(
            config.governor()?,
            config.recovery_manager()?,
            config.governance.recovery_timelock_secs,
        ));

        let (outbox, validator_manager) = {
            let guard = store.lock();
            let outbox = Outbox::load(&*guard, origin)?;
            let manager = match ValidatorManager::load(&*guard, origin)? {
                Some(manager) => {
                    info!(
                        origin,
                        validators = manager.validator_count(),
                        threshold = manager.threshold(),
                        "Validator set restored"
                    );
                    manager
                }
                None => ValidatorManager::new(
                    origin,
                    config.origin_validators()?,
                    config.origin.threshold,
                )?,
            };
            (outbox, manager)
        };
        if outbox.count() > 0 {
            info!(origin, count = outbox.count(), root = ?outbox.root(), "Outbox restored");
        }
        let outbox = Arc::new(RwLock::new(outbox));
        let validator_manager = Arc::new(RwLock::new(validator_manager));

        let mut inboxes = BTreeMap::new();
        let mut senders = BTreeMap::new();
        for destination in &config.destinations {
            let registry = Arc::new(InMemorySenderRegistry::new());
            let key = senders_key(origin, destination.domain);
            let stored = VersionedRecord::load::<Vec<H256>>(&*store.lock(), key.as_bytes())?;
            let enrolled = match stored {
                Some(stored) => {
                    info!(
                        destination = destination.domain,
                        senders = stored.len(),
                        "Sender registry restored"
                    );
                    stored
                }
                None => destination.senders()?.into_iter().collect(),
            };
            for sender in enrolled {
                registry.enroll(origin, sender);
            }
            let mut inbox = Inbox::new(
                destination.domain,
                validator_manager.clone(),
                registry.clone(),
                default_recipients(destination.domain),
            );
            if inbox.restore(&*store.lock())? {
                info!(
                    destination = destination.domain,
                    latest_proven = ?inbox.latest_proven_index(),
                    "Inbox restored"
                );
            }
            inboxes.insert(destination.domain, Arc::new(RwLock::new(inbox)));
            senders.insert(destination.domain, registry);
        }

        let local_syncers = config
            .validators()?
            .iter()
            .map(|validator| {
                let address = validator.address();
                (address, local_syncer(&config.validator.checkpoint_syncer, address))
            })
            .collect();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            access,
            clock,
            store,
            outbox,
            validator_manager,
            inboxes,
            senders,
            local_syncers,
            started: AtomicBool::new(false),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Spawn every agent and the admin endpoint.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyStarted);
        }
        info!("===========================================");
        info!("  XMP Node Runtime v{}", crate::VERSION);
        info!("  Origin domain: {}", self.config.origin.domain);
        info!("===========================================");

        let mut tasks = Vec::new();

        for validator in self.config.validators()? {
            let address = validator.address();
            let Some(syncer) = self.local_syncers.get(&address).cloned() else {
                continue;
            };
            let agent = ValidatorAgent::new(
                validator,
                self.outbox.clone(),
                syncer,
                self.config.validator.interval(),
            );
            tasks.push(tokio::spawn(agent.run(self.shutdown_rx.clone())));
        }

        if self.config.relayer.enabled {
            self.spawn_relayers(&mut tasks)?;
        } else {
            info!("Relayer disabled");
        }

        let port = self.config.telemetry.metrics_port;
        if port != 0 {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let router = admin_router(self.status_source());
            let shutdown = self.shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = serve_admin(addr, router, shutdown).await {
                    error!(%addr, error = %e, "Admin endpoint failed");
                }
            }));
        }

        info!(tasks = tasks.len(), "Node runtime started");
        self.tasks.lock().extend(tasks);
        Ok(())
    }

    fn spawn_relayers(&self, tasks: &mut Vec<JoinHandle<()>>) -> Result<(), RuntimeError> {
        let mut syncers = self.local_syncers.clone();
        for (address, conf) in self.config.remote_syncers()? {
            syncers
                .entry(address)
                .or_insert_with(|| Arc::new(conf.build()) as Arc<dyn CheckpointSyncer>);
        }
        let threshold = self.validator_manager.read().threshold() as usize;
        let multisig = match MultisigCheckpointSyncer::new(threshold, syncers) {
            Ok(multisig) => multisig,
            Err(e) => {
                warn!(error = %e, "No quorum of checkpoint syncers, relayers not started");
                return Ok(());
            }
        };

        let interval = self.config.relayer.interval();
        let policy = self.config.sender_policy()?;
        let (fetcher, checkpoints) = CheckpointFetcher::new(multisig, interval);
        tasks.push(tokio::spawn(fetcher.run(self.shutdown_rx.clone())));

        for inbox in self.inboxes.values() {
            let relayer = RelayerAgent::new(
                MessageIndex::new(self.outbox.clone()),
                inbox.clone(),
                checkpoints.clone(),
                policy.clone(),
                self.store.clone(),
                interval,
            )?;
            tasks.push(tokio::spawn(relayer.run(self.shutdown_rx.clone())));
        }
        Ok(())
    }

    /// Stop every task and persist state.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        info!("Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Task panicked during shutdown"),
                Err(_) => warn!("Task did not stop in time"),
            }
        }

        self.persist()?;
        info!("Shutdown complete");
        Ok(())
    }

    /// Receiver that flips to `true` on shutdown.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Write the outbox, validator set and every inbox to the store.
    pub fn persist(&self) -> Result<(), RuntimeError> {
        self.outbox.write().persist(&mut *self.store.lock())?;
        self.validator_manager
            .read()
            .persist(&mut *self.store.lock())?;
        for inbox in self.inboxes.values() {
            inbox.write().persist(&mut *self.store.lock())?;
        }
        Ok(())
    }

    // =========================================================================
    // MESSAGING
    // =========================================================================

    /// Commit a message to the origin outbox.
    pub fn dispatch(
        &self,
        sender: H256,
        destination: Domain,
        recipient: H256,
        body: Vec<u8>,
    ) -> Result<CommittedMessage, RuntimeError> {
        let committed = self.outbox.write().dispatch_persisted(
            &mut *self.store.lock(),
            sender,
            destination,
            recipient,
            body,
        )?;
        let destination = destination.to_string();
        metric_inc!(MESSAGES_DISPATCHED, &[destination.as_str()]);
        Ok(committed)
    }

    /// Deliver `message` to the inbox on `destination` under `signed`.
    ///
    /// The inbox is persisted before its lock is released, whether or not
    /// the delivery succeeded.
    pub fn process_with_checkpoint(
        &self,
        destination: Domain,
        signed: &MultisigSignedCheckpoint,
        message: &[u8],
        proof: &MerkleProof,
    ) -> Result<H256, RuntimeError> {
        let inbox = self.inbox(destination)?;
        let mut inbox = inbox.write();
        let result = inbox.process_with_checkpoint(signed, message, proof);
        inbox.persist(&mut *self.store.lock())?;
        Ok(result?)
    }

    /// Replace the recipient handlers of `destination`.
    pub fn set_recipients(
        &self,
        destination: Domain,
        recipients: RecipientRegistry,
    ) -> Result<(), RuntimeError> {
        self.inbox(destination)?.write().set_recipients(recipients);
        Ok(())
    }

    /// Snapshot for the admin endpoint.
    pub fn status(&self) -> NodeStatus {
        node_status(self.config.origin.domain, &self.outbox, &self.inboxes)
    }

    fn status_source(&self) -> StatusSource {
        let origin = self.config.origin.domain;
        let outbox = self.outbox.clone();
        let inboxes = self.inboxes.clone();
        Arc::new(move || node_status(origin, &outbox, &inboxes))
    }

    // =========================================================================
    // GOVERNANCE
    // =========================================================================

    fn authorize(&self, caller: H160) -> Result<AdminCapability, RuntimeError> {
        Ok(self.access.authorize(caller, self.clock.now())?)
    }

    fn persist_validator_set(&self) -> Result<(), RuntimeError> {
        self.validator_manager
            .read()
            .persist(&mut *self.store.lock())?;
        Ok(())
    }

    /// Enroll `validator` in the origin's validator set.
    pub fn enroll_validator(
        &self,
        caller: H160,
        validator: H160,
    ) -> Result<ValidatorManagerEvent, RuntimeError> {
        let cap = self.authorize(caller)?;
        let event = self.validator_manager.write().enroll_validator(&cap, validator)?;
        self.persist_validator_set()?;
        Ok(event)
    }

    /// Remove `validator` from the origin's validator set.
    pub fn unenroll_validator(
        &self,
        caller: H160,
        validator: H160,
    ) -> Result<ValidatorManagerEvent, RuntimeError> {
        let cap = self.authorize(caller)?;
        let event = self
            .validator_manager
            .write()
            .unenroll_validator(&cap, validator)?;
        self.persist_validator_set()?;
        Ok(event)
    }

    /// Change the quorum threshold.
    pub fn set_quorum_threshold(
        &self,
        caller: H160,
        threshold: u32,
    ) -> Result<ValidatorManagerEvent, RuntimeError> {
        let cap = self.authorize(caller)?;
        let event = self
            .validator_manager
            .write()
            .set_quorum_threshold(&cap, threshold)?;
        self.persist_validator_set()?;
        Ok(event)
    }

    /// Let `sender` deliver to `destination`.
    pub fn enroll_sender(
        &self,
        caller: H160,
        destination: Domain,
        sender: H256,
    ) -> Result<bool, RuntimeError> {
        self.authorize(caller)?;
        let origin = self.config.origin.domain;
        let registry = self.sender_registry(destination)?;
        if !registry.enroll(origin, sender) {
            return Ok(false);
        }
        if let Err(e) = self.persist_senders(destination, &registry) {
            registry.unenroll(origin, sender);
            return Err(e);
        }
        Ok(true)
    }

    /// Stop `sender` delivering to `destination`.
    pub fn unenroll_sender(
        &self,
        caller: H160,
        destination: Domain,
        sender: H256,
    ) -> Result<bool, RuntimeError> {
        self.authorize(caller)?;
        let origin = self.config.origin.domain;
        let registry = self.sender_registry(destination)?;
        if !registry.unenroll(origin, sender) {
            return Ok(false);
        }
        if let Err(e) = self.persist_senders(destination, &registry) {
            registry.enroll(origin, sender);
            return Err(e);
        }
        Ok(true)
    }

    fn persist_senders(
        &self,
        destination: Domain,
        registry: &InMemorySenderRegistry,
    ) -> Result<(), RuntimeError> {
        let origin = self.config.origin.domain;
        let bytes = VersionedRecord::encode(&registry.senders(origin))?;
        self.store
            .lock()
            .put(senders_key(origin, destination).as_bytes(), &bytes)?;
        Ok(())
    }

    /// Permanently stop the outbox accepting messages.
    pub fn fail_outbox(&self, caller: H160) -> Result<(), RuntimeError> {
        let cap = self.authorize(caller)?;
        let mut outbox = self.outbox.write();
        outbox.fail(&cap);
        outbox.persist(&mut *self.store.lock())?;
        Ok(())
    }

    /// Hand governance to `new_governor`.
    pub fn transfer_governor(&self, caller: H160, new_governor: H160) -> Result<(), RuntimeError> {
        let cap = self.authorize(caller)?;
        self.access.transfer_governor(&cap, new_governor);
        Ok(())
    }

    /// Start the recovery timelock. Returns when recovery becomes active.
    pub fn initiate_recovery(&self, caller: H160) -> Result<u64, RuntimeError> {
        Ok(self.access.initiate_recovery(caller, self.clock.now())?)
    }

    /// Return ownership to the governor.
    pub fn exit_recovery(&self, caller: H160) -> Result<(), RuntimeError> {
        Ok(self.access.exit_recovery(caller, self.clock.now())?)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Loaded configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Governance state.
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Origin outbox.
    pub fn outbox(&self) -> Arc<RwLock<Outbox>> {
        self.outbox.clone()
    }

    /// Origin validator set.
    pub fn validator_manager(&self) -> Arc<RwLock<ValidatorManager>> {
        self.validator_manager.clone()
    }

    /// Inbox on `destination`.
    pub fn inbox(&self, destination: Domain) -> Result<SharedInbox, RuntimeError> {
        self.inboxes
            .get(&destination)
            .cloned()
            .ok_or(RuntimeError::UnknownDestination(destination))
    }

    /// Sender registry of `destination`.
    pub fn sender_registry(
        &self,
        destination: Domain,
    ) -> Result<Arc<InMemorySenderRegistry>, RuntimeError> {
        self.senders
            .get(&destination)
            .cloned()
            .ok_or(RuntimeError::UnknownDestination(destination))
    }

    /// Checkpoint syncer of a validator run by this node.
    pub fn local_syncer(&self, validator: &H160) -> Option<Arc<dyn CheckpointSyncer>> {
        self.local_syncers.get(validator).cloned()
    }

    /// Signers for the configured keys.
    pub fn local_validators(&self) -> Result<Vec<Validator>, RuntimeError> {
        Ok(self.config.validators()?)
    }
}

fn senders_key(origin: Domain, destination: Domain) -> String {
    format!("{SENDERS_KEY_PREFIX}{origin}/{destination}")
}

fn default_recipients(destination: Domain) -> RecipientRegistry {
    RecipientRegistry::new().with_fallback(Arc::new(LoggingRecipient::new(destination)))
}

fn local_syncer(conf: &CheckpointSyncerConf, validator: H160) -> Arc<dyn CheckpointSyncer> {
    let conf = match conf {
        CheckpointSyncerConf::LocalStorage { path } => CheckpointSyncerConf::LocalStorage {
            path: Path::new(path)
                .join(format!("{validator:?}"))
                .to_string_lossy()
                .into_owned(),
        },
        other => other.clone(),
    };
    Arc::new(conf.build())
}

fn node_status(
    origin: Domain,
    outbox: &RwLock<Outbox>,
    inboxes: &BTreeMap<Domain, SharedInbox>,
) -> NodeStatus {
    let (outbox_state, dispatched, latest_checkpoint) = {
        let outbox = outbox.read();
        (outbox.state(), outbox.count(), outbox.latest_checkpoint())
    };
    NodeStatus {
        origin,
        outbox_state,
        dispatched,
        latest_checkpoint,
        inboxes: inboxes
            .iter()
            .map(|(domain, inbox)| (*domain, inbox.read().latest_proven_index()))
            .collect(),
    }
}
