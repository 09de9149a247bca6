//! # Agent Integration
//!
//! `NodeRuntime` with live validator, fetcher and relayer tasks over a
//! filesystem checkpoint syncer.

#[cfg(test)]
mod tests {
    use crate::fixtures::{governor, recipient, recovery_manager, sender, validators};
    use node_runtime::config::{DestinationConfig, OriginConfig};
    use node_runtime::{NodeConfig, NodeRuntime, SharedStore};
    use parking_lot::Mutex;
    use shared_types::{InMemoryKVStore, ManualClock, H160};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use xmp_03_validator_signer::{CheckpointSyncerConf, Validator};
    use xmp_05_inbox::{RecipientRegistry, RecordingRecipient};

    const ORIGIN: u32 = 1000;
    const DEST_A: u32 = 2000;
    const DEST_B: u32 = 3000;

    fn config(checkpoints: &Path) -> NodeConfig {
        let keys: Vec<String> = (1..=2u8).map(|b| hex::encode([b; 32])).collect();
        let addresses: Vec<String> = validators(2)
            .iter()
            .map(|v: &Validator| format!("{:?}", v.address()))
            .collect();
        let enrolled = vec![format!("{:?}", H160::repeat_byte(0xaa))];

        let mut config = NodeConfig {
            origin: OriginConfig {
                domain: ORIGIN,
                validators: addresses,
                threshold: 2,
            },
            destinations: vec![
                DestinationConfig {
                    domain: DEST_A,
                    enrolled_senders: enrolled.clone(),
                },
                DestinationConfig {
                    domain: DEST_B,
                    enrolled_senders: enrolled,
                },
            ],
            ..NodeConfig::default()
        };
        config.validator.keys = keys;
        config.validator.checkpoint_syncer = CheckpointSyncerConf::LocalStorage {
            path: checkpoints.to_string_lossy().into_owned(),
        };
        config.validator.interval_secs = 1;
        config.relayer.interval_secs = 1;
        config.governance.governor = format!("{:?}", governor());
        config.governance.recovery_manager = format!("{:?}", recovery_manager());
        config.telemetry.metrics_port = 0;
        config
    }

    fn runtime(config: NodeConfig, store: SharedStore) -> NodeRuntime {
        NodeRuntime::with_store(config, store, Arc::new(ManualClock::new(0))).unwrap()
    }

    fn recording(runtime: &NodeRuntime, domain: u32) -> Arc<RecordingRecipient> {
        let recipient = Arc::new(RecordingRecipient::new());
        runtime
            .set_recipients(domain, RecipientRegistry::new().with_fallback(recipient.clone()))
            .unwrap();
        recipient
    }

    async fn wait_for(mut done: impl FnMut() -> bool) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    #[tokio::test]
    async fn test_messages_reach_their_destination_only() {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedStore = Arc::new(Mutex::new(InMemoryKVStore::new()));
        let node = runtime(config(dir.path()), store);
        let at_a = recording(&node, DEST_A);
        let at_b = recording(&node, DEST_B);
        node.start().await.unwrap();

        node.dispatch(sender(), DEST_A, recipient(), b"to a".to_vec())
            .unwrap();
        node.dispatch(sender(), DEST_B, recipient(), b"to b".to_vec())
            .unwrap();
        node.dispatch(sender(), DEST_A, recipient(), b"to a again".to_vec())
            .unwrap();

        wait_for(|| at_a.deliveries().len() == 2 && at_b.deliveries().len() == 1).await;
        node.shutdown().await.unwrap();

        let bodies: Vec<_> = at_a.deliveries().into_iter().map(|d| d.body).collect();
        assert_eq!(bodies, vec![b"to a".to_vec(), b"to a again".to_vec()]);
        assert_eq!(at_b.deliveries()[0].body, b"to b".to_vec());

        // Each local validator wrote its own checkpoint directory.
        for validator in validators(2) {
            assert!(dir.path().join(format!("{:?}", validator.address())).is_dir());
        }
    }

    #[tokio::test]
    async fn test_restart_does_not_redeliver() {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedStore = Arc::new(Mutex::new(InMemoryKVStore::new()));

        {
            let node = runtime(config(dir.path()), store.clone());
            let at_a = recording(&node, DEST_A);
            node.start().await.unwrap();
            node.dispatch(sender(), DEST_A, recipient(), b"first".to_vec())
                .unwrap();
            wait_for(|| at_a.deliveries().len() == 1).await;
            node.shutdown().await.unwrap();
            assert_eq!(at_a.deliveries().len(), 1);
        }

        let node = runtime(config(dir.path()), store);
        let at_a = recording(&node, DEST_A);
        assert_eq!(node.status().dispatched, 1);
        assert_eq!(node.status().inboxes.get(&DEST_A), Some(&Some(0)));

        node.start().await.unwrap();
        node.dispatch(sender(), DEST_A, recipient(), b"second".to_vec())
            .unwrap();
        wait_for(|| !at_a.deliveries().is_empty()).await;
        node.shutdown().await.unwrap();

        let bodies: Vec<_> = at_a.deliveries().into_iter().map(|d| d.body).collect();
        assert_eq!(bodies, vec![b"second".to_vec()]);
    }

    #[tokio::test]
    async fn test_crash_after_delivery_does_not_redeliver() {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedStore = Arc::new(Mutex::new(InMemoryKVStore::new()));

        {
            let node = runtime(config(dir.path()), store.clone());
            let at_a = recording(&node, DEST_A);
            node.start().await.unwrap();
            node.dispatch(sender(), DEST_A, recipient(), b"first".to_vec())
                .unwrap();
            wait_for(|| at_a.deliveries().len() == 1).await;
            // Dropped without shutdown or persist.
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Crash between the delivery and the cursor write.
        store
            .lock()
            .delete(format!("relayer/{ORIGIN}/{DEST_A}/cursor").as_bytes())
            .unwrap();

        let node = runtime(config(dir.path()), store);
        let at_a = recording(&node, DEST_A);
        assert_eq!(node.status().dispatched, 1);
        assert_eq!(node.status().inboxes.get(&DEST_A), Some(&Some(0)));

        node.start().await.unwrap();
        node.dispatch(sender(), DEST_A, recipient(), b"second".to_vec())
            .unwrap();
        wait_for(|| !at_a.deliveries().is_empty()).await;
        node.shutdown().await.unwrap();

        let bodies: Vec<_> = at_a.deliveries().into_iter().map(|d| d.body).collect();
        assert_eq!(bodies, vec![b"second".to_vec()]);
    }

    #[tokio::test]
    async fn test_unenrolled_sender_never_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedStore = Arc::new(Mutex::new(InMemoryKVStore::new()));
        let node = runtime(config(dir.path()), store);
        let at_a = recording(&node, DEST_A);
        node.start().await.unwrap();

        let stranger = shared_types::H256::repeat_byte(0x55);
        node.dispatch(stranger, DEST_A, recipient(), b"spam".to_vec())
            .unwrap();
        node.dispatch(sender(), DEST_A, recipient(), b"legit".to_vec())
            .unwrap();

        wait_for(|| !at_a.deliveries().is_empty()).await;
        node.shutdown().await.unwrap();

        let deliveries = at_a.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].body, b"legit".to_vec());
    }
}
