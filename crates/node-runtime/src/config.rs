//! # Node Configuration
//!
//! Unified configuration for the origin outbox, destination inboxes,
//! governance and both agents.
//!
//! ## Loading Order
//!
//! 1. Defaults (`NodeConfig::default()`)
//! 2. JSON file named by `XMP_CONFIG`, if set
//! 3. Environment overrides (`XMP_ORIGIN_DOMAIN`, `XMP_VALIDATOR_KEY`,
//!    `XMP_CHECKPOINT_DIR`, `XMP_POLL_INTERVAL_SECS`, plus the `XMP_*`
//!    telemetry variables)
//! 4. `validate()`
//!
//! ## Security Requirements
//!
//! - Validator keys SHOULD come from `XMP_VALIDATOR_KEY`, not the file
//! - `governor` and `recoveryManager` MUST be set for production

use serde::{Deserialize, Serialize};
use shared_types::{Domain, DEFAULT_RECOVERY_TIMELOCK_SECS, H160, H256};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use xmp_01_message_codec::parse_address;
use xmp_03_validator_signer::{CheckpointSyncerConf, Validator};
use xmp_telemetry::TelemetryConfig;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "XMP_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `NodeConfig`.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Threshold outside `1..=validators`.
    #[error("Invalid threshold {threshold} for {validators} validators")]
    InvalidThreshold {
        /// Configured threshold
        threshold: u32,
        /// Configured validator count
        validators: usize,
    },

    /// No destination domains configured.
    #[error("At least one destination domain is required")]
    NoDestinations,

    /// A domain appears twice (or a destination equals the origin).
    #[error("Duplicate domain {0}")]
    DuplicateDomain(Domain),

    /// Address field does not parse.
    #[error("Invalid address in {field}: {value}")]
    InvalidAddress {
        /// Config field
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Validator key does not parse.
    #[error("Invalid validator key #{index}: {reason}")]
    InvalidKey {
        /// Position in `validator.keys`
        index: usize,
        /// Parse failure
        reason: String,
    },

    /// Environment variable does not parse.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    /// Origin domain and its validator set.
    pub origin: OriginConfig,
    /// Destination domains this node delivers to.
    pub destinations: Vec<DestinationConfig>,
    /// Validator agent configuration.
    pub validator: ValidatorConfig,
    /// Relayer agent configuration.
    pub relayer: RelayerConfig,
    /// Governor and recovery manager.
    pub governance: GovernanceConfig,
    /// State persistence.
    pub storage: StorageConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

/// Origin domain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OriginConfig {
    /// Origin domain id.
    pub domain: Domain,
    /// Enrolled validator addresses (20-byte hex).
    pub validators: Vec<String>,
    /// Signatures required for a quorum.
    pub threshold: u32,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            domain: 1000,
            validators: Vec::new(),
            threshold: 1,
        }
    }
}

/// One destination domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DestinationConfig {
    /// Destination domain id.
    pub domain: Domain,
    /// Origin senders allowed to deliver here (20- or 32-byte hex).
    pub enrolled_senders: Vec<String>,
}

impl DestinationConfig {
    /// Parsed enrolled senders.
    pub fn senders(&self) -> Result<HashSet<H256>, ConfigError> {
        parse_senders("destinations.enrolledSenders", &self.enrolled_senders)
    }
}

/// Validator agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Hex secret keys of validators run by this node.
    pub keys: Vec<String>,
    /// Where signed checkpoints are published. `LocalStorage` paths get one
    /// sub-directory per validator address.
    pub checkpoint_syncer: CheckpointSyncerConf,
    /// Seconds between outbox polls.
    pub interval_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            checkpoint_syncer: CheckpointSyncerConf::LocalStorage {
                path: "./data/checkpoints".to_string(),
            },
            interval_secs: 5,
        }
    }
}

impl ValidatorConfig {
    /// Polling interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Relayer agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelayerConfig {
    /// Whether relayer agents run.
    pub enabled: bool,
    /// Seconds between relay passes.
    pub interval_secs: u64,
    /// If set, only these senders are relayed.
    pub allow_list: Option<Vec<String>>,
    /// Senders never relayed.
    pub deny_list: Vec<String>,
    /// Checkpoint syncers of validators not run by this node, by address.
    pub validator_syncers: BTreeMap<String, CheckpointSyncerConf>,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
            allow_list: None,
            deny_list: Vec::new(),
            validator_syncers: BTreeMap::new(),
        }
    }
}

impl RelayerConfig {
    /// Polling interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Governance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GovernanceConfig {
    /// Initial governor address.
    pub governor: String,
    /// Recovery manager address.
    pub recovery_manager: String,
    /// Delay between initiating and activating recovery.
    pub recovery_timelock_secs: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            governor: format!("{:?}", H160::zero()),
            recovery_manager: format!("{:?}", H160::zero()),
            recovery_timelock_secs: DEFAULT_RECOVERY_TIMELOCK_SECS,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageBackend {
    /// Process memory; state is lost on exit.
    #[default]
    Memory,
    /// RocksDB (feature `rocksdb`).
    RocksDb,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Backend.
    pub backend: StorageBackend,
    /// Database directory for on-disk backends.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: "./data/db".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load from `XMP_CONFIG` (if set) and the process environment, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.telemetry = config.telemetry.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply `XMP_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("XMP_ORIGIN_DOMAIN") {
            self.origin.domain = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "XMP_ORIGIN_DOMAIN",
                value,
            })?;
        }
        if let Some(key) = lookup("XMP_VALIDATOR_KEY") {
            self.validator.keys = vec![key];
        }
        if let Some(path) = lookup("XMP_CHECKPOINT_DIR") {
            self.validator.checkpoint_syncer = CheckpointSyncerConf::LocalStorage { path };
        }
        if let Some(value) = lookup("XMP_POLL_INTERVAL_SECS") {
            let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "XMP_POLL_INTERVAL_SECS",
                value,
            })?;
            self.validator.interval_secs = secs;
            self.relayer.interval_secs = secs;
        }
        Ok(())
    }

    /// Check the configuration is internally consistent.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - threshold is zero or above the validator count
    /// - no destinations are configured
    /// - a domain repeats, or a destination equals the origin
    /// - any address or key fails to parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        let validators = self.origin_validators()?;
        let unique: HashSet<H160> = validators.iter().copied().collect();
        if self.origin.threshold == 0 || self.origin.threshold as usize > unique.len() {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.origin.threshold,
                validators: unique.len(),
            });
        }

        if self.destinations.is_empty() {
            return Err(ConfigError::NoDestinations);
        }
        let mut domains = HashSet::from([self.origin.domain]);
        for destination in &self.destinations {
            if !domains.insert(destination.domain) {
                return Err(ConfigError::DuplicateDomain(destination.domain));
            }
            destination.senders()?;
        }

        self.validators()?;
        self.sender_policy()?;
        self.remote_syncers()?;
        self.governor()?;
        self.recovery_manager()?;
        Ok(())
    }

    /// Enrolled validator addresses of the origin.
    pub fn origin_validators(&self) -> Result<Vec<H160>, ConfigError> {
        self.origin
            .validators
            .iter()
            .map(|v| parse_h160("origin.validators", v))
            .collect()
    }

    /// Signers for every configured key.
    pub fn validators(&self) -> Result<Vec<Validator>, ConfigError> {
        self.validator
            .keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                Validator::from_hex(key, self.origin.domain).map_err(|e| ConfigError::InvalidKey {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Relayer allow and deny lists.
    pub fn sender_policy(&self) -> Result<SenderPolicy, ConfigError> {
        let allow = self
            .relayer
            .allow_list
            .as_deref()
            .map(|list| parse_senders("relayer.allowList", list))
            .transpose()?;
        let deny = parse_senders("relayer.denyList", &self.relayer.deny_list)?;
        Ok(SenderPolicy { allow, deny })
    }

    /// Syncers of validators run elsewhere.
    pub fn remote_syncers(&self) -> Result<BTreeMap<H160, CheckpointSyncerConf>, ConfigError> {
        self.relayer
            .validator_syncers
            .iter()
            .map(|(address, conf)| {
                Ok((parse_h160("relayer.validatorSyncers", address)?, conf.clone()))
            })
            .collect()
    }

    /// Governor address.
    pub fn governor(&self) -> Result<H160, ConfigError> {
        parse_h160("governance.governor", &self.governance.governor)
    }

    /// Recovery manager address.
    pub fn recovery_manager(&self) -> Result<H160, ConfigError> {
        parse_h160("governance.recoveryManager", &self.governance.recovery_manager)
    }
}

/// Which senders a relayer forwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderPolicy {
    /// Only these, when set.
    pub allow: Option<HashSet<H256>>,
    /// Never these.
    pub deny: HashSet<H256>,
}

impl SenderPolicy {
    /// Whether messages from `sender` are relayed.
    pub fn permits(&self, sender: &H256) -> bool {
        if self.deny.contains(sender) {
            return false;
        }
        self.allow
            .as_ref()
            .map_or(true, |allow| allow.contains(sender))
    }
}

fn parse_h160(field: &'static str, value: &str) -> Result<H160, ConfigError> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    match hex::decode(stripped) {
        Ok(bytes) if bytes.len() == 20 => Ok(H160::from_slice(&bytes)),
        _ => Err(ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_senders(field: &'static str, values: &[String]) -> Result<HashSet<H256>, ConfigError> {
    values
        .iter()
        .map(|value| {
            parse_address(value).map_err(|_| ConfigError::InvalidAddress {
                field,
                value: value.clone(),
            })
        })
        .collect()
}
