//! # Agents
//!
//! Off-chain loops that move data between the components.
//!
//! ```text
//! Outbox ──latest_checkpoint──→ ValidatorAgent ──SignedCheckpoint──→ CheckpointSyncer
//!    │                                                                     │
//!    │ DispatchEvent                                   MultisigCheckpointSyncer
//!    ↓                                                                     ↓
//! MessageIndex ──CommittedMessage──→ RelayerAgent ←──quorum──── CheckpointFetcher
//!                                        │
//!                                        ↓ process_with_checkpoint
//!                                      Inbox
//! ```
//!
//! Every agent exposes a single-step `tick` for tests and a `run` loop that
//! ticks on an interval until the shutdown channel flips.

pub mod checkpoint_fetcher;
pub mod indexer;
pub mod relayer;
pub mod validator;

pub use checkpoint_fetcher::CheckpointFetcher;
pub use indexer::MessageIndex;
pub use relayer::{RelayError, RelayReport, RelayerAgent, SharedInbox};
pub use validator::ValidatorAgent;
