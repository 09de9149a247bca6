//! # Domain Module

pub mod entities;
pub mod errors;

pub(crate) use entities::ProvenRootRecord;
pub use entities::MessageStatus;
pub use errors::InboxError;
