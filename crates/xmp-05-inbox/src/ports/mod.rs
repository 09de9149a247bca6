//! # Ports

pub mod inbound;
pub mod outbound;

pub use inbound::InboxApi;
pub use outbound::{
    Delivery, InMemorySenderRegistry, MessageRecipient, RecipientRegistry, RecordingRecipient,
    SenderRegistry,
};
