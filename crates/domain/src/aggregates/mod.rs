//! Aggregates - entities with encapsulated state and guarded transitions.

pub mod message;
pub mod order;
pub mod workspace;

pub use message::{Message, MessageDraft};
pub use order::{Order, OrderRecord, OrderStatus, MAX_PREPARATION_MINUTES};
pub use workspace::Workspace;
