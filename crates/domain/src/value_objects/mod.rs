//! Value objects - validated, immutable building blocks for entities.

mod codes;
mod email;
mod names;

pub use codes::{JoinCode, OrderCode, VerificationCode};
pub use email::Email;
pub use names::{ChannelName, MessageBody, OrderName, ReactionValue, WorkspaceName};
