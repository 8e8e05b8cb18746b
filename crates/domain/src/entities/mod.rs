//! Plain records without behaviour worth guarding behind accessors.

mod channel;
mod conversation;
mod member;
mod reaction;
mod session;
mod user;

pub use channel::{Channel, DEFAULT_CHANNEL_NAME};
pub use conversation::Conversation;
pub use member::{Member, MemberRole};
pub use reaction::{summarize_reactions, Reaction, ReactionSummary};
pub use session::{PendingVerification, Session};
pub use user::{User, UserProfile};
