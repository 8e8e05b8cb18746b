//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area. Use cases check
//! authorization, validate input through domain types and call ports.

pub mod auth;
pub mod chat;
pub mod order;
pub mod upload;

pub use auth::{AuthError, AuthSession, AuthUseCases};
pub use chat::{ChatError, ChatUseCases};
pub use order::{OrderError, OrderUseCases, OrderView};
pub use upload::{UploadError, UploadUseCases};
