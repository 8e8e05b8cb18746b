//! Grupa server library.
//!
//! Team chat (workspaces, channels, direct conversations, threads and
//! reactions) plus pickup-order tracking, served over REST with a WebSocket
//! change feed.
//!
//! ## Structure
//!
//! - `use_cases/` - Operations with their authorization rules
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
