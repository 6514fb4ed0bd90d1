//! Conversation sessions
//!
//! Each session holds the ordered turn history exchanged with the model,
//! seeded with the persona instruction pair. Sessions live in memory only.

pub mod manager;
pub mod store;

pub use manager::{SessionHandle, SessionLimits, SessionManager};
pub use store::{ChatMessage, Persona, Role, Session};
