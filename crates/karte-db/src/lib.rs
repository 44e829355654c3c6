//! `SQLite` persistence for the Karte map assistant.
//!
//! Two tables back the application: `pins` (draft and confirmed map pins)
//! and `chat_messages` (the single running transcript). The schema is
//! embedded and applied with [`SqlitePool::run_migrations`].
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection pool and configuration
//! - [`pin_store`] -- Pin queries and mutations
//! - [`chat_store`] -- Transcript append, list, clear
//! - [`error`] -- Shared error types

pub mod chat_store;
pub mod error;
pub mod pin_store;
pub mod sqlite;

pub use chat_store::{ChatMessageRow, ChatStore};
pub use error::DbError;
pub use pin_store::{NewPin, PinRow, PinStore};
pub use sqlite::{SqliteConfig, SqlitePool};
