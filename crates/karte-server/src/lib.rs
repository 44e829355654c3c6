//! HTTP layer for the Karte map assistant.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Map page** (`GET /`) with the chat transcript, pin list, and a
//!   Google Maps canvas driven by `/static/app.js`
//! - **Chat** (`POST /chat/send`): stores the user turn, asks the
//!   assistant, and dispatches the parsed action
//! - **Map click** (`POST /map/click`): creates a draft pin and asks the
//!   assistant to classify it
//! - **Confirm** (`POST /pins/{id}/confirm`) and **pin listing**
//!   (`GET /map/pins`)
//!
//! # Architecture
//!
//! Handlers are thin. They load the transcript and pin snapshots from
//! `karte-db`, call [`Assistant::respond`](karte_assistant::Assistant::respond),
//! and hand the reply to the [`Dispatcher`], which owns all action side
//! effects. The model client and [`Geocoder`] are capability handles in
//! [`AppState`], so tests substitute both.

pub mod chat;
pub mod dispatch;
pub mod error;
pub mod geocode;
pub mod handlers;
pub mod map;
pub mod pages;
pub mod pins;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::ApiError;
pub use geocode::{Geocoder, GoogleGeocoder};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
