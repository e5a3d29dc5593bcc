//! HTTP server module.
//!
//! Exposes the planner as a REST API on top of axum. Handlers stay thin: they
//! resolve the session, call the planning pipeline or the history service
//! layer, and map errors onto structured JSON responses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                              │
//! │  - Session cookie binding                                │
//! │  - CORS, compression, error mapping                      │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Planning pipeline (services/)                           │
//! │  normalize → prompt → provider → repair/validate         │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  History storage (db/)                                   │
//! │  LocalRepository / PostgresRepository                    │
//! └──────────────────────────────────────────────────────────┘
//! ```

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod session;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub use router::create_router;

#[cfg(feature = "http-server")]
pub use session::CurrentSession;

#[cfg(feature = "http-server")]
pub use state::AppState;
