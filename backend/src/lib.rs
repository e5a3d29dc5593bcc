//! # Trip Planner Backend
//!
//! Turns a loosely-specified travel request into a day-by-day itinerary using
//! an external generative model, and keeps a per-session history of the
//! itineraries it produced.
//!
//! ## Architecture
//!
//! - [`api`]: identifier types shared by every layer
//! - [`models`]: travel intents, itineraries and history records
//! - [`services`]: normalization, prompt rendering, output repair and the
//!   retrying synthesizer
//! - [`provider`]: generative-text providers (Gemini, scripted)
//! - [`db`]: session-scoped history storage behind a repository trait
//! - [`config`]: process configuration from the environment
//! - `http`: axum REST API (feature `http-server`)

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;

pub mod db;
pub mod models;

pub mod provider;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
