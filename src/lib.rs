//! Combined login/signup service and its client.
//!
//! The server half exposes `POST /api/auth`, which signs up an unseen email or
//! logs in a known one and returns a signed token. The client half validates
//! the login form, calls the endpoint, keeps the token locally, and decides on
//! startup whether a stored session is still usable.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;
