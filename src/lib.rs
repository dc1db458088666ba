//! Threat Detect
//!
//! Network intrusion detection: an offline trainer that turns labeled traffic records
//! into an artifact bundle, and an HTTP service that serves predictions from it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌──────────────────────────┐
//! │ Train CSV    │ ──▶ │ threat-train    │ ──▶ │ model_artifacts.json     │
//! └──────────────┘     │ encode / scale  │     │ header + payload         │
//!                      │ fit / evaluate  │     └────────────┬─────────────┘
//!                      └─────────────────┘                  │ load once
//!                                                           ▼
//! ┌──────────────┐     ┌─────────────────────────────────────────────────┐
//! │ Client       │ ──▶ │ threat-detect (Axum)                            │
//! └──────────────┘     │ GET /   GET /simulate   POST /predict           │
//!                      └─────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod logic;
pub mod models;

pub use app::{create_router, AppState};
pub use error::{AppError, AppResult, DetectError, DetectResult};
