//! Photo Booth Server Library
//!
//! Backend for a photo booth: triggers a camera through its command-line
//! tool, stores the images, and lists them.
//!
//! ## Architecture (5 Components)
//!
//! 1. DeviceGateway - External camera CLI invocation (timeout, kill on drop)
//! 2. ReadinessProber - Camera auto-detect / mock bypass
//! 3. CaptureGuard - One capture at a time
//! 4. CaptureOrchestrator - Mock or real capture, atomic publish
//! 5. PhotoCatalog - Photo directory listing, newest first
//!
//! WebAPI exposes them over HTTP; the photo directory is the only durable state.

pub mod capture_guard;
pub mod capture_orchestrator;
pub mod device_gateway;
pub mod photo_catalog;
pub mod readiness_prober;
pub mod web_api;
pub mod models;
pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
