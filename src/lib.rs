//! # mobihue Library
//!
//! Internal library for the mobihue binary.
//!
//! This library exists to enable testing of the internals and to provide a
//! clean separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Mobihue` struct wires configuration, signals and
//!   devices together and starts the watch
//! - **Core Logic**: `core` module contains the tick loop and cycle handling
//! - **Feed**: `schedule` module fetches and parses the departure board
//! - **Devices**: `hue` module wraps the bridge, lights and sensors
//! - **Classification**: `zone` module maps arrival times to zones
//! - **Infrastructure**: configuration, signal handling, retry policies and
//!   logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod config;
pub mod constants;
pub mod core;
pub mod hue;
pub mod retry;
pub mod schedule;
pub mod signals;
pub mod zone;

// Internal modules
mod mobihue;

// Re-export for binary
pub use mobihue::Mobihue;
