//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic: configuration, wiring and the runtime loop.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`orchestration`] - Runtime loop and shutdown

pub mod bootstrap;
pub mod config;
pub mod orchestration;
