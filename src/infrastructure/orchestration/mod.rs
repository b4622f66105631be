//! Runtime orchestration.

pub mod runtime;

pub use runtime::{drive, run_with_shutdown};
