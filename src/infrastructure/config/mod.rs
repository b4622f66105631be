//! Infrastructure configuration modules.

pub mod logging;
pub mod pairs;
pub mod poller;
pub mod settings;

pub use settings::Config;
