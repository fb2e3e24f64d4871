pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::Desk;
pub use config::DeskConfig;
pub use core::poller::{CycleOutcome, PollerConfig, ResilientPoller};
pub use utils::error::{DeskError, Result};
