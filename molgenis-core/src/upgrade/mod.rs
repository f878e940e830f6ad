//! Versioned upgrade chain
//!
//! Upgrade steps evolve persisted schema and configuration from one platform
//! version to the next. They run strictly in sequence during bootstrapping,
//! each one in its own transaction, and the version store records the last
//! applied step.

mod service;
mod step;
pub mod steps;
mod version;

pub use service::{AppliedStep, UpgradeReport, UpgradeService};
pub use step::{SqlUpgradeStep, UpgradeStep};
pub use steps::builtin_steps;
pub use version::{FileVersionStore, InMemoryVersionStore, VersionStore};
