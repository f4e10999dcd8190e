//! Command implementations for the VisionOps CLI.

pub mod config;
pub mod dataset;
pub mod registry;
pub mod types;

pub use types::{ConfigCommand, DatasetCommand, RegistryCommand};
