pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use crate::adapters::storage::LocalStorage;
pub use crate::adapters::twilio::{TwilioClient, TwilioClientBuilder, TwilioCredentials};
pub use crate::config::{AppConfig, TomlConfig};
pub use crate::core::{engine::ProvisionEngine, ProvisionLimits, Provisioner, StopSignal};
pub use crate::utils::error::{ProvisionError, Result};
