use crate::config::{AppConfig, TomlConfig};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "did-provisioner")]
#[command(about = "Provision phone numbers in bulk from a CSV manifest of region,quantity rows")]
pub struct CliConfig {
    /// Carrier account SID
    pub account_sid: String,

    /// Carrier auth token
    pub auth_token: String,

    /// CSV manifest: a header row, then one `region,quantity` row per request
    pub input_file: String,

    /// Report file
    #[arg(short, long)]
    pub output: Option<String>,

    /// TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,

    /// Two-letter country code used for number searches
    #[arg(long)]
    pub country: Option<String>,

    /// Candidates requested per search call
    #[arg(long)]
    pub page_size: Option<u32>,

    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Consecutive rounds without a purchase before a region is given up
    #[arg(long)]
    pub max_idle_rounds: Option<u32>,

    /// Purchases in flight at once within a round
    #[arg(long)]
    pub concurrent_purchases: Option<usize>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    /// Parse the manifest and show the plan without calling the carrier
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// Defaults, then the settings file (if any), then command line flags.
    pub fn resolve(&self) -> Result<AppConfig> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        Ok(self.resolve_with(&file))
    }

    pub fn resolve_with(&self, file: &TomlConfig) -> AppConfig {
        let mut config = AppConfig::new(
            self.account_sid.clone(),
            self.auth_token.clone(),
            self.input_file.clone(),
        )
        .apply_file(file);

        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(api_base) = &self.api_base {
            config.api_base = api_base.clone();
        }
        if let Some(country) = &self.country {
            config.country = country.clone();
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.max_rounds = max_rounds;
        }
        if let Some(max_idle_rounds) = self.max_idle_rounds {
            config.max_idle_rounds = max_idle_rounds;
        }
        if let Some(concurrent) = self.concurrent_purchases {
            config.concurrent_purchases = concurrent;
        }
        if self.timeout_seconds.is_some() {
            config.timeout_seconds = self.timeout_seconds;
        }
        config
    }
}
