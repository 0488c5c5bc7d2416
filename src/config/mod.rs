#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::twilio::{
    TwilioClient, TwilioClientBuilder, TwilioCredentials, DEFAULT_API_BASE, DEFAULT_COUNTRY,
    DEFAULT_PAGE_SIZE,
};
use crate::core::provisioner::{DEFAULT_MAX_IDLE_ROUNDS, DEFAULT_MAX_ROUNDS};
use crate::core::report::DEFAULT_REPORT_FILE;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub use toml_config::TomlConfig;

/// Fully resolved settings for one run.
#[derive(Clone)]
pub struct AppConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub manifest_path: String,
    pub output_path: String,
    pub api_base: String,
    pub country: String,
    pub page_size: u32,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub max_rounds: u32,
    pub max_idle_rounds: u32,
    pub concurrent_purchases: usize,
}

impl AppConfig {
    /// Defaults for everything except the credentials and the manifest.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        manifest_path: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            manifest_path: manifest_path.into(),
            output_path: DEFAULT_REPORT_FILE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_seconds: None,
            user_agent: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_idle_rounds: DEFAULT_MAX_IDLE_ROUNDS,
            concurrent_purchases: 1,
        }
    }

    /// Fill any field the settings file sets.
    pub fn apply_file(mut self, file: &TomlConfig) -> Self {
        if let Some(api_base) = &file.carrier.api_base {
            self.api_base = api_base.clone();
        }
        if let Some(country) = &file.carrier.country {
            self.country = country.clone();
        }
        if let Some(page_size) = file.carrier.page_size {
            self.page_size = page_size;
        }
        if file.carrier.timeout_seconds.is_some() {
            self.timeout_seconds = file.carrier.timeout_seconds;
        }
        if file.carrier.user_agent.is_some() {
            self.user_agent = file.carrier.user_agent.clone();
        }
        if let Some(max_rounds) = file.provisioning.max_rounds {
            self.max_rounds = max_rounds;
        }
        if let Some(max_idle_rounds) = file.provisioning.max_idle_rounds {
            self.max_idle_rounds = max_idle_rounds;
        }
        if let Some(concurrent) = file.provisioning.concurrent_purchases {
            self.concurrent_purchases = concurrent;
        }
        if let Some(path) = &file.output.path {
            self.output_path = path.clone();
        }
        self
    }

    pub fn twilio_client(&self) -> Result<TwilioClient> {
        let mut builder = TwilioClientBuilder::new(TwilioCredentials::new(
            self.account_sid.clone(),
            self.auth_token.clone(),
        ))
        .api_base(self.api_base.clone())
        .country(self.country.clone())
        .page_size(self.page_size);

        if let Some(seconds) = self.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder.build()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("manifest_path", &self.manifest_path)
            .field("output_path", &self.output_path)
            .field("api_base", &self.api_base)
            .field("country", &self.country)
            .field("page_size", &self.page_size)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_rounds", &self.max_rounds)
            .field("max_idle_rounds", &self.max_idle_rounds)
            .field("concurrent_purchases", &self.concurrent_purchases)
            .finish()
    }
}

impl ConfigProvider for AppConfig {
    fn manifest_path(&self) -> &str {
        &self.manifest_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    fn max_idle_rounds(&self) -> u32 {
        self.max_idle_rounds
    }

    fn concurrent_purchases(&self) -> usize {
        self.concurrent_purchases
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("account_sid", &self.account_sid)?;
        validation::validate_non_empty_string("auth_token", &self.auth_token)?;
        validation::validate_path("input_file", &self.manifest_path)?;
        validation::validate_path("output", &self.output_path)?;
        validation::validate_url("api_base", &self.api_base)?;
        validation::validate_country_code("country", &self.country)?;
        validation::validate_range("page_size", self.page_size, 1, 1000)?;
        validation::validate_range("max_rounds", self.max_rounds, 1, u32::MAX)?;
        validation::validate_range("max_idle_rounds", self.max_idle_rounds, 1, u32::MAX)?;
        validation::validate_range("concurrent_purchases", self.concurrent_purchases, 1, 64)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ProvisionError;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::new("AC123", "secret", "numbers.csv");
        assert!(config.validate().is_ok());
        assert_eq!(config.output_path, "output.csv");
        assert_eq!(config.page_size, 30);
        assert_eq!(config.country, "US");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = TomlConfig::from_toml_str(
            "[carrier]\ncountry = \"CA\"\n[provisioning]\nconcurrent_purchases = 8\n",
        )
        .unwrap();

        let config = AppConfig::new("AC123", "secret", "numbers.csv").apply_file(&file);

        assert_eq!(config.country, "CA");
        assert_eq!(config.concurrent_purchases, 8);
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::new("AC123", "secret", "numbers.csv");
        config.concurrent_purchases = 0;
        assert!(config.validate().is_err());

        let config = AppConfig::new("AC123", "", "numbers.csv");
        assert!(matches!(
            config.validate(),
            Err(ProvisionError::MissingConfigError { .. })
        ));

        let mut config = AppConfig::new("AC123", "secret", "numbers.csv");
        config.api_base = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", AppConfig::new("AC123", "secret", "numbers.csv"));
        assert!(!debug.contains("secret"));
    }
}
