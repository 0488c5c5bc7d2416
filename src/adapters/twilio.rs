//! Twilio REST adapter: available-number search and incoming-number purchase.

use crate::core::{CandidateNumber, NumberDirectory, NumberRegistry, PurchasedNumber, RegionCode};
use crate::utils::error::{ProvisionError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_COUNTRY: &str = "US";
pub const DEFAULT_PAGE_SIZE: u32 = 30;
const API_VERSION: &str = "2010-04-01";

#[derive(Clone)]
pub struct TwilioCredentials {
    account_sid: String,
    auth_token: String,
}

impl TwilioCredentials {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TwilioClientBuilder {
    credentials: TwilioCredentials,
    api_base: String,
    country: String,
    page_size: u32,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl TwilioClientBuilder {
    pub fn new(credentials: TwilioCredentials) -> Self {
        Self {
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: None,
            user_agent: None,
        }
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<TwilioClient> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(TwilioClient {
            client: builder.build()?,
            credentials: self.credentials,
            api_base: self.api_base.trim_end_matches('/').to_string(),
            country: self.country.to_uppercase(),
            page_size: self.page_size,
        })
    }
}

/// Implements both [`NumberDirectory`] and [`NumberRegistry`] for one account.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    credentials: TwilioCredentials,
    api_base: String,
    country: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct AvailableNumbersPage {
    #[serde(default)]
    available_phone_numbers: Vec<AvailableNumber>,
}

#[derive(Debug, Deserialize)]
struct AvailableNumber {
    phone_number: String,
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    locality: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl From<AvailableNumber> for CandidateNumber {
    fn from(value: AvailableNumber) -> Self {
        Self {
            phone_number: value.phone_number,
            friendly_name: value.friendly_name,
            locality: value.locality,
            region: value.region,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IncomingNumber {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl TwilioClient {
    pub fn builder(credentials: TwilioCredentials) -> TwilioClientBuilder {
        TwilioClientBuilder::new(credentials)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn account_url(&self, resource: &str) -> String {
        format!(
            "{}/{}/Accounts/{}/{}",
            self.api_base,
            API_VERSION,
            self.credentials.account_sid,
            resource
        )
    }

    fn search_url(&self) -> String {
        self.account_url(&format!("AvailablePhoneNumbers/{}/Local.json", self.country))
    }

    fn purchase_url(&self) -> String {
        self.account_url("IncomingPhoneNumbers.json")
    }
}

fn rejection_reason(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{} (code {})", message, code),
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => format!("HTTP {}", status),
    }
}

#[async_trait]
impl NumberDirectory for TwilioClient {
    async fn search(&self, region: &RegionCode) -> Result<Vec<CandidateNumber>> {
        let filter = match region {
            RegionCode::AreaCode(code) => ("AreaCode", code.as_str()),
            RegionCode::PostalCode(code) => ("InPostalCode", code.as_str()),
        };
        let page_size = self.page_size.to_string();

        tracing::debug!("Searching available numbers: {} {}", filter.0, filter.1);
        let response = self
            .client
            .get(self.search_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .query(&[filter, ("PageSize", page_size.as_str())])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Search response status: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let page: AvailableNumbersPage = response.json().await?;
        Ok(page
            .available_phone_numbers
            .into_iter()
            .map(CandidateNumber::from)
            .collect())
    }
}

#[async_trait]
impl NumberRegistry for TwilioClient {
    async fn purchase(&self, phone_number: &str) -> Result<PurchasedNumber> {
        let response = self
            .client
            .post(self.purchase_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&[("PhoneNumber", phone_number)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ProvisionError::PurchaseRejected {
                phone_number: phone_number.to_string(),
                reason: rejection_reason(status.as_u16(), &body),
            });
        }

        // A 2xx means the number is ours even if the body is unreadable.
        let incoming = serde_json::from_str::<IncomingNumber>(&body).ok();
        if incoming.is_none() {
            tracing::warn!("Purchased {} but could not parse the response body", phone_number);
        }
        let (sid, returned_number) = match incoming {
            Some(incoming) => (incoming.sid, incoming.phone_number),
            None => (None, None),
        };

        Ok(PurchasedNumber {
            phone_number: returned_number.unwrap_or_else(|| phone_number.to_string()),
            sid,
        })
    }
}
