use crate::utils::error::{ProvisionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope of a number search: an area code or a postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionCode {
    AreaCode(String),
    PostalCode(String),
}

impl RegionCode {
    /// The mode is chosen by length alone: 3 characters is an area code, 5 is a postal code.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        match trimmed.chars().count() {
            3 => Ok(RegionCode::AreaCode(trimmed.to_string())),
            5 => Ok(RegionCode::PostalCode(trimmed.to_string())),
            _ => Err(ProvisionError::UnsupportedRegionFormat {
                region: raw.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegionCode::AreaCode(code) | RegionCode::PostalCode(code) => code,
        }
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionCode::AreaCode(code) => write!(f, "area code {}", code),
            RegionCode::PostalCode(code) => write!(f, "postal code {}", code),
        }
    }
}

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub region: String,
    pub quantity_requested: u32,
}

impl ProvisionRequest {
    pub fn new(region: impl Into<String>, quantity_requested: u32) -> Self {
        Self {
            region: region.into(),
            quantity_requested,
        }
    }

    pub fn region_code(&self) -> Result<RegionCode> {
        RegionCode::parse(&self.region)
    }
}

/// A number the directory reported as available. Not owned until purchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateNumber {
    pub phone_number: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl CandidateNumber {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            friendly_name: None,
            locality: None,
            region: None,
        }
    }
}

/// Registry acknowledgement of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedNumber {
    pub phone_number: String,
    #[serde(default)]
    pub sid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased { phone_number: String },
    Rejected { phone_number: String, reason: String },
}

/// Why the loop for one request stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Fulfilled,
    Exhausted,
    NothingRequested,
    UnsupportedRegion,
    RoundLimit,
    Stalled,
    Cancelled,
    Aborted { reason: String },
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Fulfilled => write!(f, "fulfilled"),
            Completion::Exhausted => write!(f, "no more available numbers"),
            Completion::NothingRequested => write!(f, "nothing requested"),
            Completion::UnsupportedRegion => write!(f, "unsupported region format"),
            Completion::RoundLimit => write!(f, "round limit reached"),
            Completion::Stalled => write!(f, "stalled without purchases"),
            Completion::Cancelled => write!(f, "cancelled"),
            Completion::Aborted { reason } => write!(f, "aborted: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionResult {
    pub region: String,
    pub quantity_requested: u32,
    /// Purchase order. Distinct by construction.
    pub provisioned_numbers: Vec<String>,
    pub rounds: u32,
    pub rejected_purchases: u32,
    pub completion: Completion,
}

impl ProvisionResult {
    pub fn empty(request: &ProvisionRequest, completion: Completion) -> Self {
        Self {
            region: request.region.clone(),
            quantity_requested: request.quantity_requested,
            provisioned_numbers: Vec::new(),
            rounds: 0,
            rejected_purchases: 0,
            completion,
        }
    }

    pub fn quantity_provisioned(&self) -> usize {
        self.provisioned_numbers.len()
    }

    pub fn shortfall(&self) -> usize {
        (self.quantity_requested as usize).saturating_sub(self.quantity_provisioned())
    }
}

/// Totals for a whole manifest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub requests: usize,
    pub total_requested: u64,
    pub total_provisioned: u64,
    pub shortfalls: Vec<(String, usize)>,
    pub output_path: String,
}

impl BatchSummary {
    pub fn from_results(results: &[ProvisionResult], output_path: impl Into<String>) -> Self {
        Self {
            requests: results.len(),
            total_requested: results.iter().map(|r| r.quantity_requested as u64).sum(),
            total_provisioned: results.iter().map(|r| r.quantity_provisioned() as u64).sum(),
            shortfalls: results
                .iter()
                .filter(|r| r.shortfall() > 0)
                .map(|r| (r.region.clone(), r.shortfall()))
                .collect(),
            output_path: output_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_code_by_length() {
        assert_eq!(
            RegionCode::parse("415").unwrap(),
            RegionCode::AreaCode("415".to_string())
        );
        assert_eq!(
            RegionCode::parse(" 94105 ").unwrap(),
            RegionCode::PostalCode("94105".to_string())
        );
        for raw in ["", "41", "4155", "941051"] {
            assert!(matches!(
                RegionCode::parse(raw),
                Err(ProvisionError::UnsupportedRegionFormat { .. })
            ));
        }
    }

    #[test]
    fn test_summary_totals_and_shortfalls() {
        let request = ProvisionRequest::new("415", 3);
        let mut full = ProvisionResult::empty(&request, Completion::Fulfilled);
        full.provisioned_numbers = vec!["+1".into(), "+2".into(), "+3".into()];
        let short = ProvisionResult::empty(&ProvisionRequest::new("212", 2), Completion::Exhausted);

        let summary = BatchSummary::from_results(&[full, short], "output.csv");
        assert_eq!(summary.requests, 2);
        assert_eq!(summary.total_requested, 5);
        assert_eq!(summary.total_provisioned, 3);
        assert_eq!(summary.shortfalls, vec![("212".to_string(), 2)]);
    }
}
