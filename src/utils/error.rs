use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Carrier API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Purchase of {phone_number} rejected: {reason}")]
    PurchaseRejected { phone_number: String, reason: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Manifest error on line {line}: {message}")]
    ManifestError { line: u64, message: String },

    #[error("Unsupported region format '{region}': expected a 3-digit area code or 5-digit postal code")]
    UnsupportedRegionFormat { region: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProvisionError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProvisionError::PurchaseRejected { .. }
            | ProvisionError::UnsupportedRegionFormat { .. } => ErrorSeverity::Low,
            ProvisionError::ApiError(_) | ProvisionError::HttpStatus { .. } => {
                ErrorSeverity::Medium
            }
            ProvisionError::CsvError(_)
            | ProvisionError::SerializationError(_)
            | ProvisionError::ManifestError { .. }
            | ProvisionError::ConfigError { .. }
            | ProvisionError::ConfigValidationError { .. }
            | ProvisionError::InvalidConfigValueError { .. }
            | ProvisionError::MissingConfigError { .. } => ErrorSeverity::High,
            ProvisionError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ProvisionError::ApiError(_) => "Check network connectivity and the carrier API base URL",
            ProvisionError::HttpStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check the account SID and auth token"
            }
            ProvisionError::HttpStatus { .. } => "Retry later; the carrier API reported an error",
            ProvisionError::PurchaseRejected { .. } => {
                "The number was taken or is invalid; a later search round picks other numbers"
            }
            ProvisionError::CsvError(_) | ProvisionError::ManifestError { .. } => {
                "Fix the manifest: header row, then one 'region,quantity' row per request"
            }
            ProvisionError::UnsupportedRegionFormat { .. } => {
                "Use a 3-digit area code or a 5-digit postal code"
            }
            ProvisionError::IoError(_) => "Check that the input file exists and the output path is writable",
            ProvisionError::SerializationError(_) => "The carrier response was not in the expected format",
            ProvisionError::ConfigError { .. }
            | ProvisionError::ConfigValidationError { .. }
            | ProvisionError::InvalidConfigValueError { .. }
            | ProvisionError::MissingConfigError { .. } => {
                "Review the command line arguments and the settings file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProvisionError::ApiError(_) | ProvisionError::HttpStatus { .. } => {
                format!("Could not reach the carrier API ({})", self)
            }
            ProvisionError::IoError(e) => format!("File access failed: {}", e),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
