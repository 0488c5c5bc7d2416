pub mod engine;
pub mod manifest;
pub mod provisioner;
pub mod report;

pub use crate::domain::model::{
    BatchSummary, CandidateNumber, Completion, ProvisionRequest, ProvisionResult,
    PurchaseOutcome, PurchasedNumber, RegionCode,
};
pub use crate::domain::ports::{ConfigProvider, NumberDirectory, NumberRegistry, Storage};
pub use crate::utils::error::Result;
pub use provisioner::{ProvisionLimits, Provisioner, StopSignal};
