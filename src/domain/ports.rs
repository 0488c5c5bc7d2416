use crate::domain::model::{CandidateNumber, PurchasedNumber, RegionCode};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn manifest_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn max_rounds(&self) -> u32;
    fn max_idle_rounds(&self) -> u32;
    fn concurrent_purchases(&self) -> usize;
}

/// Search for numbers that are available to buy. One call returns at most one page.
#[async_trait]
pub trait NumberDirectory: Send + Sync {
    async fn search(&self, region: &RegionCode) -> Result<Vec<CandidateNumber>>;
}

/// Claim a specific number for the account. Not idempotent: an error does not prove
/// the number was left unclaimed.
#[async_trait]
pub trait NumberRegistry: Send + Sync {
    async fn purchase(&self, phone_number: &str) -> Result<PurchasedNumber>;
}
