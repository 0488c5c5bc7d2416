use crate::core::manifest::parse_manifest;
use crate::core::report::render_report;
use crate::core::{
    BatchSummary, Completion, ConfigProvider, NumberDirectory, NumberRegistry, ProvisionResult,
    Provisioner, Storage,
};
use crate::utils::error::Result;

/// Reads the manifest, provisions every request in order, writes the report.
pub struct ProvisionEngine<D, R, S, C>
where
    D: NumberDirectory,
    R: NumberRegistry,
    S: Storage,
    C: ConfigProvider,
{
    provisioner: Provisioner<D, R>,
    storage: S,
    config: C,
}

impl<D, R, S, C> ProvisionEngine<D, R, S, C>
where
    D: NumberDirectory,
    R: NumberRegistry,
    S: Storage,
    C: ConfigProvider,
{
    pub fn new(provisioner: Provisioner<D, R>, storage: S, config: C) -> Self {
        Self {
            provisioner,
            storage,
            config,
        }
    }

    pub fn provisioner(&self) -> &Provisioner<D, R> {
        &self.provisioner
    }

    pub async fn run(&self) -> Result<BatchSummary> {
        tracing::info!("Reading and parsing {}", self.config.manifest_path());
        let manifest = self.storage.read_file(self.config.manifest_path()).await?;
        let requests = parse_manifest(&manifest)?;
        tracing::info!("Loaded {} provisioning requests", requests.len());

        let mut results: Vec<ProvisionResult> = Vec::with_capacity(requests.len());
        for request in &requests {
            // Later rows still get a report line after a stop.
            if self.provisioner.stop_signal().is_stopped() {
                results.push(ProvisionResult::empty(request, Completion::Cancelled));
                continue;
            }
            results.push(self.provisioner.provision(request).await);
        }

        tracing::info!("Writing results to {}", self.config.output_path());
        let report = render_report(&results)?;
        self.storage
            .write_file(self.config.output_path(), &report)
            .await?;

        let summary = BatchSummary::from_results(&results, self.config.output_path());
        tracing::info!(
            "Provisioned {} of {} requested phone numbers across {} requests",
            summary.total_provisioned,
            summary.total_requested,
            summary.requests
        );
        for (region, shortfall) in &summary.shortfalls {
            tracing::warn!("{} is short by {} numbers", region, shortfall);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CandidateNumber, ProvisionLimits, PurchasedNumber, RegionCode};
    use crate::utils::error::ProvisionError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_manifest(content: &str) -> Self {
            let mut files = HashMap::new();
            files.insert("manifest.csv".to_string(), content.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ProvisionError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct TestConfig;

    impl ConfigProvider for TestConfig {
        fn manifest_path(&self) -> &str {
            "manifest.csv"
        }

        fn output_path(&self) -> &str {
            "output.csv"
        }

        fn max_rounds(&self) -> u32 {
            10
        }

        fn max_idle_rounds(&self) -> u32 {
            2
        }

        fn concurrent_purchases(&self) -> usize {
            1
        }
    }

    /// Each area code has a fixed stock; a search returns what is left, up to 2 numbers.
    #[derive(Clone)]
    struct StockDirectory {
        stock: Arc<Mutex<HashMap<String, Vec<String>>>>,
        failing: Option<String>,
    }

    #[async_trait::async_trait]
    impl NumberDirectory for StockDirectory {
        async fn search(&self, region: &RegionCode) -> Result<Vec<CandidateNumber>> {
            if self.failing.as_deref() == Some(region.as_str()) {
                return Err(ProvisionError::HttpStatus {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            let stock = self.stock.lock().await;
            Ok(stock
                .get(region.as_str())
                .map(|numbers| numbers.iter().take(2).cloned().map(CandidateNumber::new).collect())
                .unwrap_or_default())
        }
    }

    #[async_trait::async_trait]
    impl NumberRegistry for StockDirectory {
        async fn purchase(&self, phone_number: &str) -> Result<PurchasedNumber> {
            let mut stock = self.stock.lock().await;
            for numbers in stock.values_mut() {
                if let Some(pos) = numbers.iter().position(|n| n == phone_number) {
                    numbers.remove(pos);
                    return Ok(PurchasedNumber {
                        phone_number: phone_number.to_string(),
                        sid: None,
                    });
                }
            }
            Err(ProvisionError::PurchaseRejected {
                phone_number: phone_number.to_string(),
                reason: "gone".to_string(),
            })
        }
    }

    fn stock_directory(failing: Option<&str>) -> StockDirectory {
        let mut stock = HashMap::new();
        stock.insert(
            "415".to_string(),
            vec!["+14150000001".into(), "+14150000002".into(), "+14150000003".into()],
        );
        stock.insert("212".to_string(), vec!["+12120000001".into()]);
        StockDirectory {
            stock: Arc::new(Mutex::new(stock)),
            failing: failing.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_engine_writes_one_row_per_request_in_order() {
        let directory = stock_directory(Some("646"));
        let storage = MockStorage::with_manifest(
            "Location,Quantity\n415,3\n4155,2\n646,1\n212,5\n415,1\n",
        );
        let provisioner = Provisioner::new(
            directory.clone(),
            directory.clone(),
            ProvisionLimits::from_config(&TestConfig),
        );
        let engine = ProvisionEngine::new(provisioner, storage.clone(), TestConfig);

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.requests, 5);
        assert_eq!(summary.total_requested, 12);
        assert_eq!(summary.total_provisioned, 4);
        assert_eq!(summary.output_path, "output.csv");

        let report = String::from_utf8(storage.get_file("output.csv").await.unwrap()).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Location,Quantity Requested,Quantity Provisioned,Provisioned Phone Numbers",
                "415,3,3,+14150000001 +14150000002 +14150000003",
                "4155,2,0,",
                "646,1,0,",
                "212,5,1,+12120000001",
                "415,1,0,",
            ]
        );
    }

    #[tokio::test]
    async fn test_engine_marks_remaining_rows_cancelled_after_stop() {
        let directory = stock_directory(None);
        let storage = MockStorage::with_manifest("Location,Quantity\n415,1\n212,1\n");
        let provisioner = Provisioner::new(
            directory.clone(),
            directory,
            ProvisionLimits::default(),
        );
        provisioner.stop_signal().stop();
        let engine = ProvisionEngine::new(provisioner, storage.clone(), TestConfig);

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.total_provisioned, 0);
        assert_eq!(summary.shortfalls.len(), 2);
        let report = String::from_utf8(storage.get_file("output.csv").await.unwrap()).unwrap();
        assert_eq!(report.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_engine_fails_on_bad_manifest_before_provisioning() {
        let directory = stock_directory(None);
        let storage = MockStorage::with_manifest("Location,Quantity\n415,lots\n");
        let provisioner =
            Provisioner::new(directory.clone(), directory.clone(), ProvisionLimits::default());
        let engine = ProvisionEngine::new(provisioner, storage.clone(), TestConfig);

        let result = engine.run().await;

        assert!(matches!(result, Err(ProvisionError::ManifestError { .. })));
        assert!(storage.get_file("output.csv").await.is_none());
        assert_eq!(directory.stock.lock().await["415"].len(), 3);
    }
}
