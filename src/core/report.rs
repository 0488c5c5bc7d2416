use crate::core::ProvisionResult;
use crate::utils::error::{ProvisionError, Result};

pub const DEFAULT_REPORT_FILE: &str = "output.csv";

pub const REPORT_HEADER: [&str; 4] = [
    "Location",
    "Quantity Requested",
    "Quantity Provisioned",
    "Provisioned Phone Numbers",
];

/// One row per result, in the given order. Numbers are joined by a single space.
pub fn render_report(results: &[ProvisionResult]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;

    for result in results {
        writer.write_record([
            result.region.clone(),
            result.quantity_requested.to_string(),
            result.quantity_provisioned().to_string(),
            result.provisioned_numbers.join(" "),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ProvisionError::IoError(e.into_error()))
}
