use crate::core::ProvisionRequest;
use crate::utils::error::{ProvisionError, Result};

/// Parse a manifest: a header row (ignored), then `region,quantity` rows.
/// Extra columns are ignored and fully blank rows are skipped.
pub fn parse_manifest(data: &[u8]) -> Result<Vec<ProvisionRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut requests = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let region = record.get(0).unwrap_or_default();
        if region.is_empty() {
            return Err(ProvisionError::ManifestError {
                line,
                message: "missing region".to_string(),
            });
        }

        let raw_quantity = record.get(1).unwrap_or_default();
        let quantity_requested =
            raw_quantity
                .parse::<u32>()
                .map_err(|_| ProvisionError::ManifestError {
                    line,
                    message: format!(
                        "quantity '{}' is not a non-negative integer",
                        raw_quantity
                    ),
                })?;

        requests.push(ProvisionRequest::new(region, quantity_requested));
    }

    tracing::debug!("Parsed {} provisioning requests from manifest", requests.len());
    Ok(requests)
}
