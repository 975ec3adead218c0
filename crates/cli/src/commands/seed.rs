//! Seed reference data from YAML.
//!
//! ```yaml
//! carriers:
//!   - id: carrier-1
//!     name: Gulf Express
//!     base_rate: "20.00"
//!     service_types: [standard, express]
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use shipdesk_api::db::{CarrierStore, PgStore};
use shipdesk_api::models::{NewCarrier, numeric_column_error};

/// Why a seed file was refused before touching the database.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("{0} validation errors found")]
    Invalid(usize),
}

/// Layout of a carriers seed file.
#[derive(Debug, Deserialize)]
pub struct CarrierSeed {
    pub carriers: Vec<NewCarrier>,
}

/// Problems that make a seed file unusable, one line each.
fn validate(seed: &CarrierSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = std::collections::BTreeSet::new();

    for carrier in &seed.carriers {
        if !seen.insert(&carrier.id) {
            errors.push(format!("{}: duplicate id", carrier.id));
        }
        if carrier.name.trim().is_empty() {
            errors.push(format!("{}: name is required", carrier.id));
        }
        if carrier.base_rate < Decimal::ZERO {
            errors.push(format!("{}: base_rate must not be negative", carrier.id));
        } else if let Some(problem) = numeric_column_error(carrier.base_rate, 10, 2) {
            errors.push(format!("{}: base_rate {problem}", carrier.id));
        }
    }
    errors
}

/// Insert or update every carrier in `file_path`.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or a database
/// operation fails.
pub async fn carriers(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()).into());
    }

    info!(path = %file_path, "Loading carriers from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CarrierSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()).into());
    }

    let store = PgStore::new(super::connect().await?);
    let total = seed.carriers.len();
    for carrier in seed.carriers {
        let saved = store.upsert_carrier(carrier).await?;
        info!(
            carrier_id = %saved.id,
            base_rate = %saved.base_rate,
            active = saved.is_active,
            "Carrier saved"
        );
    }

    info!(total, "Carrier seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../../seed/carriers.yaml");

    #[test]
    fn bundled_seed_is_valid() {
        let seed: CarrierSeed = serde_yaml::from_str(BUNDLED).unwrap();
        assert!(validate(&seed).is_empty());

        let first = seed
            .carriers
            .iter()
            .find(|c| c.id.as_str() == "carrier-1")
            .unwrap();
        assert_eq!(first.base_rate, "20.00".parse::<Decimal>().unwrap());
        assert!(first.is_active);
        assert!(seed.carriers.iter().any(|c| !c.is_active));
    }

    #[test]
    fn reports_duplicates_and_bad_rates() {
        let seed: CarrierSeed = serde_yaml::from_str(
            r#"
carriers:
  - { id: a, name: A, base_rate: "1.00" }
  - { id: a, name: " ", base_rate: "-2.00" }
"#,
        )
        .unwrap();
        let errors = validate(&seed);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e == "a: duplicate id"));
    }

    #[test]
    fn base_rates_must_fit_the_column() {
        let seed: CarrierSeed = serde_yaml::from_str(
            r#"
carriers:
  - { id: a, name: A, base_rate: "20.005" }
  - { id: b, name: B, base_rate: "100000000.00" }
  - { id: c, name: C, base_rate: "20.50" }
"#,
        )
        .unwrap();
        assert_eq!(
            validate(&seed),
            [
                "a: base_rate must have at most 2 decimal places",
                "b: base_rate must be less than 100000000",
            ]
        );
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = carriers("/nonexistent/carriers.yaml").await.unwrap_err();
        assert_eq!(err.to_string(), "File not found: /nonexistent/carriers.yaml");
    }

    #[test]
    fn rejects_invalid_ids() {
        let parsed: Result<CarrierSeed, _> = serde_yaml::from_str(
            r#"
carriers:
  - { id: "Bad Id!", name: X, base_rate: "1.00" }
"#,
        );
        assert!(parsed.is_err());
    }
}
