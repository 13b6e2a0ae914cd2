use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::WriterError;

/// Crate version that wrote the file
pub const KEY_CREATOR: &str = "mocktarget:creator";
/// RFC 3339 UTC time the run finished
pub const KEY_CREATED: &str = "mocktarget:created";
/// Run configuration as given (TOML)
pub const KEY_CONFIG: &str = "mocktarget:config";
/// Run seed
pub const KEY_SEED: &str = "mocktarget:seed";
/// Spectrum wavelength grid in Angstrom, as a JSON array
pub const KEY_WAVELENGTH: &str = "wavelength";

/// Provenance written into the footer of every output file
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    /// Run configuration text, if the run came from a file
    pub config: Option<String>,
    /// Run seed
    pub seed: u64,
    /// When the run finished
    pub created: DateTime<Utc>,
}

impl RunMetadata {
    /// Provenance stamped with the current time
    pub fn new(seed: u64) -> Self {
        Self {
            config: None,
            seed,
            created: Utc::now(),
        }
    }

    /// Attach the configuration text
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// Key-value pairs for the Parquet footer
    pub fn to_parquet_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert(
            KEY_CREATOR.to_string(),
            format!("mocktarget v{}", env!("CARGO_PKG_VERSION")),
        );
        metadata.insert(KEY_CREATED.to_string(), self.created.to_rfc3339());
        metadata.insert(KEY_SEED.to_string(), self.seed.to_string());
        if let Some(config) = &self.config {
            metadata.insert(KEY_CONFIG.to_string(), config.clone());
        }
        metadata
    }

    /// Footer of the spectra file, which also carries the wavelength grid
    pub fn to_spectra_metadata(&self, wave: &[f64]) -> Result<HashMap<String, String>, WriterError> {
        let mut metadata = self.to_parquet_metadata();
        metadata.insert(KEY_WAVELENGTH.to_string(), serde_json::to_string(wave)?);
        Ok(metadata)
    }
}
