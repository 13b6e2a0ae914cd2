use crate::makers::{MakerClass, MakerSettings};
use crate::mock::ReadRequest;

/// One class of a run: where its catalog lives and how to build it
#[derive(Debug, Clone)]
pub struct SourceSpec {
    /// Class to make
    pub class: MakerClass,
    /// Catalog request; footprint cells and seed are filled per cell
    pub request: ReadRequest,
    /// Maker options
    pub settings: MakerSettings,
}

impl SourceSpec {
    /// Class read from `mockfile` with default settings
    pub fn new(class: MakerClass, mockfile: impl Into<String>) -> Self {
        Self {
            class,
            request: ReadRequest::new(mockfile, class.name()),
            settings: MakerSettings::default(),
        }
    }

    /// Replace the maker settings
    pub fn with_settings(mut self, settings: MakerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Request for the single cell `healpix` at `nside`
    pub(crate) fn request_for(&self, nside: u32, healpix: i64, seed: u64) -> ReadRequest {
        self.request
            .clone()
            .with_healpixels(nside, vec![healpix])
            .with_seed(seed)
    }
}
