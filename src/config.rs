// ⚙️ Configuration - Logging setup and runtime options

use crate::aggregator::{Aggregator, BatchPolicy};
use crate::classifier::{BoundaryMode, PatternClassifier};
use crate::descriptions::DescriptionTable;
use crate::export::EXPORT_FILE_NAME;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "medcode-extractor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP server
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";

/// Log filter used when RUST_LOG is not set
pub fn default_log_filter() -> &'static str {
    "medcode_extractor=info"
}

/// Install the fmt subscriber (stderr, so stdout stays clean for output)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));

    // A second init (e.g. from tests) is not an error worth surfacing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// ExtractorConfig - Options shared by every shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub boundary_mode: BoundaryMode,
    pub batch_policy: BatchPolicy,

    /// Extra `code,description` CSV layered over the built-in table
    pub descriptions_path: Option<PathBuf>,

    /// Where the export artifact is written
    pub output_path: PathBuf,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            boundary_mode: BoundaryMode::default(),
            batch_policy: BatchPolicy::default(),
            descriptions_path: None,
            output_path: PathBuf::from(EXPORT_FILE_NAME),
        }
    }
}

impl ExtractorConfig {
    /// Builder: require letter/digit codes to be whole tokens
    pub fn with_strict_boundaries(mut self, strict: bool) -> Self {
        self.boundary_mode = if strict {
            BoundaryMode::WholeToken
        } else {
            BoundaryMode::Substring
        };
        self
    }

    /// Builder: abort batches on the first unreadable document
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.batch_policy = if fail_fast {
            BatchPolicy::FailFast
        } else {
            BatchPolicy::Isolate
        };
        self
    }

    pub fn with_descriptions(mut self, path: Option<PathBuf>) -> Self {
        self.descriptions_path = path;
        self
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output_path = path;
        self
    }

    /// Build the description table once; callers share the Arc
    pub fn load_descriptions(&self) -> Result<Arc<DescriptionTable>> {
        let table = match &self.descriptions_path {
            Some(path) => {
                let extra = DescriptionTable::from_csv_path(path)?;
                tracing::info!(extra = extra.len(), path = %path.display(), "Extended description table");
                DescriptionTable::builtin().extended_with(&extra)
            }
            None => DescriptionTable::builtin(),
        };
        Ok(Arc::new(table))
    }

    pub fn aggregator(&self) -> Aggregator {
        Aggregator::with_classifier(PatternClassifier::with_mode(self.boundary_mode))
            .with_policy(self.batch_policy)
    }
}
