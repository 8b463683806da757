// 📤 Export Encoder - Codes by category as a two-column CSV

use crate::codes::ExtractionResult;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Default download/file name for the export artifact
pub const EXPORT_FILE_NAME: &str = "extracted_codes.csv";

/// MIME type of the export artifact
pub const EXPORT_MIME_TYPE: &str = "text/csv";

/// Header row of the export
pub const EXPORT_HEADER: [&str; 2] = ["Code Type", "Code"];

/// Encode a result as CSV bytes
///
/// One row per (category, code), grouped by category in CPT, HCPCS, PLA
/// order and then in stored order. Empty categories contribute no rows.
pub fn encode(result: &ExtractionResult) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(EXPORT_HEADER)
        .context("Failed to write export header")?;

    for code in result.codes_iter() {
        wtr.write_record([code.category.label(), code.value.as_str()])
            .with_context(|| format!("Failed to write export row for {}", code))?;
    }

    wtr.into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to finish CSV export")
}

/// Encode and write the export artifact to `path`
pub fn write_export(path: &Path, result: &ExtractionResult) -> Result<usize> {
    let bytes = encode(result)?;
    fs::write(path, &bytes)
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = result.len(), "Wrote export");
    Ok(result.len())
}

// ============================================================================
// TESTS
// ============================================================================
