// Medical Code Extractor - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod codes;        // Categories, codes, per-document results
pub mod classifier;   // Shape rules → ExtractionResult
pub mod descriptions; // Static code → description table
pub mod aggregator;   // Batches, merge, summary
pub mod export;       // CSV export artifact
pub mod document;     // document → text collaborators
pub mod report;       // Text and JSON views for shells
pub mod config;       // Logging and runtime options

#[cfg(feature = "server")]
pub mod server;       // HTTP shell (axum)

// Re-export commonly used types
pub use codes::{AggregatedResult, Category, Code, ExtractionResult};
pub use classifier::{classify, BoundaryMode, PatternClassifier, PatternRule};
pub use descriptions::{describe, format_line, DescriptionTable, DESCRIPTION_NOT_AVAILABLE};
pub use aggregator::{
    merge, Aggregator, BatchPolicy, BatchReport, BatchSummary, CategoryCount, DocumentOutcome,
};
pub use export::{encode, write_export, EXPORT_FILE_NAME, EXPORT_HEADER, EXPORT_MIME_TYPE};
pub use document::{
    get_source, load_document, AutoSource, DecodeError, DocumentKind, DocumentSource,
    PdfTextSource, PlainTextSource, RawDocument,
};
pub use report::{category_lines, render_outcome, render_report, DescribedCode, DocumentView, ReportView};
pub use config::{default_log_filter, init_tracing, ExtractorConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
