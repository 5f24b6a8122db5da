//! # Planfact - plan-fact sales report pipeline
//!
//! Planfact turns raw CSV sales exports (semicolon-delimited, comma
//! decimals, optional BOM) into filtered, highlighted plan-fact report
//! tables with a volume-weighted totals row.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV Export │────▶│   Parser    │────▶│  Normalize  │────▶│   Render    │
//! │ (URL/file)  │     │ (auto-enc)  │     │  + ratios   │     │ filter/total│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use planfact::definition::ReportDefinition;
//! use planfact::models::FilterSelection;
//! use planfact::report::report_from_bytes;
//!
//! let definition = ReportDefinition::default_sales();
//! let report = report_from_bytes(&bytes, &definition, &FilterSelection::new())?;
//! println!("{} rows, totals ratio cell: {}", report.table.rows.len(),
//!     report.table.totals.cells[5].text);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Record, Dataset, FilterSelection, Highlight)
//! - [`definition`] - Report definitions (recognized columns, ratio pairs)
//! - [`parser`] - CSV parsing with encoding/delimiter auto-detection
//! - [`loader`] - Dataset loading collaborator with session caching
//! - [`report`] - Normalization, ratios, filters, totals, highlighting
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod definition;

// Parsing
pub mod parser;

// Loading
pub mod loader;

// Report pipeline
pub mod report;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError,
    DefinitionError,
    LoadError,
    PipelineError,
    SchemaError,
    ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Dataset,
    FilterSelection,
    Highlight,
    Record,
    Selection,
    ALL_SENTINEL,
    PLACEHOLDER,
};

// =============================================================================
// Re-exports - Definition
// =============================================================================

pub use definition::{
    is_valid_definition,
    validate_definition_json,
    ColumnDef,
    RatioDef,
    ReportDefinition,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_file_auto,
    parse_str,
    RawTable,
};

// =============================================================================
// Re-exports - Loader
// =============================================================================

pub use loader::{DatasetLoader, LoadInfo, ReportSource};

// =============================================================================
// Re-exports - Report pipeline
// =============================================================================

pub use report::{
    apply_filters,
    classify,
    clean_number,
    dataset_from_table,
    derive_ratios,
    filter_options,
    normalize,
    ratio,
    render,
    report_from_bytes,
    selection_from_pairs,
    FilterOptions,
    RenderedReport,
    RenderedTable,
    ReportMeta,
    Totals,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, CellDto, FilterDto, ReportMetadata, ReportResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
