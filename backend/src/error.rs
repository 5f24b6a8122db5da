//! Error types for the planfact report pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - CSV parsing errors
//! - [`SchemaError`] - required columns absent from the source table
//! - [`DefinitionError`] - report definition loading/validation errors
//! - [`LoadError`] - dataset fetch/load errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Per-cell parse failures are NOT errors: an unparsable numeric cell
//! becomes the missing marker and flows through ratios, totals and
//! highlighting as such. Errors here are structural - a file that cannot
//! be read at all, or a source missing whole required columns.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode content in the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The source table is structurally incompatible with the report definition.
///
/// Raised when a column marked `required` is absent from the source headers
/// entirely (as opposed to being empty per-row, which is just missing data).
/// This is a blocking error: no partial table is produced.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// One or more required columns are not present in the source.
    #[error("Required columns missing from source: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The source has headers but no data rows at all.
    #[error("Source table has no data rows")]
    NoRows,
}

// =============================================================================
// Definition Errors
// =============================================================================

/// Errors loading or validating a report definition file.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Failed to read the definition file.
    #[error("Failed to read definition: {0}")]
    IoError(#[from] std::io::Error),

    /// Definition is not valid JSON.
    #[error("Definition JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Definition does not conform to the definition schema.
    #[error("Invalid definition: {errors:?}")]
    SchemaError { errors: Vec<String> },

    /// Definition is internally inconsistent.
    #[error("Inconsistent definition: {0}")]
    Inconsistent(String),
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors from the dataset loader collaborator.
#[derive(Debug, Error)]
pub enum LoadError {
    /// HTTP fetch failed.
    #[error("Fetch failed: {0}")]
    FetchError(String),

    /// Local file read failed.
    #[error("Failed to read source file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Source incompatible with the report definition.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by the report entry points.
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Definition error.
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Dataset loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// An unknown field name was used in a filter selection.
    #[error("Unknown filter field: {0}")]
    UnknownField(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for schema checks.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for definition operations.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
