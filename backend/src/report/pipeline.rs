//! The render pass: filtered rows, totals and highlighting in one result.
//!
//! A render pass is a pure function from (dataset snapshot, filter
//! selection) to a rendered table - no stage mutates its input, nothing
//! here fetches or blocks. Loading and caching live in the loader
//! collaborator; HTTP and CLI surfaces format the result further.
//!
//! # Example
//!
//! ```rust,ignore
//! use planfact::definition::ReportDefinition;
//! use planfact::models::FilterSelection;
//! use planfact::report::{dataset_from_table, render};
//!
//! let definition = ReportDefinition::default_sales();
//! let (dataset, _dropped) = dataset_from_table(&table, &definition)?;
//! let report = render(&dataset, &FilterSelection::new(), &definition);
//! println!("{} rows", report.table.rows.len());
//! ```

use serde::Serialize;

use crate::definition::{ColumnKind, DisplayColumn, ReportDefinition};
use crate::error::PipelineResult;
use crate::models::{Dataset, FilterSelection, Highlight, Record};
use crate::parser::{parse_bytes_auto, RawTable};

use super::filter::{apply_filters, filter_options, FilterOptions};
use super::format::{format_ratio, format_value};
use super::highlight::classify;
use super::normalize::normalize;
use super::ratio::derive_ratios;
use super::totals::Totals;

// =============================================================================
// Rendered output
// =============================================================================

/// One rendered cell: display text plus, for ratio cells, the highlight
/// category for color mapping.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedCell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

/// One rendered table row.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedRow {
    pub cells: Vec<RenderedCell>,
}

/// The rendered table: headers, filtered data rows and one totals row.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RenderedRow>,
    pub totals: RenderedRow,
}

/// Render pass metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    /// Report heading from the definition.
    pub title: String,
    /// Records in the dataset before filtering.
    pub dataset_rows: usize,
    /// Records matching the current selection.
    pub matched_rows: usize,
}

/// Result of one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedReport {
    pub table: RenderedTable,
    /// Cascaded option lists for the filter selectors.
    pub options: Vec<FilterOptions>,
    pub meta: ReportMeta,
}

// =============================================================================
// Entry points
// =============================================================================

/// Normalize a raw table and derive its ratio columns.
///
/// Returns the typed dataset and the number of rows dropped by the
/// admission rule.
pub fn dataset_from_table(
    table: &RawTable,
    definition: &ReportDefinition,
) -> PipelineResult<(Dataset, usize)> {
    let normalized = normalize(table, definition)?;
    let dataset = derive_ratios(normalized.dataset, definition);
    Ok((dataset, normalized.dropped))
}

/// Full chain for one-shot callers: bytes to rendered report.
pub fn report_from_bytes(
    bytes: &[u8],
    definition: &ReportDefinition,
    selection: &FilterSelection,
) -> PipelineResult<RenderedReport> {
    let table = parse_bytes_auto(bytes)?;
    let (dataset, _dropped) = dataset_from_table(&table, definition)?;
    Ok(render(&dataset, selection, definition))
}

/// One render pass over an already-loaded dataset.
pub fn render(
    dataset: &Dataset,
    selection: &FilterSelection,
    definition: &ReportDefinition,
) -> RenderedReport {
    let columns = definition.display_columns();
    let filtered = apply_filters(dataset, selection);

    let totals_record = Totals::compute(&filtered.records, definition).to_record(definition);

    let rows = filtered
        .records
        .iter()
        .map(|record| render_record(record, &columns))
        .collect();

    RenderedReport {
        table: RenderedTable {
            headers: columns.iter().map(|c| c.header.clone()).collect(),
            rows,
            totals: render_record(&totals_record, &columns),
        },
        options: filter_options(dataset, selection, definition),
        meta: ReportMeta {
            title: definition.title.clone(),
            dataset_rows: dataset.len(),
            matched_rows: filtered.len(),
        },
    }
}

/// Render one record against the display columns.
fn render_record(record: &Record, columns: &[DisplayColumn]) -> RenderedRow {
    let cells = columns
        .iter()
        .map(|column| match column.kind {
            ColumnKind::Label => RenderedCell {
                text: record.label(&column.field).to_string(),
                highlight: None,
            },
            ColumnKind::Value => RenderedCell {
                text: format_value(record.value(&column.field)),
                highlight: None,
            },
            ColumnKind::Ratio => {
                let ratio = record.ratio(&column.field);
                RenderedCell {
                    text: format_ratio(ratio),
                    highlight: Some(classify(ratio)),
                }
            }
        })
        .collect();

    RenderedRow { cells }
}

// =============================================================================
// Tests
// =============================================================================
