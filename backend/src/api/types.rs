//! REST API types for display collaborators.
//!
//! The response carries the fully rendered table - formatted cell text
//! plus highlight tags - so a client only maps highlight categories to
//! colors and never re-implements cleaning, totals or classification.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::loader::LoadInfo;
use crate::models::Highlight;
use crate::report::{RenderedReport, RenderedRow};

/// Response for `GET /api/report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Unique id of this render pass
    pub report_id: String,

    /// Status: "ok"
    pub status: String,

    /// Report heading
    pub title: String,

    /// Display column headers
    pub headers: Vec<String>,

    /// Filtered data rows
    pub rows: Vec<Vec<CellDto>>,

    /// Totals row
    pub totals: Vec<CellDto>,

    /// Filter selectors with cascaded option lists
    pub filters: Vec<FilterDto>,

    /// Metadata about the render pass and the cached load
    pub metadata: ReportMetadata,
}

/// One rendered cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellDto {
    pub text: String,
    /// Highlight tag, present on ratio cells only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

/// One filter selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDto {
    pub field: String,
    pub header: String,
    /// Sorted candidate values, "All" sentinel first
    pub options: Vec<String>,
}

/// Metadata about the render pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Records in the dataset before filtering
    pub dataset_rows: usize,

    /// Records matching the current selection
    pub matched_rows: usize,

    /// Rows dropped at normalization (no non-zero numeric value)
    pub dropped_rows: usize,

    /// Source description (URL or path)
    pub source: String,

    /// Detected source encoding
    pub encoding: String,

    /// Detected source delimiter
    pub delimiter: String,

    /// When the cached dataset was fetched
    pub fetched_at: String,
}

impl ReportResponse {
    /// Assemble the response from a render pass and the load metadata.
    pub fn build(report: RenderedReport, info: &LoadInfo) -> Self {
        ReportResponse {
            report_id: Uuid::new_v4().to_string(),
            status: "ok".to_string(),
            title: report.meta.title.clone(),
            headers: report.table.headers.clone(),
            rows: report.table.rows.iter().map(row_to_cells).collect(),
            totals: row_to_cells(&report.table.totals),
            filters: report
                .options
                .into_iter()
                .map(|o| FilterDto {
                    field: o.field,
                    header: o.header,
                    options: o.options,
                })
                .collect(),
            metadata: ReportMetadata {
                dataset_rows: report.meta.dataset_rows,
                matched_rows: report.meta.matched_rows,
                dropped_rows: info.dropped_rows,
                source: info.source.clone(),
                encoding: info.encoding.clone(),
                delimiter: info.delimiter.to_string(),
                fetched_at: info.fetched_at.to_rfc3339(),
            },
        }
    }
}

fn row_to_cells(row: &RenderedRow) -> Vec<CellDto> {
    row.cells
        .iter()
        .map(|c| CellDto {
            text: c.text.clone(),
            highlight: c.highlight,
        })
        .collect()
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "reportId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "rows": [],
        "totals": [],
        "filters": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ReportDefinition;
    use crate::models::FilterSelection;
    use crate::report::report_from_bytes;
    use chrono::Utc;

    fn load_info() -> LoadInfo {
        LoadInfo {
            source: "test.csv".to_string(),
            encoding: "utf-8".to_string(),
            delimiter: ';',
            raw_rows: 2,
            dropped_rows: 0,
            dataset_rows: 2,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_carries_highlight_tags() {
        let definition = ReportDefinition::default_sales();
        let report = report_from_bytes(
            "Менеджер;ОП;ОП План;ВП;ВП План\nA;120;100;10;5\nB;90;100;5;10".as_bytes(),
            &definition,
            &FilterSelection::new(),
        )
        .unwrap();

        let response = ReportResponse::build(report, &load_info());
        assert_eq!(response.status, "ok");
        assert_eq!(response.rows.len(), 2);

        // Ratio cell of the first row: 120% above plan
        let ratio_cell = &response.rows[0][5];
        assert_eq!(ratio_cell.text, "120%");
        assert_eq!(ratio_cell.highlight, Some(Highlight::Above));

        // Label cells carry no highlight tag
        assert_eq!(response.rows[0][0].highlight, None);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let definition = ReportDefinition::default_sales();
        let report = report_from_bytes(
            "Менеджер;ОП;ОП План;ВП;ВП План\nA;120;100;10;5".as_bytes(),
            &definition,
            &FilterSelection::new(),
        )
        .unwrap();

        let response = ReportResponse::build(report, &load_info());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("reportId"));
        assert!(json.contains("matchedRows"));
        assert!(json.contains("fetchedAt"));
        assert!(json.contains("\"highlight\":\"above\""));
    }

    #[test]
    fn test_error_response_shape() {
        let err = error_response("Required columns missing");
        assert_eq!(err["status"], "error");
        assert!(err["error"].as_str().unwrap().contains("missing"));
    }
}
