//! Report definitions - the fixed schema a report is built against.
//!
//! A [`ReportDefinition`] names the categorical and numeric columns the
//! pipeline recognizes (mapping logical field names to source headers),
//! the ratio pairs to derive, the filter selectors to expose and the
//! display order of the rendered table. The source corpus is a family of
//! near-duplicate report variants differing only in these lists; one
//! definition file per variant replaces per-variant code.
//!
//! Definition files are JSON, validated against an embedded JSON Schema
//! (Draft 7) before use, then cross-checked for internal consistency
//! (every ratio must name known numeric fields, and so on).
//!
//! # Example
//!
//! ```rust,ignore
//! use planfact::definition::ReportDefinition;
//!
//! let def = ReportDefinition::default_sales();
//! assert_eq!(def.header_for("sales_actual"), Some("ОП"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{DefinitionError, DefinitionResult};

/// Default sales report definition, embedded at compile time.
const DEFAULT_DEFINITION: &str = include_str!("../../definitions/sales-report.json");

/// JSON Schema (Draft 7) every definition file must conform to.
const DEFINITION_SCHEMA: &str = include_str!("../../schemas/report-definition.json");

// =============================================================================
// Column and ratio definitions
// =============================================================================

/// One recognized source column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    /// Logical field name used throughout the pipeline (e.g. `sales_actual`).
    pub field: String,
    /// Source header as it appears in the CSV (e.g. `ОП`).
    pub header: String,
    /// Whether the column must exist in the source headers.
    ///
    /// A missing required column is a blocking [`SchemaError`]; a missing
    /// optional column is treated as "column not present".
    ///
    /// [`SchemaError`]: crate::error::SchemaError
    #[serde(default)]
    pub required: bool,
}

/// One derived ratio metric: numerator / denominator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatioDef {
    /// Ratio id used as a field name for the derived column (e.g. `pct_sales`).
    pub id: String,
    /// Display header of the ratio column (e.g. `% ОП`).
    pub header: String,
    /// Logical name of the numerator numeric field.
    pub numerator: String,
    /// Logical name of the denominator numeric field.
    pub denominator: String,
}

// =============================================================================
// Report definition
// =============================================================================

/// The fixed schema of one report variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// Definition format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Report heading shown by display collaborators.
    #[serde(default)]
    pub title: String,

    /// Categorical columns.
    pub labels: Vec<ColumnDef>,

    /// Numeric columns.
    pub values: Vec<ColumnDef>,

    /// Derived ratio columns.
    pub ratios: Vec<RatioDef>,

    /// Fields exposed as filter selectors, in cascade order.
    #[serde(default)]
    pub filters: Vec<String>,

    /// Display order of the rendered table: label/value fields and ratio
    /// ids. Empty means labels, then values, then ratios.
    #[serde(default)]
    pub display: Vec<String>,

    /// Primary grouping column; carries the `TOTAL` marker in the totals row.
    pub group_field: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Kind of a resolved display column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Label,
    Value,
    Ratio,
}

/// A display column resolved against the definition.
#[derive(Debug, Clone)]
pub struct DisplayColumn {
    /// Logical field name or ratio id.
    pub field: String,
    /// Header text for the rendered table.
    pub header: String,
    pub kind: ColumnKind,
}

impl ReportDefinition {
    /// The embedded default sales definition (ОП / ВП plan-fact report).
    pub fn default_sales() -> Self {
        Self::from_json(DEFAULT_DEFINITION)
            .expect("embedded default definition is valid")
    }

    /// Parse a definition from JSON, checking schema and consistency.
    pub fn from_json(json: &str) -> DefinitionResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        validate_definition_json(&value)
            .map_err(|errors| DefinitionError::SchemaError { errors })?;
        let definition: ReportDefinition = serde_json::from_value(value)?;
        definition.check_consistency()?;
        Ok(definition)
    }

    /// Load and validate a definition file.
    pub fn load(path: &Path) -> DefinitionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> DefinitionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Source header for a logical field or ratio id.
    pub fn header_for(&self, field: &str) -> Option<&str> {
        self.labels
            .iter()
            .chain(self.values.iter())
            .find(|c| c.field == field)
            .map(|c| c.header.as_str())
            .or_else(|| {
                self.ratios
                    .iter()
                    .find(|r| r.id == field)
                    .map(|r| r.header.as_str())
            })
    }

    /// Whether `field` is a recognized categorical field.
    pub fn is_label(&self, field: &str) -> bool {
        self.labels.iter().any(|c| c.field == field)
    }

    /// Whether `field` is a recognized numeric field.
    pub fn is_value(&self, field: &str) -> bool {
        self.values.iter().any(|c| c.field == field)
    }

    /// Columns that must exist in the source headers.
    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.labels
            .iter()
            .chain(self.values.iter())
            .filter(|c| c.required)
    }

    /// Display columns resolved to headers and kinds.
    ///
    /// Entries naming columns the definition does not know are skipped;
    /// `check_consistency` rejects such definitions up front, so this only
    /// matters for hand-built definitions.
    pub fn display_columns(&self) -> Vec<DisplayColumn> {
        let order: Vec<&str> = if self.display.is_empty() {
            self.labels
                .iter()
                .map(|c| c.field.as_str())
                .chain(self.values.iter().map(|c| c.field.as_str()))
                .chain(self.ratios.iter().map(|r| r.id.as_str()))
                .collect()
        } else {
            self.display.iter().map(String::as_str).collect()
        };

        order
            .into_iter()
            .filter_map(|field| {
                let kind = if self.is_label(field) {
                    ColumnKind::Label
                } else if self.is_value(field) {
                    ColumnKind::Value
                } else if self.ratios.iter().any(|r| r.id == field) {
                    ColumnKind::Ratio
                } else {
                    return None;
                };
                Some(DisplayColumn {
                    field: field.to_string(),
                    header: self.header_for(field).unwrap_or(field).to_string(),
                    kind,
                })
            })
            .collect()
    }

    /// Cross-check internal references.
    fn check_consistency(&self) -> DefinitionResult<()> {
        let value_fields: HashSet<&str> =
            self.values.iter().map(|c| c.field.as_str()).collect();
        let label_fields: HashSet<&str> =
            self.labels.iter().map(|c| c.field.as_str()).collect();

        let mut seen: HashSet<&str> = HashSet::new();
        for column in self.labels.iter().chain(self.values.iter()) {
            if !seen.insert(column.field.as_str()) {
                return Err(DefinitionError::Inconsistent(format!(
                    "duplicate field '{}'",
                    column.field
                )));
            }
        }

        for ratio in &self.ratios {
            if !seen.insert(ratio.id.as_str()) {
                return Err(DefinitionError::Inconsistent(format!(
                    "ratio id '{}' collides with another field",
                    ratio.id
                )));
            }
            for part in [&ratio.numerator, &ratio.denominator] {
                if !value_fields.contains(part.as_str()) {
                    return Err(DefinitionError::Inconsistent(format!(
                        "ratio '{}' names unknown numeric field '{}'",
                        ratio.id, part
                    )));
                }
            }
        }

        for filter in &self.filters {
            if !label_fields.contains(filter.as_str()) {
                return Err(DefinitionError::Inconsistent(format!(
                    "filter '{}' is not a categorical field",
                    filter
                )));
            }
        }

        for field in &self.display {
            if !seen.contains(field.as_str()) {
                return Err(DefinitionError::Inconsistent(format!(
                    "display column '{}' is not defined",
                    field
                )));
            }
        }

        if !label_fields.contains(self.group_field.as_str()) {
            return Err(DefinitionError::Inconsistent(format!(
                "group_field '{}' is not a categorical field",
                self.group_field
            )));
        }

        Ok(())
    }
}

impl Default for ReportDefinition {
    fn default() -> Self {
        Self::default_sales()
    }
}

// =============================================================================
// Schema validation
// =============================================================================

/// Validate a definition JSON value against the embedded Draft 7 schema.
pub fn validate_definition_json(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(DEFINITION_SCHEMA)
        .expect("Invalid embedded definition schema");

    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check: is this JSON value a structurally valid definition?
pub fn is_valid_definition(data: &Value) -> bool {
    let schema: Value = serde_json::from_str(DEFINITION_SCHEMA)
        .expect("Invalid embedded definition schema");
    jsonschema::draft7::is_valid(&schema, data)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_definition_parses() {
        let def = ReportDefinition::default_sales();
        assert_eq!(def.header_for("sales_actual"), Some("ОП"));
        assert_eq!(def.header_for("pct_sales"), Some("% ОП"));
        assert_eq!(def.group_field, "manager");
        assert!(def.is_label("manager"));
        assert!(def.is_value("profit_plan"));
    }

    #[test]
    fn test_required_columns_from_default() {
        let def = ReportDefinition::default_sales();
        let required: Vec<&str> = def.required_columns().map(|c| c.field.as_str()).collect();
        assert!(required.contains(&"sales_actual"));
        assert!(required.contains(&"sales_plan"));
        assert!(!required.contains(&"region"));
    }

    #[test]
    fn test_display_columns_resolved_in_order() {
        let def = ReportDefinition::default_sales();
        let display = def.display_columns();
        let headers: Vec<&str> = display.iter().map(|c| c.header.as_str()).collect();
        assert_eq!(
            headers,
            vec!["Менеджер", "Покупатель", "Код", "ОП", "ОП План", "% ОП", "ВП", "ВП План", "% ВП"]
        );
        assert_eq!(display[5].kind, ColumnKind::Ratio);
    }

    #[test]
    fn test_schema_rejects_missing_group_field() {
        let bad = json!({
            "labels": [],
            "values": [{ "field": "a", "header": "A" }],
            "ratios": []
        });
        assert!(!is_valid_definition(&bad));
        assert!(validate_definition_json(&bad).is_err());
    }

    #[test]
    fn test_ratio_referencing_unknown_field_rejected() {
        let json = r#"{
            "labels": [{ "field": "manager", "header": "Менеджер" }],
            "values": [{ "field": "actual", "header": "ОП" }],
            "ratios": [{ "id": "pct", "header": "%", "numerator": "actual", "denominator": "plan" }],
            "group_field": "manager"
        }"#;
        let err = ReportDefinition::from_json(json).unwrap_err();
        assert!(err.to_string().contains("plan"));
    }

    #[test]
    fn test_filter_must_be_categorical() {
        let json = r#"{
            "labels": [{ "field": "manager", "header": "Менеджер" }],
            "values": [{ "field": "actual", "header": "ОП" }],
            "ratios": [],
            "filters": ["actual"],
            "group_field": "manager"
        }"#;
        assert!(ReportDefinition::from_json(json).is_err());
    }

    #[test]
    fn test_empty_display_falls_back_to_all_columns() {
        let json = r#"{
            "labels": [{ "field": "manager", "header": "Менеджер" }],
            "values": [{ "field": "actual", "header": "ОП" }],
            "ratios": [],
            "group_field": "manager"
        }"#;
        let def = ReportDefinition::from_json(json).unwrap();
        let display = def.display_columns();
        assert_eq!(display.len(), 2);
        assert_eq!(display[0].field, "manager");
        assert_eq!(display[1].field, "actual");
    }

    #[test]
    fn test_json_roundtrip() {
        let def = ReportDefinition::default_sales();
        let json = def.to_json().unwrap();
        let back = ReportDefinition::from_json(&json).unwrap();
        assert_eq!(back.labels, def.labels);
        assert_eq!(back.ratios, def.ratios);
    }
}
