//! Normalization: raw table to typed dataset.
//!
//! Number cleaning follows the source exports: space-grouped digits,
//! comma decimal separator, dash glyphs standing in for zero. Anything
//! that still fails to parse becomes the missing marker - a bad cell is
//! data, never an error, and never aborts the pipeline.
//!
//! The only structural failures are a required column absent from the
//! source headers and a source with no data rows at all; both are
//! blocking, no partial table is produced.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

use crate::definition::ReportDefinition;
use crate::error::{SchemaError, SchemaResult};
use crate::models::{Dataset, Record, PLACEHOLDER};
use crate::parser::RawTable;

// \s is Unicode-aware in the regex crate: covers NBSP and narrow NBSP,
// both of which appear as digit group separators in the exports.
static INNER_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// Hyphen-minus, en dash, em dash, minus sign: a cell of nothing but
// dashes means an explicit zero in the source reports.
static DASH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\-\u{2013}\u{2014}\u{2212}]+$").unwrap());

/// Result of normalizing a raw table.
#[derive(Debug, Clone)]
pub struct NormalizeReport {
    /// The typed dataset, all-zero rows already dropped.
    pub dataset: Dataset,
    /// Number of rows dropped by the admission rule.
    pub dropped: usize,
}

/// Clean one numeric cell.
///
/// - internal whitespace removed (`"1 234,56"` is one number)
/// - comma decimal separator replaced with a period
/// - a dash-only token (`"–"`) becomes `0.0`
/// - empty, unparsable or non-finite values become `None`
pub fn clean_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if DASH_TOKEN.is_match(trimmed) {
        return Some(0.0);
    }

    let compact = INNER_WHITESPACE.replace_all(trimmed, "");
    let normalized = compact.replace(',', ".");

    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Clean one categorical cell: trim, empty becomes the placeholder.
pub fn clean_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a raw table against a report definition.
///
/// Row admission: a record is retained iff at least one numeric field is
/// present and `!= 0.0` (negative values count as signal). Dropped rows
/// are counted in the returned report.
pub fn normalize(table: &RawTable, definition: &ReportDefinition) -> SchemaResult<NormalizeReport> {
    check_required_columns(table, definition)?;

    if table.rows.is_empty() {
        return Err(SchemaError::NoRows);
    }

    // Resolve each recognized column to its source index once.
    let label_columns: Vec<(&str, usize)> = definition
        .labels
        .iter()
        .filter_map(|c| table.column_index(&c.header).map(|i| (c.field.as_str(), i)))
        .collect();
    let value_columns: Vec<(&str, usize)> = definition
        .values
        .iter()
        .filter_map(|c| table.column_index(&c.header).map(|i| (c.field.as_str(), i)))
        .collect();

    let present: BTreeSet<String> = label_columns
        .iter()
        .chain(value_columns.iter())
        .map(|(field, _)| field.to_string())
        .collect();

    let mut records = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;

    for row_idx in 0..table.rows.len() {
        let mut labels = HashMap::with_capacity(label_columns.len());
        for (field, col) in &label_columns {
            labels.insert(field.to_string(), clean_label(table.cell(row_idx, *col)));
        }

        let mut values = HashMap::with_capacity(value_columns.len());
        for (field, col) in &value_columns {
            values.insert(field.to_string(), clean_number(table.cell(row_idx, *col)));
        }

        let admitted = values.values().any(|v| matches!(v, Some(n) if *n != 0.0));
        if !admitted {
            dropped += 1;
            continue;
        }

        records.push(Record {
            labels,
            values,
            ratios: HashMap::new(),
        });
    }

    Ok(NormalizeReport {
        dataset: Dataset { records, present },
        dropped,
    })
}

/// Fail with [`SchemaError::MissingColumns`] when any required column is
/// absent from the source headers entirely.
fn check_required_columns(table: &RawTable, definition: &ReportDefinition) -> SchemaResult<()> {
    let missing: Vec<String> = definition
        .required_columns()
        .filter(|c| table.column_index(&c.header).is_none())
        .map(|c| c.header.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn definition() -> ReportDefinition {
        ReportDefinition::default_sales()
    }

    #[test]
    fn test_clean_number_locale_forms() {
        assert_eq!(clean_number("1 234,56"), Some(1234.56));
        assert_eq!(clean_number("–"), Some(0.0));
        assert_eq!(clean_number("—"), Some(0.0));
        assert_eq!(clean_number("-"), Some(0.0));
        assert_eq!(clean_number(""), None);
        assert_eq!(clean_number("   "), None);
        assert_eq!(clean_number("abc"), None);
        assert_eq!(clean_number("100"), Some(100.0));
        assert_eq!(clean_number("0,5"), Some(0.5));
        assert_eq!(clean_number("-12,5"), Some(-12.5));
        assert_eq!(clean_number("12.5"), Some(12.5));
    }

    #[test]
    fn test_clean_number_nbsp_groups() {
        // NBSP and narrow NBSP as thousand separators
        assert_eq!(clean_number("1\u{a0}234,56"), Some(1234.56));
        assert_eq!(clean_number("1\u{202f}234"), Some(1234.0));
    }

    #[test]
    fn test_clean_label_placeholder() {
        assert_eq!(clean_label("  Иванов "), "Иванов");
        assert_eq!(clean_label(""), PLACEHOLDER);
        assert_eq!(clean_label("   "), PLACEHOLDER);
    }

    #[test]
    fn test_normalize_types_every_numeric_cell() {
        let table = parse_str(
            "Менеджер;ОП;ОП План;ВП;ВП План\nИванов;1 234,56;1000;x;–",
            ';',
        )
        .unwrap();
        let report = normalize(&table, &definition()).unwrap();
        let record = &report.dataset.records[0];

        assert_eq!(record.value("sales_actual"), Some(1234.56));
        assert_eq!(record.value("sales_plan"), Some(1000.0));
        assert_eq!(record.value("profit_actual"), None);
        assert_eq!(record.value("profit_plan"), Some(0.0));
    }

    #[test]
    fn test_missing_required_column_is_blocking() {
        let table = parse_str("Менеджер;ОП;ОП План;ВП\nИванов;1;2;3", ';').unwrap();
        let err = normalize(&table, &definition()).unwrap_err();
        match err {
            SchemaError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["ВП План".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other}"),
        }
    }

    #[test]
    fn test_optional_column_absent_means_not_present() {
        let table =
            parse_str("Менеджер;ОП;ОП План;ВП;ВП План\nИванов;1;2;3;4", ';').unwrap();
        let report = normalize(&table, &definition()).unwrap();

        assert!(!report.dataset.has_column("region"));
        assert!(report.dataset.has_column("manager"));
        // Absent column reads as placeholder / missing per record.
        assert_eq!(report.dataset.records[0].label("region"), PLACEHOLDER);
        assert_eq!(report.dataset.records[0].value("sales_prior"), None);
    }

    #[test]
    fn test_row_admission_drops_all_zero_rows() {
        let table = parse_str(
            "Менеджер;ОП;ОП План;ВП;ВП План\nИванов;120;100;10;5\nПусто;0;0;–;\nМинус;-5;0;0;0",
            ';',
        )
        .unwrap();
        let report = normalize(&table, &definition()).unwrap();

        // The all-zero/missing row is dropped; the negative-only row stays.
        assert_eq!(report.dataset.len(), 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.dataset.records[1].label("manager"), "Минус");
    }

    #[test]
    fn test_no_data_rows_is_blocking() {
        let table = parse_str("Менеджер;ОП;ОП План;ВП;ВП План\n", ';').unwrap();
        assert!(matches!(
            normalize(&table, &definition()),
            Err(SchemaError::NoRows)
        ));
    }
}
