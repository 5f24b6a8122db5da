//! Domain models for the planfact report pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Record`] - one normalized row: categorical labels + numeric values + derived ratios
//! - [`Dataset`] - ordered record set sharing one fixed schema
//! - [`Selection`] / [`FilterSelection`] - per-field accepted-value sets
//! - [`Highlight`] - display category of one ratio cell
//!
//! After normalization every numeric cell is either a finite `f64` or
//! `None` (the missing marker) - never a raw string. Categorical cells
//! are never empty: a missing label is the [`PLACEHOLDER`] token, so
//! grouping and display never mix empty strings with real values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Placeholder label for an empty or missing categorical cell.
pub const PLACEHOLDER: &str = "-";

/// Sentinel option meaning "no restriction" in a filter selector.
///
/// Always listed first in option lists; selecting it is equivalent to
/// selecting every other value.
pub const ALL_SENTINEL: &str = "All";

// =============================================================================
// Record
// =============================================================================

/// One normalized row of the source table.
///
/// Field names are the logical names from the report definition, not the
/// raw source headers. A recognized column absent from the source file is
/// simply absent from these maps; accessors fall back to the missing
/// treatment so downstream stages need not distinguish the two cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    /// Categorical labels, `PLACEHOLDER` for empty cells.
    pub labels: HashMap<String, String>,
    /// Numeric values, `None` for missing cells.
    pub values: HashMap<String, Option<f64>>,
    /// Derived ratio metrics keyed by ratio id, `None` when undefined.
    #[serde(default)]
    pub ratios: HashMap<String, Option<f64>>,
}

impl Record {
    /// Categorical label for `field`, or the placeholder when the column
    /// was not present in the source.
    pub fn label(&self, field: &str) -> &str {
        self.labels.get(field).map(String::as_str).unwrap_or(PLACEHOLDER)
    }

    /// Numeric value for `field`; `None` covers both a missing cell and a
    /// column not present in the source.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied().flatten()
    }

    /// Derived ratio for `id`, `None` when undefined.
    pub fn ratio(&self, id: &str) -> Option<f64> {
        self.ratios.get(id).copied().flatten()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Ordered sequence of records sharing a fixed schema.
///
/// The schema is fixed at load time; `present` records which logical
/// columns actually existed in the source file, so callers can tell
/// "column not present" apart from "value missing in this row".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Normalized records, in source order.
    pub records: Vec<Record>,
    /// Logical column names present in the source headers.
    pub present: BTreeSet<String>,
}

impl Dataset {
    /// Whether a logical column existed in the source file at all.
    pub fn has_column(&self, field: &str) -> bool {
        self.present.contains(field)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// Filter Selection
// =============================================================================

/// Accepted values for one categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Selection {
    /// No restriction: every value accepted.
    All,
    /// Only the listed values accepted.
    Values(BTreeSet<String>),
}

impl Selection {
    /// Selection accepting exactly one value (the dropdown case).
    pub fn one(value: impl Into<String>) -> Self {
        Selection::Values(BTreeSet::from([value.into()]))
    }

    /// Selection from any list of values; the `ALL_SENTINEL` anywhere in
    /// the list collapses to `All`.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.iter().any(|v| v == ALL_SENTINEL) {
            Selection::All
        } else {
            Selection::Values(set)
        }
    }

    /// Whether `value` passes this selection.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Values(set) => set.contains(value),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// Mapping from categorical field name to its accepted-value set.
///
/// Constructed fresh per user interaction; treated as immutable once a
/// filtering pass starts. A field not present in the map is unrestricted.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    fields: HashMap<String, Selection>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: restrict `field` to `selection`.
    pub fn with(mut self, field: impl Into<String>, selection: Selection) -> Self {
        self.set(field, selection);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, selection: Selection) {
        let field = field.into();
        // Storing All is the same as not storing the field at all.
        if selection.is_all() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, selection);
        }
    }

    /// Effective selection for `field` (`All` when unset).
    pub fn selection(&self, field: &str) -> &Selection {
        self.fields.get(field).unwrap_or(&Selection::All)
    }

    /// Fields that actually restrict something.
    pub fn restricted_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// True when every field is unrestricted.
    pub fn is_unrestricted(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// Highlight
// =============================================================================

/// Display category of one ratio cell.
///
/// `AtTarget` is reachable only at exactly 1.0 and renders with no
/// emphasis, same as `Undefined` - the observed strict-inequality chain
/// (`> 1`, `< 1`, else nothing) is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Ratio above 1: positive emphasis.
    Above,
    /// Ratio below 1: negative emphasis.
    Below,
    /// Ratio exactly 1: no emphasis.
    AtTarget,
    /// Ratio undefined (missing value or zero plan): no emphasis.
    Undefined,
}

impl Highlight {
    /// Whether the category carries visual emphasis.
    pub fn emphasized(&self) -> bool {
        matches!(self, Highlight::Above | Highlight::Below)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors_fall_back_to_missing() {
        let record = Record::default();
        assert_eq!(record.label("region"), PLACEHOLDER);
        assert_eq!(record.value("sales_actual"), None);
        assert_eq!(record.ratio("pct_sales"), None);
    }

    #[test]
    fn test_selection_one_accepts_only_that_value() {
        let sel = Selection::one("A");
        assert!(sel.accepts("A"));
        assert!(!sel.accepts("B"));
    }

    #[test]
    fn test_selection_from_values_collapses_sentinel() {
        let sel = Selection::from_values(["North", ALL_SENTINEL]);
        assert!(sel.is_all());
        assert!(sel.accepts("anything"));
    }

    #[test]
    fn test_filter_selection_defaults_to_all() {
        let selection = FilterSelection::new();
        assert!(selection.is_unrestricted());
        assert!(selection.selection("manager").is_all());
    }

    #[test]
    fn test_setting_all_removes_restriction() {
        let mut selection = FilterSelection::new().with("manager", Selection::one("A"));
        assert!(!selection.is_unrestricted());
        selection.set("manager", Selection::All);
        assert!(selection.is_unrestricted());
    }

    #[test]
    fn test_highlight_emphasis() {
        assert!(Highlight::Above.emphasized());
        assert!(Highlight::Below.emphasized());
        assert!(!Highlight::AtTarget.emphasized());
        assert!(!Highlight::Undefined.emphasized());
    }
}
