//! Derived ratio metrics: actual divided by plan.

use crate::definition::ReportDefinition;
use crate::models::Dataset;

/// One ratio value: `Some(n / d)` when both sides are present and the
/// denominator is non-zero, otherwise undefined.
///
/// Never divides by zero, never errors - an undefined ratio is data.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Fill every record's ratio columns from the definition's ratio pairs.
///
/// Consumes and returns the dataset; no other field is touched.
pub fn derive_ratios(mut dataset: Dataset, definition: &ReportDefinition) -> Dataset {
    for record in &mut dataset.records {
        for def in &definition.ratios {
            let value = ratio(record.value(&def.numerator), record.value(&def.denominator));
            record.ratios.insert(def.id.clone(), value);
        }
    }
    dataset
}
