//! Volume-weighted totals over a filtered dataset.
//!
//! Each numeric field's total is the arithmetic sum with missing treated
//! as zero; each totals ratio is recomputed from the summed numerator and
//! denominator (weighting by volume, not by row count - NOT the mean of
//! per-row ratios). Totals merge associatively, so a partition of the
//! dataset totals to the same result as the whole.

use std::collections::HashMap;

use crate::definition::ReportDefinition;
use crate::models::Record;

use super::ratio::ratio;

/// Marker label carried by the primary grouping column of the totals row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Accumulated sums over a set of records.
#[derive(Debug, Clone, Default)]
pub struct Totals {
    sums: HashMap<String, f64>,
    /// Number of records accumulated.
    pub count: usize,
}

impl Totals {
    /// Sum every numeric field of the definition over `records`,
    /// missing values contributing zero.
    pub fn compute(records: &[Record], definition: &ReportDefinition) -> Self {
        let mut totals = Totals::default();
        for record in records {
            totals.add(record, definition);
        }
        totals
    }

    /// Accumulate one record.
    pub fn add(&mut self, record: &Record, definition: &ReportDefinition) {
        for column in &definition.values {
            let entry = self.sums.entry(column.field.clone()).or_insert(0.0);
            *entry += record.value(&column.field).unwrap_or(0.0);
        }
        self.count += 1;
    }

    /// Merge two partial totals. Ratios are always recomputed from the
    /// merged sums, so merging is associative and order-independent.
    pub fn merge(mut self, other: Totals) -> Totals {
        for (field, sum) in other.sums {
            *self.sums.entry(field).or_insert(0.0) += sum;
        }
        self.count += other.count;
        self
    }

    /// Summed value of one numeric field.
    pub fn sum(&self, field: &str) -> f64 {
        self.sums.get(field).copied().unwrap_or(0.0)
    }

    /// Totals ratio for one ratio definition: sum(numerator) over
    /// sum(denominator), undefined when the summed denominator is zero.
    pub fn ratio_for(&self, numerator: &str, denominator: &str) -> Option<f64> {
        ratio(Some(self.sum(numerator)), Some(self.sum(denominator)))
    }

    /// The synthetic totals record: summed values, recomputed ratios,
    /// `TOTAL` in the primary grouping column, blank for other labels.
    pub fn to_record(&self, definition: &ReportDefinition) -> Record {
        let mut labels = HashMap::with_capacity(definition.labels.len());
        for column in &definition.labels {
            let label = if column.field == definition.group_field {
                TOTAL_LABEL.to_string()
            } else {
                String::new()
            };
            labels.insert(column.field.clone(), label);
        }

        let mut values = HashMap::with_capacity(definition.values.len());
        for column in &definition.values {
            values.insert(column.field.clone(), Some(self.sum(&column.field)));
        }

        let mut ratios = HashMap::with_capacity(definition.ratios.len());
        for def in &definition.ratios {
            ratios.insert(
                def.id.clone(),
                self.ratio_for(&def.numerator, &def.denominator),
            );
        }

        Record {
            labels,
            values,
            ratios,
        }
    }
}
