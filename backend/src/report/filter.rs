//! Filter engine: selection matching and cascaded option lists.
//!
//! Filters compose by logical AND across fields. Option lists are
//! cascaded: field `k`'s candidates reflect the selections of the fields
//! before it in definition order, so a selector never offers a value the
//! current restriction has already filtered away. Passing an
//! unrestricted selection yields independent (full) lists.

use serde::Serialize;

use crate::definition::ReportDefinition;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Dataset, FilterSelection, Record, Selection, ALL_SENTINEL};

/// Option list for one filter selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Logical field name.
    pub field: String,
    /// Display header of the selector.
    pub header: String,
    /// Candidate values, sorted ascending, with the `All` sentinel first.
    pub options: Vec<String>,
}

/// Whether a record passes every field restriction of a selection.
pub fn matches(record: &Record, selection: &FilterSelection) -> bool {
    selection
        .restricted_fields()
        .all(|field| selection.selection(field).accepts(record.label(field)))
}

/// Subset of the dataset matching a selection.
///
/// Identity law: an unrestricted selection returns the dataset unchanged;
/// applying the same selection twice is idempotent.
pub fn apply_filters(dataset: &Dataset, selection: &FilterSelection) -> Dataset {
    if selection.is_unrestricted() {
        return dataset.clone();
    }

    Dataset {
        records: dataset
            .records
            .iter()
            .filter(|r| matches(r, selection))
            .cloned()
            .collect(),
        present: dataset.present.clone(),
    }
}

/// Cascaded option lists for the definition's filter fields.
///
/// Fields are processed in definition order; each field's candidates are
/// the distinct labels of the records that pass all *earlier* fields'
/// selections. Only fields whose column is present in the source are
/// offered.
pub fn filter_options(
    dataset: &Dataset,
    selection: &FilterSelection,
    definition: &ReportDefinition,
) -> Vec<FilterOptions> {
    let mut alive: Vec<&Record> = dataset.records.iter().collect();
    let mut result = Vec::with_capacity(definition.filters.len());

    for field in &definition.filters {
        if !dataset.has_column(field) {
            continue;
        }

        let mut values: Vec<String> = alive
            .iter()
            .map(|r| r.label(field).to_string())
            .collect();
        values.sort();
        values.dedup();

        let mut options = Vec::with_capacity(values.len() + 1);
        options.push(ALL_SENTINEL.to_string());
        options.extend(values);

        result.push(FilterOptions {
            field: field.clone(),
            header: definition.header_for(field).unwrap_or(field).to_string(),
            options,
        });

        // Narrow the record set for the next selector in the cascade.
        let field_selection = selection.selection(field);
        if !field_selection.is_all() {
            alive.retain(|r| field_selection.accepts(r.label(field)));
        }
    }

    result
}

/// Build a selection from `field=value` pairs (query params, CLI flags).
///
/// Values are comma-separated for multiselect; the `All` sentinel (or an
/// empty value) means no restriction. Unknown fields are rejected so a
/// typo never silently returns the unfiltered table.
pub fn selection_from_pairs<I, K, V>(
    pairs: I,
    definition: &ReportDefinition,
) -> PipelineResult<FilterSelection>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut selection = FilterSelection::new();
    for (field, value) in pairs {
        let field = field.as_ref();
        if !definition.is_label(field) {
            return Err(PipelineError::UnknownField(field.to_string()));
        }

        let values: Vec<&str> = value
            .as_ref()
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            continue;
        }
        selection.set(field, Selection::from_values(values));
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::report::normalize::normalize;

    fn dataset() -> (Dataset, ReportDefinition) {
        let definition = ReportDefinition::default_sales();
        let table = parse_str(
            "Регион;Менеджер;Покупатель;ОП;ОП План;ВП;ВП План\n\
             Север;Иванов;Альфа;120;100;10;5\n\
             Север;Петров;Бета;90;100;20;25\n\
             Юг;Иванов;Гамма;50;40;5;5",
            ';',
        )
        .unwrap();
        (normalize(&table, &definition).unwrap().dataset, definition)
    }

    #[test]
    fn test_unrestricted_selection_is_identity() {
        let (dataset, _) = dataset();
        let filtered = apply_filters(&dataset, &FilterSelection::new());
        assert_eq!(filtered.len(), dataset.len());
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let (dataset, _) = dataset();
        let selection = FilterSelection::new().with("manager", Selection::one("Иванов"));

        let once = apply_filters(&dataset, &selection);
        let twice = apply_filters(&once, &selection);
        assert_eq!(once.len(), 2);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_filters_compose_by_and() {
        let (dataset, _) = dataset();
        let selection = FilterSelection::new()
            .with("manager", Selection::one("Иванов"))
            .with("region", Selection::one("Север"));

        let filtered = apply_filters(&dataset, &selection);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records[0].label("buyer"), "Альфа");
    }

    #[test]
    fn test_multiselect_accepts_any_listed_value() {
        let (dataset, _) = dataset();
        let selection = FilterSelection::new()
            .with("buyer", Selection::from_values(["Альфа", "Гамма"]));

        let filtered = apply_filters(&dataset, &selection);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_option_lists_sorted_with_sentinel_first() {
        let (dataset, definition) = dataset();
        let options = filter_options(&dataset, &FilterSelection::new(), &definition);

        let regions = options.iter().find(|o| o.field == "region").unwrap();
        assert_eq!(regions.options, vec!["All", "Север", "Юг"]);
        assert_eq!(regions.header, "Регион");
    }

    #[test]
    fn test_option_lists_cascade_in_definition_order() {
        let (dataset, definition) = dataset();
        // region comes before buyer in the filter order
        let selection = FilterSelection::new().with("region", Selection::one("Юг"));
        let options = filter_options(&dataset, &selection, &definition);

        // The region list itself is unaffected by its own selection...
        let regions = options.iter().find(|o| o.field == "region").unwrap();
        assert_eq!(regions.options, vec!["All", "Север", "Юг"]);

        // ...but downstream selectors only offer what survives it.
        let buyers = options.iter().find(|o| o.field == "buyer").unwrap();
        assert_eq!(buyers.options, vec!["All", "Гамма"]);
    }

    #[test]
    fn test_selection_from_pairs() {
        let definition = ReportDefinition::default_sales();
        let selection = selection_from_pairs(
            [("manager", "Иванов"), ("buyer", "Альфа,Бета"), ("region", "All")],
            &definition,
        )
        .unwrap();

        assert_eq!(selection.selection("manager"), &Selection::one("Иванов"));
        assert!(selection.selection("buyer").accepts("Бета"));
        assert!(selection.selection("region").is_all());
    }

    #[test]
    fn test_selection_from_pairs_rejects_unknown_field() {
        let definition = ReportDefinition::default_sales();
        let err = selection_from_pairs([("typo", "x")], &definition).unwrap_err();
        assert!(err.to_string().contains("typo"));
    }

    #[test]
    fn test_absent_filter_column_not_offered() {
        let definition = ReportDefinition::default_sales();
        let table = parse_str("Менеджер;ОП;ОП План;ВП;ВП План\nИванов;1;2;3;4", ';').unwrap();
        let dataset = normalize(&table, &definition).unwrap().dataset;

        let options = filter_options(&dataset, &FilterSelection::new(), &definition);
        assert!(options.iter().all(|o| o.field != "region"));
        assert!(options.iter().any(|o| o.field == "manager"));
    }
}
