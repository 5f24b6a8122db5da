//! Report pipeline.
//!
//! This module turns a raw table into a rendered plan-fact report:
//! - `normalize`: raw strings to typed records, row admission, schema check
//! - `ratio`: derived actual/plan ratio metrics
//! - `filter`: selection matching and cascaded option lists
//! - `totals`: volume-weighted totals row
//! - `highlight`: ratio cell display categories
//! - `format`: locale number/percent formatting
//! - `pipeline`: the render pass tying the stages together

pub mod filter;
pub mod format;
pub mod highlight;
pub mod normalize;
pub mod pipeline;
pub mod ratio;
pub mod totals;

pub use filter::{apply_filters, filter_options, selection_from_pairs, FilterOptions};
pub use highlight::classify;
pub use normalize::{clean_number, normalize, NormalizeReport};
pub use pipeline::{
    dataset_from_table, render, report_from_bytes, RenderedCell, RenderedReport, RenderedRow,
    RenderedTable, ReportMeta,
};
pub use ratio::{derive_ratios, ratio};
pub use totals::Totals;
