//! Highlight classification of ratio cells.
//!
//! Pure function of one ratio value. The inequality chain is strict on
//! both sides: exactly 1.0 classifies as `AtTarget`, which renders with
//! no emphasis - the same visual treatment as `Undefined`. That matches
//! the observed behavior of the source reports and is kept as-is.

use crate::models::Highlight;

/// Classify one ratio value into its display category.
pub fn classify(ratio: Option<f64>) -> Highlight {
    match ratio {
        None => Highlight::Undefined,
        Some(v) if v > 1.0 => Highlight::Above,
        Some(v) if v < 1.0 => Highlight::Below,
        Some(_) => Highlight::AtTarget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_above_plan() {
        assert_eq!(classify(Some(1.5)), Highlight::Above);
        assert_eq!(classify(Some(1.0000001)), Highlight::Above);
    }

    #[test]
    fn test_below_plan() {
        assert_eq!(classify(Some(0.8)), Highlight::Below);
        assert_eq!(classify(Some(0.0)), Highlight::Below);
        assert_eq!(classify(Some(-0.5)), Highlight::Below);
    }

    #[test]
    fn test_exactly_on_plan_gets_no_emphasis() {
        let category = classify(Some(1.0));
        assert_eq!(category, Highlight::AtTarget);
        assert!(!category.emphasized());
    }

    #[test]
    fn test_undefined_ratio() {
        let category = classify(None);
        assert_eq!(category, Highlight::Undefined);
        assert!(!category.emphasized());
    }
}
