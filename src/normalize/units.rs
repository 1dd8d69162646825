use once_cell::sync::Lazy;

use super::vocabulary::Vocabulary;
use crate::types::Currency;

static DEFAULT_CONVERTER: Lazy<UnitConverter> =
    Lazy::new(|| UnitConverter::new(&Vocabulary::default()));

/// Maps a raw unit token to a scale factor and currency tag.
/// Unknown tokens keep the amount and report `Currency::Unknown`.
#[derive(Debug, Clone)]
pub struct UnitConverter {
    vocabulary: Vocabulary,
}

impl UnitConverter {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        let units = vocabulary.normalized().units;
        Self {
            vocabulary: Vocabulary {
                units,
                ..Vocabulary::default()
            },
        }
    }

    pub fn convert(&self, amount: f64, raw_unit: &str) -> (f64, Currency) {
        match self.vocabulary.unit_for(raw_unit) {
            Some(entry) => (amount / entry.divisor, entry.currency),
            None => (amount, Currency::Unknown),
        }
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        DEFAULT_CONVERTER.clone()
    }
}

/// Converts with the built-in unit table
pub fn convert(amount: f64, raw_unit: &str) -> (f64, Currency) {
    DEFAULT_CONVERTER.convert(amount, raw_unit)
}
