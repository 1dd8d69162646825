//! Free-text salary parsing.
//!
//! Resolution is an ordered rule table; the first rule that matches decides
//! the result and later rules are never consulted:
//!
//! 1. negotiable synonyms
//! 2. `<int> - <int> <unit>` ranges
//! 3. `<keyword> <int> <unit>` thresholds
//! 4. `<int> <unit>` single values
//!
//! Anything else is `SalaryUnit::Unknown` with no amounts. Only unsigned
//! integers are recognised; separators are stripped beforehand, so
//! "2,000-3,000$" reads as 2000-3000 but "1.5 triệu" reads as 15.

use once_cell::sync::Lazy;
use regex::Regex;

use super::units::UnitConverter;
use super::vocabulary::{Bound, Vocabulary};
use crate::types::{Currency, SalaryResult, SalaryUnit};

static DEFAULT_PARSER: Lazy<SalaryParser> = Lazy::new(|| SalaryParser::new(&Vocabulary::default()));

/// One entry of the resolution table
pub struct SalaryRule {
    pub name: &'static str,
    pub apply: fn(&SalaryParser, &str) -> Option<SalaryResult>,
}

/// Resolution order; earlier entries win
pub const SALARY_RULES: [SalaryRule; 4] = [
    SalaryRule {
        name: "negotiable",
        apply: SalaryParser::negotiable_rule,
    },
    SalaryRule {
        name: "range",
        apply: SalaryParser::range_rule,
    },
    SalaryRule {
        name: "threshold",
        apply: SalaryParser::threshold_rule,
    },
    SalaryRule {
        name: "single",
        apply: SalaryParser::single_rule,
    },
];

#[derive(Debug, Clone)]
pub struct SalaryParser {
    converter: UnitConverter,
    vocabulary: Vocabulary,
    range_re: Option<Regex>,
    threshold_re: Option<Regex>,
    single_re: Option<Regex>,
}

fn alternation<'a>(items: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut parts: Vec<String> = items
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s*")
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    parts.sort_by(|a, b| b.len().cmp(&a.len()));
    Some(parts.join("|"))
}

/// Lowercase, drop grouping separators, trim
pub fn preprocess(raw: &str) -> String {
    raw.to_lowercase().replace(['.', ','], "").trim().to_string()
}

fn number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok()
}

impl SalaryParser {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        let vocabulary = &vocabulary.normalized();
        let units = alternation(vocabulary.unit_tokens().into_iter());
        let keywords = alternation(vocabulary.thresholds.iter().map(|t| t.keyword.as_str()));

        let range_re = units.as_ref().and_then(|u| {
            Regex::new(&format!(r"([0-9]+)\s*-\s*([0-9]+)\s*({u})")).ok()
        });
        let threshold_re = match (&keywords, &units) {
            (Some(k), Some(u)) => Regex::new(&format!(r"({k})\s*([0-9]+)\s*({u})")).ok(),
            _ => None,
        };
        let single_re = units
            .as_ref()
            .and_then(|u| Regex::new(&format!(r"([0-9]+)\s*({u})")).ok());

        Self {
            converter: UnitConverter::new(vocabulary),
            vocabulary: vocabulary.clone(),
            range_re,
            threshold_re,
            single_re,
        }
    }

    /// Parses a raw salary string. Never fails: unparseable input yields
    /// `SalaryResult::unknown()`.
    pub fn parse(&self, raw: Option<&str>) -> SalaryResult {
        let Some(raw) = raw else {
            return SalaryResult::unknown();
        };
        let text = preprocess(raw);
        self.resolve(&text).1
    }

    /// Runs the rule table over preprocessed text, reporting which rule fired
    pub fn resolve(&self, text: &str) -> (Option<&'static str>, SalaryResult) {
        SALARY_RULES
            .iter()
            .find_map(|rule| (rule.apply)(self, text).map(|result| (Some(rule.name), result)))
            .unwrap_or((None, SalaryResult::unknown()))
    }

    fn unit_of(currency: Currency) -> Option<SalaryUnit> {
        match currency {
            Currency::Unknown => None,
            other => Some(other.into()),
        }
    }

    pub fn negotiable_rule(&self, text: &str) -> Option<SalaryResult> {
        self.vocabulary
            .negotiable
            .iter()
            .any(|synonym| text.contains(synonym.as_str()))
            .then(SalaryResult::negotiable)
    }

    pub fn range_rule(&self, text: &str) -> Option<SalaryResult> {
        let caps = self.range_re.as_ref()?.captures(text)?;
        let raw_unit = &caps[3];
        let (min, currency) = self.converter.convert(number(&caps[1])?, raw_unit);
        let (max, _) = self.converter.convert(number(&caps[2])?, raw_unit);
        Some(match Self::unit_of(currency) {
            Some(unit) => SalaryResult::range(min, max, unit),
            None => SalaryResult::unknown(),
        })
    }

    pub fn threshold_rule(&self, text: &str) -> Option<SalaryResult> {
        let caps = self.threshold_re.as_ref()?.captures(text)?;
        let (value, currency) = self.converter.convert(number(&caps[2])?, &caps[3]);
        let result = match (self.vocabulary.bound_for(&caps[1]), Self::unit_of(currency)) {
            (Some(Bound::Lower), Some(unit)) => SalaryResult::at_least(value, unit),
            (Some(Bound::Upper), Some(unit)) => SalaryResult::at_most(value, unit),
            _ => SalaryResult::unknown(),
        };
        Some(result)
    }

    pub fn single_rule(&self, text: &str) -> Option<SalaryResult> {
        let caps = self.single_re.as_ref()?.captures(text)?;
        let (value, currency) = self.converter.convert(number(&caps[1])?, &caps[2]);
        Some(match Self::unit_of(currency) {
            Some(unit) => SalaryResult::single(value, unit),
            None => SalaryResult::unknown(),
        })
    }
}

impl Default for SalaryParser {
    fn default() -> Self {
        DEFAULT_PARSER.clone()
    }
}

/// Parses with the built-in vocabulary
pub fn parse_salary(raw: Option<&str>) -> SalaryResult {
    DEFAULT_PARSER.parse(raw)
}
