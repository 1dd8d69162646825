//! Fixed vocabularies driving the normalizers.
//!
//! Every table here is plain data: the parsers only iterate over them in
//! order. A `[vocabulary]` table in `config.toml` can replace any of them
//! (fields left out keep their defaults).

use serde::{Deserialize, Serialize};

use super::salary::preprocess;
use crate::constants::{MULTI_LOCATION_CITY, NATIONWIDE_CITY, OVERSEAS_CITY};
use crate::types::{Currency, TitleCategory};

/// Raw unit tokens sharing one conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitEntry {
    pub tokens: Vec<String>,
    /// Amounts are divided by this to reach the canonical scale
    pub divisor: f64,
    pub currency: Currency,
}

/// Which side of the range a threshold keyword fixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdKeyword {
    /// Spaces inside a keyword match any run of whitespace, including none
    pub keyword: String,
    pub bound: Bound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRule {
    pub category: TitleCategory,
    /// Lowercase substrings; any hit selects the category
    #[serde(default)]
    pub contains: Vec<String>,
    /// Whole trimmed lowercase titles selecting the category
    #[serde(default)]
    pub exact: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRule {
    pub city: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub units: Vec<UnitEntry>,
    pub negotiable: Vec<String>,
    pub thresholds: Vec<ThresholdKeyword>,
    pub titles: Vec<TitleRule>,
    pub special_locations: Vec<LocationRule>,
    pub location_delimiter: char,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            units: vec![
                UnitEntry {
                    tokens: strings(&["triệu", "tr"]),
                    divisor: 1.0,
                    currency: Currency::Vnd,
                },
                // thousands -> millions
                UnitEntry {
                    tokens: strings(&["k", "nghìn"]),
                    divisor: 1000.0,
                    currency: Currency::Vnd,
                },
                UnitEntry {
                    tokens: strings(&["usd", "$"]),
                    divisor: 1.0,
                    currency: Currency::Usd,
                },
            ],
            negotiable: strings(&["thoả thuận", "thỏa thuận", "negotiable"]),
            thresholds: vec![
                ThresholdKeyword {
                    keyword: "trên".to_string(),
                    bound: Bound::Lower,
                },
                ThresholdKeyword {
                    keyword: "above".to_string(),
                    bound: Bound::Lower,
                },
                ThresholdKeyword {
                    keyword: "từ".to_string(),
                    bound: Bound::Lower,
                },
                ThresholdKeyword {
                    keyword: "tới".to_string(),
                    bound: Bound::Upper,
                },
                ThresholdKeyword {
                    keyword: "up to".to_string(),
                    bound: Bound::Upper,
                },
            ],
            titles: vec![
                TitleRule {
                    category: TitleCategory::DataBusinessAnalyst,
                    contains: strings(&["data analyst", "business analyst", "phân tích dữ liệu"]),
                    exact: strings(&["ba"]),
                },
                TitleRule {
                    category: TitleCategory::SoftwareDeveloper,
                    contains: strings(&[
                        "software engineer",
                        "developer",
                        "lập trình viên",
                        "dev",
                        "programmer",
                        "dotnet",
                    ]),
                    exact: Vec::new(),
                },
                TitleRule {
                    category: TitleCategory::DataSystemEngineer,
                    contains: strings(&["data engineer", "kỹ sư dữ liệu", "etl", "system engineer"]),
                    exact: Vec::new(),
                },
                TitleRule {
                    category: TitleCategory::QaTester,
                    contains: strings(&["tester", "qa", "qc"]),
                    exact: Vec::new(),
                },
                TitleRule {
                    category: TitleCategory::ManagementLead,
                    contains: strings(&["manager", "pm", "project lead"]),
                    exact: Vec::new(),
                },
            ],
            special_locations: vec![
                LocationRule {
                    city: NATIONWIDE_CITY.to_string(),
                    keywords: strings(&["toàn quốc", "vietnam", "viet nam"]),
                },
                LocationRule {
                    city: OVERSEAS_CITY.to_string(),
                    keywords: strings(&["nước ngoài", "oversea", "global"]),
                },
                LocationRule {
                    city: MULTI_LOCATION_CITY.to_string(),
                    keywords: strings(&["nhiều địa điểm", "multi-location"]),
                },
            ],
            location_delimiter: ':',
        }
    }
}

fn lower_trim(text: &str) -> String {
    text.trim().to_lowercase()
}

fn normalize_all(items: &[String], normalize: fn(&str) -> String) -> Vec<String> {
    items
        .iter()
        .map(|item| normalize(item))
        .filter(|item| !item.is_empty())
        .collect()
}

fn check_entries(table: &str, items: &[String], normalize: fn(&str) -> String) -> Result<(), String> {
    match items.iter().find(|item| normalize(item).is_empty()) {
        Some(item) => Err(format!("vocabulary.{} has an empty entry {:?}", table, item)),
        None => Ok(()),
    }
}

impl Vocabulary {
    /// Copy with every entry in the form the parsers compare against:
    /// salary and unit entries go through the salary preprocessing, title
    /// and location keywords are trimmed and lowercased. Entries that end
    /// up empty are dropped, since an empty keyword would match any input.
    pub fn normalized(&self) -> Self {
        Self {
            units: self
                .units
                .iter()
                .map(|entry| UnitEntry {
                    tokens: normalize_all(&entry.tokens, preprocess),
                    ..entry.clone()
                })
                .collect(),
            negotiable: normalize_all(&self.negotiable, preprocess),
            thresholds: self
                .thresholds
                .iter()
                .map(|t| ThresholdKeyword {
                    keyword: preprocess(&t.keyword),
                    bound: t.bound,
                })
                .filter(|t| !t.keyword.is_empty())
                .collect(),
            titles: self
                .titles
                .iter()
                .map(|rule| TitleRule {
                    category: rule.category,
                    contains: normalize_all(&rule.contains, lower_trim),
                    exact: normalize_all(&rule.exact, lower_trim),
                })
                .collect(),
            special_locations: self
                .special_locations
                .iter()
                .map(|rule| LocationRule {
                    city: rule.city.clone(),
                    keywords: normalize_all(&rule.keywords, lower_trim),
                })
                .collect(),
            location_delimiter: self.location_delimiter,
        }
    }

    /// Rejects entries that are empty once normalized
    pub fn validate(&self) -> Result<(), String> {
        for entry in &self.units {
            check_entries("units.tokens", &entry.tokens, preprocess)?;
            if !(entry.divisor.is_finite() && entry.divisor > 0.0) {
                return Err(format!("vocabulary.units divisor must be positive, got {}", entry.divisor));
            }
        }
        check_entries("negotiable", &self.negotiable, preprocess)?;
        for threshold in &self.thresholds {
            check_entries("thresholds.keyword", std::slice::from_ref(&threshold.keyword), preprocess)?;
        }
        for rule in &self.titles {
            check_entries("titles.contains", &rule.contains, lower_trim)?;
            check_entries("titles.exact", &rule.exact, lower_trim)?;
        }
        for rule in &self.special_locations {
            check_entries("special_locations.keywords", &rule.keywords, lower_trim)?;
            if rule.city.trim().is_empty() {
                return Err("vocabulary.special_locations has an empty city".to_string());
            }
        }
        if self.location_delimiter.is_whitespace() {
            return Err("vocabulary.location_delimiter must not be whitespace".to_string());
        }
        Ok(())
    }

    /// Looks up the conversion entry for a raw unit token
    pub fn unit_for(&self, token: &str) -> Option<&UnitEntry> {
        self.units
            .iter()
            .find(|entry| entry.tokens.iter().any(|t| t == token))
    }

    /// All unit tokens, longest first so alternations prefer "triệu" over "tr"
    pub fn unit_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self
            .units
            .iter()
            .flat_map(|entry| entry.tokens.iter().map(String::as_str))
            .filter(|t| !t.is_empty())
            .collect();
        tokens.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        tokens
    }

    /// The bound a matched threshold keyword fixes; whitespace is ignored
    /// so "upto" and "up  to" both resolve like "up to"
    pub fn bound_for(&self, matched: &str) -> Option<Bound> {
        let squashed: String = matched.split_whitespace().collect();
        self.thresholds
            .iter()
            .find(|t| t.keyword.split_whitespace().collect::<String>() == squashed)
            .map(|t| t.bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_populated() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.units.len(), 3);
        assert_eq!(vocab.titles.len(), 5);
        assert_eq!(vocab.special_locations.len(), 3);
        assert_eq!(vocab.location_delimiter, ':');
    }

    #[test]
    fn test_unit_tokens_longest_first() {
        let vocab = Vocabulary::default();
        let tokens = vocab.unit_tokens();
        let long = tokens.iter().position(|t| *t == "triệu").unwrap();
        let short = tokens.iter().position(|t| *t == "tr").unwrap();
        assert!(long < short);
    }

    #[test]
    fn test_bound_for_ignores_spacing() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.bound_for("up to"), Some(Bound::Upper));
        assert_eq!(vocab.bound_for("upto"), Some(Bound::Upper));
        assert_eq!(vocab.bound_for("trên"), Some(Bound::Lower));
        assert_eq!(vocab.bound_for("dưới"), None);
    }

    #[test]
    fn test_partial_override_from_toml() {
        let vocab: Vocabulary = toml::from_str(
            r#"
            negotiable = ["thương lượng"]
            location_delimiter = ";"
            "#,
        )
        .unwrap();
        assert_eq!(vocab.negotiable, vec!["thương lượng".to_string()]);
        assert_eq!(vocab.location_delimiter, ';');
        // untouched tables keep their defaults
        assert_eq!(vocab.units, Vocabulary::default().units);
    }

    #[test]
    fn test_unit_table_from_toml() {
        let vocab: Vocabulary = toml::from_str(
            r#"
            [[units]]
            tokens = ["eur", "€"]
            divisor = 1.0
            currency = "Unknown"
            "#,
        )
        .unwrap();
        assert_eq!(vocab.units.len(), 1);
        assert_eq!(vocab.unit_for("€").unwrap().currency, Currency::Unknown);
        assert!(vocab.unit_for("usd").is_none());
    }

    #[test]
    fn test_normalized_lowercases_and_drops_empty_entries() {
        let vocab: Vocabulary = toml::from_str(
            r#"
            negotiable = [" Thương Lượng ", "", "."]
            thresholds = [{ keyword = "Tối Đa", bound = "upper" }, { keyword = "  ", bound = "lower" }]

            [[units]]
            tokens = ["EUR", " "]
            divisor = 1.0
            currency = "USD"

            [[titles]]
            category = "Software Developer"
            contains = ["DevOps", ""]
            exact = [" SRE "]

            [[special_locations]]
            city = "Remote"
            keywords = ["Từ Xa", " "]
            "#,
        )
        .unwrap();
        let normalized = vocab.normalized();

        assert_eq!(normalized.negotiable, vec!["thương lượng".to_string()]);
        assert_eq!(normalized.thresholds.len(), 1);
        assert_eq!(normalized.thresholds[0].keyword, "tối đa");
        assert_eq!(normalized.units[0].tokens, vec!["eur".to_string()]);
        assert_eq!(normalized.titles[0].contains, vec!["devops".to_string()]);
        assert_eq!(normalized.titles[0].exact, vec!["sre".to_string()]);
        assert_eq!(normalized.special_locations[0].keywords, vec!["từ xa".to_string()]);
    }

    #[test]
    fn test_validate_rejects_empty_entries() {
        assert!(Vocabulary::default().validate().is_ok());

        let mut vocab = Vocabulary::default();
        vocab.negotiable.push(String::new());
        assert!(vocab.validate().unwrap_err().contains("negotiable"));

        let mut vocab = Vocabulary::default();
        vocab.titles[0].contains.push("   ".to_string());
        assert!(vocab.validate().unwrap_err().contains("titles.contains"));

        let mut vocab = Vocabulary::default();
        vocab.special_locations[0].keywords.push(String::new());
        assert!(vocab.validate().is_err());

        let mut vocab = Vocabulary::default();
        vocab.units[0].tokens.push(",".to_string());
        assert!(vocab.validate().is_err());

        let mut vocab = Vocabulary::default();
        vocab.units[1].divisor = 0.0;
        assert!(vocab.validate().is_err());
    }

    #[test]
    fn test_default_is_already_normalized() {
        assert_eq!(Vocabulary::default().normalized(), Vocabulary::default());
    }
}
