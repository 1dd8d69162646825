use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw job listing as delivered by a source (CSV import or crawler).
/// Every field except the link may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub salary: Option<String>,
    pub address: Option<String>,
    /// Stable identity of the listing; storage deduplicates on it
    #[serde(rename = "link_description", alias = "external_link")]
    pub external_link: String,
}

/// Currency tag produced by the unit table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "VND")]
    Vnd,
    #[serde(rename = "USD")]
    Usd,
    Unknown,
}

/// Canonical unit attached to a parsed salary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalaryUnit {
    #[serde(rename = "VND")]
    Vnd,
    #[serde(rename = "USD")]
    Usd,
    Negotiable,
    Unknown,
}

impl SalaryUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryUnit::Vnd => "VND",
            SalaryUnit::Usd => "USD",
            SalaryUnit::Negotiable => "Negotiable",
            SalaryUnit::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "VND" => SalaryUnit::Vnd,
            "USD" => SalaryUnit::Usd,
            "Negotiable" => SalaryUnit::Negotiable,
            _ => SalaryUnit::Unknown,
        }
    }
}

impl From<Currency> for SalaryUnit {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::Vnd => SalaryUnit::Vnd,
            Currency::Usd => SalaryUnit::Usd,
            Currency::Unknown => SalaryUnit::Unknown,
        }
    }
}

impl fmt::Display for SalaryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured compensation extracted from a free-text salary.
///
/// Amounts are in millions for VND and in units for USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryResult {
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: SalaryUnit,
}

impl SalaryResult {
    pub fn unknown() -> Self {
        Self {
            average: None,
            min: None,
            max: None,
            unit: SalaryUnit::Unknown,
        }
    }

    pub fn negotiable() -> Self {
        Self {
            average: Some(0.0),
            min: Some(0.0),
            max: Some(0.0),
            unit: SalaryUnit::Negotiable,
        }
    }

    pub fn range(min: f64, max: f64, unit: SalaryUnit) -> Self {
        Self {
            average: Some((min + max) / 2.0),
            min: Some(min),
            max: Some(max),
            unit,
        }
    }

    pub fn at_least(value: f64, unit: SalaryUnit) -> Self {
        Self {
            average: Some(value),
            min: Some(value),
            max: None,
            unit,
        }
    }

    pub fn at_most(value: f64, unit: SalaryUnit) -> Self {
        Self {
            average: Some(value),
            min: None,
            max: Some(value),
            unit,
        }
    }

    pub fn single(value: f64, unit: SalaryUnit) -> Self {
        Self {
            average: Some(value),
            min: Some(value),
            max: Some(value),
            unit,
        }
    }
}

/// Fixed job-title taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TitleCategory {
    #[serde(rename = "Data/Business Analyst")]
    DataBusinessAnalyst,
    #[serde(rename = "Software Developer")]
    SoftwareDeveloper,
    #[serde(rename = "Data/System Engineer")]
    DataSystemEngineer,
    #[serde(rename = "QA/Tester")]
    QaTester,
    #[serde(rename = "Management/Lead")]
    ManagementLead,
    #[serde(rename = "Other IT Role")]
    OtherItRole,
    Unknown,
}

impl TitleCategory {
    pub const ALL: [TitleCategory; 7] = [
        TitleCategory::DataBusinessAnalyst,
        TitleCategory::SoftwareDeveloper,
        TitleCategory::DataSystemEngineer,
        TitleCategory::QaTester,
        TitleCategory::ManagementLead,
        TitleCategory::OtherItRole,
        TitleCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TitleCategory::DataBusinessAnalyst => "Data/Business Analyst",
            TitleCategory::SoftwareDeveloper => "Software Developer",
            TitleCategory::DataSystemEngineer => "Data/System Engineer",
            TitleCategory::QaTester => "QA/Tester",
            TitleCategory::ManagementLead => "Management/Lead",
            TitleCategory::OtherItRole => "Other IT Role",
            TitleCategory::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .unwrap_or(TitleCategory::Unknown)
    }
}

impl fmt::Display for TitleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (city, district) pair found in an address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationPair {
    pub city: String,
    pub district: Option<String>,
}

impl LocationPair {
    pub fn new(city: impl Into<String>, district: Option<String>) -> Self {
        Self {
            city: city.into(),
            district,
        }
    }

    /// City without a district (special cases and the Unknown fallback)
    pub fn city_only(city: impl Into<String>) -> Self {
        Self::new(city, None)
    }

    pub fn unknown() -> Self {
        Self::city_only(crate::constants::UNKNOWN_CITY)
    }
}

/// Flattened output row: one per (record, location pair)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub job_title: Option<String>,
    pub company: Option<String>,
    #[serde(rename = "salary")]
    pub salary_average: Option<f64>,
    #[serde(rename = "min_salary")]
    pub salary_min: Option<f64>,
    #[serde(rename = "max_salary")]
    pub salary_max: Option<f64>,
    pub salary_unit: SalaryUnit,
    pub city: String,
    pub district: Option<String>,
    #[serde(rename = "standardized_job_title")]
    pub category: TitleCategory,
    #[serde(rename = "link_description")]
    pub external_link: String,
}

impl NormalizedRow {
    pub fn location(&self) -> LocationPair {
        LocationPair::new(self.city.clone(), self.district.clone())
    }

    pub fn salary(&self) -> SalaryResult {
        SalaryResult {
            average: self.salary_average,
            min: self.salary_min,
            max: self.salary_max,
            unit: self.salary_unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_unit_labels_round_trip() {
        for unit in [
            SalaryUnit::Vnd,
            SalaryUnit::Usd,
            SalaryUnit::Negotiable,
            SalaryUnit::Unknown,
        ] {
            assert_eq!(SalaryUnit::from_label(unit.as_str()), unit);
        }
        assert_eq!(SalaryUnit::from_label("Thoả thuận"), SalaryUnit::Unknown);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(
            TitleCategory::from_label("Management/Lead"),
            TitleCategory::ManagementLead
        );
        assert_eq!(TitleCategory::from_label("nonsense"), TitleCategory::Unknown);
        assert_eq!(TitleCategory::QaTester.to_string(), "QA/Tester");
    }

    #[test]
    fn test_range_average_is_mean() {
        let r = SalaryResult::range(10.0, 20.0, SalaryUnit::Vnd);
        assert_eq!(r.average, Some(15.0));
        assert_eq!(r.min, Some(10.0));
        assert_eq!(r.max, Some(20.0));
    }

    #[test]
    fn test_raw_record_serde_uses_link_description() {
        let record = RawRecord {
            job_title: Some("Dev".to_string()),
            company: None,
            salary: None,
            address: None,
            external_link: "https://example.com/1".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["link_description"], "https://example.com/1");

        let parsed: RawRecord = serde_json::from_value(serde_json::json!({
            "job_title": null,
            "company": null,
            "salary": null,
            "address": null,
            "external_link": "https://example.com/2"
        }))
        .unwrap();
        assert_eq!(parsed.external_link, "https://example.com/2");
    }
}
