use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use crate::constants::SENTINEL_CITIES;
use crate::types::{NormalizedRow, SalaryUnit, TitleCategory};

pub const TECH_KEYWORDS: [&str; 18] = [
    "Python", "SQL", "Java", "Javascript", "C++", "C#", "AWS", "Azure", "GCP", "Docker",
    "Kubernetes", "React", "Angular", "Vue", "ML", "AI", "Big Data", ".Net",
];

/// Categories with a meaningful salary comparison
const SALARY_CATEGORIES: [TitleCategory; 5] = [
    TitleCategory::DataBusinessAnalyst,
    TitleCategory::SoftwareDeveloper,
    TitleCategory::DataSystemEngineer,
    TitleCategory::QaTester,
    TitleCategory::ManagementLead,
];

// A keyword must not touch a word character on either side. Keywords such
// as "C++" or ".Net" start or end with punctuation, where `\b` would never match.
static TECH_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    TECH_KEYWORDS
        .iter()
        .filter_map(|keyword| {
            let pattern = format!(r"(?i)(?:^|[^\w]){}(?:$|[^\w])", regex::escape(keyword));
            Regex::new(&pattern).ok().map(|re| (*keyword, re))
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySalary {
    pub category: TitleCategory,
    pub average: f64,
    pub listings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechCount {
    pub keyword: &'static str,
    pub count: usize,
}

/// Mean VND salary per concrete category, highest first
pub fn average_salary_by_category(rows: &[NormalizedRow]) -> Vec<CategorySalary> {
    let mut sums: HashMap<TitleCategory, (f64, usize)> = HashMap::new();
    for row in rows {
        if row.salary_unit != SalaryUnit::Vnd || !SALARY_CATEGORIES.contains(&row.category) {
            continue;
        }
        let Some(average) = row.salary_average.filter(|a| *a > 0.0) else {
            continue;
        };
        let entry = sums.entry(row.category).or_insert((0.0, 0));
        entry.0 += average;
        entry.1 += 1;
    }

    let mut result: Vec<CategorySalary> = sums
        .into_iter()
        .map(|(category, (sum, listings))| CategorySalary {
            category,
            average: sum / listings as f64,
            listings,
        })
        .collect();
    result.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

/// Row counts per real city, most listings first
pub fn listings_by_city(rows: &[NormalizedRow]) -> Vec<CityCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        if SENTINEL_CITIES.contains(&row.city.as_str()) {
            continue;
        }
        *counts.entry(row.city.as_str()).or_default() += 1;
    }
    let mut result: Vec<CityCount> = counts
        .into_iter()
        .map(|(city, count)| CityCount {
            city: city.to_string(),
            count,
        })
        .collect();
    // BTreeMap order already breaks ties by city
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

/// Rows whose title mentions each technology keyword, most mentioned first.
/// Every keyword is listed, including ones with no mentions.
pub fn technology_mentions(rows: &[NormalizedRow]) -> Vec<TechCount> {
    let mut result: Vec<TechCount> = TECH_PATTERNS
        .iter()
        .map(|(keyword, re)| TechCount {
            keyword: *keyword,
            count: rows
                .iter()
                .filter_map(|row| row.job_title.as_deref())
                .filter(|title| re.is_match(title))
                .count(),
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

/// All three aggregates over one set of rows
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total_rows: usize,
    pub salary_by_category: Vec<CategorySalary>,
    pub listings_by_city: Vec<CityCount>,
    pub technology_mentions: Vec<TechCount>,
}

impl Report {
    pub fn build(rows: &[NormalizedRow]) -> Self {
        Self {
            total_rows: rows.len(),
            salary_by_category: average_salary_by_category(rows),
            listings_by_city: listings_by_city(rows),
            technology_mentions: technology_mentions(rows),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Rows analysed: {}", self.total_rows);

        let _ = writeln!(out, "\nAverage salary by role (VND, million/month):");
        if self.salary_by_category.is_empty() {
            let _ = writeln!(out, "  (no VND salaries)");
        }
        for entry in &self.salary_by_category {
            let _ = writeln!(
                out,
                "  {:<24} {:>8.2}  ({} listings)",
                entry.category.as_str(),
                entry.average,
                entry.listings
            );
        }

        let _ = writeln!(out, "\nListings by city:");
        if self.listings_by_city.is_empty() {
            let _ = writeln!(out, "  (no located listings)");
        }
        for entry in &self.listings_by_city {
            let _ = writeln!(out, "  {:<24} {:>6}", entry.city, entry.count);
        }

        let _ = writeln!(out, "\nTechnology mentions in titles:");
        for entry in &self.technology_mentions {
            let _ = writeln!(out, "  {:<24} {:>6}", entry.keyword, entry.count);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, category: TitleCategory, unit: SalaryUnit, avg: Option<f64>, city: &str) -> NormalizedRow {
        NormalizedRow {
            job_title: Some(title.to_string()),
            company: None,
            salary_average: avg,
            salary_min: avg,
            salary_max: avg,
            salary_unit: unit,
            city: city.to_string(),
            district: None,
            category,
            external_link: format!("https://example.com/{}", title),
        }
    }

    fn rows() -> Vec<NormalizedRow> {
        use SalaryUnit::*;
        use TitleCategory::*;
        vec![
            row("Senior Python Developer", SoftwareDeveloper, Vnd, Some(30.0), "Hà Nội"),
            row("Java Developer", SoftwareDeveloper, Vnd, Some(20.0), "Hồ Chí Minh"),
            row("Data Analyst (SQL, Python)", DataBusinessAnalyst, Vnd, Some(15.0), "Hà Nội"),
            row("C++ Engineer", DataSystemEngineer, Usd, Some(2000.0), "Đà Nẵng"),
            row("Manager", ManagementLead, Negotiable, None, "Toàn Quốc"),
            row("Javascript React Dev", OtherItRole, Vnd, Some(50.0), "Unknown"),
            row("Tester .Net", QaTester, Vnd, Some(0.0), "Hồ Chí Minh"),
        ]
    }

    #[test]
    fn test_average_salary_by_category() {
        let result = average_salary_by_category(&rows());
        assert_eq!(
            result,
            vec![
                CategorySalary { category: TitleCategory::SoftwareDeveloper, average: 25.0, listings: 2 },
                CategorySalary { category: TitleCategory::DataBusinessAnalyst, average: 15.0, listings: 1 },
            ]
        );
    }

    #[test]
    fn test_listings_by_city_excludes_sentinels() {
        let result = listings_by_city(&rows());
        let pairs: Vec<(&str, usize)> = result.iter().map(|c| (c.city.as_str(), c.count)).collect();
        assert_eq!(pairs, vec![("Hà Nội", 2), ("Hồ Chí Minh", 2), ("Đà Nẵng", 1)]);
    }

    #[test]
    fn test_technology_mentions_whole_word() {
        let result = technology_mentions(&rows());
        let count = |k: &str| result.iter().find(|t| t.keyword == k).map(|t| t.count).unwrap();
        assert_eq!(result.len(), TECH_KEYWORDS.len());
        assert_eq!(count("Python"), 2);
        // "Javascript" must not count as "Java"
        assert_eq!(count("Java"), 1);
        assert_eq!(count("Javascript"), 1);
        assert_eq!(count("C++"), 1);
        assert_eq!(count(".Net"), 1);
        assert_eq!(count("AI"), 0);
        assert_eq!(result[0].keyword, "Python");
    }

    #[test]
    fn test_render_text() {
        let text = Report::build(&rows()).render_text();
        assert!(text.contains("Rows analysed: 7"));
        assert!(text.contains("Software Developer"));
        assert!(text.contains("Hà Nội"));
    }

    #[test]
    fn test_empty_rows() {
        let report = Report::build(&[]);
        assert!(report.salary_by_category.is_empty());
        assert!(report.listings_by_city.is_empty());
        assert!(report.technology_mentions.iter().all(|t| t.count == 0));
    }
}
