use once_cell::sync::Lazy;

use super::vocabulary::{LocationRule, Vocabulary};
use crate::types::LocationPair;

static DEFAULT_EXTRACTOR: Lazy<LocationExtractor> =
    Lazy::new(|| LocationExtractor::new(&Vocabulary::default()));

/// Splits a delimited address ("City: District: City: District") into
/// ordered (city, district) pairs. The result is never empty.
#[derive(Debug, Clone)]
pub struct LocationExtractor {
    special: Vec<LocationRule>,
    delimiter: char,
}

impl LocationExtractor {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            special: vocabulary.normalized().special_locations,
            delimiter: vocabulary.location_delimiter,
        }
    }

    pub fn extract(&self, raw: Option<&str>) -> Vec<LocationPair> {
        let Some(raw) = raw else {
            return vec![LocationPair::unknown()];
        };

        let lowered = raw.to_lowercase();
        if let Some(rule) = self
            .special
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k.as_str())))
        {
            return vec![LocationPair::city_only(rule.city.clone())];
        }

        let parts: Vec<&str> = raw
            .split(self.delimiter)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let pairs: Vec<LocationPair> = parts
            .chunks(2)
            .map(|chunk| {
                LocationPair::new(title_case(chunk[0]), chunk.get(1).map(|d| d.to_string()))
            })
            .collect();

        if pairs.is_empty() {
            vec![LocationPair::unknown()]
        } else {
            pairs
        }
    }
}

impl Default for LocationExtractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}

/// Extracts with the built-in keywords and ':' delimiter
pub fn extract_locations(raw: Option<&str>) -> Vec<LocationPair> {
    DEFAULT_EXTRACTOR.extract(raw)
}

/// Uppercases the first cased character of every word and lowercases the
/// rest; a word starts after any character without case.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_cased = false;
    for c in text.chars() {
        let cased = c.is_lowercase() || c.is_uppercase();
        if cased && !prev_cased {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        prev_cased = cased;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(city: &str, district: Option<&str>) -> LocationPair {
        LocationPair::new(city, district.map(str::to_string))
    }

    #[test]
    fn test_pairs_in_source_order() {
        assert_eq!(
            extract_locations(Some("Hà Nội: Đống Đa: Hồ Chí Minh: Quận 1")),
            vec![
                pair("Hà Nội", Some("Đống Đa")),
                pair("Hồ Chí Minh", Some("Quận 1")),
            ]
        );
        assert_eq!(
            extract_locations(Some("Hà Nội: Cầu Giấy")),
            vec![pair("Hà Nội", Some("Cầu Giấy"))]
        );
    }

    #[test]
    fn test_odd_trailing_segment_has_no_district() {
        assert_eq!(extract_locations(Some("Hồ Chí Minh")), vec![pair("Hồ Chí Minh", None)]);
        assert_eq!(
            extract_locations(Some("Hà Nội: Ba Đình: Đà Nẵng")),
            vec![pair("Hà Nội", Some("Ba Đình")), pair("Đà Nẵng", None)]
        );
    }

    #[test]
    fn test_city_is_title_cased_district_untouched() {
        assert_eq!(
            extract_locations(Some("hà nội: đống đa")),
            vec![pair("Hà Nội", Some("đống đa"))]
        );
    }

    #[test]
    fn test_special_cases() {
        assert_eq!(extract_locations(Some("Toàn Quốc")), vec![pair("Toàn Quốc", None)]);
        assert_eq!(extract_locations(Some("OverSea: Global")), vec![pair("Nước Ngoài", None)]);
        assert_eq!(
            extract_locations(Some("Nhiều địa điểm")),
            vec![pair("Multi-location", None)]
        );
        // special cases are checked before splitting
        assert_eq!(
            extract_locations(Some("Hà Nội: Vietnam")),
            vec![pair("Toàn Quốc", None)]
        );
    }

    #[test]
    fn test_unknown_fallbacks() {
        assert_eq!(extract_locations(None), vec![pair("Unknown", None)]);
        assert_eq!(extract_locations(Some("")), vec![pair("Unknown", None)]);
        assert_eq!(extract_locations(Some(" : : ")), vec![pair("Unknown", None)]);
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        assert_eq!(
            extract_locations(Some("Hà Nội::Đống Đa:")),
            vec![pair("Hà Nội", Some("Đống Đa"))]
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let vocab = Vocabulary {
            location_delimiter: ',',
            ..Vocabulary::default()
        };
        let extractor = LocationExtractor::new(&vocab);
        assert_eq!(
            extractor.extract(Some("Đà Nẵng, Hải Châu")),
            vec![pair("Đà Nẵng", Some("Hải Châu"))]
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("HỒ CHÍ MINH"), "Hồ Chí Minh");
        assert_eq!(title_case("quận 1"), "Quận 1");
        assert_eq!(title_case("bà rịa-vũng tàu"), "Bà Rịa-Vũng Tàu");
    }

    #[test]
    fn test_configured_keywords_are_normalized() {
        let vocab: Vocabulary = toml::from_str(
            r#"
            [[special_locations]]
            city = "Remote"
            keywords = ["Từ Xa", " REMOTE "]
            "#,
        )
        .unwrap();
        let extractor = LocationExtractor::new(&vocab);
        assert_eq!(extractor.extract(Some("Làm việc từ xa")), vec![pair("Remote", None)]);
        assert_eq!(extractor.extract(Some("Remote")), vec![pair("Remote", None)]);
    }

    #[test]
    fn test_empty_keyword_does_not_capture_every_address() {
        let mut vocab = Vocabulary::default();
        vocab.special_locations[0].keywords.push(String::new());
        let extractor = LocationExtractor::new(&vocab);
        assert_eq!(
            extractor.extract(Some("Hà Nội: Cầu Giấy")),
            vec![pair("Hà Nội", Some("Cầu Giấy"))]
        );
    }
}
