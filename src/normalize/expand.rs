use crate::types::{LocationPair, NormalizedRow, RawRecord, SalaryResult, TitleCategory};

/// Lazy fan-out of one record over its location pairs.
///
/// Yields exactly one row per pair, in pair order. Every row carries the
/// same non-location fields; nothing is filtered.
pub struct RowExpansion<'a> {
    record: &'a RawRecord,
    category: TitleCategory,
    salary: SalaryResult,
    locations: std::vec::IntoIter<LocationPair>,
}

impl Iterator for RowExpansion<'_> {
    type Item = NormalizedRow;

    fn next(&mut self) -> Option<Self::Item> {
        let location = self.locations.next()?;
        Some(NormalizedRow {
            job_title: self.record.job_title.clone(),
            company: self.record.company.clone(),
            salary_average: self.salary.average,
            salary_min: self.salary.min,
            salary_max: self.salary.max,
            salary_unit: self.salary.unit,
            city: location.city,
            district: location.district,
            category: self.category,
            external_link: self.record.external_link.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.locations.size_hint()
    }
}

impl ExactSizeIterator for RowExpansion<'_> {}

pub fn expand(
    record: &RawRecord,
    category: TitleCategory,
    salary: SalaryResult,
    locations: Vec<LocationPair>,
) -> RowExpansion<'_> {
    RowExpansion {
        record,
        category,
        salary,
        locations: locations.into_iter(),
    }
}
