//! Pure normalization core: salary, title and location parsing plus the
//! per-record row explosion. Nothing in here performs I/O or fails.

pub mod expand;
pub mod location;
pub mod salary;
pub mod title;
pub mod units;
pub mod vocabulary;

pub use expand::{expand, RowExpansion};
pub use location::{extract_locations, LocationExtractor};
pub use salary::{parse_salary, SalaryParser, SalaryRule, SALARY_RULES};
pub use title::{classify_title, TitleClassifier};
pub use units::{convert, UnitConverter};
pub use vocabulary::Vocabulary;
