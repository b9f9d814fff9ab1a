//! Stateless field extractors over normalized document text.

pub mod amounts;
pub mod dates;
pub mod institutes;
pub mod matcher;
pub mod patterns;
pub mod text;

pub use amounts::find_amounts;
pub use dates::{earliest_valid_date, find_datestrings, replace_months};
pub use institutes::InstituteMatcher;
pub use matcher::{match_candidates, surname_matches};
pub use text::{flatten_lines, normalize_whitespace};
