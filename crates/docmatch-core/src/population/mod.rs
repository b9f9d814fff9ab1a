//! Population store: the external reference dataset queried by birth
//! date.

mod snapshot;

pub use snapshot::PopulationSnapshot;

use std::future::Future;

use chrono::NaiveDate;

use crate::error::ResolverError;
use crate::models::PopulationRecord;

/// Query boundary of the external population store.
///
/// An empty result set is a normal, expected outcome, not an error.
/// Implementations surface real failures through [`ResolverError`];
/// caching, retries, and pagination are the store's own concern.
pub trait CandidateResolver {
    /// Return the records whose birth date equals `birth_date`.
    fn lookup_by_birth_date(
        &self,
        birth_date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<PopulationRecord>, ResolverError>> + Send;
}
