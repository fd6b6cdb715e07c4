//! Result cache trait.
//!
//! The resolver writes every outcome, fallback records included, so that an
//! unreachable URL does not cost the full time budget on every request.

use crate::types::record::MetadataRecord;

/// Key/value store of resolved records, keyed by URL.
///
/// Implementations must be safe to share across concurrent resolutions.
/// `get` on an expired entry behaves as a miss.
#[cfg_attr(test, mockall::automock)]
pub trait RecordCache: Send + Sync {
    /// Look up a record. Returns `None` on a miss or an expired entry.
    fn get(&self, url: &str) -> Option<MetadataRecord>;

    /// Store a record, evicting as needed.
    fn set(&self, url: &str, record: MetadataRecord);
}
