use thiserror::Error;
use uuid::Uuid;
use yieldpilot_db::DbError;

#[derive(Debug, Error)]
pub enum RankerError {
    #[error("Listing not found: {0}")]
    ListingNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, RankerError>;

impl RankerError {
    /// Map a storage error for a single-listing operation, surfacing a
    /// missing record as `ListingNotFound`.
    pub fn for_listing(listing_id: Uuid, err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => RankerError::ListingNotFound(listing_id),
            other => RankerError::Storage(other),
        }
    }
}
