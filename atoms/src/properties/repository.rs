use async_trait::async_trait;

use crate::error::PropertyResult;

use super::model::{Property, PropertyDetails, PropertyPage};
use super::payload::PropertyPatch;
use super::query::{PageRequest, PropertyFilter};

/// Document store for property records.
///
/// `update` and `delete` fail with `PropertyError::NotFound` when no record
/// carries the id; every backend failure is a `PropertyError::Persistence`.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn list(&self, filter: &PropertyFilter, page: PageRequest) -> PropertyResult<PropertyPage>;

    async fn get(&self, property_id: u64) -> PropertyResult<Option<Property>>;

    async fn distinct_types(&self, project: Option<&str>) -> PropertyResult<Vec<String>>;

    /// Assigns the next `property_id` and stamps both timestamps.
    async fn create(&self, details: PropertyDetails) -> PropertyResult<Property>;

    /// Replaces only the fields present in `patch` and bumps `updated_at`.
    async fn update(&self, property_id: u64, patch: PropertyPatch) -> PropertyResult<Property>;

    async fn delete(&self, property_id: u64) -> PropertyResult<()>;
}
