use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{PropertyError, PropertyResult};

use super::model::{Property, PropertyDetails, PropertyPage};
use super::payload::PropertyPatch;
use super::query::{self, PageRequest, PropertyFilter};
use super::repository::PropertyRepository;

/// Property store kept in a map, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryPropertyRepository {
    records: Mutex<BTreeMap<u64, Property>>,
    last_id: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryPropertyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create`, `update` and `delete` fail with a persistence error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stores `property` as is, keeping its id and timestamps.
    pub fn insert(&self, property: Property) {
        self.last_id.fetch_max(property.property_id, Ordering::SeqCst);
        lock(&self.records).insert(property.property_id, property);
    }

    pub fn snapshot(&self, property_id: u64) -> Option<Property> {
        lock(&self.records).get(&property_id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> PropertyResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PropertyError::Persistence("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PropertyRepository for MemoryPropertyRepository {
    async fn list(&self, filter: &PropertyFilter, page: PageRequest) -> PropertyResult<PropertyPage> {
        let records: Vec<Property> = lock(&self.records).values().cloned().collect();
        Ok(query::select_page(records, filter, page))
    }

    async fn get(&self, property_id: u64) -> PropertyResult<Option<Property>> {
        Ok(self.snapshot(property_id))
    }

    async fn distinct_types(&self, project: Option<&str>) -> PropertyResult<Vec<String>> {
        let records = lock(&self.records);
        Ok(query::distinct_types(records.values(), project))
    }

    async fn create(&self, details: PropertyDetails) -> PropertyResult<Property> {
        self.check_writable()?;

        let property_id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let property = details.into_property(property_id, Utc::now());
        lock(&self.records).insert(property_id, property.clone());
        Ok(property)
    }

    async fn update(&self, property_id: u64, patch: PropertyPatch) -> PropertyResult<Property> {
        self.check_writable()?;

        let mut records = lock(&self.records);
        let property = records
            .get_mut(&property_id)
            .ok_or(PropertyError::NotFound(property_id))?;
        patch.apply(&mut property.details);
        property.updated_at = Utc::now();
        Ok(property.clone())
    }

    async fn delete(&self, property_id: u64) -> PropertyResult<()> {
        self.check_writable()?;

        lock(&self.records)
            .remove(&property_id)
            .map(|_| ())
            .ok_or(PropertyError::NotFound(property_id))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
