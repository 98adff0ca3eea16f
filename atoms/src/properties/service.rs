use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{PropertyError, PropertyResult};
use crate::media::{delete_files_best_effort, reconcile_gallery, spawn_orphan_cleanup, ObjectStorage};

use super::model::{Property, PropertyPage};
use super::payload::{CreatePropertyPayload, PropertyPatch};
use super::query::{PageRequest, PropertyFilter};
use super::repository::PropertyRepository;

/// Outcome of an update: the stored record plus the background deletion of
/// superseded gallery files, if any were replaced.
#[derive(Debug)]
pub struct UpdatedProperty {
    pub property: Property,
    pub cleanup: Option<JoinHandle<()>>,
}

pub async fn list_properties(
    repo: &dyn PropertyRepository,
    filter: &PropertyFilter,
    page: PageRequest,
) -> PropertyResult<PropertyPage> {
    repo.list(filter, page).await
}

pub async fn get_property(repo: &dyn PropertyRepository, property_id: u64) -> PropertyResult<Property> {
    repo.get(property_id)
        .await?
        .ok_or(PropertyError::NotFound(property_id))
}

pub async fn list_types(repo: &dyn PropertyRepository, project: Option<&str>) -> PropertyResult<Vec<String>> {
    repo.distinct_types(project).await
}

/// Validate, upload the inline gallery, then persist the template merged
/// with the payload. Uploaded files are removed again if the write fails.
pub async fn create_property(
    repo: &dyn PropertyRepository,
    storage: &dyn ObjectStorage,
    payload: CreatePropertyPayload,
) -> PropertyResult<Property> {
    payload.validate()?;

    let mut details = payload.into_details();
    let reconciled = reconcile_gallery(storage, std::mem::take(&mut details.gallery), None).await?;
    details.gallery = reconciled.gallery;

    match repo.create(details).await {
        Ok(property) => {
            tracing::info!(
                "Created property {} with {} gallery images",
                property.property_id,
                property.details.gallery.len()
            );
            Ok(property)
        }
        Err(e) => {
            tracing::error!("Failed to store new property: {}", e);
            delete_files_best_effort(storage, &reconciled.uploaded).await;
            Err(e)
        }
    }
}

/// Apply `patch` to an existing record.
///
/// When the patch carries a gallery it is reconciled against the stored one;
/// files replaced slot for slot are deleted in the background after the
/// write succeeds.
pub async fn update_property(
    repo: &dyn PropertyRepository,
    storage: Arc<dyn ObjectStorage>,
    property_id: u64,
    mut patch: PropertyPatch,
) -> PropertyResult<UpdatedProperty> {
    let existing = get_property(repo, property_id).await?;

    let mut uploaded = Vec::new();
    let mut superseded = Vec::new();
    if let Some(incoming) = patch.gallery.take() {
        let reconciled =
            reconcile_gallery(storage.as_ref(), incoming, Some(existing.details.gallery.as_slice())).await?;
        patch.gallery = Some(reconciled.gallery);
        uploaded = reconciled.uploaded;
        superseded = reconciled.superseded;
    }

    let property = match repo.update(property_id, patch).await {
        Ok(property) => property,
        Err(e) => {
            tracing::error!("Failed to update property {}: {}", property_id, e);
            delete_files_best_effort(storage.as_ref(), &uploaded).await;
            return Err(e);
        }
    };

    Ok(UpdatedProperty {
        property,
        cleanup: spawn_orphan_cleanup(storage, superseded),
    })
}

/// Removes the record only; its gallery files stay in storage.
pub async fn delete_property(repo: &dyn PropertyRepository, property_id: u64) -> PropertyResult<()> {
    repo.delete(property_id).await?;
    tracing::info!("Deleted property {}", property_id);
    Ok(())
}
