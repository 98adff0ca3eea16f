use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;

use super::model::{file_name_from_url, gallery_file_name, GalleryImage, InlineImage};
use super::storage::{ObjectStorage, StorageError};

/// Result of reconciling an incoming gallery.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconciledGallery {
    /// Gallery safe to persist: every `src` is hosted.
    pub gallery: Vec<GalleryImage>,
    /// Files uploaded while reconciling, removed again if the write fails.
    pub uploaded: Vec<String>,
    /// Previously hosted files replaced by a new upload at the same slot.
    pub superseded: Vec<String>,
}

struct PendingUpload {
    slot: usize,
    file_name: String,
    mime_type: String,
    class_name: String,
}

/// Resolves inline images in `incoming` to hosted URLs.
///
/// Slots are handled by position:
/// - on update, a `src` starting with `http` is kept as is, no upload;
/// - a base64 data URL is uploaded under a fresh file name;
/// - anything else is dropped.
///
/// On create (`existing` is `None`) every slot must be a data URL, so hosted
/// sources are dropped like any other unrecognized slot.
///
/// When `existing` is given (update path), every uploaded slot whose
/// existing counterpart at the same index is hosted marks that old file as
/// superseded. Uploads run concurrently; if one fails the others are removed
/// again and the first error is returned.
pub async fn reconcile_gallery(
    storage: &dyn ObjectStorage,
    incoming: Vec<GalleryImage>,
    existing: Option<&[GalleryImage]>,
) -> Result<ReconciledGallery, StorageError> {
    // `None` marks a slot filled by the next pending upload.
    let mut layout: Vec<Option<GalleryImage>> = Vec::with_capacity(incoming.len());
    let mut pending = Vec::new();
    let mut payloads = Vec::new();

    for (slot, image) in incoming.into_iter().enumerate() {
        if image.is_hosted() && existing.is_some() {
            layout.push(Some(image));
            continue;
        }

        let Some(inline) = InlineImage::parse(&image.src) else {
            tracing::warn!("Skipping gallery slot {}: unrecognized image source", slot);
            continue;
        };

        let class_name = if image.class_name.is_empty() {
            GalleryImage::default_class_name(slot)
        } else {
            image.class_name
        };

        pending.push(PendingUpload {
            slot,
            file_name: gallery_file_name(slot, inline.extension()),
            mime_type: inline.mime_type,
            class_name,
        });
        payloads.push(inline.bytes);
        layout.push(None);
    }

    let results = join_all(
        pending
            .iter()
            .zip(payloads)
            .map(|(upload, bytes)| storage.upload(bytes, &upload.file_name, &upload.mime_type)),
    )
    .await;

    let mut uploaded = Vec::with_capacity(results.len());
    let mut urls = Vec::with_capacity(results.len());
    let mut failure = None;
    for (upload, result) in pending.iter().zip(results) {
        match result {
            Ok(url) => {
                uploaded.push(upload.file_name.clone());
                urls.push(url);
            }
            Err(e) => {
                tracing::error!("Gallery upload for slot {} failed: {}", upload.slot, e);
                failure.get_or_insert(e);
            }
        }
    }

    if let Some(err) = failure {
        delete_files_best_effort(storage, &uploaded).await;
        return Err(err);
    }

    let superseded: Vec<String> = existing
        .map(|existing| {
            pending
                .iter()
                .filter_map(|upload| existing.get(upload.slot))
                .filter(|old| old.is_hosted())
                .filter_map(|old| file_name_from_url(&old.src))
                .collect()
        })
        .unwrap_or_default();

    let mut hosted = pending
        .into_iter()
        .zip(urls)
        .map(|(upload, url)| GalleryImage::hosted(url, upload.class_name));

    let gallery = layout
        .into_iter()
        .filter_map(|slot| slot.or_else(|| hosted.next()))
        .collect();

    Ok(ReconciledGallery {
        gallery,
        uploaded,
        superseded,
    })
}

/// Deletes `file_names` concurrently; failures are logged and swallowed.
pub async fn delete_files_best_effort(storage: &dyn ObjectStorage, file_names: &[String]) {
    if file_names.is_empty() {
        return;
    }

    let results = join_all(file_names.iter().map(|name| storage.delete(name))).await;
    for (name, result) in file_names.iter().zip(results) {
        match result {
            Ok(()) => tracing::info!("Deleted image {}", name),
            Err(e) => tracing::warn!("Skip delete {}: {}", name, e),
        }
    }
}

/// Deletes superseded files in the background once the write has landed.
///
/// The caller may drop the handle; it is returned so the deletions can be
/// awaited where that matters.
pub fn spawn_orphan_cleanup(
    storage: Arc<dyn ObjectStorage>,
    file_names: Vec<String>,
) -> Option<JoinHandle<()>> {
    if file_names.is_empty() {
        return None;
    }

    Some(tokio::spawn(async move {
        delete_files_best_effort(storage.as_ref(), &file_names).await;
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::memory::MemoryObjectStorage;

    const PNG: &str = "data:image/png;base64,aGVsbG8=";

    fn slot(src: &str) -> GalleryImage {
        GalleryImage {
            src: src.to_string(),
            href: src.to_string(),
            class_name: String::new(),
        }
    }

    #[tokio::test]
    async fn uploads_inline_images_with_mime_extension() {
        let storage = MemoryObjectStorage::new("https://cdn.test");

        let result = reconcile_gallery(&storage, vec![slot(PNG)], None).await.unwrap();

        assert_eq!(result.gallery.len(), 1);
        assert_eq!(result.uploaded.len(), 1);
        assert!(result.uploaded[0].ends_with("-0.png"));
        let url = storage.url_for(&result.uploaded[0]);
        assert_eq!(result.gallery[0].src, url);
        assert_eq!(result.gallery[0].href, url);
        assert_eq!(result.gallery[0].class_name, "item2 box-img");
        assert_eq!(storage.object(&result.uploaded[0]).unwrap().0, "image/png");
        assert!(result.superseded.is_empty());
    }

    #[tokio::test]
    async fn hosted_slots_pass_through_untouched() {
        let storage = MemoryObjectStorage::new("https://cdn.test");
        let hosted = GalleryImage {
            src: "https://cdn.test/a.jpg".to_string(),
            href: "https://cdn.test/a-large.jpg".to_string(),
            class_name: "custom".to_string(),
        };

        let result = reconcile_gallery(&storage, vec![hosted.clone()], Some(std::slice::from_ref(&hosted)))
            .await
            .unwrap();

        assert_eq!(result.gallery, vec![hosted]);
        assert!(storage.uploads().is_empty());
        assert!(result.superseded.is_empty());
    }

    #[tokio::test]
    async fn unrecognized_slots_are_dropped_and_order_kept() {
        let storage = MemoryObjectStorage::new("https://cdn.test");
        let incoming = vec![
            slot("https://cdn.test/keep.jpg"),
            slot("/images/local.jpg"),
            GalleryImage {
                class_name: "item9 box-img".to_string(),
                ..slot("data:image/webp;base64,aGVsbG8=")
            },
        ];

        let result = reconcile_gallery(&storage, incoming, Some(&[][..])).await.unwrap();

        assert_eq!(result.gallery.len(), 2);
        assert_eq!(result.gallery[0].src, "https://cdn.test/keep.jpg");
        assert!(result.gallery[1].src.ends_with("-2.webp"));
        assert_eq!(result.gallery[1].class_name, "item9 box-img");
    }

    #[tokio::test]
    async fn create_keeps_only_inline_slots() {
        let storage = MemoryObjectStorage::new("https://cdn.test");
        let incoming = vec![slot("https://elsewhere.example/x.jpg"), slot(PNG)];

        let result = reconcile_gallery(&storage, incoming, None).await.unwrap();

        assert_eq!(result.gallery.len(), 1);
        assert_eq!(result.uploaded.len(), 1);
        assert!(result.uploaded[0].ends_with("-1.png"));
        assert_eq!(result.gallery[0].src, storage.url_for(&result.uploaded[0]));
        assert_eq!(result.gallery[0].class_name, "item3 box-img");
    }

    #[tokio::test]
    async fn replaced_hosted_slot_is_superseded_by_position() {
        let storage = MemoryObjectStorage::new("https://cdn.test");
        let existing = vec![
            slot("https://cdn.test/old-0.jpg"),
            slot("https://cdn.test/old%201.jpg"),
            slot("/images/studio/studio1.jpeg"),
        ];
        let incoming = vec![slot("https://cdn.test/old-0.jpg"), slot(PNG), slot(PNG)];

        let result = reconcile_gallery(&storage, incoming, Some(existing.as_slice())).await.unwrap();

        assert_eq!(result.gallery.len(), 3);
        assert_eq!(result.uploaded.len(), 2);
        // slot 2 replaced a non-hosted image, nothing to delete there
        assert_eq!(result.superseded, vec!["old 1.jpg".to_string()]);
    }

    #[tokio::test]
    async fn failed_upload_removes_sibling_uploads() {
        let storage = MemoryObjectStorage::new("https://cdn.test");
        storage.fail_uploads_ending_with("-1.gif");
        let incoming = vec![slot(PNG), slot("data:image/gif;base64,aGVsbG8=")];

        let err = reconcile_gallery(&storage, incoming, None).await.unwrap_err();

        assert!(matches!(err, StorageError::Upload { .. }));
        assert_eq!(storage.uploads().len(), 2);
        assert_eq!(storage.object_count(), 0);
        assert_eq!(storage.deletes().len(), 1);
        assert!(storage.deletes()[0].ends_with("-0.png"));
    }

    #[tokio::test]
    async fn orphan_cleanup_swallows_delete_failures() {
        let storage = Arc::new(MemoryObjectStorage::new("https://cdn.test"));
        storage.fail_deletes(true);

        let handle = spawn_orphan_cleanup(storage.clone(), vec!["gone.jpg".to_string()])
            .expect("cleanup scheduled");
        handle.await.unwrap();

        assert_eq!(storage.deletes(), vec!["gone.jpg".to_string()]);
        assert!(spawn_orphan_cleanup(storage, Vec::new()).is_none());
    }
}
