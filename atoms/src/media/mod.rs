// Gallery images: inline data URLs, the object storage gateway and the
// reconciler that turns one into the other.
pub mod gallery;
pub mod model;
pub mod storage;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use gallery::{
    delete_files_best_effort, reconcile_gallery, spawn_orphan_cleanup, ReconciledGallery,
};
pub use model::{file_name_from_url, gallery_file_name, GalleryImage, InlineImage};
pub use storage::{ObjectStorage, S3ObjectStorage, StorageError};
