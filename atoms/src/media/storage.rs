use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {file_name} failed: {message}")]
    Upload { file_name: String, message: String },

    #[error("delete of {file_name} failed: {message}")]
    Delete { file_name: String, message: String },
}

/// Object storage gateway for gallery files.
///
/// `upload` returns the public URL the site will render; `delete` takes the
/// bare file name, the same one `upload` was given.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError>;

    async fn delete(&self, file_name: &str) -> Result<(), StorageError>;
}

/// S3 bucket holding publicly readable gallery files.
#[derive(Debug, Clone)]
pub struct S3ObjectStorage {
    client: S3Client,
    bucket: String,
    key_prefix: String,
    public_base_url: String,
}

impl S3ObjectStorage {
    pub fn new(
        client: S3Client,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Virtual-hosted style base URL used when no CDN is configured.
    pub fn default_public_base_url(bucket: &str, region: &str) -> String {
        format!("https://{}.s3.{}.amazonaws.com", bucket, region)
    }

    fn key_for(&self, file_name: &str) -> String {
        object_key(&self.key_prefix, file_name)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError> {
        let key = self.key_for(file_name);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(mime_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed for {}: {}", key, DisplayErrorContext(&e));
                StorageError::Upload {
                    file_name: file_name.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        tracing::info!("Uploaded {} ({} bytes, {})", key, size, mime_type);
        Ok(self.public_url(&key))
    }

    async fn delete(&self, file_name: &str) -> Result<(), StorageError> {
        let key = self.key_for(file_name);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                file_name: file_name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}

fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}
