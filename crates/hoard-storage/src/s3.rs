//! S3-compatible blob store using the AWS SDK.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use hoard_core::ports::{BlobStore, ObjectVersion, PutCondition, VersionedObject};
use hoard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an S3 compatible service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    /// Region; `us-east-1` when unset.
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint (MinIO, R2, ...). Bare `host:port` is treated as http.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Key prefix applied to every object.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Explicit credentials; the ambient AWS chain is used when unset.
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Path-style addressing, required by MinIO.
    #[serde(default)]
    pub force_path_style: bool,
    /// Create the bucket on startup if it is missing.
    #[serde(default)]
    pub create_bucket: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "hoard-artifacts".to_string(),
            region: None,
            endpoint: None,
            prefix: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            force_path_style: false,
            create_bucket: false,
        }
    }
}

impl S3Config {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_path_style(mut self, force: bool) -> Self {
        self.force_path_style = force;
        self
    }

    pub fn with_create_bucket(mut self, create: bool) -> Self {
        self.create_bucket = create;
        self
    }
}

/// HTTP status of a service error, if the request reached the service.
fn status_of<E>(err: &SdkError<E>) -> Option<u16> {
    match err {
        SdkError::ServiceError(service_err) => Some(service_err.raw().status().as_u16()),
        _ => None,
    }
}

fn storage_error<E>(action: &str, key: &str, err: SdkError<E>) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::Storage(format!(
        "S3 {} failed for {}: {}",
        action,
        key,
        DisplayErrorContext(&err)
    ))
}

fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

/// Blob store backed by one S3 bucket.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    region: String,
}

impl std::fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl S3BlobStore {
    /// Build a client from configuration.
    pub async fn new(config: &S3Config) -> Result<Self> {
        let has_access_key_id = config.access_key_id.is_some();
        let has_secret_access_key = config.secret_access_key.is_some();
        if has_access_key_id ^ has_secret_access_key {
            return Err(Error::Config(
                "s3 config requires both access_key_id and secret_access_key when either is set"
                    .to_string(),
            ));
        }

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()));
        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
                key_id.clone(),
                secret.clone(),
                config.session_token.clone(),
                None,
                "hoard-config",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            let lower = endpoint.to_ascii_lowercase();
            let endpoint = if lower.starts_with("http://") || lower.starts_with("https://") {
                endpoint.clone()
            } else {
                format!("http://{}", endpoint)
            };
            builder = builder.endpoint_url(endpoint);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let store = Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            prefix: config
                .prefix
                .as_ref()
                .map(|p| p.trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty()),
            region,
        };

        if config.create_bucket {
            store.ensure_bucket().await?;
        }

        info!(bucket = %store.bucket, region = %store.region, "S3 blob store ready");
        Ok(store)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, key),
            None => key.to_string(),
        }
    }

    /// Create the bucket unless it already exists.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn ensure_bucket(&self) -> Result<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                debug!("Bucket already exists");
                return Ok(());
            }
            Err(err) if status_of(&err) == Some(404) => {}
            Err(err) => return Err(storage_error("head_bucket", &self.bucket, err)),
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("Created bucket");
                Ok(())
            }
            Err(err) => {
                let already_there = err
                    .as_service_error()
                    .map(|e| e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists())
                    .unwrap_or(false);
                if already_there {
                    info!("Bucket already exists");
                    Ok(())
                } else {
                    Err(storage_error("create_bucket", &self.bucket, err))
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[instrument(skip(self, path), fields(backend = "s3"))]
    async fn put_file(&self, key: &str, path: &Path, condition: PutCondition) -> Result<()> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            Error::UploadFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .content_type(content_type_for(key))
            .body(body);

        request = match &condition {
            PutCondition::None => request,
            PutCondition::IfAbsent => request.if_none_match("*"),
            PutCondition::IfMatch(version) => request.if_match(version.as_str()),
        };

        match request.send().await {
            Ok(_) => {
                debug!(key = %key, "Uploaded object");
                Ok(())
            }
            Err(err) if matches!(status_of(&err), Some(409) | Some(412)) => Err(Error::Conflict {
                key: key.to_string(),
                reason: format!("{:?} not satisfied", condition),
            }),
            Err(err) => Err(Error::UploadFailed(format!(
                "S3 put_object failed for {}: {}",
                key,
                DisplayErrorContext(&err)
            ))),
        }
    }

    #[instrument(skip(self, data), fields(backend = "s3", bytes = data.len()))]
    async fn put_bytes(
        &self,
        key: &str,
        data: Vec<u8>,
        condition: PutCondition,
    ) -> Result<ObjectVersion> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .content_type(content_type_for(key))
            .body(ByteStream::from(data));

        request = match &condition {
            PutCondition::None => request,
            PutCondition::IfAbsent => request.if_none_match("*"),
            PutCondition::IfMatch(version) => request.if_match(version.as_str()),
        };

        match request.send().await {
            Ok(output) => Ok(ObjectVersion::new(output.e_tag().unwrap_or_default())),
            Err(err) if matches!(status_of(&err), Some(409) | Some(412)) => Err(Error::Conflict {
                key: key.to_string(),
                reason: format!("{:?} not satisfied", condition),
            }),
            Err(err) => Err(storage_error("put_object", key, err)),
        }
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get(&self, key: &str) -> Result<Option<VersionedObject>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if status_of(&err) == Some(404) => return Ok(None),
            Err(err) => return Err(storage_error("get_object", key, err)),
        };

        let version = ObjectVersion::new(output.e_tag().unwrap_or_default());
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read body of {}: {}", key, e)))?
            .into_bytes()
            .to_vec();

        Ok(Some(VersionedObject { data, version }))
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if status_of(&err) == Some(404) => Ok(false),
            Err(err) => Err(storage_error("head_object", key, err)),
        }
    }

    async fn signed_download_url(
        &self,
        key: &str,
        ttl: Duration,
        download_name: Option<&str>,
    ) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| Error::Config(format!("Invalid link lifetime {:?}: {}", ttl, e)))?;

        let mut request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key));
        if let Some(name) = download_name {
            request =
                request.response_content_disposition(format!("attachment; filename=\"{}\"", name));
        }

        let presigned = request
            .presigned(presigning)
            .await
            .map_err(|e| storage_error("presign", key, e))?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = S3Config::new("bucket")
            .with_region("ap-southeast-2")
            .with_endpoint("localhost:9000")
            .with_credentials("id", "secret")
            .with_path_style(true);

        assert_eq!(config.bucket, "bucket");
        assert_eq!(config.region.as_deref(), Some("ap-southeast-2"));
        assert!(config.force_path_style);
        assert!(!config.create_bucket);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: S3Config = serde_json::from_str(r#"{"bucket": "b"}"#).unwrap();
        assert_eq!(config.bucket, "b");
        assert!(config.region.is_none());
        assert!(!config.force_path_style);
    }

    #[tokio::test]
    async fn test_rejects_half_configured_credentials() {
        let mut config = S3Config::new("bucket");
        config.access_key_id = Some("id".to_string());

        let err = S3BlobStore::new(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_presigned_url_is_offline_and_scoped_to_key() {
        let config = S3Config::new("bucket")
            .with_endpoint("http://127.0.0.1:9")
            .with_credentials("AKIDEXAMPLE", "secret")
            .with_path_style(true);
        let store = S3BlobStore::new(&config).await.unwrap();

        let url = store
            .signed_download_url("A.bz2", Duration::from_secs(3600), Some("A.bz2"))
            .await
            .unwrap();

        assert!(url.starts_with("http://127.0.0.1:9/bucket/A.bz2?"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("response-content-disposition="));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("text.json"), "application/json");
        assert_eq!(content_type_for("a.bz2"), "application/octet-stream");
    }
}
