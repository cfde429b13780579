//! Testcontainer configurations for integration tests.

use hoard_storage::S3Config;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::minio::MinIO;

/// MinIO container standing in for S3.
pub struct MinioContainer {
    #[allow(dead_code)] // Kept to maintain container lifetime
    container: ContainerAsync<MinIO>,
    endpoint: String,
    access_key: String,
    secret_key: String,
}

impl MinioContainer {
    pub async fn start() -> anyhow::Result<Self> {
        let container = MinIO::default().with_tag("latest").start().await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(9000).await?;

        Ok(Self {
            container,
            endpoint: format!("http://{}:{}", host, port),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Store settings for `bucket`, created on first use.
    pub fn s3_config(&self, bucket: &str) -> S3Config {
        S3Config::new(bucket)
            .with_endpoint(self.endpoint.clone())
            .with_credentials(self.access_key.clone(), self.secret_key.clone())
            .with_path_style(true)
            .with_create_bucket(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn test_minio_container_starts() {
        let minio = MinioContainer::start().await.unwrap();
        assert!(minio.endpoint().contains("http://"));
        assert!(minio.s3_config("scratch").force_path_style);
    }
}
