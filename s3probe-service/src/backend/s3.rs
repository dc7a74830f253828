use std::fmt;
use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, BucketLocationConstraint, CreateBucketConfiguration,
    ExpirationStatus, LifecycleExpiration, LifecycleRule, LifecycleRuleFilter,
};
use bytes::Bytes;

use super::common::{BackendError, BackendResult, LifecyclePolicy, StorageClient};

/// The region AWS treats as default, which must not be sent as a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an [`S3Backend`].
#[derive(Clone)]
pub struct S3BackendConfig {
    /// Full endpoint URL including the scheme, e.g. `http://localhost:9000`.
    pub endpoint: String,
    /// Signing region.
    pub region: String,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Timeout for a single operation including retries of the SDK.
    pub request_timeout: Option<Duration>,
}

impl fmt::Debug for S3BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3BackendConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[redacted]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// A [`StorageClient`] talking to an S3-compatible endpoint.
///
/// Uses static credentials and path-style addressing, which works for AWS as well as MinIO, Ceph
/// and most other S3-compatible services.
pub struct S3Backend {
    client: Client,
    endpoint: String,
    region: String,
}

impl S3Backend {
    /// Creates a new client for the configured endpoint.
    ///
    /// This does not perform any network requests.
    pub fn new(config: S3BackendConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key,
            config.secret_key,
            None,
            None,
            "s3probe-static",
        );

        let mut timeouts = TimeoutConfig::builder();
        if let Some(timeout) = config.request_timeout {
            timeouts = timeouts.operation_timeout(timeout);
        }

        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .timeout_config(timeouts.build())
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            endpoint: config.endpoint,
            region: config.region,
        }
    }
}

impl fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl StorageClient for S3Backend {
    fn name(&self) -> &'static str {
        "s3"
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn list_buckets(&self) -> BackendResult<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| BackendError::sdk("failed to list buckets", err))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_owned))
            .collect())
    }

    #[tracing::instrument(level = "trace", fields(?bucket), skip_all)]
    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                // HEAD responses carry no error body, so some services only signal via status.
                let not_found = err
                    .as_service_error()
                    .is_some_and(HeadBucketError::is_not_found)
                    || err
                        .raw_response()
                        .is_some_and(|response| response.status().as_u16() == 404);

                if not_found {
                    tracing::debug!("Bucket does not exist");
                    Ok(false)
                } else {
                    Err(BackendError::sdk(
                        format!("failed to check existence of bucket `{bucket}`"),
                        err,
                    ))
                }
            }
        }
    }

    #[tracing::instrument(level = "trace", fields(?bucket), skip_all)]
    async fn make_bucket(&self, bucket: &str) -> BackendResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            let constraint = BucketLocationConstraint::from(self.region.as_str());
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|err| BackendError::sdk(format!("failed to create bucket `{bucket}`"), err))?;
        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(?bucket), skip_all)]
    async fn set_bucket_lifecycle(
        &self,
        bucket: &str,
        policy: &LifecyclePolicy,
    ) -> BackendResult<()> {
        let status = if policy.enabled {
            ExpirationStatus::Enabled
        } else {
            ExpirationStatus::Disabled
        };

        let rule = LifecycleRule::builder()
            .id(&policy.rule_id)
            .filter(LifecycleRuleFilter::builder().prefix("").build())
            .status(status)
            .expiration(
                LifecycleExpiration::builder()
                    .days(policy.expiration_days)
                    .build(),
            )
            .build()
            .map_err(|err| BackendError::sdk("invalid lifecycle rule", err))?;

        let configuration = BucketLifecycleConfiguration::builder()
            .rules(rule)
            .build()
            .map_err(|err| BackendError::sdk("invalid lifecycle configuration", err))?;

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(bucket)
            .lifecycle_configuration(configuration)
            .send()
            .await
            .map_err(|err| {
                BackendError::sdk(format!("failed to set lifecycle of bucket `{bucket}`"), err)
            })?;
        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(?bucket, ?key), skip_all)]
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> BackendResult<()> {
        let length = data.len() as i64;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(length)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| BackendError::sdk(format!("failed to put `{bucket}/{key}`"), err))?;
        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(?bucket, ?key), skip_all)]
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Option<Bytes>> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(GetObjectError::is_no_such_key) => {
                tracing::debug!("Object not found");
                return Ok(None);
            }
            Err(err) => {
                return Err(BackendError::sdk(
                    format!("failed to get `{bucket}/{key}`"),
                    err,
                ));
            }
        };

        // Read the full body so that the measured latency covers the transfer.
        let data = output
            .body
            .collect()
            .await
            .map_err(|err| BackendError::sdk(format!("failed to read `{bucket}/{key}`"), err))?
            .into_bytes();

        Ok(Some(data))
    }

    #[tracing::instrument(level = "trace", fields(?bucket, ?key), skip_all)]
    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| BackendError::sdk(format!("failed to remove `{bucket}/{key}`"), err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> S3BackendConfig {
        S3BackendConfig {
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            access_key: "minioadmin".into(),
            secret_key: "hunter2".into(),
            request_timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let formatted = format!("{:?}", config());
        assert!(formatted.contains("minioadmin"));
        assert!(!formatted.contains("hunter2"));
    }

    #[tokio::test]
    async fn constructs_without_network() {
        let backend = S3Backend::new(config());
        assert_eq!(backend.name(), "s3");
        assert!(format!("{backend:?}").contains("localhost:9000"));
    }
}
