//! Per-region, per-role AWS session construction
//!
//! Provides `AwsClientFactory`, which loads the default AWS SDK
//! configuration once and derives regional configs (optionally assuming a
//! role) for every scrape unit.

use super::cloudwatch::CloudWatchClient;
use super::tagging::TaggingClient;
use crate::client::ClientFactory;
use aws_config::retry::RetryConfig;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use cloudwatch_scrape_common::RoleArn;
use std::sync::Arc;
use tracing::debug;

/// Maximum attempts per AWS call, including the first
const MAX_ATTEMPTS: u32 = 5;

/// Session name used when assuming a role
const SESSION_NAME: &str = "cloudwatch-scrape";

/// Builds tagging, Auto Scaling and CloudWatch clients from one loaded base config.
#[derive(Clone)]
pub struct AwsClientFactory {
    base: Arc<SdkConfig>,
    fips: bool,
}

impl AwsClientFactory {
    /// Load AWS configuration from the environment, config files and
    /// instance roles.
    pub async fn new(fips: bool) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_sdk_config(config, fips)
    }

    pub fn from_sdk_config(config: SdkConfig, fips: bool) -> Self {
        Self {
            base: Arc::new(config),
            fips,
        }
    }

    pub fn fips(&self) -> bool {
        self.fips
    }

    /// Derive the config for one (region, role) pair.
    ///
    /// An empty role uses the base credentials as-is.
    async fn regional_config(&self, region: &str, role: &RoleArn) -> SdkConfig {
        let region = Region::new(region.to_string());
        let mut builder = self
            .base
            .to_builder()
            .region(region.clone())
            .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS));

        if let Some(arn) = role.as_assumable() {
            debug!(role = %arn, region = %region, "Assuming role");
            let provider = AssumeRoleProvider::builder(arn)
                .session_name(SESSION_NAME)
                .region(region)
                .configure(&self.base)
                .build()
                .await;
            builder = builder.credentials_provider(SharedCredentialsProvider::new(provider));
        }

        builder.build()
    }
}

impl ClientFactory for AwsClientFactory {
    type Tagging = TaggingClient;
    type CloudWatch = CloudWatchClient;

    async fn tagging_client(&self, region: &str, role: &RoleArn) -> anyhow::Result<TaggingClient> {
        let config = self.regional_config(region, role).await;
        Ok(TaggingClient::new(
            aws_sdk_resourcegroupstagging::Client::new(&config),
            aws_sdk_autoscaling::Client::new(&config),
        ))
    }

    async fn cloudwatch_client(
        &self,
        region: &str,
        role: &RoleArn,
    ) -> anyhow::Result<CloudWatchClient> {
        let config = self.regional_config(region, role).await;
        Ok(CloudWatchClient::from_config(&config, self.fips))
    }
}

impl std::fmt::Debug for AwsClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClientFactory")
            .field("region", &self.base.region())
            .field("fips", &self.fips)
            .finish_non_exhaustive()
    }
}
