//! Resource enumeration via the Resource Groups Tagging API, and via
//! DescribeAutoScalingGroups for Auto Scaling groups

use super::error::from_sdk_error;
use super::extract_pairs;
use crate::client::TaggingOperations;
use crate::error::DiscoveryError;
use aws_sdk_autoscaling::types::TagDescription;
use aws_sdk_resourcegroupstagging::{Client, types::ResourceTagMapping};
use cloudwatch_scrape_common::{DiscoveryJob, ResourceRecord, ResourceSource, Tag};
use tracing::debug;

/// Client listing resources and their tags for a discovery job's service
#[derive(Debug, Clone)]
pub struct TaggingClient {
    client: Client,
    autoscaling: aws_sdk_autoscaling::Client,
}

impl TaggingClient {
    pub fn new(client: Client, autoscaling: aws_sdk_autoscaling::Client) -> Self {
        Self {
            client,
            autoscaling,
        }
    }

    async fn list_from_tagging_api(
        &self,
        job: &DiscoveryJob,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, DiscoveryError> {
        let filters = job
            .descriptor()
            .map(|service| {
                service
                    .resource_type_filters
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let mut pages = self
            .client
            .get_resources()
            .set_resource_type_filters(Some(filters))
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    return Err(DiscoveryError::new(
                        resources,
                        from_sdk_error("GetResources", &e),
                    ));
                }
            };
            resources.extend(
                page.resource_tag_mapping_list()
                    .iter()
                    .filter_map(|mapping| to_resource(mapping, &job.service, region)),
            );
        }
        Ok(resources)
    }

    /// Auto Scaling groups aren't returned by the tagging API, so they are
    /// listed directly along with their tags.
    async fn list_auto_scaling_groups(
        &self,
        job: &DiscoveryJob,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, DiscoveryError> {
        let mut pages = self
            .autoscaling
            .describe_auto_scaling_groups()
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    return Err(DiscoveryError::new(
                        resources,
                        from_sdk_error("DescribeAutoScalingGroups", &e),
                    ));
                }
            };
            resources.extend(page.auto_scaling_groups().iter().filter_map(|group| {
                to_asg_resource(
                    group.auto_scaling_group_arn(),
                    group.tags(),
                    &job.service,
                    region,
                )
            }));
        }
        Ok(resources)
    }
}

impl TaggingOperations for TaggingClient {
    async fn list_tagged_resources(
        &self,
        job: &DiscoveryJob,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, DiscoveryError> {
        let source = job
            .descriptor()
            .map(|service| service.source)
            .unwrap_or(ResourceSource::Tagging);

        let resources = match source {
            ResourceSource::Tagging => self.list_from_tagging_api(job, region).await?,
            ResourceSource::AutoScaling => self.list_auto_scaling_groups(job, region).await?,
        };

        debug!(
            service = %job.service,
            region = %region,
            resources = resources.len(),
            "Listed tagged resources"
        );
        Ok(resources)
    }
}

fn to_resource(mapping: &ResourceTagMapping, service: &str, region: &str) -> Option<ResourceRecord> {
    Some(ResourceRecord {
        id: mapping.resource_arn()?.to_string(),
        service: service.to_string(),
        region: region.to_string(),
        tags: extract_pairs(
            mapping.tags(),
            |t| Some(t.key()),
            |t| Some(t.value()),
            |key, value| Tag::new(key, value),
        ),
    })
}

fn to_asg_resource(
    arn: Option<&str>,
    tags: &[TagDescription],
    service: &str,
    region: &str,
) -> Option<ResourceRecord> {
    Some(ResourceRecord {
        id: arn?.to_string(),
        service: service.to_string(),
        region: region.to_string(),
        tags: extract_pairs(
            tags,
            |t| t.key(),
            |t| t.value(),
            |key, value| Tag::new(key, value),
        ),
    })
}
