//! Scrape orchestration: fan out units, fan in their results

use super::ScrapeResult;
use super::discovery::DiscoveryUnit;
use super::limits::ScrapeLimits;
use super::static_job::StaticUnit;
use crate::client::ClientFactory;
use cloudwatch_scrape_common::{ConfigError, RoleArn, ScrapeConfig, ScrapeSettings};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Identifies one unit of a scrape
#[derive(Debug, Clone)]
struct UnitKey {
    job: usize,
    region: String,
    role: RoleArn,
}

/// Runs every configured job in every region under every role.
///
/// Both concurrency limits are created once and shared by all scrapes run
/// through the same `Scraper`.
pub struct Scraper<F> {
    factory: Arc<F>,
    config: Arc<ScrapeConfig>,
    settings: ScrapeSettings,
    limits: ScrapeLimits,
}

impl<F: ClientFactory> Scraper<F> {
    /// Validate `settings` and `config` and build a scraper.
    ///
    /// Configs assembled in code go through the same validation as loaded
    /// ones, so jobs without roles get the ambient default role.
    pub fn new(
        factory: F,
        mut config: ScrapeConfig,
        settings: ScrapeSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        config.validate()?;
        Ok(Self {
            factory: Arc::new(factory),
            config: Arc::new(config),
            limits: ScrapeLimits::from_settings(&settings),
            settings,
        })
    }

    pub fn limits(&self) -> &ScrapeLimits {
        &self.limits
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Run one scrape.
    ///
    /// Units run concurrently and own their outputs; results are merged only
    /// after every unit has finished. A failing unit contributes whatever it
    /// produced and never affects the others. Ordering of the merged output
    /// is unspecified.
    pub async fn scrape(&self) -> ScrapeResult {
        let mut units = JoinSet::new();

        for (index, job) in self.config.discovery.jobs.iter().enumerate() {
            for role in &job.role_arns {
                for region in &job.regions {
                    let key = UnitKey {
                        job: index,
                        region: region.clone(),
                        role: role.clone(),
                    };
                    units.spawn(run_discovery_unit(
                        self.factory.clone(),
                        self.config.clone(),
                        self.limits.clone(),
                        self.settings.metrics_per_query,
                        key,
                    ));
                }
            }
        }

        for (index, job) in self.config.static_jobs.iter().enumerate() {
            for role in &job.role_arns {
                for region in &job.regions {
                    let key = UnitKey {
                        job: index,
                        region: region.clone(),
                        role: role.clone(),
                    };
                    units.spawn(run_static_unit(
                        self.factory.clone(),
                        self.config.clone(),
                        self.limits.clone(),
                        key,
                    ));
                }
            }
        }

        let spawned = units.len();
        let mut result = ScrapeResult::default();
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(output) => result.merge(output),
                Err(e) => error!(error = %e, "Scrape unit did not complete"),
            }
        }

        info!(
            units = spawned,
            resources = result.resources.len(),
            records = result.records.len(),
            "Scrape complete"
        );
        result
    }
}

async fn run_discovery_unit<F: ClientFactory>(
    factory: Arc<F>,
    config: Arc<ScrapeConfig>,
    limits: ScrapeLimits,
    metrics_per_query: usize,
    key: UnitKey,
) -> ScrapeResult {
    let job = &config.discovery.jobs[key.job];

    let tagging = match factory.tagging_client(&key.region, &key.role).await {
        Ok(client) => client,
        Err(e) => {
            error!(job = %job.service, region = %key.region, role = %key.role, error = ?e, "Couldn't create tagging client");
            return ScrapeResult::default();
        }
    };
    let cloudwatch = match factory.cloudwatch_client(&key.region, &key.role).await {
        Ok(client) => client,
        Err(e) => {
            error!(job = %job.service, region = %key.region, role = %key.role, error = ?e, "Couldn't create CloudWatch client");
            return ScrapeResult::default();
        }
    };

    DiscoveryUnit {
        job,
        region: &key.region,
        role: &key.role,
        exported_tags: &config.discovery.exported_tags_on_metrics,
        limits: &limits,
        metrics_per_query,
    }
    .run(&tagging, &cloudwatch)
    .await
}

async fn run_static_unit<F: ClientFactory>(
    factory: Arc<F>,
    config: Arc<ScrapeConfig>,
    limits: ScrapeLimits,
    key: UnitKey,
) -> ScrapeResult {
    let job = &config.static_jobs[key.job];

    let cloudwatch = match factory.cloudwatch_client(&key.region, &key.role).await {
        Ok(client) => client,
        Err(e) => {
            error!(job = %job.name, region = %key.region, role = %key.role, error = ?e, "Couldn't create CloudWatch client");
            return ScrapeResult::default();
        }
    };

    let records = StaticUnit::new(job, &key.region, &limits)
        .run(&cloudwatch)
        .await;
    ScrapeResult {
        resources: Vec::new(),
        records,
    }
}
