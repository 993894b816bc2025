//! cloudwatch-scrape-common - Shared types and matching logic
//!
//! This crate holds everything the scrape engine needs that does not talk to
//! AWS: the record types, job configuration, the service registry and the
//! pure matching functions. It has no AWS SDK dependency so the matching
//! rules can be tested without any network client.
//!
//! ## Modules
//!
//! - [`config`]: Scrape configuration (discovery and static jobs)
//! - [`defaults`]: Default configuration values
//! - [`dimensions`]: Dimension resolution, reconciliation and catalog filtering
//! - [`error`]: Configuration errors
//! - [`model`]: Resource, scrape and catalog record types
//! - [`query_id`]: Per-unit query identifier generation
//! - [`services`]: Supported discovery services and their dimension rules
//! - [`tags`]: Tag filtering and metric tag projection

pub mod config;
pub mod defaults;
pub mod dimensions;
pub mod error;
pub mod model;
pub mod query_id;
pub mod services;
pub mod tags;

// Re-export commonly used types
pub use config::{
    DiscoveryConfig, DiscoveryJob, ExportedTagsOnMetrics, MetricConfig, RoleArn, ScrapeConfig,
    ScrapeSettings, StaticJob,
};
pub use dimensions::DimensionSet;
pub use error::ConfigError;
pub use model::{
    Datapoint, Dimension, MetricCatalogEntry, MetricDataResult, ResourceRecord, ScrapeRecord, Tag,
};
pub use query_id::QueryIdGenerator;
pub use services::{ResourceSource, ServiceDescriptor};
pub use tags::TagFilter;
