//! cloudwatch-scrape - resource discovery and CloudWatch scrape engine
//!
//! Discovers resources per (job, role, region), assembles one query per
//! resource, metric and statistic, fetches them in bounded batches and
//! returns two correlated result sets: the discovered resources (for labels)
//! and the scraped records (for export).
//!
//! The engine talks to AWS only through the traits in [`client`]; the
//! [`aws`] module provides the SDK-backed implementations.

pub mod aws;
pub mod client;
pub mod error;
pub mod scrape;

pub use client::{
    CatalogOperations, ClientFactory, FetchWindow, MetricDataOperations, TaggingOperations,
};
pub use error::{ClientError, DiscoveryError};
pub use scrape::{ScrapeLimits, ScrapeResult, Scraper};
