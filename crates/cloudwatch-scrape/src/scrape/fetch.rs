//! Batch partitioning, concurrent fetch and result correlation

use crate::client::{FetchWindow, MetricDataOperations};
use cloudwatch_scrape_common::{MetricDataResult, ScrapeRecord};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Number of partitions needed for `records` queries at `max_per_query` each
pub fn partition_count(records: usize, max_per_query: usize) -> usize {
    records.div_ceil(max_per_query.max(1))
}

/// Split records into partitions of at most `max_per_query`, fetch all
/// partitions concurrently and attach each result to its record.
///
/// Partitions are contiguous and keep input order. Each partition is owned
/// by exactly one fetch, so no two fetches touch the same record. Records of
/// a partition whose fetch failed are dropped; records of successful
/// partitions are kept even when no result was found for them.
pub async fn fetch_partitioned<C: MetricDataOperations>(
    client: &C,
    mut records: Vec<ScrapeRecord>,
    namespace: &str,
    window: FetchWindow,
    max_per_query: usize,
) -> Vec<ScrapeRecord> {
    if records.is_empty() {
        return records;
    }
    let max = max_per_query.max(1);
    debug!(
        namespace = %namespace,
        records = records.len(),
        partitions = partition_count(records.len(), max),
        "Fetching metric data"
    );

    let mut fetches = Vec::new();
    for (index, partition) in records.chunks_mut(max).enumerate() {
        fetches.push(fetch_partition(client, index, partition, namespace, window));
    }
    let succeeded = join_all(fetches).await;

    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| succeeded[i / max])
        .map(|(_, record)| record)
        .collect()
}

async fn fetch_partition<C: MetricDataOperations>(
    client: &C,
    index: usize,
    partition: &mut [ScrapeRecord],
    namespace: &str,
    window: FetchWindow,
) -> bool {
    match client.fetch_batch(partition, namespace, window).await {
        Ok(results) => {
            let applied = correlate(partition, results);
            debug!(
                partition = index,
                queries = partition.len(),
                applied,
                "Partition fetched"
            );
            true
        }
        Err(e) => {
            warn!(
                partition = index,
                namespace = %namespace,
                queries = partition.len(),
                error = %e,
                "Metric data fetch failed, dropping partition"
            );
            false
        }
    }
}

/// Attach each result's first (most recent) value and timestamp to the
/// record with the matching query id. Returns the number of values attached.
///
/// Results with an id not present in the partition are logged and dropped.
pub fn correlate(partition: &mut [ScrapeRecord], results: Vec<MetricDataResult>) -> usize {
    let by_id: HashMap<String, usize> = partition
        .iter()
        .enumerate()
        .map(|(i, record)| (record.query_id.clone(), i))
        .collect();

    let mut applied = 0;
    for result in results {
        let Some(&i) = by_id.get(&result.id) else {
            warn!(query_id = %result.id, "Result id not found in partition, dropping");
            continue;
        };
        let Some(&value) = result.values.first() else {
            continue;
        };
        if partition[i].attach(value, result.timestamps.first().copied()) {
            applied += 1;
        }
    }
    applied
}
