use futures::future::join_all;
use ql::Filter;
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::Aggregator;
use engine::HistogramBucket;

#[derive(Serialize)]
struct HistogramQuery<'a> {
    start: i64,
    end: i64,
    interval: i64,
    #[serde(flatten)]
    filter: &'a Filter,
}

impl Aggregator {
    /// Fans a histogram request out to every peer and sums counts for
    /// matching bucket boundaries, returned in ascending time order.
    pub async fn histogram(&self, start: i64, end: i64, interval_nanos: i64, filter: &Filter, auth: Option<&str>) -> Vec<HistogramBucket> {
        let responses = join_all(
            self.peers
                .iter()
                .map(|peer| fetch_one(&self.client, peer, start, end, interval_nanos, filter, auth)),
        )
        .await;

        let mut merged: BTreeMap<i64, u64> = BTreeMap::new();
        for buckets in responses.into_iter().flatten() {
            for bucket in buckets {
                *merged.entry(bucket.time).or_insert(0) += bucket.count;
            }
        }

        merged.into_iter().map(|(time, count)| HistogramBucket { time, count }).collect()
    }
}

#[allow(clippy::too_many_arguments)]
async fn fetch_one(
    client: &reqwest::Client,
    peer: &str,
    start: i64,
    end: i64,
    interval_nanos: i64,
    filter: &Filter,
    auth: Option<&str>,
) -> Option<Vec<HistogramBucket>> {
    let url = format!("{peer}/api/histogram");
    let mut request = client.get(&url).query(&HistogramQuery { start, end, interval: interval_nanos, filter });
    if let Some(token) = auth {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(peer, error = %e, "histogram request to peer failed");
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        tracing::warn!(peer, status = %response.status(), "peer returned non-success status for histogram");
        return None;
    }

    match response.json::<Vec<HistogramBucket>>().await {
        Ok(buckets) => Some(buckets),
        Err(e) => {
            tracing::warn!(peer, error = %e, "failed to decode histogram response from peer");
            None
        }
    }
}
