use engine::SystemStats;
use futures::future::join_all;
use reqwest::StatusCode;

use crate::Aggregator;

impl Aggregator {
    /// Fans a stats request out to every peer and sums the scalar and
    /// per-service counters element-wise.
    ///
    /// `ingestion_rate` is summed too: each peer reports its own local
    /// ingest rate, and the cluster-wide rate is the sum of all of them.
    pub async fn stats(&self, auth: Option<&str>) -> SystemStats {
        let responses = join_all(self.peers.iter().map(|peer| fetch_one(&self.client, peer, auth))).await;

        let mut merged = SystemStats::default();
        for stats in responses.into_iter().flatten() {
            merged.ingestion_rate += stats.ingestion_rate;
            merged.total_logs += stats.total_logs;
            merged.disk_usage += stats.disk_usage;
            for (slot, count) in stats.level_dist.iter().enumerate() {
                merged.level_dist[slot] += count;
            }
            for (service, count) in stats.top_services {
                *merged.top_services.entry(service).or_insert(0) += count;
            }
        }
        merged
    }
}

async fn fetch_one(client: &reqwest::Client, peer: &str, auth: Option<&str>) -> Option<SystemStats> {
    let url = format!("{peer}/api/stats");
    let mut request = client.get(&url);
    if let Some(token) = auth {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(peer, error = %e, "stats request to peer failed");
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        tracing::warn!(peer, status = %response.status(), "peer returned non-success status for stats");
        return None;
    }

    match response.json::<SystemStats>().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(peer, error = %e, "failed to decode stats response from peer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_scalars_and_service_counts() {
        let mut merged = SystemStats::default();
        for stats in [
            SystemStats { ingestion_rate: 1.0, total_logs: 10, disk_usage: 100, level_dist: [1, 0, 0, 0, 0, 0], top_services: [("api".to_string(), 5)].into() },
            SystemStats { ingestion_rate: 2.0, total_logs: 20, disk_usage: 200, level_dist: [0, 1, 0, 0, 0, 0], top_services: [("api".to_string(), 3)].into() },
        ] {
            merged.ingestion_rate += stats.ingestion_rate;
            merged.total_logs += stats.total_logs;
            merged.disk_usage += stats.disk_usage;
            for (slot, count) in stats.level_dist.iter().enumerate() {
                merged.level_dist[slot] += count;
            }
            for (service, count) in stats.top_services {
                *merged.top_services.entry(service).or_insert(0) += count;
            }
        }

        assert_eq!(merged.total_logs, 30);
        assert_eq!(merged.disk_usage, 300);
        assert_eq!(merged.level_dist, [1, 1, 0, 0, 0, 0]);
        assert_eq!(merged.top_services.get("api"), Some(&8));
    }
}
