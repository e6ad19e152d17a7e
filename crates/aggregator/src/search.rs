use futures::future::join_all;
use ql::{Filter, LogRow};
use reqwest::StatusCode;
use serde::Serialize;

use crate::Aggregator;

/// The query-string shape forwarded to `GET {peer}/api/search`, mirroring
/// the raw query string a caller sends to this node's own handler.
#[derive(Serialize)]
struct SearchQuery<'a> {
    #[serde(flatten)]
    filter: &'a Filter,
    limit: usize,
}

impl Aggregator {
    /// Runs a search against every peer and merges the results, newest
    /// first, truncated to `limit`.
    ///
    /// A peer that errors or returns a non-success status is logged and
    /// dropped; the merge still proceeds with whatever peers answered.
    pub async fn search(&self, filter: &Filter, limit: usize, auth: Option<&str>) -> Vec<LogRow> {
        let responses = join_all(self.peers.iter().map(|peer| fetch_one(&self.client, peer, filter, limit, auth))).await;

        let mut merged: Vec<LogRow> = responses.into_iter().flatten().flatten().collect();
        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        merged.truncate(limit);
        merged
    }
}

async fn fetch_one(client: &reqwest::Client, peer: &str, filter: &Filter, limit: usize, auth: Option<&str>) -> Option<Vec<LogRow>> {
    let url = format!("{peer}/api/search");
    let mut request = client.get(&url).query(&SearchQuery { filter, limit });
    if let Some(token) = auth {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(peer, error = %e, "search request to peer failed");
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        tracing::warn!(peer, status = %response.status(), "peer returned non-success status for search");
        return None;
    }

    match response.json::<Vec<LogRow>>().await {
        Ok(rows) => Some(rows),
        Err(e) => {
            tracing::warn!(peer, error = %e, "failed to decode search response from peer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql::Level;

    fn row(ts: i64) -> LogRow {
        LogRow { timestamp: ts, level: Level::Info, service: "api".into(), host: "h1".into(), message: "m".into(), trace_id: None }
    }

    #[test]
    fn merge_sorts_descending_and_truncates() {
        let mut rows = vec![row(100), row(300), row(200)];
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(2);
        assert_eq!(rows.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![300, 200]);
    }
}
