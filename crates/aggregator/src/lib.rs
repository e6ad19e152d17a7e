//! # Aggregator
//!
//! Stateless scatter-gather fan-out across peer storage nodes: each public
//! method sends one request per configured peer in parallel, merges whatever
//! comes back, and degrades gracefully when a peer is unreachable.
//!
//! Grounded in the shape of a background HTTP client holding a long-lived
//! `reqwest::Client` and fanning out async requests, the way a logging
//! client in this codebase family holds one client across many calls rather
//! than building a fresh one per request.
//!
//! A peer failure is logged and dropped, never propagated as an error — the
//! merged result is still returned as long as at least one peer responded.
//! Only when every peer fails does a caller see an empty result.

mod histogram;
mod search;
mod stats;

use reqwest::Client;
use std::time::Duration;

/// Per-request timeout applied to every outbound peer call.
const PEER_TIMEOUT: Duration = Duration::from_secs(10);

/// Fans queries out to a fixed set of peer base URLs (e.g.
/// `http://10.0.0.2:8088`) and merges their responses.
///
/// Holds no state of its own beyond the peer list and a shared HTTP client;
/// every call is independent and safe to run concurrently with any other.
pub struct Aggregator {
    peers: Vec<String>,
    client: Client,
}

impl Aggregator {
    /// Builds an aggregator over `peers`. Panics only if the underlying TLS
    /// backend fails to initialize, mirroring `reqwest::Client::new`'s own
    /// infallible-in-practice contract.
    pub fn new(peers: Vec<String>) -> Self {
        let client = Client::builder()
            .timeout(PEER_TIMEOUT)
            .build()
            .expect("failed to build aggregator HTTP client");
        Self { peers, client }
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator").field("peers", &self.peers).finish()
    }
}
