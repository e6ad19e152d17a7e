use aggregator::Aggregator;
use engine::Engine;
use std::sync::Arc;

/// Shared application state, cloned (cheaply, via `Arc`) into every worker.
///
/// Which fields are populated is decided once at startup by `--role`: an
/// `ingester` only ever has `engine`, a `console` only ever has
/// `aggregator`, and a `standalone` has both and serves reads straight from
/// its local engine rather than fanning out to itself.
pub struct AppState {
    pub engine: Option<Arc<Engine>>,
    pub aggregator: Option<Arc<Aggregator>>,
}
