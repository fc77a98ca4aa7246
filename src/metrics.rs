use tracing::trace;

// Trace events only; the Prometheus recorder in main renders whatever is registered.

pub fn inc_requests(route: &'static str) {
    trace!(target = "hermes.metrics", route, "requests_total_inc");
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "hermes.metrics",
        stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}

pub fn analysis_completed(top_route: &str, price_source: &str, replayed: bool) {
    trace!(
        target = "hermes.metrics",
        top_route,
        price_source,
        replayed,
        "analyses_total_inc"
    );
}
