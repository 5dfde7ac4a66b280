use anyhow::Result;
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!("pipeline_runs_total", "Number of pipeline refresh runs started.");
    describe_counter!(
        "pipeline_failed_runs_total",
        "Number of pipeline refresh runs that failed."
    );
    describe_counter!(
        "pipeline_unchanged_total",
        "Number of refresh runs skipped because records were unchanged."
    );
    describe_counter!(
        "pipeline_superseded_total",
        "Number of refresh runs discarded because a newer run published first."
    );
    describe_counter!(
        "gateway_requests_total",
        "Number of chain gateway requests made."
    );
    describe_counter!(
        "model_requests_total",
        "Number of scoring model requests made."
    );
    describe_counter!(
        "help_submissions_total",
        "Number of help transactions submitted through the form."
    );
    describe_counter!(
        "tracing_error_events",
        "Number of ERROR-level tracing events."
    );
}

pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?)
}
