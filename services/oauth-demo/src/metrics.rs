//! Prometheus metrics exposition
//!
//! The demo records `demo_callbacks_total` (label `outcome`) for the redirect
//! callback. The `twitch-auth` library contributes
//! `twitch_oauth_token_requests_total` and
//! `twitch_oauth_endpoint_requests_total`; all of them render through the
//! recorder installed here.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record the outcome of an authorization callback.
pub fn record_callback(outcome: &'static str) {
    metrics::counter!("demo_callbacks_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_callback_does_not_panic_without_recorder() {
        record_callback("success");
    }

    #[test]
    fn record_callback_increments_counter_with_label() {
        // build_recorder() avoids the global singleton; install_recorder()
        // panics on a second call within one test process.
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_callback("state_mismatch");
        record_callback("success");

        let output = handle.render();
        assert!(output.contains("demo_callbacks_total"), "got: {output}");
        assert!(output.contains("outcome=\"state_mismatch\""));
        assert!(output.contains("outcome=\"success\""));
    }
}
