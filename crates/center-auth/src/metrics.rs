//! Session counters
//!
//! - `center_auth_logins_total` (counter): label `outcome`
//! - `center_session_losses_total` (counter): label `reason`
//!
//! Emitted through the `metrics` facade; without an installed recorder these
//! calls are no-ops.

/// Record a login attempt outcome (`success`, `rejected`, `network`, `error`).
pub fn record_login(outcome: &'static str) {
    metrics::counter!("center_auth_logins_total", "outcome" => outcome).increment(1);
}

/// Record the end of a session (`logout`, `verify_rejected`, `verify_failed`,
/// `unauthorized`).
pub fn record_session_end(reason: &'static str) {
    metrics::counter!("center_session_losses_total", "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_login("success");
        record_session_end("logout");
    }

    #[test]
    fn counters_carry_their_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_login("rejected");
        record_login("success");
        record_session_end("unauthorized");

        let output = handle.render();
        assert!(output.contains("center_auth_logins_total{outcome=\"rejected\"} 1"));
        assert!(output.contains("center_auth_logins_total{outcome=\"success\"} 1"));
        assert!(output.contains("center_session_losses_total{reason=\"unauthorized\"} 1"));
    }
}
