//! Metrics/tracing hooks.
//!
//! This module purposefully avoids pulling heavy telemetry stacks; the
//! binary decides where events go by installing a subscriber.

#[cfg(feature = "tracing")]
pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::span!(tracing::Level::DEBUG, "reltools", event);
    let _entered = span.enter();
    for (k, v) in key_values {
        tracing::debug!(%event, key = %k, value = %v, "metric");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn emit_span(_event: &str, _key_values: &[(&str, String)]) { /* no-op */
}
