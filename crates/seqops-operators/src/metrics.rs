//! Tracing hooks for operator milestones.
//!
//! This module purposefully avoids pulling heavy telemetry stacks. With the
//! `tracing` feature off every call compiles to nothing.

#[cfg(feature = "tracing")]
pub fn emit_event(event: &'static str, key_values: &[(&str, u64)]) {
    let span = tracing::debug_span!("seqops", event);
    let _entered = span.enter();
    for (k, v) in key_values {
        tracing::debug!(%event, key = %k, value = *v, "operator");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn emit_event(_event: &'static str, _key_values: &[(&str, u64)]) { /* no-op */
}
