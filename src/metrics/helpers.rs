//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::policy::{RuleFamily, RuleOperation};
use crate::template::RenderMode;

use super::{
    CLIENT_RESOLUTIONS_TOTAL, FLOW_SUBMISSIONS_TOTAL, FLOW_SUBMISSION_FAILURES_TOTAL,
    OPTION_RESOLUTIONS_TOTAL, TEMPLATES_RENDERED_TOTAL, TEMPLATE_MISSES_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording template metrics
pub struct TemplateMetrics;

impl TemplateMetrics {
    pub fn record_render(mode: RenderMode) {
        TEMPLATES_RENDERED_TOTAL
            .with_label_values(&[mode.as_str()])
            .inc();
    }

    pub fn record_miss() {
        TEMPLATE_MISSES_TOTAL.inc();
    }
}

/// Helper struct for recording flow pipeline metrics
pub struct FlowMetrics;

impl FlowMetrics {
    pub fn record_options(ok: bool) {
        let outcome = if ok { "ok" } else { "failed" };
        OPTION_RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// `outcome` is one of `ok`, `failed` or `tolerated`
    pub fn record_client(outcome: &str) {
        CLIENT_RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn record_submission(family: RuleFamily, operation: RuleOperation) {
        FLOW_SUBMISSIONS_TOTAL
            .with_label_values(&[family.as_str(), operation.as_str()])
            .inc();
    }

    pub fn record_failure(stage: &str) {
        FLOW_SUBMISSION_FAILURES_TOTAL
            .with_label_values(&[stage])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_recorded_metrics() {
        TemplateMetrics::record_render(RenderMode::Text);
        FlowMetrics::record_submission(RuleFamily::Block, RuleOperation::Created);

        let text = encode_metrics().unwrap();
        assert!(text.contains("policy_flows_templates_rendered_total"));
        assert!(text.contains("policy_flows_flow_submissions_total"));
    }
}
