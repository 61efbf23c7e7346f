//! Prometheus metrics for template rendering and flow submission.
//!
//! - Template metrics (renders by mode, unresolved placeholders)
//! - Option resolution outcomes
//! - Client resolution outcomes
//! - Submission counts by family and mode, failures by stage

mod helpers;

pub use helpers::{encode_metrics, FlowMetrics, TemplateMetrics};

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "policy_flows";

lazy_static! {
    // ============================================================================
    // Template Metrics
    // ============================================================================

    /// Templates rendered by output mode
    pub static ref TEMPLATES_RENDERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_templates_rendered_total", METRIC_PREFIX),
        "Total templates rendered",
        &["mode"]
    ).unwrap();

    /// Placeholders that resolved to an empty value
    pub static ref TEMPLATE_MISSES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_misses_total", METRIC_PREFIX),
        "Total template placeholders that did not resolve"
    ).unwrap();

    // ============================================================================
    // Flow Metrics
    // ============================================================================

    /// Option resolutions by outcome (ok, failed)
    pub static ref OPTION_RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_option_resolutions_total", METRIC_PREFIX),
        "Total card option resolutions",
        &["outcome"]
    ).unwrap();

    /// Client identifier resolutions by outcome (ok, failed, tolerated)
    pub static ref CLIENT_RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_client_resolutions_total", METRIC_PREFIX),
        "Total client identifier resolutions",
        &["outcome"]
    ).unwrap();

    /// Submissions dispatched to the policy backend
    pub static ref FLOW_SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_flow_submissions_total", METRIC_PREFIX),
        "Total flow submissions dispatched",
        &["family", "mode"]
    ).unwrap();

    /// Submissions that failed, by pipeline stage
    pub static ref FLOW_SUBMISSION_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_flow_submission_failures_total", METRIC_PREFIX),
        "Total flow submissions that failed",
        &["stage"]
    ).unwrap();
}
