//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a
//! reconciliation run. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

use crate::load_balancer::capacity::DEFAULT_MAX_RULES;
use crate::load_balancer::types::RedirectConfig;
use crate::rules::grouping::MergePolicy;
use crate::tabular::columns::ColumnMap;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Which load balancer to reconcile.
    pub load_balancer: LoadBalancerConfig,

    /// How to reach the control plane.
    pub control_plane: ControlPlaneConfig,

    /// Reconciliation policy.
    pub reconcile: ReconcileConfig,

    /// Import column layout.
    pub columns: ColumnMap,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Target load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoadBalancerConfig {
    /// Load balancer identifier (ARN).
    pub arn: String,
}

/// Control-plane gateway settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// Base URL of the gateway.
    pub endpoint: String,

    /// Environment variable holding the bearer token.
    pub token_env: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Items requested per listing page.
    pub page_size: u32,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8600".to_string(),
            token_env: "LB_CONTROL_PLANE_TOKEN".to_string(),
            timeout_secs: 30,
            page_size: 100,
        }
    }
}

/// Reconciliation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Rule ceiling per listener, the default rule included.
    pub max_rules: usize,

    /// How condition rows are merged into rules.
    pub merge_policy: MergePolicy,

    /// Sentinel marking a condition cell as not applicable.
    pub not_applicable: String,

    /// Pause between submissions.
    pub pacing: PacingConfig,

    /// Action built for `redirect` rows.
    pub redirect: RedirectConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_rules: DEFAULT_MAX_RULES,
            merge_policy: MergePolicy::default(),
            not_applicable: "N/A".to_string(),
            pacing: PacingConfig::default(),
            redirect: default_redirect(),
        }
    }
}

/// HTTPS:443 permanent redirect.
pub fn default_redirect() -> RedirectConfig {
    RedirectConfig::default()
}

/// Inter-submission pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Base pause after each submission in milliseconds.
    pub pause_ms: u64,

    /// Back off exponentially after consecutive submission failures.
    pub adaptive: bool,

    /// Upper bound for the adaptive pause in milliseconds.
    pub max_pause_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            pause_ms: 2000,
            adaptive: false,
            max_pause_ms: 30_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
