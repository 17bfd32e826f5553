//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ceilings, pauses, timeouts)
//! - Detect conflicting column offsets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs before any control-plane call is made

use std::collections::HashMap;

use crate::config::schema::SyncConfig;
use crate::load_balancer::types::MAX_PRIORITY;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.load_balancer.arn.trim().is_empty() {
        errors.push(ValidationError::new("load_balancer.arn", "must not be empty"));
    }

    if url::Url::parse(&config.control_plane.endpoint).is_err() {
        errors.push(ValidationError::new(
            "control_plane.endpoint",
            format!("'{}' is not a valid URL", config.control_plane.endpoint),
        ));
    }
    if config.control_plane.timeout_secs == 0 {
        errors.push(ValidationError::new("control_plane.timeout_secs", "must be greater than 0"));
    }
    if config.control_plane.page_size == 0 {
        errors.push(ValidationError::new("control_plane.page_size", "must be greater than 0"));
    }

    let reconcile = &config.reconcile;
    if reconcile.max_rules == 0 || reconcile.max_rules > MAX_PRIORITY as usize {
        errors.push(ValidationError::new(
            "reconcile.max_rules",
            format!("must be within 1..={}", MAX_PRIORITY),
        ));
    }
    if reconcile.not_applicable.trim().is_empty() {
        errors.push(ValidationError::new("reconcile.not_applicable", "must not be empty"));
    }
    if reconcile.pacing.max_pause_ms < reconcile.pacing.pause_ms {
        errors.push(ValidationError::new(
            "reconcile.pacing.max_pause_ms",
            "must not be smaller than pause_ms",
        ));
    }
    if reconcile.redirect.protocol.is_empty() || reconcile.redirect.port.is_empty() {
        errors.push(ValidationError::new(
            "reconcile.redirect",
            "protocol and port are required",
        ));
    }

    let mut seen: HashMap<usize, &str> = HashMap::new();
    for (name, index) in config.columns.indices() {
        if let Some(other) = seen.insert(index, name) {
            errors.push(ValidationError::new(
                "columns",
                format!("{} and {} both use column {}", other, name, index),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
