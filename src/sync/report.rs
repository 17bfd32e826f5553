//! Outcome of a reconciliation run.

use std::fmt;

use crate::rules::spec::GroupKey;
use crate::tabular::reader::RowRejection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRule {
    pub key: GroupKey,
    pub listener_arn: String,
    pub priority: u32,
    pub rule_arn: String,
}

/// A rule that was not attempted (validation or lookup failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub key: GroupKey,
    pub reason: String,
}

/// A rule whose submission (or capacity step) failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRule {
    pub key: GroupKey,
    pub priority: Option<u32>,
    pub reason: String,
}

/// A rule submitted while its listener was still at the ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverCapacity {
    pub key: GroupKey,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub created: Vec<CreatedRule>,
    pub skipped: Vec<SkippedRule>,
    pub failed: Vec<FailedRule>,
    /// ARNs deleted by the capacity governor.
    pub evicted: Vec<String>,
    /// (rule ARN, error) for evictions the control plane refused.
    pub failed_evictions: Vec<(String, String)>,
    pub over_capacity: Vec<OverCapacity>,
    pub rejected_rows: Vec<RowRejection>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.failed.is_empty()
            && self.failed_evictions.is_empty()
            && self.over_capacity.is_empty()
            && self.rejected_rows.is_empty()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            created = self.created.len(),
            skipped = self.skipped.len(),
            failed = self.failed.len(),
            evicted = self.evicted.len(),
            failed_evictions = self.failed_evictions.len(),
            over_capacity = self.over_capacity.len(),
            rejected_rows = self.rejected_rows.len(),
            "Finished creating rules"
        );
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.created {
            writeln!(f, "created  {} priority {} -> {}", rule.key, rule.priority, rule.rule_arn)?;
        }
        for arn in &self.evicted {
            writeln!(f, "evicted  {}", arn)?;
        }
        for (arn, error) in &self.failed_evictions {
            writeln!(f, "not evicted {}: {}", arn, error)?;
        }
        for rule in &self.over_capacity {
            writeln!(f, "over ceiling {}: {}", rule.key, rule.reason)?;
        }
        for rule in &self.skipped {
            writeln!(f, "skipped  {}: {}", rule.key, rule.reason)?;
        }
        for rule in &self.failed {
            match rule.priority {
                Some(p) => writeln!(f, "failed   {} priority {}: {}", rule.key, p, rule.reason)?,
                None => writeln!(f, "failed   {}: {}", rule.key, rule.reason)?,
            }
        }
        for row in &self.rejected_rows {
            writeln!(f, "rejected line {}: {}", row.line, row.reason)?;
        }
        write!(
            f,
            "{} created, {} skipped, {} failed, {} evicted, {} evictions failed, {} rows rejected",
            self.created.len(),
            self.skipped.len(),
            self.failed.len(),
            self.evicted.len(),
            self.failed_evictions.len(),
            self.rejected_rows.len()
        )
    }
}
