//! Rule grouping engine.
//!
//! # Responsibilities
//! - Turn raw rows into logical `RuleSpec`s keyed by `GroupKey`
//! - Merge condition rows according to an explicit `MergePolicy`
//! - Report every rejected row without stopping
//!
//! # Design Decisions
//! - Rows are visited in input order; specs come out in first-seen order
//! - Values for a repeated field are unioned, first occurrence wins the slot,
//!   so no value is ever dropped by a later row
//! - Redirect rows ignore the target-group cell

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::load_balancer::types::ActionType;
use crate::rules::condition::ConditionNormalizer;
use crate::rules::spec::{GroupKey, RuleSpec};
use crate::tabular::reader::{RawRow, RowRejection};

/// How rows sharing a `GroupKey` are merged into rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// host-header and path-pattern rows merge into one rule; every other
    /// row becomes its own single-condition rule.
    #[default]
    HostPathPair,
    /// Every row sharing a key merges into one rule.
    All,
    /// Like `HostPathPair`, but only host-header/path-pattern rows are used
    /// and a rule is created only once both halves of the pair are present.
    HostPathPairStrict,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::HostPathPair => "host-path-pair",
            MergePolicy::All => "all",
            MergePolicy::HostPathPairStrict => "host-path-pair-strict",
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "host-path-pair" => Ok(MergePolicy::HostPathPair),
            "all" => Ok(MergePolicy::All),
            "host-path-pair-strict" => Ok(MergePolicy::HostPathPairStrict),
            other => Err(format!(
                "unknown merge policy '{}' (expected host-path-pair, all or host-path-pair-strict)",
                other
            )),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping result: specs in first-seen order and the rows that were dropped.
#[derive(Debug, Default)]
pub struct GroupingOutcome {
    pub specs: Vec<RuleSpec>,
    pub rejected: Vec<RowRejection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Merged,
    Row(usize),
}

/// Groups raw rows into rule specifications.
#[derive(Debug, Clone, Default)]
pub struct RuleGrouper {
    normalizer: ConditionNormalizer,
    policy: MergePolicy,
}

impl RuleGrouper {
    pub fn new(normalizer: ConditionNormalizer, policy: MergePolicy) -> Self {
        Self { normalizer, policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn group(&self, rows: &[RawRow]) -> GroupingOutcome {
        let mut outcome = GroupingOutcome::default();
        let mut slots: HashMap<(GroupKey, Slot), usize> = HashMap::new();

        for row in rows {
            let conditions = match self.normalizer.normalize_row(&row.condition_field, &row.condition_value) {
                Ok(conditions) => conditions,
                Err(e) => {
                    tracing::warn!(line = row.line, port = %row.listener_port, error = %e, "Skipping row");
                    outcome.rejected.push(rejection(row.line, e));
                    continue;
                }
            };

            let key = match group_key(row) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(line = row.line, error = %e, "Skipping row");
                    outcome.rejected.push(rejection(row.line, e));
                    continue;
                }
            };

            let pair_only = conditions.iter().all(|c| c.field.is_host_or_path());
            let slot = match self.policy {
                MergePolicy::All => Slot::Merged,
                MergePolicy::HostPathPair if pair_only => Slot::Merged,
                MergePolicy::HostPathPair => Slot::Row(row.line),
                MergePolicy::HostPathPairStrict if pair_only => Slot::Merged,
                MergePolicy::HostPathPairStrict => {
                    let e = SyncError::Validation(format!(
                        "field '{}' is not applied under the {} policy",
                        row.condition_field, self.policy
                    ));
                    tracing::warn!(line = row.line, error = %e, "Skipping row");
                    outcome.rejected.push(rejection(row.line, e));
                    continue;
                }
            };

            let idx = *slots.entry((key.clone(), slot)).or_insert_with(|| {
                outcome.specs.push(RuleSpec::new(key));
                outcome.specs.len() - 1
            });
            let spec = &mut outcome.specs[idx];
            for condition in conditions {
                spec.add_condition(condition);
            }
            spec.source_lines.push(row.line);
        }

        if self.policy == MergePolicy::HostPathPairStrict {
            let (complete, incomplete): (Vec<_>, Vec<_>) = outcome
                .specs
                .drain(..)
                .partition(RuleSpec::has_host_and_path);
            for spec in incomplete {
                tracing::info!(key = %spec.key, "Holding back rule until both host-header and path-pattern are present");
                for line in spec.source_lines {
                    outcome.rejected.push(RowRejection {
                        line,
                        reason: format!("{} lacks a host-header/path-pattern pair", spec.key),
                    });
                }
            }
            outcome.specs = complete;
        }

        tracing::debug!(
            policy = %self.policy,
            specs = outcome.specs.len(),
            rejected = outcome.rejected.len(),
            "Rows grouped"
        );
        outcome
    }
}

fn rejection(line: usize, error: SyncError) -> RowRejection {
    RowRejection {
        line,
        reason: error.to_string(),
    }
}

fn group_key(row: &RawRow) -> Result<GroupKey, SyncError> {
    let listener_port = parse_port(&row.listener_port)?;
    let action_type: ActionType = row.action_type.parse().map_err(SyncError::Validation)?;
    let target_group_name = match action_type {
        ActionType::Redirect => None,
        _ if row.target_group_name.is_empty() => None,
        _ => Some(row.target_group_name.clone()),
    };
    Ok(GroupKey {
        listener_port,
        action_type,
        target_group_name,
    })
}

/// Parse a listener port cell; spreadsheet numerics like `443.0` are accepted.
pub fn parse_port(raw: &str) -> Result<u16, SyncError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    match digits.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(SyncError::Validation(format!("invalid listener port '{}'", trimmed))),
    }
}
