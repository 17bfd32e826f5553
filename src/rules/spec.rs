//! Logical rule specifications produced by grouping.

use crate::load_balancer::types::ActionType;
use crate::rules::condition::{Condition, ConditionField};

/// Identity under which raw rows are merged into one rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub listener_port: u16,
    pub action_type: ActionType,
    /// Always `None` for redirects.
    pub target_group_name: Option<String>,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.listener_port,
            self.action_type,
            self.target_group_name.as_deref().unwrap_or("-")
        )
    }
}

/// A rule to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub key: GroupKey,
    /// At most one entry per field.
    pub conditions: Vec<Condition>,
    /// Set by the synchronizer once a priority is allocated.
    pub priority: Option<u32>,
    /// Input lines that contributed to this rule.
    pub source_lines: Vec<usize>,
}

impl RuleSpec {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            conditions: Vec::new(),
            priority: None,
            source_lines: Vec::new(),
        }
    }

    /// Merge a condition into the entry for its field, creating it if absent.
    pub fn add_condition(&mut self, condition: Condition) {
        match self.conditions.iter_mut().find(|c| c.field == condition.field) {
            Some(existing) => existing.absorb(&condition.values),
            None => self.conditions.push(condition),
        }
    }

    pub fn condition(&self, field: ConditionField) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.field == field)
    }

    pub fn has_host_and_path(&self) -> bool {
        self.condition(ConditionField::HostHeader).is_some()
            && self.condition(ConditionField::PathPattern).is_some()
    }
}
