//! Positional column layout of the import table.

use serde::{Deserialize, Serialize};

/// Zero-based column offsets for each field the reconciler reads.
///
/// Two layouts are in use: the 9-column export layout (the default, which lets
/// an export be re-applied unchanged) and an 8-column compact layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnMap {
    /// First row is a header and is skipped.
    pub has_header: bool,
    pub listener_port: usize,
    pub action_type: usize,
    pub target_group_name: usize,
    pub condition_field: usize,
    pub condition_value: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::export_layout()
    }
}

impl ColumnMap {
    /// `Listener Port, Rule Priority, Rule ARN, Action Type, Target Group ARN,
    /// Target Group Name, Redirect URL, Condition Field, Condition Value`.
    pub fn export_layout() -> Self {
        Self {
            has_header: true,
            listener_port: 0,
            action_type: 3,
            target_group_name: 5,
            condition_field: 7,
            condition_value: 8,
        }
    }

    /// `Listener Port, Rule Priority, Rule ARN, Action Type, Target Group Name,
    /// Condition Field, Condition Value, Notes`.
    pub fn compact_layout() -> Self {
        Self {
            has_header: true,
            listener_port: 0,
            action_type: 3,
            target_group_name: 4,
            condition_field: 5,
            condition_value: 6,
        }
    }

    /// Look up a named layout.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "export" => Some(Self::export_layout()),
            "compact" => Some(Self::compact_layout()),
            _ => None,
        }
    }

    pub fn indices(&self) -> [(&'static str, usize); 5] {
        [
            ("listener_port", self.listener_port),
            ("action_type", self.action_type),
            ("target_group_name", self.target_group_name),
            ("condition_field", self.condition_field),
            ("condition_value", self.condition_value),
        ]
    }

    /// Minimum number of cells a row needs to be read.
    pub fn required_width(&self) -> usize {
        self.indices().iter().map(|(_, i)| *i).max().unwrap_or(0) + 1
    }
}
