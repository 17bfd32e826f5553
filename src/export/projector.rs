//! Export projector.
//!
//! # Responsibilities
//! - Flatten live rules into one row per (rule, action, condition value)
//! - Emit a single combined row for rules carrying both host-header and
//!   path-pattern, matching the grouping engine's default merge policy
//! - Mark condition-less rules (the default rule) with the sentinel so a
//!   re-import skips them

use crate::load_balancer::targets::TargetGroupIndex;
use crate::load_balancer::types::{Listener, Rule, RuleAction, RulePriority};
use crate::rules::condition::{format_combined, ConditionField, COMBINED_FIELD};

/// One flat export row; field order matches the export header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub listener_port: u16,
    pub rule_priority: String,
    pub rule_arn: String,
    pub action_type: String,
    pub target_group_arn: String,
    pub target_group_name: String,
    pub redirect_url: String,
    pub condition_field: String,
    pub condition_value: String,
}

impl ExportRow {
    pub fn cells(&self) -> [String; 9] {
        [
            self.listener_port.to_string(),
            self.rule_priority.clone(),
            self.rule_arn.clone(),
            self.action_type.clone(),
            self.target_group_arn.clone(),
            self.target_group_name.clone(),
            self.redirect_url.clone(),
            self.condition_field.clone(),
            self.condition_value.clone(),
        ]
    }
}

/// Live rules of one listener.
#[derive(Debug, Clone)]
pub struct ListenerRules {
    pub listener: Listener,
    pub rules: Vec<Rule>,
}

/// Projects live state into export rows.
#[derive(Debug, Clone)]
pub struct ExportProjector<'a> {
    index: &'a TargetGroupIndex,
    not_applicable: String,
}

impl<'a> ExportProjector<'a> {
    pub fn new(index: &'a TargetGroupIndex, not_applicable: impl Into<String>) -> Self {
        Self {
            index,
            not_applicable: not_applicable.into(),
        }
    }

    /// Rows ordered by listener port, then numbered priority, labels last.
    pub fn project(&self, listeners: &[ListenerRules]) -> Vec<ExportRow> {
        let mut listeners: Vec<&ListenerRules> = listeners.iter().collect();
        listeners.sort_by_key(|l| l.listener.port);

        let mut rows = Vec::new();
        for entry in listeners {
            let mut rules: Vec<&Rule> = entry.rules.iter().collect();
            rules.sort_by_key(|r| match &r.priority {
                RulePriority::Numbered(n) => (0, *n),
                RulePriority::Label(_) => (1, 0),
            });
            for rule in rules {
                self.project_rule(entry.listener.port, rule, &mut rows);
            }
        }
        rows
    }

    fn project_rule(&self, port: u16, rule: &Rule, rows: &mut Vec<ExportRow>) {
        let conditions = self.condition_cells(rule);

        if rule.actions.is_empty() {
            for (field, value) in &conditions {
                rows.push(self.row(port, rule, None, field, value));
            }
            return;
        }

        for action in &rule.actions {
            for (field, value) in &conditions {
                rows.push(self.row(port, rule, Some(action), field, value));
            }
        }
    }

    /// (field, value) cells for a rule, with the host/path merge applied.
    fn condition_cells(&self, rule: &Rule) -> Vec<(String, String)> {
        if rule.conditions.is_empty() {
            return vec![(self.not_applicable.clone(), self.not_applicable.clone())];
        }

        let hosts = values_of(rule, ConditionField::HostHeader);
        let paths = values_of(rule, ConditionField::PathPattern);
        let merged = !hosts.is_empty() && !paths.is_empty();

        let mut cells = Vec::new();
        if merged {
            cells.push((COMBINED_FIELD.to_string(), format_combined(&hosts, &paths)));
        }
        for condition in &rule.conditions {
            if merged && condition.field.is_host_or_path() {
                continue;
            }
            for value in &condition.values {
                cells.push((condition.field.as_str().to_string(), value.clone()));
            }
        }
        cells
    }

    fn row(&self, port: u16, rule: &Rule, action: Option<&RuleAction>, field: &str, value: &str) -> ExportRow {
        let target_group_arn = action
            .and_then(|a| a.target_group_arn.clone())
            .unwrap_or_default();
        let target_group_name = self
            .index
            .name_of(&target_group_arn)
            .unwrap_or_default()
            .to_string();

        ExportRow {
            listener_port: port,
            rule_priority: rule.priority.to_string(),
            rule_arn: rule.rule_arn.clone(),
            action_type: action.map(|a| a.action_type.to_string()).unwrap_or_default(),
            target_group_arn,
            target_group_name,
            redirect_url: action
                .and_then(|a| a.redirect.as_ref())
                .map(|r| r.to_url())
                .unwrap_or_default(),
            condition_field: field.to_string(),
            condition_value: value.to_string(),
        }
    }
}

fn values_of(rule: &Rule, field: ConditionField) -> Vec<String> {
    rule.conditions
        .iter()
        .filter(|c| c.field == field)
        .flat_map(|c| c.values.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::default_redirect;
    use crate::load_balancer::types::TargetGroup;
    use crate::rules::condition::Condition;

    fn index() -> TargetGroupIndex {
        TargetGroupIndex::from_groups(vec![TargetGroup {
            name: "web".into(),
            target_group_arn: "arn:tg/web".into(),
        }])
    }

    fn rule(arn: &str, priority: RulePriority, conditions: Vec<Condition>, actions: Vec<RuleAction>) -> Rule {
        Rule {
            rule_arn: arn.into(),
            priority,
            conditions,
            actions,
            is_default: false,
        }
    }

    fn listener(port: u16, rules: Vec<Rule>) -> ListenerRules {
        ListenerRules {
            listener: Listener {
                listener_arn: format!("arn:listener/{}", port),
                port,
                protocol: None,
            },
            rules,
        }
    }

    #[test]
    fn test_host_and_path_become_one_row() {
        let index = index();
        let live = vec![listener(
            443,
            vec![rule(
                "arn:r1",
                RulePriority::Numbered(1),
                vec![
                    Condition::new(ConditionField::HostHeader, "a.com"),
                    Condition::new(ConditionField::PathPattern, "/api/*"),
                    Condition::new(ConditionField::HttpRequestMethod, "GET"),
                ],
                vec![RuleAction::forward("arn:tg/web")],
            )],
        )];

        let rows = ExportProjector::new(&index, "N/A").project(&live);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].condition_field, COMBINED_FIELD);
        assert_eq!(rows[0].condition_value, "a.com + /api/*");
        assert_eq!(rows[0].target_group_name, "web");
        assert_eq!(rows[1].condition_field, "http-request-method");
    }

    #[test]
    fn test_one_row_per_value_without_pair() {
        let index = index();
        let live = vec![listener(
            80,
            vec![rule(
                "arn:r2",
                RulePriority::Numbered(4),
                vec![Condition {
                    field: ConditionField::HostHeader,
                    values: vec!["a.com".into(), "b.com".into()],
                }],
                vec![RuleAction::redirect(default_redirect())],
            )],
        )];

        let rows = ExportProjector::new(&index, "N/A").project(&live);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].condition_value, "b.com");
        assert_eq!(rows[0].action_type, "redirect");
        assert_eq!(rows[0].redirect_url, "HTTPS://#{host}:443/#{path}?#{query}");
        assert_eq!(rows[0].target_group_name, "");
    }

    #[test]
    fn test_default_rule_uses_sentinel_and_sorts_last() {
        let index = index();
        let live = vec![
            listener(
                443,
                vec![
                    rule(
                        "arn:default",
                        RulePriority::Label("default".into()),
                        vec![],
                        vec![RuleAction::forward("arn:tg/web")],
                    ),
                    rule(
                        "arn:r9",
                        RulePriority::Numbered(9),
                        vec![Condition::new(ConditionField::SourceIp, "10.0.0.0/8")],
                        vec![RuleAction::forward("arn:tg/unknown")],
                    ),
                ],
            ),
            listener(80, vec![]),
        ];

        let rows = ExportProjector::new(&index, "N/A").project(&live);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rule_priority, "9");
        assert_eq!(rows[0].target_group_name, "");
        assert_eq!(rows[1].rule_priority, "default");
        assert_eq!(rows[1].condition_field, "N/A");
        assert_eq!(rows[1].condition_value, "N/A");
    }
}
