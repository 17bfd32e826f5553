//! Priority allocation.
//!
//! The next priority is one past the highest numbered rule. Labelled rules
//! (the default rule) are ignored, and a listener with no numbered rules
//! starts at 1. The snapshot must be re-fetched after every mutation.

use crate::load_balancer::listener::ListenerState;

/// Compute the next free priority for a listener snapshot.
pub fn next_priority(state: &ListenerState) -> u32 {
    state
        .existing_rules
        .iter()
        .filter_map(|r| r.priority.number())
        .max()
        .map(|max| max.saturating_add(1))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::listener::ExistingRule;
    use crate::load_balancer::types::RulePriority;

    fn state(priorities: &[&str]) -> ListenerState {
        ListenerState {
            listener_arn: "arn:listener/443".into(),
            port: 443,
            existing_rules: priorities
                .iter()
                .enumerate()
                .map(|(i, p)| ExistingRule {
                    priority: p.parse::<RulePriority>().unwrap(),
                    rule_arn: format!("arn:rule/{}", i),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_listener_starts_at_one() {
        assert_eq!(next_priority(&state(&[])), 1);
        assert_eq!(next_priority(&state(&["default"])), 1);
    }

    #[test]
    fn test_max_plus_one_ignores_labels() {
        assert_eq!(next_priority(&state(&["default", "3", "17", "5"])), 18);
    }

    #[test]
    fn test_gaps_are_not_filled() {
        assert_eq!(next_priority(&state(&["1", "50"])), 51);
    }
}
