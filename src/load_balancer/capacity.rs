//! Capacity governor.
//!
//! # Responsibilities
//! - Keep a listener strictly below its rule ceiling before a creation
//! - Evict numbered rules lowest priority first (oldest first, since
//!   priorities are allocated increasingly)
//! - Re-fetch the live rule count after each deletion
//!
//! # Design Decisions
//! - Best effort: a failed deletion is recorded and the next candidate is tried
//! - The default rule counts toward the ceiling but is never evicted

use crate::load_balancer::listener::ListenerState;
use crate::load_balancer::types::ApiResult;
use crate::load_balancer::ElbApi;

/// Default per-listener rule ceiling.
pub const DEFAULT_MAX_RULES: usize = 1000;

/// Outcome of a capacity check.
#[derive(Debug, Clone)]
pub struct CapacityReport {
    /// Snapshot after the last eviction.
    pub state: ListenerState,
    /// ARNs of rules that were deleted.
    pub evicted: Vec<String>,
    /// (rule ARN, error) for deletions that failed.
    pub failed: Vec<(String, String)>,
    pub max_rules: usize,
}

impl CapacityReport {
    /// True when a new rule fits under the ceiling.
    pub fn has_room(&self) -> bool {
        self.state.rule_count() < self.max_rules
    }
}

/// Enforces the per-listener rule ceiling.
#[derive(Debug, Clone, Copy)]
pub struct CapacityGovernor {
    max_rules: usize,
}

impl Default for CapacityGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RULES)
    }
}

impl CapacityGovernor {
    pub fn new(max_rules: usize) -> Self {
        Self { max_rules }
    }

    pub fn max_rules(&self) -> usize {
        self.max_rules
    }

    /// Evict until `rule_count() < max_rules` or every candidate was tried.
    ///
    /// Only a failed re-fetch is returned as an error; deletion failures are
    /// collected in the report.
    pub async fn ensure_capacity(
        &self,
        api: &dyn ElbApi,
        mut state: ListenerState,
    ) -> ApiResult<CapacityReport> {
        let mut evicted = Vec::new();
        let mut failed = Vec::new();

        if state.rule_count() >= self.max_rules {
            tracing::info!(
                listener = %state.listener_arn,
                rules = state.rule_count(),
                max_rules = self.max_rules,
                "Rule ceiling reached, evicting oldest rules"
            );

            let mut candidates: Vec<(u32, String)> = state
                .existing_rules
                .iter()
                .filter_map(|r| r.priority.number().map(|p| (p, r.rule_arn.clone())))
                .collect();
            candidates.sort();

            for (priority, rule_arn) in candidates {
                if state.rule_count() < self.max_rules {
                    break;
                }
                match api.delete_rule(&rule_arn).await {
                    Ok(()) => {
                        tracing::info!(rule_arn = %rule_arn, priority, "Deleted rule");
                        evicted.push(rule_arn);
                        state.refresh(api).await?;
                    }
                    Err(e) => {
                        tracing::warn!(rule_arn = %rule_arn, priority, error = %e, "Failed to delete rule");
                        failed.push((rule_arn, e.to_string()));
                    }
                }
            }

            if state.rule_count() >= self.max_rules {
                tracing::warn!(
                    listener = %state.listener_arn,
                    rules = state.rule_count(),
                    max_rules = self.max_rules,
                    failed_deletions = failed.len(),
                    "Eviction exhausted without freeing capacity"
                );
            }
        }

        Ok(CapacityReport {
            state,
            evicted,
            failed,
            max_rules: self.max_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::memory::InMemoryElb;
    use crate::load_balancer::types::Listener;

    async fn listener_with_rules(api: &InMemoryElb, count: u32) -> Listener {
        let listener = api.add_listener("arn:lb", 443);
        for priority in 1..=count {
            api.seed_rule(&listener.listener_arn, priority, "a.com", "arn:tg/web");
        }
        listener
    }

    #[tokio::test]
    async fn test_under_ceiling_is_untouched() {
        let api = InMemoryElb::new();
        let listener = listener_with_rules(&api, 3).await;
        let state = ListenerState::fetch(&api, &listener).await.unwrap();

        let report = CapacityGovernor::new(10).ensure_capacity(&api, state).await.unwrap();
        assert!(report.evicted.is_empty());
        assert!(report.has_room());
        assert_eq!(report.state.rule_count(), 4);
    }

    #[tokio::test]
    async fn test_evicts_lowest_priority_first() {
        let api = InMemoryElb::new();
        let listener = listener_with_rules(&api, 5).await;
        let state = ListenerState::fetch(&api, &listener).await.unwrap();
        let lowest: Vec<String> = state.existing_rules[0..2].iter().map(|r| r.rule_arn.clone()).collect();

        // 5 numbered + default = 6 rules; ceiling 5 needs two evictions.
        let report = CapacityGovernor::new(5).ensure_capacity(&api, state).await.unwrap();
        assert_eq!(report.evicted, lowest);
        assert!(report.has_room());
        assert_eq!(report.state.rule_count(), 4);
    }

    #[tokio::test]
    async fn test_failed_deletion_moves_to_next_candidate() {
        let api = InMemoryElb::new();
        let listener = listener_with_rules(&api, 3).await;
        let state = ListenerState::fetch(&api, &listener).await.unwrap();
        let first = state.existing_rules[0].rule_arn.clone();
        let second = state.existing_rules[1].rule_arn.clone();
        api.fail_deletion_of(&first);

        let report = CapacityGovernor::new(4).ensure_capacity(&api, state).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, first);
        assert_eq!(report.evicted, vec![second]);
        assert!(report.has_room());
    }

    #[tokio::test]
    async fn test_exhausted_eviction_reports_no_room() {
        let api = InMemoryElb::new();
        let listener = listener_with_rules(&api, 2).await;
        let state = ListenerState::fetch(&api, &listener).await.unwrap();
        for rule in &state.existing_rules {
            api.fail_deletion_of(&rule.rule_arn);
        }

        let report = CapacityGovernor::new(2).ensure_capacity(&api, state).await.unwrap();
        assert!(report.evicted.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(!report.has_room());
    }
}
