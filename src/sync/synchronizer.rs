//! Rule synchronizer.
//!
//! Drives each rule spec, one at a time, through
//! `VALIDATE (incl. target lookup) → RESOLVE_LISTENER → ENSURE_CAPACITY →
//! ALLOCATE_PRIORITY → BUILD_ACTIONS → SUBMIT`. Every step returns a value;
//! a failing spec is recorded and the next one starts. Nothing is rolled back.

use crate::error::{ResourceKind, SyncError};
use crate::load_balancer::capacity::CapacityGovernor;
use crate::load_balancer::listener::ListenerState;
use crate::load_balancer::priority::next_priority;
use crate::load_balancer::targets::ResolveTarget;
use crate::load_balancer::types::{CreateRuleRequest, Listener, RedirectConfig};
use crate::load_balancer::ElbApi;
use crate::rules::spec::RuleSpec;
use crate::sync::actions::{build_actions, validate};
use crate::sync::pacing::Pacer;
use crate::sync::report::{CreatedRule, FailedRule, OverCapacity, SkippedRule, SyncReport};

/// Creates rules for grouped specs against one load balancer.
pub struct Synchronizer<'a> {
    api: &'a dyn ElbApi,
    resolver: &'a dyn ResolveTarget,
    load_balancer_arn: String,
    governor: CapacityGovernor,
    redirect: RedirectConfig,
    pacer: Pacer,
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        api: &'a dyn ElbApi,
        resolver: &'a dyn ResolveTarget,
        load_balancer_arn: impl Into<String>,
        governor: CapacityGovernor,
        redirect: RedirectConfig,
        pacer: Pacer,
    ) -> Self {
        Self {
            api,
            resolver,
            load_balancer_arn: load_balancer_arn.into(),
            governor,
            redirect,
            pacer,
        }
    }

    /// Process every spec in order, collecting outcomes into `report`.
    pub async fn run(&mut self, specs: Vec<RuleSpec>, report: &mut SyncReport) {
        for mut spec in specs {
            match self.sync_one(&mut spec, report).await {
                Ok(created) => {
                    tracing::info!(
                        rule_arn = %created.rule_arn,
                        priority = created.priority,
                        listener = %created.listener_arn,
                        "Rule created successfully"
                    );
                    report.created.push(created);
                    self.pacer.after_success().await;
                }
                Err(error @ (SyncError::Validation(_) | SyncError::NotFound { .. })) => {
                    tracing::warn!(key = %spec.key, error = %error, "Skipping rule");
                    report.skipped.push(SkippedRule {
                        key: spec.key.clone(),
                        reason: error.to_string(),
                    });
                }
                Err(error @ SyncError::Submission { .. }) => {
                    tracing::error!(key = %spec.key, priority = spec.priority, error = %error, "Failed to create rule");
                    report.failed.push(FailedRule {
                        key: spec.key.clone(),
                        priority: spec.priority,
                        reason: error.to_string(),
                    });
                    self.pacer.after_failure().await;
                }
                Err(other) => {
                    tracing::error!(key = %spec.key, error = %other, "Rule processing failed");
                    report.failed.push(FailedRule {
                        key: spec.key.clone(),
                        priority: spec.priority,
                        reason: other.to_string(),
                    });
                }
            }
        }
    }

    /// Run one spec to completion. The allocated priority is written to
    /// `spec.priority` before submission.
    async fn sync_one(&self, spec: &mut RuleSpec, report: &mut SyncReport) -> Result<CreatedRule, SyncError> {
        let target_group_arn = validate(spec, self.resolver)?;

        let listener = self.resolve_listener(spec.key.listener_port).await?;

        let state = ListenerState::fetch(self.api, &listener).await?;
        let capacity = self.governor.ensure_capacity(self.api, state).await?;
        report.evicted.extend(capacity.evicted.iter().cloned());
        report.failed_evictions.extend(capacity.failed.iter().cloned());
        if !capacity.has_room() {
            let exceeded = SyncError::CapacityExceeded {
                listener: listener.listener_arn.clone(),
                count: capacity.state.rule_count(),
                max: capacity.max_rules,
            };
            tracing::warn!(key = %spec.key, error = %exceeded, "Submitting anyway");
            report.over_capacity.push(OverCapacity {
                key: spec.key.clone(),
                reason: exceeded.to_string(),
            });
        }

        // The governor's snapshot is fresh as of its last deletion.
        let priority = next_priority(&capacity.state);
        spec.priority = Some(priority);
        tracing::info!(priority, port = listener.port, "Assigned priority");

        let actions = build_actions(spec, target_group_arn.as_deref(), &self.redirect)?;

        let request = CreateRuleRequest {
            priority,
            conditions: spec.conditions.clone(),
            actions,
        };
        let rule = self
            .api
            .create_rule(&listener.listener_arn, &request)
            .await
            .map_err(|e| SyncError::Submission {
                listener: listener.listener_arn.clone(),
                priority,
                message: e.to_string(),
            })?;

        Ok(CreatedRule {
            key: spec.key.clone(),
            listener_arn: listener.listener_arn,
            priority,
            rule_arn: rule.rule_arn,
        })
    }

    /// Map a port to a listener using a fresh listing.
    async fn resolve_listener(&self, port: u16) -> Result<Listener, SyncError> {
        let listeners = self.api.list_listeners(&self.load_balancer_arn).await?;
        listeners
            .into_iter()
            .find(|l| l.port == port)
            .ok_or_else(|| SyncError::NotFound {
                kind: ResourceKind::Listener,
                name: format!("port {}", port),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::default_redirect;
    use crate::load_balancer::memory::{ApiCall, InMemoryElb};
    use crate::load_balancer::targets::TargetGroupIndex;
    use crate::load_balancer::types::ActionType;
    use crate::rules::condition::{Condition, ConditionField};
    use crate::rules::spec::GroupKey;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        inner: TargetGroupIndex,
        lookups: AtomicUsize,
    }

    impl ResolveTarget for CountingResolver {
        fn resolve(&self, name: &str) -> Result<String, SyncError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(name)
        }
    }

    fn spec(port: u16, action_type: ActionType, target: Option<&str>, path: &str) -> RuleSpec {
        let mut spec = RuleSpec::new(GroupKey {
            listener_port: port,
            action_type,
            target_group_name: target.map(String::from),
        });
        spec.add_condition(Condition::new(ConditionField::PathPattern, path));
        spec
    }

    async fn run(api: &InMemoryElb, resolver: &dyn ResolveTarget, max_rules: usize, specs: Vec<RuleSpec>) -> SyncReport {
        let mut report = SyncReport::default();
        let mut sync = Synchronizer::new(
            api,
            resolver,
            "arn:lb",
            CapacityGovernor::new(max_rules),
            default_redirect(),
            Pacer::disabled(),
        );
        sync.run(specs, &mut report).await;
        report
    }

    #[tokio::test]
    async fn test_redirect_never_resolves_target() {
        let api = InMemoryElb::new();
        api.add_listener("arn:lb", 80);
        let resolver = CountingResolver {
            inner: TargetGroupIndex::default(),
            lookups: AtomicUsize::new(0),
        };

        let report = run(&api, &resolver, 1000, vec![spec(80, ActionType::Redirect, None, "/old/*")]).await;
        assert_eq!(report.created.len(), 1);
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sequential_priorities() {
        let api = InMemoryElb::new();
        let listener = api.add_listener("arn:lb", 443);
        let tg = api.add_target_group("web");
        api.seed_rule(&listener.listener_arn, 7, "seed.com", &tg);
        let index = TargetGroupIndex::load(&api).await.unwrap();

        let specs = (0..3)
            .map(|i| spec(443, ActionType::Forward, Some("web"), &format!("/p{}/*", i)))
            .collect();
        let report = run(&api, &index, 1000, specs).await;
        let priorities: Vec<u32> = report.created.iter().map(|c| c.priority).collect();
        assert_eq!(priorities, vec![8, 9, 10]);
    }

    #[tokio::test]
    async fn test_unknown_port_skips_only_that_spec() {
        let api = InMemoryElb::new();
        api.add_listener("arn:lb", 80);

        let specs = vec![
            spec(8080, ActionType::Redirect, None, "/a"),
            spec(80, ActionType::Redirect, None, "/b"),
        ];
        let report = run(&api, &TargetGroupIndex::default(), 1000, specs).await;
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key.listener_port, 8080);
        assert_eq!(report.created.len(), 1);
    }

    #[tokio::test]
    async fn test_submission_failure_is_reported_and_run_continues() {
        let api = InMemoryElb::new();
        api.add_listener("arn:lb", 80);
        // The provider refuses a third rule; the governor's ceiling stays out of reach.
        api.set_rule_limit(2);

        let specs = vec![
            spec(80, ActionType::Redirect, None, "/a"),
            spec(80, ActionType::Redirect, None, "/b"),
            spec(80, ActionType::Redirect, None, "/c"),
        ];
        let report = run(&api, &TargetGroupIndex::default(), 1000, specs).await;
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].priority, Some(2));
        assert!(report.failed[0].reason.contains("TooManyRules"));
    }

    #[tokio::test]
    async fn test_capacity_eviction_before_create() {
        let api = InMemoryElb::new();
        let listener = api.add_listener("arn:lb", 443);
        let tg = api.add_target_group("web");
        let oldest = api.seed_rule(&listener.listener_arn, 1, "a.com", &tg);
        api.seed_rule(&listener.listener_arn, 2, "b.com", &tg);
        let index = TargetGroupIndex::load(&api).await.unwrap();

        // Two numbered rules plus default already meet a ceiling of 3.
        let report = run(&api, &index, 3, vec![spec(443, ActionType::Forward, Some("web"), "/x")]).await;
        assert_eq!(report.evicted, vec![oldest.clone()]);
        assert_eq!(report.created[0].priority, 3);
        assert!(api.mutations().contains(&ApiCall::DeleteRule(oldest)));
        assert_eq!(api.rules(&listener.listener_arn).len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_spec_makes_no_calls() {
        let api = InMemoryElb::new();
        api.add_listener("arn:lb", 80);

        let report = run(&api, &TargetGroupIndex::default(), 1000, vec![spec(80, ActionType::Forward, None, "/a")]).await;
        assert_eq!(report.skipped.len(), 1);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_evictions_are_reported_and_create_still_attempted() {
        let api = InMemoryElb::new();
        let listener = api.add_listener("arn:lb", 80);
        let tg = api.add_target_group("web");
        let first = api.seed_rule(&listener.listener_arn, 1, "a.com", &tg);
        let second = api.seed_rule(&listener.listener_arn, 2, "b.com", &tg);
        api.fail_deletion_of(&first);
        api.fail_deletion_of(&second);

        let report = run(&api, &TargetGroupIndex::default(), 3, vec![spec(80, ActionType::Redirect, None, "/a")]).await;

        let refused: Vec<&str> = report.failed_evictions.iter().map(|(arn, _)| arn.as_str()).collect();
        assert_eq!(refused, vec![first.as_str(), second.as_str()]);
        assert!(report.evicted.is_empty());
        assert_eq!(report.over_capacity.len(), 1);
        assert!(report.over_capacity[0].reason.contains("ceiling is 3"));
        assert!(api.mutations().contains(&ApiCall::CreateRule {
            listener_arn: listener.listener_arn.clone(),
            priority: 3
        }));
        assert_eq!(report.created.len(), 1);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_unknown_target_never_evicts() {
        let api = InMemoryElb::new();
        let listener = api.add_listener("arn:lb", 443);
        let tg = api.add_target_group("web");
        api.seed_rule(&listener.listener_arn, 1, "a.com", &tg);
        let index = TargetGroupIndex::load(&api).await.unwrap();

        let report = run(&api, &index, 2, vec![spec(443, ActionType::Forward, Some("gone"), "/x")]).await;
        assert_eq!(report.skipped.len(), 1);
        assert!(report.evicted.is_empty());
        assert!(api.mutations().is_empty());
        assert_eq!(api.rules(&listener.listener_arn).len(), 2);
    }

    #[tokio::test]
    async fn test_allocated_priority_is_written_to_spec() {
        let api = InMemoryElb::new();
        let listener = api.add_listener("arn:lb", 80);
        let tg = api.add_target_group("web");
        api.seed_rule(&listener.listener_arn, 4, "a.com", &tg);
        let index = TargetGroupIndex::default();
        let sync = Synchronizer::new(
            &api,
            &index,
            "arn:lb",
            CapacityGovernor::default(),
            default_redirect(),
            Pacer::disabled(),
        );

        let mut rule = spec(80, ActionType::Redirect, None, "/a");
        assert_eq!(rule.priority, None);
        let mut report = SyncReport::default();
        let created = sync.sync_one(&mut rule, &mut report).await.unwrap();
        assert_eq!(rule.priority, Some(5));
        assert_eq!(created.priority, 5);
    }
}
