//! In-memory control plane.
//!
//! Backs dry runs (seeded from a live snapshot) and tests. Mirrors the
//! provider's behaviour where the reconciler depends on it: every listener
//! has an undeletable default rule, priorities are unique per listener and
//! within 1..=50000, and rules are listed numbered-ascending, default last.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::load_balancer::types::{
    ApiError, ApiResult, CreateRuleRequest, Listener, Rule, RuleAction, RulePriority, TargetGroup,
    MAX_PRIORITY,
};
use crate::load_balancer::ElbApi;
use crate::rules::condition::{Condition, ConditionField};

/// A recorded control-plane call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListListeners(String),
    ListRules(String),
    CreateRule { listener_arn: String, priority: u32 },
    DeleteRule(String),
    ListTargetGroups,
}

#[derive(Debug, Default)]
struct MemoryState {
    listeners: HashMap<String, Vec<Listener>>,
    rules: HashMap<String, Vec<Rule>>,
    target_groups: Vec<TargetGroup>,
    failing_deletions: HashSet<String>,
    rule_limit: Option<usize>,
    next_id: u64,
    calls: Vec<ApiCall>,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Control plane held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryElb {
    state: Mutex<MemoryState>,
}

impl InMemoryElb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("in-memory control plane mutex poisoned")
    }

    /// Copy listeners, rules and target groups from another control plane.
    pub async fn snapshot(source: &dyn ElbApi, load_balancer_arn: &str) -> ApiResult<Self> {
        let memory = Self::new();
        let listeners = source.list_listeners(load_balancer_arn).await?;
        let target_groups = source.list_target_groups().await?;
        let mut rules = HashMap::new();
        for listener in &listeners {
            rules.insert(
                listener.listener_arn.clone(),
                source.list_rules(&listener.listener_arn).await?,
            );
        }

        {
            let mut state = memory.lock();
            state.listeners.insert(load_balancer_arn.to_string(), listeners);
            state.rules = rules;
            state.target_groups = target_groups;
        }
        tracing::debug!(load_balancer = %load_balancer_arn, "Snapshot copied into memory");
        Ok(memory)
    }

    /// Add a listener with its default rule.
    pub fn add_listener(&self, load_balancer_arn: &str, port: u16) -> Listener {
        let mut state = self.lock();
        let id = state.next_id();
        let listener = Listener {
            listener_arn: format!("{}/listener/{}", load_balancer_arn, id),
            port,
            protocol: Some(if port == 443 { "HTTPS" } else { "HTTP" }.to_string()),
        };
        let default_rule = Rule {
            rule_arn: format!("{}/rule/default", listener.listener_arn),
            priority: RulePriority::Label("default".to_string()),
            conditions: Vec::new(),
            actions: Vec::new(),
            is_default: true,
        };
        state
            .listeners
            .entry(load_balancer_arn.to_string())
            .or_default()
            .push(listener.clone());
        state.rules.insert(listener.listener_arn.clone(), vec![default_rule]);
        listener
    }

    /// Register a target group and return its ARN.
    pub fn add_target_group(&self, name: &str) -> String {
        let mut state = self.lock();
        let id = state.next_id();
        let target_group_arn = format!("arn:targetgroup/{}/{}", name, id);
        state.target_groups.push(TargetGroup {
            name: name.to_string(),
            target_group_arn: target_group_arn.clone(),
        });
        target_group_arn
    }

    /// Insert a forward rule matching one host, bypassing validation.
    pub fn seed_rule(&self, listener_arn: &str, priority: u32, host: &str, target_group_arn: &str) -> String {
        self.insert_rule(
            listener_arn,
            priority,
            vec![Condition::new(ConditionField::HostHeader, host)],
            vec![RuleAction::forward(target_group_arn)],
        )
    }

    /// Insert an arbitrary rule, bypassing validation.
    pub fn insert_rule(
        &self,
        listener_arn: &str,
        priority: u32,
        conditions: Vec<Condition>,
        actions: Vec<RuleAction>,
    ) -> String {
        let mut state = self.lock();
        let id = state.next_id();
        let rule_arn = format!("{}/rule/{}", listener_arn, id);
        state.rules.entry(listener_arn.to_string()).or_default().push(Rule {
            rule_arn: rule_arn.clone(),
            priority: RulePriority::Numbered(priority),
            conditions,
            actions,
            is_default: false,
        });
        rule_arn
    }

    /// Make every future deletion of `rule_arn` fail.
    pub fn fail_deletion_of(&self, rule_arn: &str) {
        self.lock().failing_deletions.insert(rule_arn.to_string());
    }

    /// Reject creations once a listener holds `limit` rules.
    pub fn set_rule_limit(&self, limit: usize) {
        self.lock().rule_limit = Some(limit);
    }

    /// Current rules of a listener, in listing order.
    pub fn rules(&self, listener_arn: &str) -> Vec<Rule> {
        let state = self.lock();
        sorted_rules(state.rules.get(listener_arn).map(Vec::as_slice).unwrap_or_default())
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Mutating calls only.
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::CreateRule { .. } | ApiCall::DeleteRule(_)))
            .collect()
    }
}

fn sorted_rules(rules: &[Rule]) -> Vec<Rule> {
    let mut rules = rules.to_vec();
    rules.sort_by_key(|r| match r.priority {
        RulePriority::Numbered(n) => (0, n),
        RulePriority::Label(_) => (1, 0),
    });
    rules
}

#[async_trait]
impl ElbApi for InMemoryElb {
    async fn list_listeners(&self, load_balancer_arn: &str) -> ApiResult<Vec<Listener>> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListListeners(load_balancer_arn.to_string()));
        state
            .listeners
            .get(load_balancer_arn)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("load balancer {}", load_balancer_arn)))
    }

    async fn list_rules(&self, listener_arn: &str) -> ApiResult<Vec<Rule>> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListRules(listener_arn.to_string()));
        state
            .rules
            .get(listener_arn)
            .map(|rules| sorted_rules(rules))
            .ok_or_else(|| ApiError::NotFound(format!("listener {}", listener_arn)))
    }

    async fn create_rule(&self, listener_arn: &str, request: &CreateRuleRequest) -> ApiResult<Rule> {
        let mut state = self.lock();
        state.calls.push(ApiCall::CreateRule {
            listener_arn: listener_arn.to_string(),
            priority: request.priority,
        });

        if request.priority == 0 || request.priority > MAX_PRIORITY {
            return Err(ApiError::Rejected(format!(
                "priority {} outside 1..={}",
                request.priority, MAX_PRIORITY
            )));
        }
        if request.conditions.is_empty() {
            return Err(ApiError::Rejected("a rule needs at least one condition".to_string()));
        }
        if request.actions.is_empty() {
            return Err(ApiError::Rejected("a rule needs at least one action".to_string()));
        }

        let rule_limit = state.rule_limit;
        let existing = state
            .rules
            .get(listener_arn)
            .ok_or_else(|| ApiError::NotFound(format!("listener {}", listener_arn)))?;
        if existing.iter().any(|r| r.priority == RulePriority::Numbered(request.priority)) {
            return Err(ApiError::Rejected(format!("PriorityInUse: {}", request.priority)));
        }
        if rule_limit.is_some_and(|limit| existing.len() >= limit) {
            return Err(ApiError::Rejected("TooManyRules".to_string()));
        }

        let id = state.next_id();
        let rule = Rule {
            rule_arn: format!("{}/rule/{}", listener_arn, id),
            priority: RulePriority::Numbered(request.priority),
            conditions: request.conditions.clone(),
            actions: request.actions.clone(),
            is_default: false,
        };
        state
            .rules
            .entry(listener_arn.to_string())
            .or_default()
            .push(rule.clone());
        Ok(rule)
    }

    async fn delete_rule(&self, rule_arn: &str) -> ApiResult<()> {
        let mut state = self.lock();
        state.calls.push(ApiCall::DeleteRule(rule_arn.to_string()));

        if state.failing_deletions.contains(rule_arn) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("injected failure deleting {}", rule_arn),
            });
        }

        for rules in state.rules.values_mut() {
            if let Some(pos) = rules.iter().position(|r| r.rule_arn == rule_arn) {
                if rules[pos].is_default {
                    return Err(ApiError::Rejected("cannot delete a default rule".to_string()));
                }
                rules.remove(pos);
                return Ok(());
            }
        }
        Err(ApiError::NotFound(format!("rule {}", rule_arn)))
    }

    async fn list_target_groups(&self) -> ApiResult<Vec<TargetGroup>> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListTargetGroups);
        Ok(state.target_groups.clone())
    }
}
