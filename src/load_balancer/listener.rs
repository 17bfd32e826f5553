//! Point-in-time snapshot of a listener's rules.

use crate::load_balancer::types::{ApiResult, Listener, RulePriority};
use crate::load_balancer::ElbApi;

/// A rule as seen by priority allocation and eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRule {
    pub priority: RulePriority,
    pub rule_arn: String,
}

/// Rules currently on one listener. Valid until the next mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerState {
    pub listener_arn: String,
    pub port: u16,
    pub existing_rules: Vec<ExistingRule>,
}

impl ListenerState {
    /// Fetch a fresh snapshot.
    pub async fn fetch(api: &dyn ElbApi, listener: &Listener) -> ApiResult<Self> {
        let rules = api.list_rules(&listener.listener_arn).await?;
        Ok(Self {
            listener_arn: listener.listener_arn.clone(),
            port: listener.port,
            existing_rules: rules
                .into_iter()
                .map(|r| ExistingRule {
                    priority: r.priority,
                    rule_arn: r.rule_arn,
                })
                .collect(),
        })
    }

    /// Re-fetch in place.
    pub async fn refresh(&mut self, api: &dyn ElbApi) -> ApiResult<()> {
        let listener = Listener {
            listener_arn: self.listener_arn.clone(),
            port: self.port,
            protocol: None,
        };
        *self = Self::fetch(api, &listener).await?;
        Ok(())
    }

    /// Number of rules, the default rule included.
    pub fn rule_count(&self) -> usize {
        self.existing_rules.len()
    }
}
