//! Load balancer control-plane subsystem.
//!
//! # Data Flow
//! ```text
//! ElbApi (trait: list listeners/rules/target groups, create/delete rule)
//!     ├── client.rs (HttpElbClient: reqwest against the control-plane gateway)
//!     └── memory.rs (InMemoryElb: dry runs and tests)
//!
//! Per reconciliation step:
//!     listener.rs (fresh ListenerState snapshot)
//!     → capacity.rs (evict lowest priorities until under the ceiling)
//!     → priority.rs (max numbered priority + 1)
//!     → targets.rs (target group name → ARN)
//! ```
//!
//! # Design Decisions
//! - The API handle is passed explicitly; there is no process-wide client
//! - State is re-fetched after every mutation instead of cached
//! - List-then-create is not atomic; a concurrent writer can collide on a
//!   priority and the resulting rejection is reported, not retried

use async_trait::async_trait;

pub mod capacity;
pub mod client;
pub mod listener;
pub mod memory;
pub mod priority;
pub mod targets;
pub mod types;

pub use capacity::{CapacityGovernor, CapacityReport};
pub use client::HttpElbClient;
pub use listener::{ExistingRule, ListenerState};
pub use memory::InMemoryElb;
pub use priority::next_priority;
pub use targets::{ResolveTarget, TargetGroupIndex};
pub use types::{ApiError, ApiResult, Listener, Rule, RuleAction, TargetGroup};

use types::CreateRuleRequest;

/// The cloud control-plane capability consumed by the reconciler.
#[async_trait]
pub trait ElbApi: Send + Sync {
    /// List the listeners of a load balancer.
    async fn list_listeners(&self, load_balancer_arn: &str) -> ApiResult<Vec<Listener>>;

    /// List every rule of a listener, including its default rule.
    async fn list_rules(&self, listener_arn: &str) -> ApiResult<Vec<Rule>>;

    /// Create a rule; the control plane rejects duplicate priorities.
    async fn create_rule(&self, listener_arn: &str, request: &CreateRuleRequest) -> ApiResult<Rule>;

    /// Delete a rule by ARN.
    async fn delete_rule(&self, rule_arn: &str) -> ApiResult<()>;

    /// List all target groups visible to the caller.
    async fn list_target_groups(&self) -> ApiResult<Vec<TargetGroup>>;
}
