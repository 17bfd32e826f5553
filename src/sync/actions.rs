//! Action construction for a rule spec.

use crate::error::SyncError;
use crate::load_balancer::targets::ResolveTarget;
use crate::load_balancer::types::{ActionType, RedirectConfig, RuleAction};
use crate::rules::spec::RuleSpec;

/// Reject specs that cannot become a rule, before any remote call.
///
/// Forward targets are resolved here against the preloaded index, so a spec
/// naming an unknown target group never triggers an eviction. Returns the
/// target group ARN for forward specs and `None` for redirects.
pub fn validate(spec: &RuleSpec, resolver: &dyn ResolveTarget) -> Result<Option<String>, SyncError> {
    if spec.conditions.is_empty() {
        return Err(SyncError::Validation(format!("{} has no conditions", spec.key)));
    }
    match spec.key.action_type {
        ActionType::Redirect => Ok(None),
        ActionType::Forward => match spec.key.target_group_name.as_deref() {
            Some(name) => resolver.resolve(name).map(Some),
            None => Err(SyncError::Validation(format!(
                "{} forwards without a target group name",
                spec.key
            ))),
        },
        other => Err(SyncError::Validation(format!(
            "action '{}' cannot be built from a row",
            other
        ))),
    }
}

/// Build the action list from a validated spec.
pub fn build_actions(
    spec: &RuleSpec,
    target_group_arn: Option<&str>,
    redirect: &RedirectConfig,
) -> Result<Vec<RuleAction>, SyncError> {
    match (spec.key.action_type, target_group_arn) {
        (ActionType::Redirect, _) => Ok(vec![RuleAction::redirect(redirect.clone())]),
        (ActionType::Forward, Some(arn)) => Ok(vec![RuleAction::forward(arn)]),
        (ActionType::Forward, None) => Err(SyncError::Validation(format!(
            "{} forwards without a resolved target group",
            spec.key
        ))),
        (other, _) => Err(SyncError::Validation(format!(
            "action '{}' cannot be built from a row",
            other
        ))),
    }
}
