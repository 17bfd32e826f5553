//! Target group name resolution.

use std::collections::HashMap;

use crate::error::{ResourceKind, SyncError};
use crate::load_balancer::types::{ApiResult, TargetGroup};
use crate::load_balancer::ElbApi;

/// Maps a human target group name to the provider identifier.
pub trait ResolveTarget: Send + Sync {
    fn resolve(&self, name: &str) -> Result<String, SyncError>;
}

/// Name ⇄ ARN index built once per run from a full listing.
#[derive(Debug, Clone, Default)]
pub struct TargetGroupIndex {
    by_name: HashMap<String, String>,
    by_arn: HashMap<String, String>,
}

impl TargetGroupIndex {
    pub fn from_groups(groups: impl IntoIterator<Item = TargetGroup>) -> Self {
        let mut index = Self::default();
        for group in groups {
            if let Some(previous) = index.by_name.get(&group.name) {
                tracing::warn!(name = %group.name, kept = %previous, "Duplicate target group name");
                continue;
            }
            index.by_arn.insert(group.target_group_arn.clone(), group.name.clone());
            index.by_name.insert(group.name, group.target_group_arn);
        }
        index
    }

    /// List every target group and index it.
    pub async fn load(api: &dyn ElbApi) -> ApiResult<Self> {
        let groups = api.list_target_groups().await?;
        let index = Self::from_groups(groups);
        tracing::info!(target_groups = index.len(), "Target group index built");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Reverse lookup used by export.
    pub fn name_of(&self, target_group_arn: &str) -> Option<&str> {
        self.by_arn.get(target_group_arn).map(String::as_str)
    }
}

impl ResolveTarget for TargetGroupIndex {
    fn resolve(&self, name: &str) -> Result<String, SyncError> {
        self.by_name.get(name).cloned().ok_or_else(|| SyncError::NotFound {
            kind: ResourceKind::TargetGroup,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> TargetGroupIndex {
        TargetGroupIndex::from_groups(vec![
            TargetGroup {
                name: "web".into(),
                target_group_arn: "arn:tg/web".into(),
            },
            TargetGroup {
                name: "api".into(),
                target_group_arn: "arn:tg/api".into(),
            },
        ])
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let index = index();
        assert_eq!(index.resolve("web").unwrap(), "arn:tg/web");
        assert!(matches!(
            index.resolve("missing"),
            Err(SyncError::NotFound { kind: ResourceKind::TargetGroup, .. })
        ));
    }

    #[test]
    fn test_reverse_lookup() {
        let index = index();
        assert_eq!(index.name_of("arn:tg/api"), Some("api"));
        assert_eq!(index.name_of("arn:tg/other"), None);
    }
}
