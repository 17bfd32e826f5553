//! End-to-end apply runs against the in-memory control plane.

use lb_rule_sync::load_balancer::memory::ApiCall;
use lb_rule_sync::load_balancer::types::{ActionType, RulePriority};
use lb_rule_sync::rules::{ConditionField, MergePolicy};
use lb_rule_sync::{sync, SyncError};

mod common;

#[tokio::test]
async fn test_host_and_path_rows_create_one_rule() {
    let fx = common::fixture();
    let table = common::table(&[
        "443,,,forward,,web,,host-header,a.com",
        "443,,,forward,,web,,path-pattern,/api/*",
    ]);

    let report = sync::apply(&fx.api, &common::config(), table).await.unwrap();
    assert_eq!(report.created.len(), 1);
    assert!(report.is_clean());

    let rules = fx.api.rules(&fx.https.listener_arn);
    let created = &rules[0];
    assert_eq!(created.priority, RulePriority::Numbered(1));
    assert_eq!(created.conditions.len(), 2);
    assert_eq!(created.conditions[0].field, ConditionField::HostHeader);
    assert_eq!(created.conditions[1].field, ConditionField::PathPattern);
    assert_eq!(created.actions[0].target_group_arn.as_deref(), Some(fx.web_arn.as_str()));
}

#[tokio::test]
async fn test_unknown_target_skips_only_its_group() {
    let fx = common::fixture();
    let table = common::table(&[
        "443,,,forward,,missing,,path-pattern,/lost/*",
        "443,,,forward,,api,,path-pattern,/api/*",
    ]);

    let report = sync::apply(&fx.api, &common::config(), table).await.unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].key.target_group_name.as_deref(), Some("missing"));
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].key.target_group_name.as_deref(), Some("api"));

    let rules = fx.api.rules(&fx.https.listener_arn);
    assert_eq!(rules[0].actions[0].target_group_arn.as_deref(), Some(fx.api_arn.as_str()));
}

#[tokio::test]
async fn test_invalid_rows_are_reported_not_applied() {
    let fx = common::fixture();
    let table = common::table(&[
        "443,default,arn:x,forward,,web,,N/A,N/A",
        "443,,,forward,,web,,cookie,session=1",
        "443,,,forward",
        "80,,,redirect,,,,path-pattern,/old/*",
    ]);

    let report = sync::apply(&fx.api, &common::config(), table).await.unwrap();
    assert_eq!(report.rejected_rows.len(), 3);
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].key.action_type, ActionType::Redirect);

    let created = fx.api.mutations();
    assert_eq!(
        created,
        vec![ApiCall::CreateRule {
            listener_arn: fx.http.listener_arn.clone(),
            priority: 1
        }]
    );
}

#[tokio::test]
async fn test_priorities_continue_after_existing_rules() {
    let fx = common::fixture();
    fx.api.seed_rule(&fx.https.listener_arn, 41, "seed.com", &fx.web_arn);
    let table = common::table(&[
        "443,,,forward,,web,,host-header,a.com",
        "443,,,forward,,api,,host-header,b.com",
        "443,,,forward,,web,,source-ip,10.0.0.0/8",
    ]);

    let report = sync::apply(&fx.api, &common::config(), table).await.unwrap();
    let priorities: Vec<u32> = report.created.iter().map(|c| c.priority).collect();
    assert_eq!(priorities, vec![42, 43, 44]);
}

#[tokio::test]
async fn test_merge_all_policy_combines_other_fields() {
    let fx = common::fixture();
    let mut config = common::config();
    config.reconcile.merge_policy = MergePolicy::All;
    let table = common::table(&[
        "443,,,forward,,web,,host-header,a.com",
        "443,,,forward,,web,,http-request-method,POST",
    ]);

    let report = sync::apply(&fx.api, &config, table).await.unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(fx.api.rules(&fx.https.listener_arn)[0].conditions.len(), 2);
}

#[tokio::test]
async fn test_capacity_ceiling_evicts_oldest() {
    let fx = common::fixture();
    let oldest = fx.api.seed_rule(&fx.http.listener_arn, 1, "a.com", &fx.web_arn);
    fx.api.seed_rule(&fx.http.listener_arn, 2, "b.com", &fx.web_arn);
    let mut config = common::config();
    config.reconcile.max_rules = 3;

    let table = common::table(&["80,,,forward,,web,,host-header,c.com"]);
    let report = sync::apply(&fx.api, &config, table).await.unwrap();

    assert_eq!(report.evicted, vec![oldest]);
    assert_eq!(report.created[0].priority, 3);
    assert_eq!(fx.api.rules(&fx.http.listener_arn).len(), 3);
}

#[tokio::test]
async fn test_load_balancer_without_listeners_is_fatal() {
    let fx = common::fixture();
    let mut config = common::config();
    config.load_balancer.arn = "arn:aws:elasticloadbalancing:ap-south-1:1:loadbalancer/app/none/2".into();
    let table = common::table(&["80,,,redirect,,,,path-pattern,/old/*"]);

    let result = sync::apply(&fx.api, &config, table).await;
    assert!(matches!(result, Err(SyncError::Fatal(_))));
    assert!(fx.api.mutations().is_empty());
}
