//! Shared fixtures for integration tests.

use lb_rule_sync::config::SyncConfig;
use lb_rule_sync::load_balancer::types::Listener;
use lb_rule_sync::tabular::{reader, ColumnMap, TableRead};
use lb_rule_sync::InMemoryElb;

pub const LB_ARN: &str = "arn:aws:elasticloadbalancing:ap-south-1:1:loadbalancer/app/web/1";

pub const HEADER: &str = "Listener Port,Rule Priority,Rule ARN,Action Type,Target Group ARN,Target Group Name,Redirect URL,Condition Field,Condition Value";

/// A control plane with listeners on 80 and 443 and two target groups.
pub struct Fixture {
    pub api: InMemoryElb,
    pub http: Listener,
    pub https: Listener,
    pub web_arn: String,
    pub api_arn: String,
}

pub fn fixture() -> Fixture {
    let api = InMemoryElb::new();
    let http = api.add_listener(LB_ARN, 80);
    let https = api.add_listener(LB_ARN, 443);
    let web_arn = api.add_target_group("web");
    let api_arn = api.add_target_group("api");
    Fixture {
        api,
        http,
        https,
        web_arn,
        api_arn,
    }
}

/// Config pointing at the fixture load balancer, without pauses.
#[allow(dead_code)]
pub fn config() -> SyncConfig {
    let mut config = SyncConfig::default();
    config.load_balancer.arn = LB_ARN.to_string();
    config.reconcile.pacing.pause_ms = 0;
    config
}

/// Parse CSV data rows (header added) in the export layout.
#[allow(dead_code)]
pub fn table(rows: &[&str]) -> TableRead {
    let mut csv = String::from(HEADER);
    for row in rows {
        csv.push('\n');
        csv.push_str(row);
    }
    csv.push('\n');
    reader::read_rows(csv.as_bytes(), &ColumnMap::export_layout()).unwrap()
}
