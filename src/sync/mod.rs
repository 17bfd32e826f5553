//! Apply direction: desired rows → rules on the load balancer.
//!
//! # Data Flow
//! ```text
//! TableRead (tabular import)
//!     → preflight: listeners exist, target group index loads (fatal otherwise)
//!     → rules::RuleGrouper (RuleSpec[] + rejected rows)
//!     → synchronizer.rs (per spec: validate + target lookup, capacity, priority, actions, submit)
//!     → pacing.rs (pause between submissions)
//!     → SyncReport
//! ```
//!
//! # Design Decisions
//! - Strictly sequential; each spec finishes before the next begins
//! - Only preflight failures abort, and they happen before any mutation
//! - A partially completed run keeps whatever it created

pub mod actions;
pub mod pacing;
pub mod report;
pub mod synchronizer;

pub use pacing::Pacer;
pub use report::SyncReport;
pub use synchronizer::Synchronizer;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::load_balancer::capacity::CapacityGovernor;
use crate::load_balancer::targets::TargetGroupIndex;
use crate::load_balancer::ElbApi;
use crate::rules::condition::ConditionNormalizer;
use crate::rules::grouping::RuleGrouper;
use crate::tabular::reader::TableRead;

/// Reconcile the rows of `table` onto the configured load balancer.
pub async fn apply(api: &dyn ElbApi, config: &SyncConfig, table: TableRead) -> SyncResult<SyncReport> {
    let load_balancer_arn = config.load_balancer.arn.as_str();

    let listeners = api.list_listeners(load_balancer_arn).await.map_err(|e| {
        SyncError::Fatal(format!("cannot list listeners of {}: {}", load_balancer_arn, e))
    })?;
    if listeners.is_empty() {
        return Err(SyncError::Fatal(format!(
            "load balancer {} has no listeners",
            load_balancer_arn
        )));
    }
    tracing::info!(
        load_balancer = %load_balancer_arn,
        ports = ?listeners.iter().map(|l| l.port).collect::<Vec<_>>(),
        "Listeners found"
    );

    let index = TargetGroupIndex::load(api)
        .await
        .map_err(|e| SyncError::Fatal(format!("cannot list target groups: {}", e)))?;

    let grouper = RuleGrouper::new(
        ConditionNormalizer::new(config.reconcile.not_applicable.clone()),
        config.reconcile.merge_policy,
    );
    let grouped = grouper.group(&table.rows);
    tracing::info!(
        rows = table.rows.len(),
        rules = grouped.specs.len(),
        policy = %grouper.policy(),
        "Rows grouped into rules"
    );

    let mut report = SyncReport {
        rejected_rows: table.rejected,
        ..SyncReport::default()
    };
    report.rejected_rows.extend(grouped.rejected);

    let mut synchronizer = Synchronizer::new(
        api,
        &index,
        load_balancer_arn,
        CapacityGovernor::new(config.reconcile.max_rules),
        config.reconcile.redirect.clone(),
        Pacer::new(config.reconcile.pacing.clone()),
    );
    synchronizer.run(grouped.specs, &mut report).await;

    report.log_summary();
    Ok(report)
}
