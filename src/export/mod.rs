//! Export direction: live rules → flat rows.
//!
//! # Data Flow
//! ```text
//! ElbApi (listeners → rules per listener, target groups)
//!     → ListenerRules[] snapshot
//!     → projector.rs (flatten, host/path merge-back)
//!     → tabular::writer (CSV with fixed header)
//! ```

pub mod projector;

pub use projector::{ExportProjector, ExportRow, ListenerRules};

use crate::error::{ResourceKind, SyncError, SyncResult};
use crate::load_balancer::targets::TargetGroupIndex;
use crate::load_balancer::ElbApi;

/// Read the live rules of a load balancer, optionally for one port only.
pub async fn snapshot(
    api: &dyn ElbApi,
    load_balancer_arn: &str,
    port: Option<u16>,
) -> SyncResult<Vec<ListenerRules>> {
    let listeners = api.list_listeners(load_balancer_arn).await?;
    let mut selected = Vec::new();
    for listener in listeners {
        if port.is_some_and(|p| p != listener.port) {
            continue;
        }
        let rules = api.list_rules(&listener.listener_arn).await?;
        tracing::debug!(listener = %listener.listener_arn, rules = rules.len(), "Listener rules fetched");
        selected.push(ListenerRules { listener, rules });
    }

    if let (Some(p), true) = (port, selected.is_empty()) {
        return Err(SyncError::NotFound {
            kind: ResourceKind::Listener,
            name: format!("port {}", p),
        });
    }
    Ok(selected)
}

/// Snapshot and project a load balancer's rules.
pub async fn export_rows(
    api: &dyn ElbApi,
    load_balancer_arn: &str,
    port: Option<u16>,
    not_applicable: &str,
) -> SyncResult<Vec<ExportRow>> {
    let listeners = snapshot(api, load_balancer_arn, port).await?;
    let index = TargetGroupIndex::load(api).await?;
    let rows = ExportProjector::new(&index, not_applicable).project(&listeners);
    tracing::info!(
        listeners = listeners.len(),
        rows = rows.len(),
        "Rules projected for export"
    );
    Ok(rows)
}
