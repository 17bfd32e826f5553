//! Load balancer listener rule reconciliation library.

pub mod config;
pub mod error;
pub mod export;
pub mod load_balancer;
pub mod observability;
pub mod rules;
pub mod sync;
pub mod tabular;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use load_balancer::{ElbApi, HttpElbClient, InMemoryElb};
pub use sync::SyncReport;
