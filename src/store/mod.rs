//! Persistence for users, subscriptions and scans.
//!
//! The [`ScanStore`] trait is the seam between the orchestrator and the
//! database. [`InMemoryScanStore`] serves tests and local development;
//! `PgScanStore` (feature `postgres`) is the production implementation.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod record;
mod traits;

pub use memory::InMemoryScanStore;
#[cfg(feature = "postgres")]
pub use postgres::PgScanStore;
pub use record::{NewScan, Plan, Scan, ScanId, Subscription, SubscriptionStatus, User, UserId};
pub use traits::{ArcScanStore, ScanStore};
