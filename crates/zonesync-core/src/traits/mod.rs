//! Core traits for zonesync
//!
//! - [`DnsApiClient`]: Raw access to a provider's remote DNS API
//! - [`RecordStrategy`]: Per-resource-kind parsing, serialization and lifecycle

pub mod api_client;
pub mod record_strategy;

pub use api_client::{DnsApiClient, DnsApiClientFactory};
pub use record_strategy::RecordStrategy;
