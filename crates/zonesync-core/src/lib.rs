// # zonesync-core
//
// Reconciliation core for declarative DNS zone records.
//
// ## Architecture Overview
//
// - **DnsApiClient**: Trait for the provider's remote API (one call per record)
// - **ZoneCache / CachedClient**: TTL cache of whole-zone listings
// - **wire**: Decoding of provider responses into records and errors
// - **engine**: Canonical keys and the multiset diff between record sets
// - **RecordStrategy**: Per-kind expand/collapse plus the shared lifecycle
// - **ResourceManager**: Uniform create/read/update/delete/import dispatch
// - **ClientRegistry**: Plugin-based registry for provider clients
//
// ## Data Flow
//
// ```text
// declared data ──expand──► records ─┐
//                                    ├─diff──► removals, additions ──► DnsApiClient
// zone listing ──select──► records ──┘
//        ▲
//        └── ZoneCache (invalidated after every successful write)
// ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod record;
pub mod registry;
pub mod resource;
pub mod strategy;
pub mod traits;
pub mod wire;

// Re-export core types for convenience
pub use cache::{CachedClient, ZoneCache};
pub use config::{CacheConfig, ProviderConfig, ResourceConfig, ZonesyncConfig};
pub use engine::{diff, Diff};
pub use error::{Error, Result};
pub use manager::{ReconcileMode, ReconcileOutcome, Reconciliation, ResourceManager};
pub use record::{Record, RecordType};
pub use registry::{ClientRegistry, StrategyRegistry};
pub use resource::{RecordData, ResourceId, ResourceKind, ResourceState};
pub use traits::{DnsApiClient, DnsApiClientFactory, RecordStrategy};
pub use wire::{check_response, ZoneSnapshot};
