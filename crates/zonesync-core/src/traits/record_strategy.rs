// # Record Strategy Trait
//
// One implementation per resource kind. A strategy knows how to:
//
// - turn declared data into canonical records (`expand`)
// - pick its records out of a zone listing (`select`) and fold them back
//   into declared shape (`collapse`)
// - send a single record to the provider (`add` / `remove`)
//
// The lifecycle operations (`create`, `read`, `update`, `delete`, `import`)
// are built from those pieces in `crate::strategy::operations` and rarely
// need overriding. A kind that genuinely lacks a capability keeps the
// default "unsupported" implementation.
//
// ## Lifecycle
//
// ```text
// Absent ──create──► Present ──update*──► Present ──delete──► Absent
//                       ▲                    │
//                       └──── read (empty listing clears id) ────┘
// ```

use async_trait::async_trait;

use crate::cache::CachedClient;
use crate::engine::{diff, Diff};
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::resource::{RecordData, ResourceKind, ResourceState};
use crate::strategy::operations;
use crate::traits::DnsApiClient;
use crate::wire::ZoneSnapshot;

/// Per-kind reconciliation strategy
#[async_trait]
pub trait RecordStrategy: Send + Sync {
    /// Resource kind handled by this strategy
    fn kind(&self) -> ResourceKind;

    /// Check declared data before any network call
    ///
    /// # Returns
    ///
    /// - `Err(Error::Shape)`: data belongs to another kind
    /// - `Err(Error::Validation)`: data violates the kind's rules
    fn validate(&self, data: &RecordData) -> Result<()>;

    /// Flatten declared data into canonical records
    fn expand(&self, resource: &ResourceState) -> Result<Vec<Record>>;

    /// Fold observed records back into declared shape
    ///
    /// `records` is non-empty and sorted by canonical key.
    fn collapse(&self, resource: &ResourceState, records: &[Record]) -> Result<RecordData>;

    /// Record type this resource manages
    fn record_type(&self, _resource: &ResourceState) -> Result<RecordType> {
        self.kind()
            .record_type()
            .ok_or_else(|| Error::shape(format!("{} has no fixed record type", self.kind())))
    }

    /// This resource's records in a zone listing
    fn select(&self, snapshot: &ZoneSnapshot, resource: &ResourceState) -> Result<Vec<Record>> {
        snapshot.records(&resource.name, self.record_type(resource)?)
    }

    /// Identifier stored by the host once the resource exists
    fn resource_id(&self, resource: &ResourceState) -> String {
        resource.resource_id().to_string()
    }

    /// Send one record to the provider
    async fn add(&self, client: &dyn DnsApiClient, record: &Record) -> Result<Vec<u8>> {
        client
            .add_record(
                record.record_type,
                &record.zone,
                &record.subname,
                &record.wire_content(),
                record.priority,
            )
            .await
    }

    /// Remove one record from the provider
    async fn remove(&self, client: &dyn DnsApiClient, record: &Record) -> Result<Vec<u8>> {
        client
            .remove_record(
                &record.zone,
                &record.subname,
                record.record_type,
                &record.wire_content(),
                record.priority,
            )
            .await
    }

    /// Writes needed to move from `prior` to `resource`, without applying them
    fn plan(&self, prior: &ResourceState, resource: &ResourceState) -> Result<Diff> {
        Ok(diff(&self.expand(prior)?, &self.expand(resource)?))
    }

    /// Create every declared record, then read the result back
    async fn create(&self, client: &CachedClient, resource: &mut ResourceState) -> Result<()> {
        operations::create(self, client, resource).await
    }

    /// Refresh `resource` from the provider
    async fn read(&self, client: &CachedClient, resource: &mut ResourceState) -> Result<()> {
        operations::read(self, client, resource).await
    }

    /// Converge from `prior` to the data declared in `resource`
    async fn update(
        &self,
        _client: &CachedClient,
        _prior: &ResourceState,
        _resource: &mut ResourceState,
    ) -> Result<()> {
        Err(Error::unsupported("update", self.kind().to_string()))
    }

    /// Remove every record of the resource
    async fn delete(&self, client: &CachedClient, resource: &mut ResourceState) -> Result<()> {
        operations::delete(self, client, resource).await
    }

    /// Adopt an existing resource from a `zone/name` identifier
    async fn import(&self, client: &CachedClient, id: &str) -> Result<ResourceState> {
        operations::import(self, client, id).await
    }
}
