//! Lifecycle operations shared by every strategy
//!
//! Writes are applied removals first, then additions, one provider call per
//! record. The first failing write aborts the operation. A removal the
//! provider answers with "record not found" counts as done. Whenever at least
//! one write went through, the zone's cache entry is invalidated before the
//! operation returns, even if a later write failed.

use tracing::{debug, info, warn};

use crate::cache::CachedClient;
use crate::engine::{diff, Diff};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::resource::{RecordData, ResourceId, ResourceState};
use crate::traits::{DnsApiClient, RecordStrategy};
use crate::wire::check_response;

async fn add_one<S>(strategy: &S, client: &dyn DnsApiClient, record: &Record) -> Result<()>
where
    S: RecordStrategy + ?Sized,
{
    let result = match strategy.add(client, record).await {
        Ok(bytes) => check_response(&bytes),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            debug!(record = %record, "Added record");
            Ok(())
        }
        Err(e) => Err(Error::operation(
            "add",
            record.record_type.as_str(),
            record.to_string(),
            e,
        )),
    }
}

async fn remove_one<S>(strategy: &S, client: &dyn DnsApiClient, record: &Record) -> Result<()>
where
    S: RecordStrategy + ?Sized,
{
    let result = match strategy.remove(client, record).await {
        Ok(bytes) => check_response(&bytes),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            debug!(record = %record, "Removed record");
            Ok(())
        }
        Err(e) if e.is_record_not_found() => {
            warn!(record = %record, "Record already absent, treating removal as done");
            Ok(())
        }
        Err(e) => Err(Error::operation(
            "remove",
            record.record_type.as_str(),
            record.to_string(),
            e,
        )),
    }
}

/// Apply a diff against `zone`
///
/// # Returns
///
/// - `Ok(())`: every write succeeded
/// - `Err(Error::Operation)`: the first failing write, with its record
pub async fn apply<S>(strategy: &S, client: &CachedClient, zone: &str, diff: &Diff) -> Result<()>
where
    S: RecordStrategy + ?Sized,
{
    let mut writes = 0usize;
    let mut outcome = Ok(());

    for record in &diff.to_remove {
        if let Err(e) = remove_one(strategy, client.client(), record).await {
            outcome = Err(e);
            break;
        }
        writes += 1;
    }

    if outcome.is_ok() {
        for record in &diff.to_add {
            if let Err(e) = add_one(strategy, client.client(), record).await {
                outcome = Err(e);
                break;
            }
            writes += 1;
        }
    }

    if writes > 0 {
        client.invalidate(zone).await;
    }

    outcome
}

/// Create every declared record, then read the resource back
pub async fn create<S>(strategy: &S, client: &CachedClient, resource: &mut ResourceState) -> Result<()>
where
    S: RecordStrategy + ?Sized,
{
    strategy.validate(&resource.data)?;
    let declared = strategy.expand(resource)?;

    info!(
        kind = %strategy.kind(),
        zone = %resource.zone,
        name = %resource.name,
        records = declared.len(),
        "Creating resource"
    );

    apply(strategy, client, &resource.zone, &diff(&[], &declared)).await?;
    resource.id = Some(strategy.resource_id(resource));

    strategy.read(client, resource).await
}

/// Refresh a resource from the zone listing
///
/// An empty listing clears the identifier instead of failing.
pub async fn read<S>(strategy: &S, client: &CachedClient, resource: &mut ResourceState) -> Result<()>
where
    S: RecordStrategy + ?Sized,
{
    debug!(kind = %strategy.kind(), zone = %resource.zone, name = %resource.name, "Reading resource");

    let snapshot = client.snapshot(&resource.zone).await?;
    let observed = strategy.select(&snapshot, resource)?;

    if observed.is_empty() {
        debug!(zone = %resource.zone, name = %resource.name, "No records found, resource is absent");
        resource.id = None;
        return Ok(());
    }

    resource.data = strategy.collapse(resource, &observed)?;
    resource.id = Some(strategy.resource_id(resource));
    Ok(())
}

/// Apply only the records that changed between `prior` and `resource`
///
/// An empty declaration removes everything and clears the identifier.
/// Anything else is validated before the first write.
pub async fn update_by_diff<S>(
    strategy: &S,
    client: &CachedClient,
    prior: &ResourceState,
    resource: &mut ResourceState,
) -> Result<()>
where
    S: RecordStrategy + ?Sized,
{
    let declared_empty = strategy.expand(resource)?.is_empty();
    if !declared_empty {
        strategy.validate(&resource.data)?;
    }
    let changes = strategy.plan(prior, resource)?;

    info!(
        kind = %strategy.kind(),
        zone = %resource.zone,
        name = %resource.name,
        add = changes.to_add.len(),
        remove = changes.to_remove.len(),
        "Updating resource"
    );

    apply(strategy, client, &resource.zone, &changes).await?;

    if declared_empty {
        resource.id = None;
        return Ok(());
    }

    strategy.read(client, resource).await
}

/// Remove every record of the resource
pub async fn delete<S>(strategy: &S, client: &CachedClient, resource: &mut ResourceState) -> Result<()>
where
    S: RecordStrategy + ?Sized,
{
    let current = strategy.expand(resource)?;

    info!(
        kind = %strategy.kind(),
        zone = %resource.zone,
        name = %resource.name,
        records = current.len(),
        "Deleting resource"
    );

    apply(strategy, client, &resource.zone, &diff(&current, &[])).await?;
    resource.id = None;
    Ok(())
}

/// Adopt an existing resource from a `zone/name` identifier
///
/// # Returns
///
/// - `Ok(ResourceState)`: the resource as observed at the provider
/// - `Err(Error::Shape)`: malformed identifier
/// - `Err(Error::NotFound)`: no records exist at `zone/name`
pub async fn import<S>(strategy: &S, client: &CachedClient, id: &str) -> Result<ResourceState>
where
    S: RecordStrategy + ?Sized,
{
    let parsed = ResourceId::parse(id)?;
    info!(kind = %strategy.kind(), id, "Importing resource");

    let mut resource = ResourceState::new(
        parsed.zone,
        parsed.name,
        RecordData::empty(strategy.kind()),
    );
    strategy.read(client, &mut resource).await?;

    if !resource.is_present() {
        return Err(Error::not_found(format!(
            "{} {id}: no records to import",
            strategy.kind()
        )));
    }

    Ok(resource)
}
