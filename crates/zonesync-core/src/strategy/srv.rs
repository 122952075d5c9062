//! SRV strategy
//!
//! Declared as groups of targets sharing `(priority, weight, port)`. Writes
//! go through the dedicated SRV calls, which carry all three discriminators.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::operations;
use crate::cache::CachedClient;
use crate::engine::flatten_groups;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::resource::{RecordData, ResourceKind, ResourceState, SrvGroup};
use crate::traits::{DnsApiClient, RecordStrategy};

#[derive(Debug, Default)]
pub struct SrvRecordStrategy;

impl SrvRecordStrategy {
    pub fn new() -> Self {
        Self
    }

    fn groups<'a>(&self, data: &'a RecordData) -> Result<&'a [SrvGroup]> {
        match data {
            RecordData::Srv { record } => Ok(record),
            other => Err(Error::shape(format!(
                "{} cannot handle {} data",
                ResourceKind::Srv,
                other.kind()
            ))),
        }
    }
}

fn discriminators(record: &Record) -> (u16, u16, u16) {
    (
        record.priority.unwrap_or(0),
        record.weight.unwrap_or(0),
        record.port.unwrap_or(0),
    )
}

#[async_trait]
impl RecordStrategy for SrvRecordStrategy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Srv
    }

    fn validate(&self, data: &RecordData) -> Result<()> {
        let groups = self.groups(data)?;
        if groups.is_empty() {
            return Err(Error::validation("at least one SRV record must be specified"));
        }
        for group in groups {
            if group.targets.is_empty() {
                return Err(Error::validation(format!(
                    "SRV group {}/{}/{} has no targets",
                    group.priority, group.weight, group.port
                )));
            }
            if group.port == 0 {
                return Err(Error::validation("SRV port must be greater than zero"));
            }
        }
        Ok(())
    }

    fn expand(&self, resource: &ResourceState) -> Result<Vec<Record>> {
        Ok(flatten_groups(
            &resource.zone,
            &resource.name,
            RecordType::Srv,
            self.groups(&resource.data)?,
        ))
    }

    fn collapse(&self, _resource: &ResourceState, records: &[Record]) -> Result<RecordData> {
        let mut groups: BTreeMap<(u16, u16, u16), Vec<String>> = BTreeMap::new();
        for record in records {
            groups
                .entry(discriminators(record))
                .or_default()
                .push(record.content.clone());
        }

        let record = groups
            .into_iter()
            .map(|((priority, weight, port), mut targets)| {
                targets.sort();
                SrvGroup {
                    priority,
                    weight,
                    port,
                    targets,
                }
            })
            .collect();

        Ok(RecordData::Srv { record })
    }

    async fn add(&self, client: &dyn DnsApiClient, record: &Record) -> Result<Vec<u8>> {
        let (priority, weight, port) = discriminators(record);
        client
            .add_srv_record(
                &record.zone,
                &record.subname,
                &record.wire_content(),
                priority,
                weight,
                port,
            )
            .await
    }

    async fn remove(&self, client: &dyn DnsApiClient, record: &Record) -> Result<Vec<u8>> {
        let (priority, weight, port) = discriminators(record);
        client
            .remove_srv_record(
                &record.zone,
                &record.subname,
                &record.wire_content(),
                priority,
                weight,
                port,
            )
            .await
    }

    async fn update(
        &self,
        client: &CachedClient,
        prior: &ResourceState,
        resource: &mut ResourceState,
    ) -> Result<()> {
        operations::update_by_diff(self, client, prior, resource).await
    }
}
