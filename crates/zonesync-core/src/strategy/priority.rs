//! MX and NS strategy
//!
//! Declared as priority tiers, each a multiset of server names. Diffing runs
//! on the flattened `(priority, server)` records, so moving one server out of
//! a tier costs exactly one removal and one addition.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::operations;
use crate::cache::CachedClient;
use crate::engine::flatten_groups;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::resource::{PriorityGroup, RecordData, ResourceKind, ResourceState};
use crate::traits::RecordStrategy;

pub struct PriorityRecordStrategy {
    kind: ResourceKind,
    record_type: RecordType,
}

impl PriorityRecordStrategy {
    /// MX records
    pub fn mx() -> Self {
        Self {
            kind: ResourceKind::Mx,
            record_type: RecordType::Mx,
        }
    }

    /// NS records
    pub fn ns() -> Self {
        Self {
            kind: ResourceKind::Ns,
            record_type: RecordType::Ns,
        }
    }

    fn groups<'a>(&self, data: &'a RecordData) -> Result<&'a [PriorityGroup]> {
        match (self.kind, data) {
            (ResourceKind::Mx, RecordData::Mx { record })
            | (ResourceKind::Ns, RecordData::Ns { record }) => Ok(record),
            _ => Err(Error::shape(format!(
                "{} cannot handle {} data",
                self.kind,
                data.kind()
            ))),
        }
    }
}

#[async_trait]
impl RecordStrategy for PriorityRecordStrategy {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn validate(&self, data: &RecordData) -> Result<()> {
        let groups = self.groups(data)?;
        if groups.is_empty() {
            return Err(Error::validation(format!(
                "at least one {} record must be specified",
                self.record_type
            )));
        }
        for group in groups {
            if group.servers.is_empty() {
                return Err(Error::validation(format!(
                    "{} priority {} has no servers",
                    self.record_type, group.priority
                )));
            }
            if group.servers.iter().any(|s| s.trim().is_empty()) {
                return Err(Error::validation(format!(
                    "{} server names must not be blank",
                    self.record_type
                )));
            }
        }
        Ok(())
    }

    fn expand(&self, resource: &ResourceState) -> Result<Vec<Record>> {
        Ok(flatten_groups(
            &resource.zone,
            &resource.name,
            self.record_type,
            self.groups(&resource.data)?,
        ))
    }

    fn collapse(&self, _resource: &ResourceState, records: &[Record]) -> Result<RecordData> {
        let mut tiers: BTreeMap<u16, Vec<String>> = BTreeMap::new();
        for record in records {
            tiers
                .entry(record.priority.unwrap_or(0))
                .or_default()
                .push(record.content.clone());
        }

        let record = tiers
            .into_iter()
            .map(|(priority, mut servers)| {
                servers.sort();
                PriorityGroup { priority, servers }
            })
            .collect();

        Ok(match self.kind {
            ResourceKind::Ns => RecordData::Ns { record },
            _ => RecordData::Mx { record },
        })
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
