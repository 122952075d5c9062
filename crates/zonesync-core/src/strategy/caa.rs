//! CAA strategy
//!
//! Every `(flag, tag, value)` tuple is its own group. Writes go through the
//! dedicated CAA calls.

use async_trait::async_trait;

use super::operations;
use crate::cache::CachedClient;
use crate::engine::flatten_groups;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::resource::{CaaEntry, RecordData, ResourceKind, ResourceState};
use crate::traits::{DnsApiClient, RecordStrategy};

/// Property tags accepted by CAA (RFC 8659)
const KNOWN_TAGS: &[&str] = &["issue", "issuewild", "iodef", "issuemail", "issuevmc"];

#[derive(Debug, Default)]
pub struct CaaRecordStrategy;

impl CaaRecordStrategy {
    pub fn new() -> Self {
        Self
    }

    fn entries<'a>(&self, data: &'a RecordData) -> Result<&'a [CaaEntry]> {
        match data {
            RecordData::Caa { record } => Ok(record),
            other => Err(Error::shape(format!(
                "{} cannot handle {} data",
                ResourceKind::Caa,
                other.kind()
            ))),
        }
    }
}

#[async_trait]
impl RecordStrategy for CaaRecordStrategy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Caa
    }

    fn validate(&self, data: &RecordData) -> Result<()> {
        let entries = self.entries(data)?;
        if entries.is_empty() {
            return Err(Error::validation("at least one CAA record must be specified"));
        }
        for entry in entries {
            if entry.value.trim().is_empty() {
                return Err(Error::validation("CAA value must not be empty"));
            }
            if !KNOWN_TAGS.contains(&entry.tag.as_str()) {
                return Err(Error::validation(format!(
                    "unknown CAA tag '{}', expected one of {}",
                    entry.tag,
                    KNOWN_TAGS.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn expand(&self, resource: &ResourceState) -> Result<Vec<Record>> {
        Ok(flatten_groups(
            &resource.zone,
            &resource.name,
            RecordType::Caa,
            self.entries(&resource.data)?,
        ))
    }

    fn collapse(&self, _resource: &ResourceState, records: &[Record]) -> Result<RecordData> {
        let record = records
            .iter()
            .map(|r| CaaEntry {
                flag: r.flag.unwrap_or(0),
                tag: r.tag.clone().unwrap_or_default(),
                value: r.content.clone(),
            })
            .collect();
        Ok(RecordData::Caa { record })
    }

    async fn add(&self, client: &dyn DnsApiClient, record: &Record) -> Result<Vec<u8>> {
        client
            .add_caa_record(
                &record.zone,
                &record.subname,
                &record.content,
                record.flag.unwrap_or(0),
                record.tag.as_deref().unwrap_or("issue"),
            )
            .await
    }

    async fn remove(&self, client: &dyn DnsApiClient, record: &Record) -> Result<Vec<u8>> {
        client
            .remove_caa_record(
                &record.zone,
                &record.subname,
                &record.content,
                record.flag.unwrap_or(0),
                record.tag.as_deref().unwrap_or("issue"),
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
