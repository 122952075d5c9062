//! Deprecated single-record resource
//!
//! Holds one record of any simple or priority type. It has no update (every
//! change replaces the resource) and cannot be imported. Its identifier keeps
//! the old `zone/name/type` form.

use async_trait::async_trait;

use crate::cache::CachedClient;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::resource::{RecordData, ResourceKind, ResourceState};
use crate::traits::RecordStrategy;
use crate::wire::ZoneSnapshot;

/// Priority used for MX and NS records when none is declared
pub const DEFAULT_LEGACY_PRIORITY: u16 = 10;

#[derive(Debug, Default)]
pub struct LegacyRecordStrategy;

impl LegacyRecordStrategy {
    pub fn new() -> Self {
        Self
    }

    fn parts<'a>(&self, data: &'a RecordData) -> Result<(RecordType, &'a str, Option<u16>)> {
        match data {
            RecordData::DnsRecord {
                record_type,
                record,
                priority,
            } => Ok((*record_type, record.as_str(), *priority)),
            other => Err(Error::shape(format!(
                "{} cannot handle {} data",
                ResourceKind::DnsRecord,
                other.kind()
            ))),
        }
    }
}

#[async_trait]
impl RecordStrategy for LegacyRecordStrategy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DnsRecord
    }

    fn validate(&self, data: &RecordData) -> Result<()> {
        let (record_type, record, _) = self.parts(data)?;
        if matches!(record_type, RecordType::Srv | RecordType::Caa) {
            return Err(Error::validation(format!(
                "{record_type} records need the dedicated {record_type} resource"
            )));
        }
        if record.trim().is_empty() {
            return Err(Error::validation("record must not be empty"));
        }
        Ok(())
    }

    fn record_type(&self, resource: &ResourceState) -> Result<RecordType> {
        Ok(self.parts(&resource.data)?.0)
    }

    fn expand(&self, resource: &ResourceState) -> Result<Vec<Record>> {
        let (record_type, value, priority) = self.parts(&resource.data)?;
        if value.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut record = Record::new(&resource.zone, &resource.name, record_type, value.trim());
        if matches!(record_type, RecordType::Mx | RecordType::Ns) {
            record = record.with_priority(priority.unwrap_or(DEFAULT_LEGACY_PRIORITY));
        }
        Ok(vec![record])
    }

    /// Only the exact declared record counts as present
    fn select(&self, snapshot: &ZoneSnapshot, resource: &ResourceState) -> Result<Vec<Record>> {
        let wanted: Vec<String> = self
            .expand(resource)?
            .iter()
            .map(Record::canonical_key)
            .collect();

        Ok(snapshot
            .records(&resource.name, self.record_type(resource)?)?
            .into_iter()
            .filter(|r| wanted.contains(&r.canonical_key()))
            .collect())
    }

    fn collapse(&self, resource: &ResourceState, records: &[Record]) -> Result<RecordData> {
        let (record_type, _, _) = self.parts(&resource.data)?;
        let first = records
            .first()
            .ok_or_else(|| Error::not_found(format!("{}/{}", resource.zone, resource.name)))?;

        Ok(RecordData::DnsRecord {
            record_type,
            record: first.content.clone(),
            priority: first.priority,
        })
    }

    fn resource_id(&self, resource: &ResourceState) -> String {
        match self.parts(&resource.data) {
            Ok((record_type, _, _)) => resource.resource_id().legacy(record_type),
            Err(_) => resource.resource_id().to_string(),
        }
    }

    async fn import(&self, _client: &CachedClient, _id: &str) -> Result<ResourceState> {
        Err(Error::unsupported("import", self.kind().to_string()))
    }
}
