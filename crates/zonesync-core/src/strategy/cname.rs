//! CNAME strategy
//!
//! A CNAME resource holds exactly one record and is replaced wholesale on
//! change rather than diffed value by value.

use async_trait::async_trait;
use tracing::warn;

use super::operations;
use crate::cache::CachedClient;
use crate::engine::Diff;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::resource::{RecordData, ResourceKind, ResourceState};
use crate::traits::RecordStrategy;

#[derive(Debug, Default)]
pub struct CnameRecordStrategy;

impl CnameRecordStrategy {
    pub fn new() -> Self {
        Self
    }

    fn target<'a>(&self, data: &'a RecordData) -> Result<&'a str> {
        match data {
            RecordData::Cname { cname } => Ok(cname.trim()),
            other => Err(Error::shape(format!(
                "{} cannot handle {} data",
                ResourceKind::Cname,
                other.kind()
            ))),
        }
    }
}

#[async_trait]
impl RecordStrategy for CnameRecordStrategy {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Cname
    }

    fn validate(&self, data: &RecordData) -> Result<()> {
        if self.target(data)?.is_empty() {
            return Err(Error::validation("cname must not be empty"));
        }
        Ok(())
    }

    fn expand(&self, resource: &ResourceState) -> Result<Vec<Record>> {
        let target = self.target(&resource.data)?;
        if target.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Record::new(
            &resource.zone,
            &resource.name,
            RecordType::Cname,
            target,
        )])
    }

    fn collapse(&self, resource: &ResourceState, records: &[Record]) -> Result<RecordData> {
        if records.len() > 1 {
            warn!(
                zone = %resource.zone,
                name = %resource.name,
                count = records.len(),
                "Multiple CNAME records found, keeping the first"
            );
        }
        let cname = records
            .first()
            .map(|r| r.content.clone())
            .unwrap_or_default();
        Ok(RecordData::Cname { cname })
    }

    /// Full replacement whenever the target differs
    fn plan(&self, prior: &ResourceState, resource: &ResourceState) -> Result<Diff> {
        let old = self.expand(prior)?;
        let new = self.expand(resource)?;

        let same = old.iter().map(Record::canonical_key).eq(new.iter().map(Record::canonical_key));
        if same {
            return Ok(Diff::default());
        }

        Ok(Diff {
            to_add: new,
            to_remove: old,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn state(target: &str) -> ResourceState {
        ResourceState::new(
            "example.com",
            "www",
            RecordData::Cname {
                cname: target.to_string(),
            },
        )
    }

    #[test]
    fn test_validate() {
        let strategy = CnameRecordStrategy::new();
        assert!(matches!(strategy.validate(&state(" ").data), Err(Error::Validation(_))));
        assert!(strategy.validate(&state("target.example.com").data).is_ok());
    }

    #[test]
    fn test_trailing_dot_is_not_a_change() {
        let strategy = CnameRecordStrategy::new();
        let plan = strategy
            .plan(&state("target.example.com."), &state("target.example.com"))
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_change_replaces_wholesale() {
        let strategy = CnameRecordStrategy::new();
        let plan = strategy.plan(&state("old.example.com"), &state("new.example.com")).unwrap();
        assert_eq!(plan.to_remove.len(), 1);
        assert_eq!(plan.to_add.len(), 1);
        assert_eq!(plan.to_remove[0].content, "old.example.com");
        assert_eq!(plan.to_add[0].wire_content(), "new.example.com.");
    }
}
