//! Strategy for flat multisets of scalar values (A, AAAA, TXT)

use async_trait::async_trait;

use super::operations;
use crate::cache::CachedClient;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::resource::{RecordData, ResourceKind, ResourceState};
use crate::traits::RecordStrategy;

/// Normalizes a declared or observed value before comparison
pub type Preprocessor = fn(&str) -> String;

/// Checks the declared values of a resource
pub type Validator = fn(RecordType, &[String]) -> Result<()>;

fn identity(value: &str) -> String {
    value.to_string()
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Require at least one non-blank value
pub fn require_values(record_type: RecordType, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::validation(format!(
            "at least one {record_type} record must be specified"
        )));
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(Error::validation(format!(
            "{record_type} record values must not be blank"
        )));
    }
    Ok(())
}

/// Strategy parameterized by record type, preprocessor and validator
pub struct GenericRecordStrategy {
    kind: ResourceKind,
    record_type: RecordType,
    preprocessor: Preprocessor,
    validator: Validator,
}

impl GenericRecordStrategy {
    /// Build a strategy for `kind`
    ///
    /// # Parameters
    ///
    /// - `kind`: One of the flat-list kinds (A, AAAA, TXT)
    /// - `preprocessor`: Value normalizer, identity when `None`
    /// - `validator`: Declared-value check, [`require_values`] when `None`
    pub fn new(
        kind: ResourceKind,
        preprocessor: Option<Preprocessor>,
        validator: Option<Validator>,
    ) -> Result<Self> {
        let record_type = match kind {
            ResourceKind::A | ResourceKind::Aaaa | ResourceKind::Txt => kind.record_type(),
            _ => None,
        }
        .ok_or_else(|| Error::config(format!("{kind} is not a flat-list resource")))?;

        Ok(Self {
            kind,
            record_type,
            preprocessor: preprocessor.unwrap_or(identity),
            validator: validator.unwrap_or(require_values),
        })
    }

    /// A records
    pub fn a() -> Self {
        Self {
            kind: ResourceKind::A,
            record_type: RecordType::A,
            preprocessor: trimmed,
            validator: require_values,
        }
    }

    /// AAAA records
    pub fn aaaa() -> Self {
        Self {
            kind: ResourceKind::Aaaa,
            record_type: RecordType::Aaaa,
            preprocessor: trimmed,
            validator: require_values,
        }
    }

    /// TXT records; values are compared verbatim
    pub fn txt() -> Self {
        Self {
            kind: ResourceKind::Txt,
            record_type: RecordType::Txt,
            preprocessor: identity,
            validator: require_values,
        }
    }

    fn values<'a>(&self, data: &'a RecordData) -> Result<&'a [String]> {
        match (self.kind, data) {
            (ResourceKind::A, RecordData::A { records })
            | (ResourceKind::Aaaa, RecordData::Aaaa { records })
            | (ResourceKind::Txt, RecordData::Txt { records }) => Ok(records),
            _ => Err(Error::shape(format!(
                "{} cannot handle {} data",
                self.kind,
                data.kind()
            ))),
        }
    }

    fn wrap(&self, records: Vec<String>) -> RecordData {
        match self.record_type {
            RecordType::Aaaa => RecordData::Aaaa { records },
            RecordType::Txt => RecordData::Txt { records },
            _ => RecordData::A { records },
        }
    }
}

#[async_trait]
impl RecordStrategy for GenericRecordStrategy {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn validate(&self, data: &RecordData) -> Result<()> {
        let values = self.values(data)?;
        (self.validator)(self.record_type, values)
    }

    fn expand(&self, resource: &ResourceState) -> Result<Vec<Record>> {
        Ok(self
            .values(&resource.data)?
            .iter()
            .map(|v| {
                Record::new(
                    &resource.zone,
                    &resource.name,
                    self.record_type,
                    (self.preprocessor)(v),
                )
            })
            .collect())
    }

    fn collapse(&self, _resource: &ResourceState, records: &[Record]) -> Result<RecordData> {
        let mut values: Vec<String> = records
            .iter()
            .map(|r| (self.preprocessor)(&r.content))
            .collect();
        values.sort();
        Ok(self.wrap(values))
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

    fn state(values: &[&str]) -> ResourceState {
        ResourceState::new(
            "example.com",
            "www",
            RecordData::A {
                records: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    #[test]
    fn test_validate_requires_values() {
        let strategy = GenericRecordStrategy::a();
        let err = strategy.validate(&state(&[]).data).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("at least one A record")));
        assert!(strategy.validate(&state(&["1.1.1.1"]).data).is_ok());
    }

    #[test]
    fn test_wrong_variant_is_shape_error() {
        let strategy = GenericRecordStrategy::txt();
        assert!(matches!(
            strategy.validate(&state(&["1.1.1.1"]).data),
            Err(Error::Shape(_))
        ));
        assert!(matches!(strategy.expand(&state(&["1.1.1.1"])), Err(Error::Shape(_))));
    }

    #[test]
    fn test_expand_applies_preprocessor() {
        let strategy = GenericRecordStrategy::a();
        let records = strategy.expand(&state(&[" 1.1.1.1 "])).unwrap();
        assert_eq!(records[0].content, "1.1.1.1");
        assert_eq!(records[0].record_type, RecordType::A);
    }

    #[test]
    fn test_reordered_declaration_plans_nothing() {
        let strategy = GenericRecordStrategy::a();
        let plan = strategy
            .plan(&state(&["1.1.1.1", "2.2.2.2"]), &state(&["2.2.2.2", "1.1.1.1"]))
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_custom_parameters() {
        fn lower(v: &str) -> String {
            v.to_ascii_lowercase()
        }
        fn allow_empty(_: RecordType, _: &[String]) -> Result<()> {
            Ok(())
        }

        let strategy =
            GenericRecordStrategy::new(ResourceKind::Txt, Some(lower), Some(allow_empty)).unwrap();
        let resource = ResourceState::new(
            "example.com",
            "@",
            RecordData::Txt { records: vec!["HELLO".into()] },
        );
        assert!(strategy.validate(&RecordData::Txt { records: vec![] }).is_ok());
        assert_eq!(strategy.expand(&resource).unwrap()[0].content, "hello");

        assert!(GenericRecordStrategy::new(ResourceKind::Mx, None, None).is_err());
    }
}
