//! Resource model
//!
//! A resource is one host-managed object: all records of one type at one
//! `zone`/`name`. Its declared shape is a [`RecordData`] variant, checked at
//! the boundary where host input enters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::engine::RecordGroup;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};

/// Kinds of resources the host can manage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Txt,
    Srv,
    Caa,
    /// Deprecated single-record resource of any type
    DnsRecord,
}

impl ResourceKind {
    /// All resource kinds
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::A,
        ResourceKind::Aaaa,
        ResourceKind::Cname,
        ResourceKind::Mx,
        ResourceKind::Ns,
        ResourceKind::Txt,
        ResourceKind::Srv,
        ResourceKind::Caa,
        ResourceKind::DnsRecord,
    ];

    /// Host-facing resource name
    pub fn resource_name(&self) -> &'static str {
        match self {
            ResourceKind::A => "regru_dns_a_record",
            ResourceKind::Aaaa => "regru_dns_aaaa_record",
            ResourceKind::Cname => "regru_dns_cname_record",
            ResourceKind::Mx => "regru_dns_mx_record",
            ResourceKind::Ns => "regru_dns_ns_record",
            ResourceKind::Txt => "regru_dns_txt_record",
            ResourceKind::Srv => "regru_dns_srv_record",
            ResourceKind::Caa => "regru_dns_caa_record",
            ResourceKind::DnsRecord => "regru_dns_record",
        }
    }

    /// Fixed record type, or `None` for the legacy resource
    pub fn record_type(&self) -> Option<RecordType> {
        match self {
            ResourceKind::A => Some(RecordType::A),
            ResourceKind::Aaaa => Some(RecordType::Aaaa),
            ResourceKind::Cname => Some(RecordType::Cname),
            ResourceKind::Mx => Some(RecordType::Mx),
            ResourceKind::Ns => Some(RecordType::Ns),
            ResourceKind::Txt => Some(RecordType::Txt),
            ResourceKind::Srv => Some(RecordType::Srv),
            ResourceKind::Caa => Some(RecordType::Caa),
            ResourceKind::DnsRecord => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.resource_name() == s)
            .ok_or_else(|| Error::shape(format!("unknown resource kind: {s}")))
    }
}

/// MX/NS priority tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityGroup {
    pub priority: u16,
    pub servers: Vec<String>,
}

impl RecordGroup for PriorityGroup {
    fn flatten(&self, zone: &str, subname: &str, record_type: RecordType) -> Vec<Record> {
        self.servers
            .iter()
            .map(|s| Record::new(zone, subname, record_type, s).with_priority(self.priority))
            .collect()
    }
}

/// SRV targets sharing priority, weight and port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvGroup {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub targets: Vec<String>,
}

impl RecordGroup for SrvGroup {
    fn flatten(&self, zone: &str, subname: &str, _record_type: RecordType) -> Vec<Record> {
        self.targets
            .iter()
            .map(|t| {
                Record::new(zone, subname, RecordType::Srv, t)
                    .with_srv(self.priority, self.weight, self.port)
            })
            .collect()
    }
}

/// A single CAA tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaaEntry {
    #[serde(default)]
    pub flag: u8,
    #[serde(default = "default_caa_tag")]
    pub tag: String,
    pub value: String,
}

fn default_caa_tag() -> String {
    "issue".to_string()
}

impl RecordGroup for CaaEntry {
    fn flatten(&self, zone: &str, subname: &str, _record_type: RecordType) -> Vec<Record> {
        vec![Record::new(zone, subname, RecordType::Caa, &self.value).with_caa(self.flag, &self.tag)]
    }
}

/// Declared shape of a resource, one variant per resource kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordData {
    A { records: Vec<String> },
    Aaaa { records: Vec<String> },
    Txt { records: Vec<String> },
    Cname { cname: String },
    Mx { record: Vec<PriorityGroup> },
    Ns { record: Vec<PriorityGroup> },
    Srv { record: Vec<SrvGroup> },
    Caa { record: Vec<CaaEntry> },
    DnsRecord {
        record_type: RecordType,
        record: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<u16>,
    },
}

impl RecordData {
    /// Resource kind this data belongs to
    pub fn kind(&self) -> ResourceKind {
        match self {
            RecordData::A { .. } => ResourceKind::A,
            RecordData::Aaaa { .. } => ResourceKind::Aaaa,
            RecordData::Txt { .. } => ResourceKind::Txt,
            RecordData::Cname { .. } => ResourceKind::Cname,
            RecordData::Mx { .. } => ResourceKind::Mx,
            RecordData::Ns { .. } => ResourceKind::Ns,
            RecordData::Srv { .. } => ResourceKind::Srv,
            RecordData::Caa { .. } => ResourceKind::Caa,
            RecordData::DnsRecord { .. } => ResourceKind::DnsRecord,
        }
    }

    /// Empty declaration for a kind (what Read produces for an absent resource)
    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::A => RecordData::A { records: Vec::new() },
            ResourceKind::Aaaa => RecordData::Aaaa { records: Vec::new() },
            ResourceKind::Txt => RecordData::Txt { records: Vec::new() },
            ResourceKind::Cname => RecordData::Cname { cname: String::new() },
            ResourceKind::Mx => RecordData::Mx { record: Vec::new() },
            ResourceKind::Ns => RecordData::Ns { record: Vec::new() },
            ResourceKind::Srv => RecordData::Srv { record: Vec::new() },
            ResourceKind::Caa => RecordData::Caa { record: Vec::new() },
            ResourceKind::DnsRecord => RecordData::DnsRecord {
                record_type: RecordType::A,
                record: String::new(),
                priority: None,
            },
        }
    }

    /// Decode untyped host input for a known kind
    ///
    /// The `type` tag is implied by `kind` and may be omitted from `value`.
    ///
    /// # Returns
    ///
    /// - `Ok(RecordData)`: value matches the kind's shape
    /// - `Err(Error::Shape)`: value is not an object or a field has the wrong shape
    pub fn from_value(kind: ResourceKind, value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::shape(format!(
                    "{kind}: expected an object, got {}",
                    json_kind(&other)
                )));
            }
        };

        let tag = serde_json::to_value(kind)
            .map_err(|e| Error::shape(format!("{kind}: {e}")))?;
        match map.get("type") {
            None => {
                map.insert("type".to_string(), tag);
            }
            Some(existing) if *existing == tag => {}
            Some(other) => {
                return Err(Error::shape(format!(
                    "{kind}: type tag {other} does not match resource kind"
                )));
            }
        }

        serde_json::from_value(Value::Object(map)).map_err(|e| Error::shape(format!("{kind}: {e}")))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Parsed resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub zone: String,
    pub name: String,
}

impl ResourceId {
    /// Parse a `zone/name` identifier
    ///
    /// Fails unless the identifier splits into exactly two non-empty parts.
    pub fn parse(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split('/').collect();
        match parts.as_slice() {
            [zone, name] if !zone.is_empty() && !name.is_empty() => Ok(Self {
                zone: zone.to_string(),
                name: name.to_string(),
            }),
            _ => Err(Error::shape(format!(
                "invalid resource ID '{id}': expected zone/name"
            ))),
        }
    }

    /// Identifier of the deprecated single-record resource
    pub fn legacy(&self, record_type: RecordType) -> String {
        format!("{}/{}/{}", self.zone, self.name, record_type)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone, self.name)
    }
}

/// Host-side state of one resource
///
/// `id` is `None` while the resource is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub zone: String,
    pub name: String,
    #[serde(flatten)]
    pub data: RecordData,
}

impl ResourceState {
    /// New, not yet created resource
    pub fn new(zone: impl Into<String>, name: impl Into<String>, data: RecordData) -> Self {
        Self {
            id: None,
            zone: zone.into(),
            name: name.into(),
            data,
        }
    }

    /// Resource kind
    pub fn kind(&self) -> ResourceKind {
        self.data.kind()
    }

    /// Whether the resource currently exists
    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }

    /// `zone/name` as a parsed identifier
    pub fn resource_id(&self) -> ResourceId {
        ResourceId {
            zone: self.zone.clone(),
            name: self.name.clone(),
        }
    }
}
