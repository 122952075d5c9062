//! Provider response decoding
//!
//! The API client is a black box returning raw JSON bytes. This module turns
//! those bytes into either a structured [`Error::Provider`] or a
//! [`ZoneSnapshot`] from which per-resource [`Record`]s are extracted.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::{normalize_domain, tokenize, Record, RecordType};

/// Top-level provider response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub answer: Answer,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub domains: Vec<DomainAnswer>,
}

/// Per-domain section of a response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainAnswer {
    #[serde(default)]
    pub dname: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_text: Option<String>,
    #[serde(default)]
    pub rrs: Vec<WireRecord>,
}

/// A record exactly as the provider returns it
///
/// Numeric fields are accepted either as JSON numbers or numeric strings.
/// Anything else reads as absent, so one odd record never poisons the zone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireRecord {
    #[serde(default)]
    pub subname: String,
    #[serde(default)]
    pub rectype: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub prio: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub port: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub flag: Option<i64>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn decode(bytes: &[u8]) -> Result<ZoneResponse> {
    serde_json::from_slice(bytes).map_err(|e| Error::parse(format!("invalid response: {e}")))
}

fn domain_error(domain: &DomainAnswer) -> Error {
    Error::provider(
        domain.dname.clone(),
        domain.error_code.clone().unwrap_or_default(),
        domain.error_text.clone().unwrap_or_default(),
    )
}

fn response_error(response: &ZoneResponse) -> Option<Error> {
    if let Some(domain) = response.answer.domains.iter().find(|d| d.result == "error") {
        return Some(domain_error(domain));
    }

    if response.result == "error" {
        return Some(Error::provider(
            "",
            response.error_code.clone().unwrap_or_default(),
            response
                .error_text
                .clone()
                .unwrap_or_else(|| "overall result is error".to_string()),
        ));
    }

    None
}

/// Check a raw provider response for errors
///
/// # Returns
///
/// - `Ok(())`: response decoded and reports success
/// - `Err(Error::Provider)`: top-level or per-domain `result: "error"`
/// - `Err(Error::Parse)`: bytes are not a provider response
pub fn check_response(bytes: &[u8]) -> Result<()> {
    let response = decode(bytes)?;
    match response_error(&response) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Convert a provider record into the canonical model
///
/// Structured fields win. When CAA flag/tag or SRV weight/port are missing,
/// they are recovered from the whitespace-separated `content`.
pub fn parse_wire_record(zone: &str, wire: &WireRecord) -> Result<Record> {
    let record_type: RecordType = wire
        .rectype
        .parse()
        .map_err(|_| Error::parse(format!("unsupported record type '{}'", wire.rectype)))?;

    let record = match record_type {
        RecordType::Mx | RecordType::Ns => {
            Record::new(zone, wire.subname.clone(), record_type, &wire.content)
                .with_priority(to_u16("prio", wire.prio.unwrap_or(0))?)
        }
        RecordType::Srv => parse_srv(zone, wire)?,
        RecordType::Caa => parse_caa(zone, wire)?,
        _ => Record::new(zone, wire.subname.clone(), record_type, &wire.content),
    };

    Ok(record)
}

fn parse_srv(zone: &str, wire: &WireRecord) -> Result<Record> {
    let tokens = tokenize(&wire.content);
    let (prio, weight, port, target) = match tokens.as_slice() {
        [p, w, port, target] => (
            wire.prio.or(p.parse().ok()),
            wire.weight.or(w.parse().ok()),
            wire.port.or(port.parse().ok()),
            target.clone(),
        ),
        [w, port, target] => (
            wire.prio,
            wire.weight.or(w.parse().ok()),
            wire.port.or(port.parse().ok()),
            target.clone(),
        ),
        _ => (wire.prio, wire.weight, wire.port, wire.content.clone()),
    };

    Ok(
        Record::new(zone, wire.subname.clone(), RecordType::Srv, target).with_srv(
            to_u16("prio", prio.unwrap_or(0))?,
            to_u16("weight", weight.unwrap_or(0))?,
            to_u16("port", port.unwrap_or(0))?,
        ),
    )
}

fn parse_caa(zone: &str, wire: &WireRecord) -> Result<Record> {
    let structured_tag = wire.tag.as_deref().filter(|t| !t.is_empty());
    let structured_flag = wire.flag.filter(|f| *f != 0);

    if structured_tag.is_some() || structured_flag.is_some() {
        let flag = to_u8("flag", wire.flag.unwrap_or(0))?;
        let value = wire.content.trim().trim_matches('"');
        return Ok(Record::new(zone, wire.subname.clone(), RecordType::Caa, value)
            .with_caa(flag, structured_tag.unwrap_or_default()));
    }

    let tokens = tokenize(&wire.content);
    if tokens.len() >= 3
        && let Ok(flag) = tokens[0].parse::<u8>()
    {
        let value = tokens[2..].join(" ");
        return Ok(Record::new(zone, wire.subname.clone(), RecordType::Caa, value)
            .with_caa(flag, tokens[1].clone()));
    }

    Ok(
        Record::new(zone, wire.subname.clone(), RecordType::Caa, wire.content.trim())
            .with_caa(0, ""),
    )
}

fn to_u16(field: &str, value: i64) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::parse(format!("{field} out of range: {value}")))
}

fn to_u8(field: &str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::parse(format!("{field} out of range: {value}")))
}

/// Decoded records of one zone
#[derive(Debug, Clone)]
pub struct ZoneSnapshot {
    zone: String,
    records: Vec<WireRecord>,
}

impl ZoneSnapshot {
    /// Decode a `get_records` response for `zone`
    ///
    /// Domain sections naming a different zone are ignored.
    pub fn parse(zone: &str, bytes: &[u8]) -> Result<Self> {
        let response = decode(bytes)?;
        if let Some(err) = response_error(&response) {
            return Err(err);
        }

        let wanted = normalize_domain(zone).to_ascii_lowercase();
        let records = response
            .answer
            .domains
            .into_iter()
            .filter(|d| d.dname.is_empty() || normalize_domain(&d.dname).to_ascii_lowercase() == wanted)
            .flat_map(|d| d.rrs)
            .collect();

        Ok(Self {
            zone: zone.to_string(),
            records,
        })
    }

    /// Zone this snapshot belongs to
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Number of raw records in the snapshot
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the snapshot holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records at `subname` of `record_type`, sorted by canonical key
    pub fn records(&self, subname: &str, record_type: RecordType) -> Result<Vec<Record>> {
        let mut found = self
            .records
            .iter()
            .filter(|r| r.subname == subname && r.rectype.eq_ignore_ascii_case(record_type.as_str()))
            .map(|r| parse_wire_record(&self.zone, r))
            .collect::<Result<Vec<_>>>()?;

        found.sort_by_cached_key(Record::canonical_key);
        Ok(found)
    }
}
