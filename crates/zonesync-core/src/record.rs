//! Record model and canonicalization
//!
//! A [`Record`] is the atomic unit exchanged with the provider. Its
//! [`canonical key`](Record::canonical_key) is the only notion of identity
//! used by the reconciliation engine: two records are the same if and only
//! if their keys are equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Separator between canonical key components
pub const KEY_SEPARATOR: char = '_';

/// DNS record types managed by zonesync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Mail exchanger
    Mx,
    /// Name server
    Ns,
    /// Text
    Txt,
    /// Service locator
    Srv,
    /// Certification authority authorization
    Caa,
}

impl RecordType {
    /// All supported record types
    pub const ALL: [RecordType; 8] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Txt,
        RecordType::Srv,
        RecordType::Caa,
    ];

    /// Provider tag for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Caa => "CAA",
        }
    }

    /// Whether `content` holds a host name that the provider expects in FQDN form
    pub fn is_domain_valued(&self) -> bool {
        matches!(
            self,
            RecordType::Cname | RecordType::Mx | RecordType::Ns | RecordType::Srv
        )
    }

    /// Whether records of this type carry a priority
    pub fn uses_priority(&self) -> bool {
        matches!(self, RecordType::Mx | RecordType::Ns | RecordType::Srv)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::shape(format!("unsupported record type: {s}")))
    }
}

/// A single DNS record
///
/// Optional fields are only populated for the types that use them:
/// `priority` for MX/NS/SRV, `weight`/`port` for SRV, `flag`/`tag` for CAA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Zone the record lives in (e.g. "example.com")
    pub zone: String,
    /// Name relative to the zone ("@" for the apex)
    pub subname: String,
    /// Record type
    pub record_type: RecordType,
    /// Primary value; host names are stored without a trailing dot
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Record {
    /// Create a record, normalizing host-name content for domain-valued types
    pub fn new(
        zone: impl Into<String>,
        subname: impl Into<String>,
        record_type: RecordType,
        content: impl AsRef<str>,
    ) -> Self {
        let content = if record_type.is_domain_valued() {
            normalize_domain(content.as_ref())
        } else {
            content.as_ref().to_string()
        };

        Self {
            zone: zone.into(),
            subname: subname.into(),
            record_type,
            content,
            priority: None,
            weight: None,
            port: None,
            flag: None,
            tag: None,
        }
    }

    /// Set the priority discriminator (MX, NS)
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the SRV discriminators
    pub fn with_srv(mut self, priority: u16, weight: u16, port: u16) -> Self {
        self.priority = Some(priority);
        self.weight = Some(weight);
        self.port = Some(port);
        self
    }

    /// Set the CAA discriminators
    pub fn with_caa(mut self, flag: u8, tag: impl Into<String>) -> Self {
        self.flag = Some(flag);
        self.tag = Some(tag.into());
        self
    }

    /// Deterministic identity string
    ///
    /// Components are joined with `_`. Numbers are zero-padded so that
    /// lexical order of keys matches numeric order of the discriminators.
    pub fn canonical_key(&self) -> String {
        let mut parts: Vec<String> = vec![
            self.zone.clone(),
            self.subname.clone(),
            self.record_type.as_str().to_string(),
        ];

        if let Some(priority) = self.priority {
            parts.push(format!("{priority:05}"));
        }
        if let Some(weight) = self.weight {
            parts.push(format!("{weight:05}"));
        }
        if let Some(port) = self.port {
            parts.push(format!("{port:05}"));
        }
        if let Some(flag) = self.flag {
            parts.push(format!("{flag:03}"));
        }
        if let Some(tag) = &self.tag {
            parts.push(tag.clone());
        }
        parts.push(self.content.clone());

        parts.join(&KEY_SEPARATOR.to_string())
    }

    /// Content as it must be sent to the provider
    pub fn wire_content(&self) -> String {
        if self.record_type.is_domain_valued() {
            fqdn(&self.content)
        } else {
            self.content.clone()
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.zone, self.subname, self.record_type)?;
        if let Some(priority) = self.priority {
            write!(f, " {priority}")?;
        }
        if let (Some(weight), Some(port)) = (self.weight, self.port) {
            write!(f, " {weight} {port}")?;
        }
        if let Some(flag) = self.flag {
            write!(f, " {flag}")?;
        }
        if let Some(tag) = &self.tag {
            write!(f, " {tag}")?;
        }
        write!(f, " {}", self.content)
    }
}

/// Strip the trailing dot from a host name
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_string()
}

/// Append a trailing dot to a host name if missing
pub fn fqdn(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{domain}.")
    }
}

/// Split record content on whitespace, keeping double-quoted runs together
///
/// Quotes are removed from the returned tokens.
pub fn tokenize(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in content.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                    quoted = false;
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parse() {
        assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert_eq!(" CNAME ".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert!(matches!("SOA".parse::<RecordType>(), Err(Error::Shape(_))));
    }

    #[test]
    fn test_record_type_serde_uses_provider_tags() {
        let json = serde_json::to_string(&RecordType::Aaaa).unwrap();
        assert_eq!(json, "\"AAAA\"");
        let back: RecordType = serde_json::from_str("\"CAA\"").unwrap();
        assert_eq!(back, RecordType::Caa);
    }

    #[test]
    fn test_domain_content_is_normalized() {
        let mx = Record::new("example.com", "@", RecordType::Mx, "mail.example.com.");
        assert_eq!(mx.content, "mail.example.com");
        assert_eq!(mx.wire_content(), "mail.example.com.");

        let txt = Record::new("example.com", "@", RecordType::Txt, "v=spf1 -all.");
        assert_eq!(txt.content, "v=spf1 -all.");
        assert_eq!(txt.wire_content(), "v=spf1 -all.");
    }

    #[test]
    fn test_canonical_key_layout() {
        let a = Record::new("example.com", "www", RecordType::A, "1.1.1.1");
        assert_eq!(a.canonical_key(), "example.com_www_A_1.1.1.1");

        let mx = Record::new("example.com", "@", RecordType::Mx, "mx1.example.com").with_priority(5);
        assert_eq!(mx.canonical_key(), "example.com_@_MX_00005_mx1.example.com");

        let caa = Record::new("example.com", "@", RecordType::Caa, "letsencrypt.org").with_caa(0, "issue");
        assert_eq!(caa.canonical_key(), "example.com_@_CAA_000_issue_letsencrypt.org");
    }

    #[test]
    fn test_canonical_key_orders_numerically() {
        let low = Record::new("z", "@", RecordType::Mx, "b").with_priority(5);
        let high = Record::new("z", "@", RecordType::Mx, "a").with_priority(10);
        assert!(low.canonical_key() < high.canonical_key());
    }

    #[test]
    fn test_canonical_key_ignores_trailing_dot() {
        let a = Record::new("z", "@", RecordType::Cname, "target.example.com.");
        let b = Record::new("z", "@", RecordType::Cname, "target.example.com");
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize("0 issue \"letsencrypt.org\""),
            vec!["0", "issue", "letsencrypt.org"]
        );
        assert_eq!(
            tokenize("0   iodef \"mailto:ops team@example.com\""),
            vec!["0", "iodef", "mailto:ops team@example.com"]
        );
        assert_eq!(tokenize("a \"\" b"), vec!["a", "", "b"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_display_includes_discriminators() {
        let srv = Record::new("example.com", "_sip._tcp", RecordType::Srv, "sip.example.com.")
            .with_srv(10, 60, 5060);
        assert_eq!(srv.to_string(), "example.com/_sip._tcp SRV 10 60 5060 sip.example.com");
    }
}
