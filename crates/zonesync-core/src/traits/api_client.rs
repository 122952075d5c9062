// # DNS API Client Trait
//
// The boundary between the reconciliation core and a provider's remote API.
//
// ## Implementations
//
// - Reg.ru: `zonesync-provider-regru` crate
//
// ## Contract
//
// Every method performs exactly one API call and returns the provider's raw
// JSON response. The core decodes and checks those bytes itself (see
// `crate::wire`), so implementations only need to map transport failures to
// `Error::Transport`. An implementation may also reject an error answer
// early as `Error::Provider`, keeping the provider's error code intact.
// Implementations must not retry or cache.

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::record::RecordType;
use crate::Error;

/// Trait for remote DNS API clients
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsApiClient: Send + Sync {
    /// Add a single record of a simple or priority-carrying type
    ///
    /// # Parameters
    ///
    /// - `record_type`: Record type to create
    /// - `zone`: Zone name (e.g., "example.com")
    /// - `subname`: Name relative to the zone ("@" for the apex)
    /// - `value`: Record content in provider syntax (FQDN for host names)
    /// - `priority`: Priority for MX and NS records
    ///
    /// # Returns
    ///
    /// - `Ok(bytes)`: Raw provider response
    /// - `Err(Error)`: If the request could not be performed
    async fn add_record(
        &self,
        record_type: RecordType,
        zone: &str,
        subname: &str,
        value: &str,
        priority: Option<u16>,
    ) -> Result<Vec<u8>, Error>;

    /// Remove a single record
    ///
    /// `priority` is only sent for MX, NS and SRV records.
    async fn remove_record(
        &self,
        zone: &str,
        subname: &str,
        record_type: RecordType,
        content: &str,
        priority: Option<u16>,
    ) -> Result<Vec<u8>, Error>;

    /// Add an SRV record
    async fn add_srv_record(
        &self,
        zone: &str,
        subname: &str,
        target: &str,
        priority: u16,
        weight: u16,
        port: u16,
    ) -> Result<Vec<u8>, Error>;

    /// Remove an SRV record
    async fn remove_srv_record(
        &self,
        zone: &str,
        subname: &str,
        target: &str,
        priority: u16,
        weight: u16,
        port: u16,
    ) -> Result<Vec<u8>, Error>;

    /// Add a CAA record
    async fn add_caa_record(
        &self,
        zone: &str,
        subname: &str,
        value: &str,
        flag: u8,
        tag: &str,
    ) -> Result<Vec<u8>, Error>;

    /// Remove a CAA record
    async fn remove_caa_record(
        &self,
        zone: &str,
        subname: &str,
        value: &str,
        flag: u8,
        tag: &str,
    ) -> Result<Vec<u8>, Error>;

    /// Fetch every record in a zone
    ///
    /// # Returns
    ///
    /// Raw provider response with `answer.domains[].rrs[]`
    async fn get_records(&self, zone: &str) -> Result<Vec<u8>, Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing API clients from configuration
pub trait DnsApiClientFactory: Send + Sync {
    /// Create a client from provider configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed DnsApiClient trait object
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsApiClient>, Error>;
}
