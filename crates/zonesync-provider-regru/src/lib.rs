// # Reg.ru DNS API Client
//
// This crate provides the Reg.ru API v2 client used by the zonesync core.
//
// ## Behavior
//
// - One HTTP request per trait call (form-encoded POST)
// - Credentials and `output_content_type=plain` are sent with every request
// - Error answers are surfaced as `Error::Provider` with an actionable hint
// - Network and HTTP status failures are surfaced as `Error::Transport`
// - NO retry logic (a failed write aborts the operation in the core)
// - NO caching (zone listings are cached by the core's `ZoneCache`)
//
// ## Security Requirements
//
// - The password NEVER appears in logs or Debug output
// - Client construction fails fast if credentials are empty
//
// ## API Reference
//
// - Reg.ru API v2: https://www.reg.ru/reseller/api2doc
// - Add records: POST `/zone/add_alias`, `/zone/add_aaaa`, `/zone/add_cname`,
//   `/zone/add_mx`, `/zone/add_ns`, `/zone/add_txt`, `/zone/add_srv`,
//   `/zone/add_caa`
// - Remove record: POST `/zone/remove_record`
// - List records: POST `/zone/get_resource_records`

use async_trait::async_trait;
use std::time::Duration;
use zonesync_core::config::{DEFAULT_REGRU_API_URL, ProviderConfig};
use zonesync_core::record::RecordType;
use zonesync_core::registry::ClientRegistry;
use zonesync_core::traits::{DnsApiClient, DnsApiClientFactory};
use zonesync_core::wire::check_response;
use zonesync_core::{Error, Result};

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider type name used in configuration and the registry
pub const PROVIDER_NAME: &str = "regru";

/// Reg.ru API v2 client
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct RegruClient {
    /// Account login
    username: String,

    /// Account password
    /// ⚠️ NEVER log this value
    password: String,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for RegruClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegruClient")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RegruClient {
    /// Create a new Reg.ru client
    ///
    /// # Parameters
    ///
    /// - `username`: Account login
    /// - `password`: Account password (or API password)
    /// - `base_url`: API base URL, [`DEFAULT_REGRU_API_URL`] when `None`
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: empty credentials or the HTTP client could not
    ///   be built
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();

        if username.is_empty() {
            return Err(Error::config("Reg.ru username cannot be empty"));
        }
        if password.is_empty() {
            return Err(Error::config("Reg.ru password cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_REGRU_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            username,
            password,
            base_url,
            client,
        })
    }

    /// API base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one API call
    ///
    /// # Returns
    ///
    /// - `Ok(bytes)`: raw response body reporting success
    /// - `Err(Error::Provider)`: the API answered with an error
    /// - `Err(Error::Transport)`: the request failed or returned a non-2xx status
    async fn call(&self, endpoint: &str, mut params: Vec<(&'static str, String)>) -> Result<Vec<u8>> {
        params.push(("username", self.username.clone()));
        params.push(("password", self.password.clone()));
        params.push(("output_content_type", "plain".to_string()));

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, "Calling Reg.ru API");

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::transport(endpoint, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::transport(
                endpoint,
                format!("HTTP {status}: {body}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(endpoint, format!("Failed to read response: {e}")))?
            .to_vec();

        match check_response(&bytes) {
            Ok(()) => Ok(bytes),
            Err(Error::Provider { domain, code, text }) => {
                tracing::debug!(endpoint, code = %code, "Reg.ru API returned an error");
                Err(Error::provider(domain, code.clone(), explain(&code, &text)))
            }
            Err(e) => Err(e),
        }
    }

    fn record_params(zone: &str, subname: &str) -> Vec<(&'static str, String)> {
        vec![
            ("domain_name", zone.to_string()),
            ("subdomain", subname.to_string()),
        ]
    }
}

/// Add an actionable hint to a provider error text
///
/// Unknown codes keep the provider's own text.
pub fn explain(code: &str, text: &str) -> String {
    let hint = match code {
        "ACCESS_DENIED_FROM_IP" => {
            "API access denied from this IP address. Add it to the allowed IP list in the Reg.ru account API settings"
        }
        "IP_EXCEEDED_ALLOWED_CONNECTION_RATE" => {
            "Too many requests from this IP address. Wait a few minutes before retrying"
        }
        "INVALID_USERNAME_OR_PASSWORD" => "Invalid username or password. Check the API credentials",
        "DOMAIN_NOT_FOUND" => "Domain not found in this Reg.ru account",
        "RECORD_NOT_FOUND" | "RR_NOT_FOUND" => "DNS record not found",
        "INVALID_RECORD_TYPE" => "Record type is not supported for this zone",
        "DUPLICATE_RECORD" => "An identical record already exists",
        "INVALID_IP_ADDRESS" => "Invalid IP address in record content",
        "RATE_LIMIT_EXCEEDED" => "API rate limit exceeded. Retry later",
        _ => return text.to_string(),
    };

    if text.is_empty() {
        hint.to_string()
    } else {
        format!("{hint} ({text})")
    }
}

/// Endpoint and value parameter for simple and priority record types
fn add_endpoint(record_type: RecordType) -> Option<(&'static str, &'static str)> {
    match record_type {
        RecordType::A => Some(("zone/add_alias", "ipaddr")),
        RecordType::Aaaa => Some(("zone/add_aaaa", "ipaddr")),
        RecordType::Cname => Some(("zone/add_cname", "canonical_name")),
        RecordType::Mx => Some(("zone/add_mx", "mail_server")),
        RecordType::Ns => Some(("zone/add_ns", "dns_server")),
        RecordType::Txt => Some(("zone/add_txt", "text")),
        RecordType::Srv | RecordType::Caa => None,
    }
}

#[async_trait]
impl DnsApiClient for RegruClient {
    async fn add_record(
        &self,
        record_type: RecordType,
        zone: &str,
        subname: &str,
        value: &str,
        priority: Option<u16>,
    ) -> Result<Vec<u8>> {
        let (endpoint, value_param) = add_endpoint(record_type)
            .ok_or_else(|| Error::unsupported("add_record", record_type.as_str()))?;

        let mut params = Self::record_params(zone, subname);
        params.push((value_param, value.to_string()));
        if let Some(priority) = priority
            && matches!(record_type, RecordType::Mx | RecordType::Ns)
        {
            params.push(("priority", priority.to_string()));
        }

        tracing::info!(zone, subname, record_type = %record_type, "Adding record");
        self.call(endpoint, params).await
    }

    async fn remove_record(
        &self,
        zone: &str,
        subname: &str,
        record_type: RecordType,
        content: &str,
        priority: Option<u16>,
    ) -> Result<Vec<u8>> {
        let mut params = Self::record_params(zone, subname);
        params.push(("record_type", record_type.as_str().to_string()));
        params.push(("content", content.to_string()));
        if let Some(priority) = priority
            && record_type.uses_priority()
        {
            params.push(("priority", priority.to_string()));
        }

        tracing::info!(zone, subname, record_type = %record_type, "Removing record");
        self.call("zone/remove_record", params).await
    }

    async fn add_srv_record(
        &self,
        zone: &str,
        subname: &str,
        target: &str,
        priority: u16,
        weight: u16,
        port: u16,
    ) -> Result<Vec<u8>> {
        let mut params = Self::record_params(zone, subname);
        params.push(("target", target.to_string()));
        params.push(("priority", priority.to_string()));
        params.push(("weight", weight.to_string()));
        params.push(("port", port.to_string()));

        tracing::info!(zone, subname, record_type = "SRV", "Adding record");
        self.call("zone/add_srv", params).await
    }

    async fn remove_srv_record(
        &self,
        zone: &str,
        subname: &str,
        target: &str,
        priority: u16,
        weight: u16,
        port: u16,
    ) -> Result<Vec<u8>> {
        let mut params = Self::record_params(zone, subname);
        params.push(("record_type", "SRV".to_string()));
        params.push(("content", target.to_string()));
        params.push(("priority", priority.to_string()));
        params.push(("weight", weight.to_string()));
        params.push(("port", port.to_string()));

        tracing::info!(zone, subname, record_type = "SRV", "Removing record");
        self.call("zone/remove_record", params).await
    }

    async fn add_caa_record(
        &self,
        zone: &str,
        subname: &str,
        value: &str,
        flag: u8,
        tag: &str,
    ) -> Result<Vec<u8>> {
        let mut params = Self::record_params(zone, subname);
        params.push(("value", value.to_string()));
        params.push(("flags", flag.to_string()));
        params.push(("tag", if tag.is_empty() { "issue" } else { tag }.to_string()));

        tracing::info!(zone, subname, record_type = "CAA", "Adding record");
        self.call("zone/add_caa", params).await
    }

    async fn remove_caa_record(
        &self,
        zone: &str,
        subname: &str,
        value: &str,
        flag: u8,
        tag: &str,
    ) -> Result<Vec<u8>> {
        let mut params = Self::record_params(zone, subname);
        params.push(("record_type", "CAA".to_string()));
        params.push(("content", value.to_string()));
        params.push(("flags", flag.to_string()));
        params.push(("tag", if tag.is_empty() { "issue" } else { tag }.to_string()));

        tracing::info!(zone, subname, record_type = "CAA", "Removing record");
        self.call("zone/remove_record", params).await
    }

    async fn get_records(&self, zone: &str) -> Result<Vec<u8>> {
        tracing::debug!(zone, "Fetching zone records");
        self.call("zone/get_resource_records", vec![("dname", zone.to_string())])
            .await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Reg.ru clients
pub struct RegruFactory;

impl DnsApiClientFactory for RegruFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsApiClient>> {
        match config {
            ProviderConfig::Regru {
                username,
                password,
                api_url,
            } => Ok(Box::new(RegruClient::new(
                username.clone(),
                password.clone(),
                api_url.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for Reg.ru provider")),
        }
    }
}

/// Register the Reg.ru client with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ClientRegistry;
///
/// let registry = ClientRegistry::new();
/// zonesync_provider_regru::register(&registry);
/// assert!(registry.has_client("regru"));
/// ```
pub fn register(registry: &ClientRegistry) {
    registry.register_client(PROVIDER_NAME, Box::new(RegruFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zonesync_core::{RecordData, ResourceKind, ResourceManager, ResourceState};

    fn success() -> serde_json::Value {
        json!({
            "result": "success",
            "answer": { "domains": [ { "dname": "example.com", "result": "success" } ] }
        })
    }

    fn client(server: &MockServer) -> RegruClient {
        RegruClient::new("test", "secret_password_123", Some(server.uri())).unwrap()
    }

    #[test]
    fn test_factory_creation() {
        let config = ProviderConfig::Regru {
            username: "test".to_string(),
            password: "test".to_string(),
            api_url: None,
        };

        let client = RegruFactory.create(&config).unwrap();
        assert_eq!(client.provider_name(), "regru");
    }

    #[test]
    fn test_factory_missing_credentials() {
        let config = ProviderConfig::Regru {
            username: "test".to_string(),
            password: String::new(),
            api_url: None,
        };
        assert!(matches!(RegruFactory.create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_register() {
        let registry = ClientRegistry::new();
        register(&registry);
        assert!(registry.has_client("regru"));
    }

    #[test]
    fn test_password_not_exposed_in_debug() {
        let client = RegruClient::new("user", "secret_password_123", None).unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret_password_123"));
        assert!(debug_str.contains("RegruClient"));
        assert_eq!(client.base_url(), DEFAULT_REGRU_API_URL);
    }

    #[test]
    fn test_explain() {
        assert!(explain("ACCESS_DENIED_FROM_IP", "denied").contains("allowed IP list"));
        assert!(explain("ACCESS_DENIED_FROM_IP", "denied").ends_with("(denied)"));
        assert_eq!(explain("SOMETHING_ELSE", "raw text"), "raw text");
    }

    #[tokio::test]
    async fn test_add_a_record_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zone/add_alias"))
            .and(body_string_contains("domain_name=example.com"))
            .and(body_string_contains("subdomain=www"))
            .and(body_string_contains("ipaddr=1.1.1.1"))
            .and(body_string_contains("username=test"))
            .and(body_string_contains("output_content_type=plain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success()))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .add_record(RecordType::A, "example.com", "www", "1.1.1.1", None)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_add_mx_sends_priority() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zone/add_mx"))
            .and(body_string_contains("mail_server=mx.example.com."))
            .and(body_string_contains("priority=10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success()))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .add_record(RecordType::Mx, "example.com", "@", "mx.example.com.", Some(10))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_remove_srv_sends_discriminators() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zone/remove_record"))
            .and(body_string_contains("record_type=SRV"))
            .and(body_string_contains("priority=10"))
            .and(body_string_contains("weight=5"))
            .and(body_string_contains("port=5060"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success()))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .remove_srv_record("example.com", "_sip._tcp", "sip.example.com.", 10, 5, 5060)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_add_srv_and_caa_through_generic_call_is_unsupported() {
        let server = MockServer::start().await;
        let result = client(&server)
            .add_record(RecordType::Srv, "example.com", "_sip._tcp", "x", None)
            .await;
        assert!(matches!(result, Err(Error::Unsupported { .. })));
    }

    #[tokio::test]
    async fn test_error_response_has_hint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zone/get_resource_records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "error",
                "error_code": "ACCESS_DENIED_FROM_IP",
                "error_text": "Access to API from this IP denied"
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_records("example.com").await.unwrap_err();
        match err {
            Error::Provider { code, text, .. } => {
                assert_eq!(code, "ACCESS_DENIED_FROM_IP");
                assert!(text.contains("allowed IP list"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_record_on_remove_is_recognizable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zone/remove_record"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "answer": { "domains": [
                    { "dname": "example.com", "result": "error", "error_code": "RR_NOT_FOUND" }
                ] }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .remove_record("example.com", "www", RecordType::A, "1.1.1.1", None)
            .await
            .unwrap_err();
        assert!(err.is_record_not_found());
    }

    #[tokio::test]
    async fn test_http_status_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).get_records("example.com").await.unwrap_err();
        assert!(matches!(err, Error::Transport { ref message, .. } if message.contains("503")));
    }

    #[tokio::test]
    async fn test_manager_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zone/get_resource_records"))
            .and(body_string_contains("dname=example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "answer": { "domains": [ {
                    "dname": "example.com",
                    "result": "success",
                    "rrs": [
                        { "subname": "www", "rectype": "A", "content": "1.1.1.1", "prio": "0", "state": "A" },
                        { "subname": "www", "rectype": "A", "content": "2.2.2.2", "prio": 0, "state": "A" }
                    ]
                } ] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = ResourceManager::new(Arc::new(client(&server)));
        let imported = manager.import(ResourceKind::A, "example.com/www").await.unwrap();
        assert_eq!(
            imported.data,
            RecordData::A {
                records: vec!["1.1.1.1".to_string(), "2.2.2.2".to_string()]
            }
        );

        // Served from cache.
        let mut again = ResourceState::new("example.com", "www", RecordData::empty(ResourceKind::A));
        manager.read(&mut again).await.unwrap();
        assert!(again.is_present());
    }
}
