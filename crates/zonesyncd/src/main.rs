// # zonesyncd - Zone reconciliation host
//
// A THIN integration layer over zonesync-core:
//
// 1. Read settings from environment variables
// 2. Load and validate the JSON manifest
// 3. Register provider clients and build the resource manager
// 4. Reconcile every declared resource, then print the resulting states
//
// All DNS logic lives in zonesync-core. This binary holds none.
//
// ## Configuration
//
// - `ZONESYNC_MANIFEST`: Path to the JSON manifest (required)
// - `ZONESYNC_MODE`: `plan` (default, no writes) or `apply`
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `ZONESYNC_USERNAME` / `ZONESYNC_PASSWORD`: Reg.ru credentials, override
//   the manifest so secrets can stay out of it
// - `ZONESYNC_API_URL`: Reg.ru API base URL override
// - `ZONESYNC_CACHE_TTL_SECS`: Zone cache TTL override
//
// ## Example
//
// ```bash
// export ZONESYNC_MANIFEST=/etc/zonesync/zones.json
// export ZONESYNC_USERNAME=user
// export ZONESYNC_PASSWORD=secret
// export ZONESYNC_MODE=apply
//
// zonesyncd
// ```

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{
    CachedClient, ClientRegistry, ProviderConfig, ReconcileMode, ReconcileOutcome,
    ResourceManager, ResourceState, StrategyRegistry, ZoneCache, ZonesyncConfig,
};

/// Exit codes for different termination scenarios
///
/// - 0: Every resource reconciled
/// - 1: Configuration or startup error
/// - 2: Runtime error (at least one resource failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// All resources reconciled
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Host settings read from the environment
#[derive(Debug)]
struct Config {
    manifest_path: PathBuf,
    mode: ReconcileMode,
    log_level: String,
    username: Option<String>,
    password: Option<String>,
    api_url: Option<String>,
    cache_ttl_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest_path = lookup("ZONESYNC_MANIFEST")
            .filter(|p| !p.is_empty())
            .context(
                "ZONESYNC_MANIFEST is required. \
                Set it via: export ZONESYNC_MANIFEST=/etc/zonesync/zones.json",
            )?;

        let mode = match lookup("ZONESYNC_MODE")
            .unwrap_or_else(|| "plan".to_string())
            .to_lowercase()
            .as_str()
        {
            "plan" => ReconcileMode::Plan,
            "apply" => ReconcileMode::Apply,
            other => anyhow::bail!(
                "ZONESYNC_MODE '{}' is not valid. Valid modes: plan, apply",
                other
            ),
        };

        let cache_ttl_secs = match lookup("ZONESYNC_CACHE_TTL_SECS") {
            Some(raw) => Some(raw.parse::<u64>().with_context(|| {
                format!("ZONESYNC_CACHE_TTL_SECS must be a number of seconds. Got: {raw}")
            })?),
            None => None,
        };

        Ok(Self {
            manifest_path: PathBuf::from(manifest_path),
            mode,
            log_level: lookup("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            username: lookup("ZONESYNC_USERNAME").filter(|s| !s.is_empty()),
            password: lookup("ZONESYNC_PASSWORD").filter(|s| !s.is_empty()),
            api_url: lookup("ZONESYNC_API_URL").filter(|s| !s.is_empty()),
            cache_ttl_secs,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.manifest_path.is_file() {
            anyhow::bail!(
                "ZONESYNC_MANIFEST does not point to a file: {}",
                self.manifest_path.display()
            );
        }

        if let Some(ttl) = self.cache_ttl_secs
            && !(1..=3600).contains(&ttl)
        {
            anyhow::bail!(
                "ZONESYNC_CACHE_TTL_SECS must be between 1 and 3600 seconds. Got: {}",
                ttl
            );
        }

        if let Some(ref url) = self.api_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!(
                "ZONESYNC_API_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Load the manifest and apply environment overrides
fn load_manifest(config: &Config) -> Result<ZonesyncConfig> {
    let mut manifest = ZonesyncConfig::load(&config.manifest_path)?;

    if let ProviderConfig::Regru {
        username,
        password,
        api_url,
    } = &mut manifest.provider
    {
        if let Some(value) = &config.username {
            *username = value.clone();
        }
        if let Some(value) = &config.password {
            *password = value.clone();
        }
        if config.api_url.is_some() {
            api_url.clone_from(&config.api_url);
        }
    }

    if let Some(ttl) = config.cache_ttl_secs {
        manifest.cache.ttl_secs = ttl;
    }

    manifest.validate()?;
    Ok(manifest)
}

/// Registry with every provider compiled into this binary
fn client_registry() -> ClientRegistry {
    let registry = ClientRegistry::new();

    #[cfg(feature = "regru")]
    {
        info!("Registering Reg.ru client");
        zonesync_provider_regru::register(&registry);
    }

    registry
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let manifest = match load_manifest(&config) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Manifest error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    info!(
        mode = ?config.mode,
        resources = manifest.resources.len(),
        provider = manifest.provider.type_name(),
        "Starting zonesyncd"
    );

    let manager = match build_manager(&client_registry(), &manifest) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to create API client: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(reconcile_all(manager, &manifest, config.mode));

    match result {
        Ok(states) => {
            match serde_json::to_string_pretty(&states) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!("Failed to render resource states: {}", e),
            }
            ZonesyncExitCode::CleanShutdown.into()
        }
        Err(e) => {
            error!("Reconciliation failed: {:#}", e);
            ZonesyncExitCode::RuntimeError.into()
        }
    }
}

/// Build the resource manager for a manifest
fn build_manager(registry: &ClientRegistry, manifest: &ZonesyncConfig) -> Result<ResourceManager> {
    let client = registry.create_client(&manifest.provider)?;
    let client = CachedClient::new(Arc::from(client), ZoneCache::with_ttl(manifest.cache.ttl()));
    Ok(ResourceManager::with_parts(
        Arc::new(StrategyRegistry::with_defaults()),
        client,
    ))
}

/// Reconcile every manifest resource concurrently
///
/// Failures are logged per resource; the run fails if any resource failed.
async fn reconcile_all(
    manager: ResourceManager,
    manifest: &ZonesyncConfig,
    mode: ReconcileMode,
) -> Result<Vec<ResourceState>> {
    let mut tasks = JoinSet::new();

    for (index, resource) in manifest.resources.iter().enumerate() {
        let manager = manager.clone();
        let desired = resource.to_state();
        tasks.spawn(async move { (index, manager.reconcile(desired, mode).await) });
    }

    let mut states: Vec<Option<ResourceState>> = vec![None; manifest.resources.len()];
    let mut failures = 0usize;

    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.context("reconcile task panicked")?;
        let resource = &manifest.resources[index];

        match result {
            Ok(reconciliation) => {
                info!(
                    kind = %resource.kind(),
                    zone = %resource.zone,
                    name = %resource.name,
                    "{}",
                    describe(&reconciliation.outcome)
                );
                states[index] = Some(reconciliation.state);
            }
            Err(e) => {
                failures += 1;
                error!(
                    kind = %resource.kind(),
                    zone = %resource.zone,
                    name = %resource.name,
                    "Reconciliation failed: {}",
                    e
                );
            }
        }
    }

    if failures > 0 {
        anyhow::bail!(
            "{} of {} resource(s) failed to reconcile",
            failures,
            manifest.resources.len()
        );
    }

    Ok(states.into_iter().flatten().collect())
}

/// One-line summary of an outcome
fn describe(outcome: &ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::Unchanged => "Up to date".to_string(),
        ReconcileOutcome::Created { added } => format!("Created ({added} record(s))"),
        ReconcileOutcome::Updated { added, removed } => {
            format!("Updated (+{added} -{removed})")
        }
        ReconcileOutcome::Replaced { added, removed } => {
            format!("Replaced (+{added} -{removed})")
        }
        ReconcileOutcome::Planned { create, diff } => format!(
            "Would {} (+{} -{})",
            if *create { "create" } else { "update" },
            diff.to_add.len(),
            diff.to_remove.len()
        ),
    }
}
