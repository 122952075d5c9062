//! Resource manager
//!
//! The uniform CRUD+Import surface the host talks to. Each call looks up the
//! strategy for the resource's kind and runs it against the shared
//! [`CachedClient`].
//!
//! [`ResourceManager::reconcile`] strings those calls together the way a
//! host applying a manifest would:
//!
//! ```text
//! read observed ──absent──► create
//!        │
//!        └─present──► plan(observed, desired) ──empty──► unchanged
//!                              │
//!                              └──► update (or delete + create when the
//!                                   kind has no update)
//! ```

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CachedClient, ZoneCache};
use crate::engine::Diff;
use crate::error::{Error, Result};
use crate::registry::StrategyRegistry;
use crate::resource::{RecordData, ResourceKind, ResourceState};
use crate::traits::{DnsApiClient, RecordStrategy};

/// Whether reconciliation writes or only reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Compute changes without writing
    Plan,
    /// Compute and apply changes
    Apply,
}

/// What reconciliation did (or would do) for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Observed state already matches
    Unchanged,
    /// Resource did not exist and was created
    Created { added: usize },
    /// Only the changed records were written
    Updated { added: usize, removed: usize },
    /// Kind has no update; resource was deleted and recreated
    Replaced { added: usize, removed: usize },
    /// Plan mode: the changes that apply would make
    Planned { create: bool, diff: Diff },
}

/// Result of reconciling one resource
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub outcome: ReconcileOutcome,
    /// State after reconciliation (the observed state in plan mode)
    pub state: ResourceState,
}

/// Dispatches resource operations to strategies
#[derive(Clone)]
pub struct ResourceManager {
    strategies: Arc<StrategyRegistry>,
    client: CachedClient,
}

impl ResourceManager {
    /// Manager with the built-in strategies and a fresh default cache
    pub fn new(client: Arc<dyn DnsApiClient>) -> Self {
        Self::with_parts(
            Arc::new(StrategyRegistry::with_defaults()),
            CachedClient::new(client, ZoneCache::new()),
        )
    }

    /// Manager from explicit parts
    pub fn with_parts(strategies: Arc<StrategyRegistry>, client: CachedClient) -> Self {
        Self { strategies, client }
    }

    /// The cached client shared by every operation
    pub fn client(&self) -> &CachedClient {
        &self.client
    }

    /// Strategy for a kind
    pub fn strategy(&self, kind: ResourceKind) -> Result<Arc<dyn RecordStrategy>> {
        self.strategies.get(kind)
    }

    /// Build a resource from untyped host input
    ///
    /// # Returns
    ///
    /// - `Err(Error::Shape)`: `value` does not match `kind`'s shape
    pub fn declare(
        &self,
        kind: ResourceKind,
        zone: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Result<ResourceState> {
        let data = RecordData::from_value(kind, value)?;
        Ok(ResourceState::new(zone, name, data))
    }

    pub async fn create(&self, resource: &mut ResourceState) -> Result<()> {
        self.strategy(resource.kind())?
            .create(&self.client, resource)
            .await
    }

    pub async fn read(&self, resource: &mut ResourceState) -> Result<()> {
        self.strategy(resource.kind())?
            .read(&self.client, resource)
            .await
    }

    pub async fn update(&self, prior: &ResourceState, resource: &mut ResourceState) -> Result<()> {
        if prior.kind() != resource.kind() {
            return Err(Error::shape(format!(
                "cannot update {} into {}",
                prior.kind(),
                resource.kind()
            )));
        }
        self.strategy(resource.kind())?
            .update(&self.client, prior, resource)
            .await
    }

    pub async fn delete(&self, resource: &mut ResourceState) -> Result<()> {
        self.strategy(resource.kind())?
            .delete(&self.client, resource)
            .await
    }

    /// Import an existing resource from a `zone/name` identifier
    pub async fn import(&self, kind: ResourceKind, id: &str) -> Result<ResourceState> {
        self.strategy(kind)?.import(&self.client, id).await
    }

    /// Writes needed to move from `prior` to `resource`
    pub fn plan(&self, prior: &ResourceState, resource: &ResourceState) -> Result<Diff> {
        self.strategy(resource.kind())?.plan(prior, resource)
    }

    /// Drop every cached zone listing
    pub async fn clear_cache(&self) {
        self.client.cache().clear().await;
    }

    /// Bring one resource to its declared state
    pub async fn reconcile(
        &self,
        desired: ResourceState,
        mode: ReconcileMode,
    ) -> Result<Reconciliation> {
        let strategy = self.strategy(desired.kind())?;
        strategy.validate(&desired.data)?;

        let mut observed = desired.clone();
        strategy.read(&self.client, &mut observed).await?;

        if !observed.is_present() {
            let mut absent = desired.clone();
            absent.data = RecordData::empty(desired.kind());
            let diff = strategy.plan(&absent, &desired)?;

            if mode == ReconcileMode::Plan {
                return Ok(Reconciliation {
                    outcome: ReconcileOutcome::Planned { create: true, diff },
                    state: observed,
                });
            }

            let mut state = desired;
            strategy.create(&self.client, &mut state).await?;
            return Ok(Reconciliation {
                outcome: ReconcileOutcome::Created {
                    added: diff.to_add.len(),
                },
                state,
            });
        }

        let diff = strategy.plan(&observed, &desired)?;
        if diff.is_empty() {
            debug!(zone = %desired.zone, name = %desired.name, "Resource up to date");
            return Ok(Reconciliation {
                outcome: ReconcileOutcome::Unchanged,
                state: observed,
            });
        }

        if mode == ReconcileMode::Plan {
            return Ok(Reconciliation {
                outcome: ReconcileOutcome::Planned {
                    create: false,
                    diff,
                },
                state: observed,
            });
        }

        let mut state = desired;
        match strategy.update(&self.client, &observed, &mut state).await {
            Ok(()) => Ok(Reconciliation {
                outcome: ReconcileOutcome::Updated {
                    added: diff.to_add.len(),
                    removed: diff.to_remove.len(),
                },
                state,
            }),
            Err(Error::Unsupported { .. }) => {
                info!(
                    kind = %state.kind(),
                    zone = %state.zone,
                    name = %state.name,
                    "Kind has no update, replacing resource"
                );
                let removed = strategy.expand(&observed)?.len();
                let mut old = observed;
                strategy.delete(&self.client, &mut old).await?;
                strategy.create(&self.client, &mut state).await?;
                Ok(Reconciliation {
                    outcome: ReconcileOutcome::Replaced {
                        added: strategy.expand(&state)?.len(),
                        removed,
                    },
                    state,
                })
            }
            Err(e) => Err(e),
        }
    }
}
