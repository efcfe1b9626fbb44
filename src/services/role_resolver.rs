use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::database::{DatabaseError, RoleStore};
use crate::types::{Identity, Role};

struct CachedRole {
    /// `None` caches a confirmed "no role"
    role: Option<Role>,
    expires_at: Instant,
}

impl CachedRole {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Per-identity cache slot. `generation` changes on every invalidation so a
/// lookup that started before it cannot write its result back.
#[derive(Default)]
struct Slot {
    generation: u64,
    cached: Option<CachedRole>,
}

/// Resolves identities to roles through the role store, with a TTL cache in
/// front of it.
///
/// Lookups are bounded by a timeout; a slow or failing store resolves to
/// "no role" (fail closed) and nothing is cached for that attempt. Role
/// changes go through [`RoleResolver::change_role`], which evicts the cached
/// entry as soon as the store write returns.
pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
    slots: DashMap<Identity, Slot>,
    epoch: AtomicU64,
    ttl: Duration,
    lookup_timeout: Duration,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RoleStore>, ttl: Duration, lookup_timeout: Duration) -> Self {
        Self {
            store,
            slots: DashMap::new(),
            epoch: AtomicU64::new(0),
            ttl,
            lookup_timeout,
        }
    }

    pub async fn resolve(&self, identity: &Identity) -> Option<Role> {
        let seen_generation = match self.slots.get(identity) {
            Some(slot) => {
                if let Some(cached) = slot.cached.as_ref().filter(|c| !c.is_expired()) {
                    tracing::debug!("Role cache hit for '{}'", identity);
                    return cached.role;
                }
                slot.generation
            }
            None => 0,
        };

        let role = match tokio::time::timeout(self.lookup_timeout, self.store.find_role(identity)).await {
            Ok(Ok(role)) => role,
            Ok(Err(e)) => {
                tracing::warn!("Role lookup failed for '{}', denying: {}", identity, e);
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    "Role lookup for '{}' exceeded {:?}, denying",
                    identity,
                    self.lookup_timeout
                );
                return None;
            }
        };

        let mut slot = self.slots.entry(identity.clone()).or_default();
        if slot.generation == seen_generation {
            slot.cached = Some(CachedRole {
                role,
                expires_at: Instant::now() + self.ttl,
            });
        } else {
            tracing::debug!("Role for '{}' changed during lookup, not caching", identity);
        }

        role
    }

    /// Drop the cached role for an identity immediately
    pub fn invalidate(&self, identity: &Identity) {
        let generation = self.epoch.fetch_add(1, Ordering::Relaxed) + 1;
        let mut slot = self.slots.entry(identity.clone()).or_default();
        slot.generation = generation;
        slot.cached = None;
    }

    /// Administrator role change: write through to the store, then evict.
    /// Returns false when the identity has no account.
    pub async fn change_role(&self, identity: &Identity, role: Role) -> Result<bool, DatabaseError> {
        let result = self.store.set_role(identity, role).await;
        self.invalidate(identity);

        if let Ok(true) = result {
            tracing::info!("Role for '{}' changed to {}", identity, role);
        }
        result
    }

    /// Remove expired entries. Slots that were invalidated are kept so their
    /// generation keeps guarding in-flight lookups.
    pub fn purge_expired(&self) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| !matches!(&slot.cached, Some(cached) if cached.is_expired()));
        before.saturating_sub(self.slots.len())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
