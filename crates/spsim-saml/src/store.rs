//! Pending-login state.
//!
//! Two small stores back the login flow: a correlation store remembering
//! outstanding AuthnRequest IDs, and a one-shot relay parking received
//! responses between the ACS POST and the browser picking the result up.
//! Both are traits so a multi-instance deployment can swap the in-memory
//! implementations for a shared backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{SamlError, SamlResult};

/// Default lifetime of a parked response.
pub const DEFAULT_RELAY_TTL: Duration = Duration::from_secs(5 * 60);

/// Monotonic time source, swappable in tests.
pub trait Clock: Send + Sync {
    /// Elapsed time since the clock's origin.
    fn now(&self) -> Duration;
}

/// Monotonic wall clock.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for expiry tests.
pub struct ManualClock {
    now: std::sync::Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: std::sync::Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Store of the outstanding AuthnRequest ID per SP.
///
/// Each SP holds at most one outstanding request; starting a new login
/// overwrites the previous slot, so an abandoned tab cannot pile up
/// correlation state.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Records the request ID issued for the given SP, replacing any
    /// previous one.
    async fn put(&self, sp_id: &str, request_id: &str) -> SamlResult<()>;

    /// Consumes the SP's outstanding slot and reports whether it held
    /// this request ID.
    async fn take(&self, sp_id: &str, request_id: &str) -> SamlResult<bool>;
}

/// In-memory correlation store.
#[derive(Default)]
pub struct InMemoryCorrelationStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryCorrelationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CorrelationStore for InMemoryCorrelationStore {
    async fn put(&self, sp_id: &str, request_id: &str) -> SamlResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(sp_id.to_string(), request_id.to_string());
        Ok(())
    }

    async fn take(&self, sp_id: &str, request_id: &str) -> SamlResult<bool> {
        let mut entries = self.entries.lock().await;
        match entries.get(sp_id) {
            Some(outstanding) if outstanding == request_id => {
                entries.remove(sp_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// A response parked at the ACS, waiting to be picked up exactly once.
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    /// SP the response was posted to.
    pub sp_id: String,
    /// The `SAMLResponse` form value as received, still base64.
    pub saml_response: String,
    /// The `RelayState` form value, if any.
    pub relay_state: Option<String>,
}

/// One-shot store for responses received at the ACS.
#[async_trait]
pub trait ResponseRelay: Send + Sync {
    /// Parks a response under the given ID.
    async fn store(&self, response_id: &str, response: RelayedResponse) -> SamlResult<()>;

    /// Removes and returns a parked response.
    ///
    /// A second take of the same ID fails with [`SamlError::SessionNotFound`];
    /// a take past the TTL fails with [`SamlError::SessionExpired`].
    async fn take_once(&self, response_id: &str) -> SamlResult<RelayedResponse>;
}

/// In-memory one-shot relay with TTL eviction.
pub struct InMemoryResponseRelay {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Duration, RelayedResponse)>>,
}

impl InMemoryResponseRelay {
    /// Creates a relay with the given clock and entry lifetime.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a relay on the system clock with the default TTL.
    #[must_use]
    pub fn with_default_ttl() -> Self {
        Self::new(Arc::new(SystemClock::new()), DEFAULT_RELAY_TTL)
    }
}

#[async_trait]
impl ResponseRelay for InMemoryResponseRelay {
    async fn store(&self, response_id: &str, response: RelayedResponse) -> SamlResult<()> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        // Opportunistic sweep keeps abandoned logins from accumulating.
        entries.retain(|_, (deadline, _)| *deadline > now);

        debug!(response_id, sp_id = %response.sp_id, "Parked SAML response");
        entries.insert(response_id.to_string(), (now + self.ttl, response));
        Ok(())
    }

    async fn take_once(&self, response_id: &str) -> SamlResult<RelayedResponse> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let (deadline, response) = entries
            .remove(response_id)
            .ok_or(SamlError::SessionNotFound)?;

        if deadline <= now {
            return Err(SamlError::SessionExpired);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relayed(sp_id: &str) -> RelayedResponse {
        RelayedResponse {
            sp_id: sp_id.to_string(),
            saml_response: "cmVzcA==".to_string(),
            relay_state: None,
        }
    }

    #[tokio::test]
    async fn correlation_take_is_single_use() {
        let store = InMemoryCorrelationStore::new();
        store.put("sp1", "_req1").await.unwrap();

        assert!(store.take("sp1", "_req1").await.unwrap());
        assert!(!store.take("sp1", "_req1").await.unwrap());
    }

    #[tokio::test]
    async fn correlation_new_initiation_overwrites() {
        let store = InMemoryCorrelationStore::new();
        store.put("sp1", "_req1").await.unwrap();
        store.put("sp1", "_req2").await.unwrap();

        assert!(!store.take("sp1", "_req1").await.unwrap());
        // The stale take must not consume the live slot.
        assert!(store.take("sp1", "_req2").await.unwrap());
    }

    #[tokio::test]
    async fn correlation_is_scoped_per_sp() {
        let store = InMemoryCorrelationStore::new();
        store.put("sp1", "_req1").await.unwrap();

        assert!(!store.take("sp2", "_req1").await.unwrap());
        assert!(store.take("sp1", "_req1").await.unwrap());
    }

    #[tokio::test]
    async fn relay_take_is_one_shot() {
        let relay = InMemoryResponseRelay::with_default_ttl();
        relay.store("r1", relayed("sp1")).await.unwrap();

        let taken = relay.take_once("r1").await.unwrap();
        assert_eq!(taken.sp_id, "sp1");

        let err = relay.take_once("r1").await;
        assert!(matches!(err, Err(SamlError::SessionNotFound)));
    }

    #[tokio::test]
    async fn relay_entries_expire() {
        let clock = Arc::new(ManualClock::new());
        let relay = InMemoryResponseRelay::new(clock.clone(), Duration::from_secs(300));
        relay.store("r1", relayed("sp1")).await.unwrap();

        clock.advance(Duration::from_secs(299));
        relay.store("r2", relayed("sp2")).await.unwrap();

        clock.advance(Duration::from_secs(2));
        let err = relay.take_once("r1").await;
        assert!(matches!(err, Err(SamlError::SessionExpired)));

        assert_eq!(relay.take_once("r2").await.unwrap().sp_id, "sp2");
    }

    #[tokio::test]
    async fn unknown_response_id_is_not_found() {
        let relay = InMemoryResponseRelay::with_default_ttl();
        let err = relay.take_once("missing").await;
        assert!(matches!(err, Err(SamlError::SessionNotFound)));
    }
}
