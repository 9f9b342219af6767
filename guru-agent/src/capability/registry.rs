//! Capability registry for tracking available capabilities.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::Capability;

/// Registry of available capabilities.
pub struct CapabilityRegistry {
    capabilities: Arc<RwLock<HashSet<Capability>>>,
    metadata: Arc<RwLock<HashMap<Capability, CapabilityMetadata>>>,
}

/// Metadata about a registered capability.
#[derive(Debug, Clone)]
pub struct CapabilityMetadata {
    /// Whether this capability is currently enabled
    pub enabled: bool,
    /// Custom timeout override (ms)
    pub timeout_ms: Option<u64>,
}

impl Default for CapabilityMetadata {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: None,
        }
    }
}

impl CapabilityRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            capabilities: Arc::new(RwLock::new(HashSet::new())),
            metadata: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry with every capability registered and enabled.
    pub async fn with_all() -> Self {
        let registry = Self::new();
        registry.register_all(Capability::all()).await;
        registry
    }

    pub async fn register(&self, capability: Capability) {
        self.capabilities.write().await.insert(capability);
        self.metadata
            .write()
            .await
            .entry(capability)
            .or_default();
    }

    pub async fn register_all(&self, capabilities: impl IntoIterator<Item = Capability>) {
        for cap in capabilities {
            self.register(cap).await;
        }
    }

    pub async fn has(&self, capability: Capability) -> bool {
        self.capabilities.read().await.contains(&capability)
    }

    /// Registered and enabled.
    pub async fn is_available(&self, capability: Capability) -> bool {
        if !self.has(capability).await {
            return false;
        }

        let meta = self.metadata.read().await;
        meta.get(&capability).map(|m| m.enabled).unwrap_or(false)
    }

    /// All registered capabilities, sorted.
    pub async fn all(&self) -> Vec<Capability> {
        let mut caps: Vec<_> = self.capabilities.read().await.iter().copied().collect();
        caps.sort();
        caps
    }

    /// Registered and enabled capabilities, sorted.
    pub async fn available(&self) -> Vec<Capability> {
        let caps = self.capabilities.read().await;
        let meta = self.metadata.read().await;

        let mut available: Vec<_> = caps
            .iter()
            .filter(|c| meta.get(c).map(|m| m.enabled).unwrap_or(true))
            .copied()
            .collect();
        available.sort();
        available
    }

    pub async fn set_enabled(&self, capability: Capability, enabled: bool) {
        if let Some(m) = self.metadata.write().await.get_mut(&capability) {
            m.enabled = enabled;
        }
    }

    pub async fn set_timeout(&self, capability: Capability, timeout_ms: u64) {
        if let Some(m) = self.metadata.write().await.get_mut(&capability) {
            m.timeout_ms = Some(timeout_ms);
        }
    }

    /// Apply one timeout to every registered capability.
    pub async fn set_timeout_all(&self, timeout_ms: u64) {
        for m in self.metadata.write().await.values_mut() {
            m.timeout_ms = Some(timeout_ms);
        }
    }

    /// Configured timeout, or twice the estimated time.
    pub async fn get_timeout(&self, capability: Capability) -> u64 {
        let meta = self.metadata.read().await;
        meta.get(&capability)
            .and_then(|m| m.timeout_ms)
            .unwrap_or_else(|| capability.estimated_time_ms() * 2)
    }

    pub async fn get_metadata(&self, capability: Capability) -> Option<CapabilityMetadata> {
        self.metadata.read().await.get(&capability).cloned()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
