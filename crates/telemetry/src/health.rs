//! Component health for the readiness and health endpoints.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Checks slower than this report the component as degraded.
pub const SLOW_CHECK_MS: u64 = 1_000;

/// Health status for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_serving(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }
}

/// Component health state.
#[derive(Debug)]
pub struct ComponentHealth {
    name: &'static str,
    healthy: AtomicBool,
    latency_ms: AtomicU64,
    message: parking_lot::RwLock<Option<String>>,
}

impl ComponentHealth {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            healthy: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            message: parking_lot::RwLock::new(None),
        }
    }

    pub fn set_healthy(&self, latency_ms: u64) {
        self.healthy.store(true, Ordering::Relaxed);
        self.latency_ms.store(latency_ms, Ordering::Relaxed);
        *self.message.write() = None;
    }

    pub fn set_unhealthy(&self, msg: impl Into<String>) {
        self.healthy.store(false, Ordering::Relaxed);
        *self.message.write() = Some(msg.into());
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> Option<String> {
        self.message.read().clone()
    }

    fn status(&self) -> HealthStatus {
        if !self.is_healthy() {
            HealthStatus::Unhealthy
        } else if self.latency_ms() > SLOW_CHECK_MS {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    fn report(&self) -> ComponentHealthReport {
        ComponentHealthReport {
            name: self.name.to_string(),
            status: self.status(),
            latency_ms: self.latency_ms(),
            message: self.message(),
        }
    }
}

/// Aggregated health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealthReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealthReport {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub message: Option<String>,
}

/// Health of the components the service depends on.
pub struct HealthRegistry {
    pub clickhouse: ComponentHealth,
}

impl HealthRegistry {
    pub const fn new() -> Self {
        Self {
            clickhouse: ComponentHealth::new("clickhouse"),
        }
    }

    /// Generate a health report; overall status is the worst component status.
    pub fn report(&self) -> HealthReport {
        let components = vec![self.clickhouse.report()];

        let status = if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if components.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport { status, components }
    }

    /// Check if the service can serve queries.
    pub fn is_ready(&self) -> bool {
        self.clickhouse.is_healthy()
    }

    /// Check if the service is alive.
    pub fn is_alive(&self) -> bool {
        true
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global health registry.
pub static HEALTH: std::sync::LazyLock<HealthRegistry> =
    std::sync::LazyLock::new(HealthRegistry::new);

/// Get the global health registry.
pub fn health() -> &'static HealthRegistry {
    &HEALTH
}
