//! Health report payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Health of a service or one of its checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with reduced capability
    Degraded,
    /// Not operational
    Unhealthy,
    /// Not checked yet, or an unrecognized status string
    #[default]
    Unknown,
}

impl HealthStatus {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }

    /// Parse a status string; common synonyms such as `ok` and `down` are accepted.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "healthy" | "ok" | "up" | "pass" => HealthStatus::Healthy,
            "degraded" | "warn" | "warning" => HealthStatus::Degraded,
            "unhealthy" | "error" | "down" | "fail" => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }

    /// Ordering used to find the worst status: healthy < unknown < degraded < unhealthy.
    pub fn severity(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Unknown => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Unhealthy => 3,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HealthStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(HealthStatus::from_name(&name))
    }
}

/// Result of one named check within a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Check status
    pub status: HealthStatus,
    /// Detail or error message
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Check latency in milliseconds
    #[serde(default, alias = "response_time", skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
}

/// Body returned by a service health endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Overall status
    pub status: HealthStatus,
    /// Uptime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
    /// Named checks
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, CheckResult>,
    /// Latency of the whole check in milliseconds
    #[serde(default, alias = "response_time", skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    /// Time the report was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Service version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl HealthReport {
    /// Whether the service reports itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Checks that are not healthy, by name.
    pub fn failing_checks(&self) -> Vec<(&str, &CheckResult)> {
        self.checks
            .iter()
            .filter(|(_, check)| check.status != HealthStatus::Healthy)
            .map(|(name, check)| (name.as_str(), check))
            .collect()
    }

    /// The worst of the overall status and all check statuses.
    pub fn worst_check_status(&self) -> HealthStatus {
        self.checks
            .values()
            .map(|check| check.status)
            .chain(std::iter::once(self.status))
            .max_by_key(HealthStatus::severity)
            .unwrap_or(self.status)
    }
}
