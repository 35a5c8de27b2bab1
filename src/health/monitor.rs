//! Polling schedule and latest results for monitored services.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

use super::report::{HealthReport, HealthStatus};

/// A service whose health endpoint is polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredService {
    /// Service id
    pub id: String,
    /// Display name
    pub name: String,
    /// Health endpoint (absolute URL or backend path)
    pub health_url: String,
    /// Disabled services are never polled
    pub enabled: bool,
}

impl MonitoredService {
    /// An enabled service.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        health_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            health_url: health_url.into(),
            enabled: true,
        }
    }
}

/// Latest known health of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSnapshot {
    /// Overall status
    pub status: HealthStatus,
    /// Report body, when the endpoint answered
    pub report: Option<HealthReport>,
    /// Error message, when the endpoint could not be reached
    pub error: Option<String>,
    /// When the check finished
    pub checked_at: Instant,
}

/// Per-status counts over enabled services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthSummary {
    /// Healthy services
    pub healthy: usize,
    /// Degraded services
    pub degraded: usize,
    /// Unhealthy services
    pub unhealthy: usize,
    /// Services never checked or with an unknown status
    pub unknown: usize,
}

impl HealthSummary {
    /// Number of services counted.
    pub fn total(&self) -> usize {
        self.healthy + self.degraded + self.unhealthy + self.unknown
    }
}

#[derive(Debug)]
struct Entry {
    service: MonitoredService,
    next_due: Instant,
    last: Option<ServiceSnapshot>,
}

/// Tracks which services are due for a health check.
///
/// The monitor holds no timers; callers pass the current time and run the
/// checks themselves. Failed checks are recorded and retried only at the
/// next scheduled poll.
#[derive(Debug)]
pub struct HealthMonitor {
    entries: Vec<Entry>,
    interval: Duration,
    auto_refresh: bool,
}

impl HealthMonitor {
    /// Create a monitor polling at `interval`, with auto-refresh enabled.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Config("Health poll interval must be positive".to_string()));
        }
        Ok(Self {
            entries: Vec::new(),
            interval,
            auto_refresh: true,
        })
    }

    /// Create a monitor polling at the configured `health_poll_interval_secs`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.health_poll_interval())
    }

    /// Add or replace a service. New services are due immediately.
    pub fn register(&mut self, service: MonitoredService, now: Instant) {
        match self.entries.iter_mut().find(|e| e.service.id == service.id) {
            Some(entry) => entry.service = service,
            None => self.entries.push(Entry {
                service,
                next_due: now,
                last: None,
            }),
        }
    }

    /// Remove a service, returning whether it was registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.service.id != id);
        self.entries.len() != before
    }

    /// Enable or disable polling of a service.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        self.entry_mut(id)?.service.enabled = enabled;
        Ok(())
    }

    /// Registered services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &MonitoredService> {
        self.entries.iter().map(|e| &e.service)
    }

    /// Whether periodic polling is on.
    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    /// Turn periodic polling on or off.
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    /// Poll interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the poll interval and reschedule every service from its last check.
    pub fn set_interval(&mut self, interval: Duration, now: Instant) -> Result<()> {
        if interval.is_zero() {
            return Err(Error::Config("Health poll interval must be positive".to_string()));
        }
        self.interval = interval;
        for entry in &mut self.entries {
            entry.next_due = entry
                .last
                .as_ref()
                .map(|snapshot| snapshot.checked_at + interval)
                .unwrap_or(now);
        }
        Ok(())
    }

    /// Enabled services whose next poll is due. Empty while auto-refresh is off.
    pub fn due(&self, now: Instant) -> Vec<&MonitoredService> {
        if !self.auto_refresh {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.service.enabled && e.next_due <= now)
            .map(|e| &e.service)
            .collect()
    }

    /// Earliest time any enabled service becomes due.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries
            .iter()
            .filter(|e| e.service.enabled)
            .map(|e| e.next_due)
            .min()
    }

    /// Store a report and schedule the next poll.
    pub fn record_success(&mut self, id: &str, report: HealthReport, now: Instant) -> Result<()> {
        let interval = self.interval;
        let entry = self.entry_mut(id)?;
        debug!(service = id, status = %report.status, "Health check completed");
        entry.last = Some(ServiceSnapshot {
            status: report.status,
            report: Some(report),
            error: None,
            checked_at: now,
        });
        entry.next_due = now + interval;
        Ok(())
    }

    /// Store a failed check as unhealthy and schedule the next poll.
    pub fn record_failure(&mut self, id: &str, error: impl Into<String>, now: Instant) -> Result<()> {
        let interval = self.interval;
        let entry = self.entry_mut(id)?;
        let error = error.into();
        warn!(service = id, error = %error, "Health check failed");
        entry.last = Some(ServiceSnapshot {
            status: HealthStatus::Unhealthy,
            report: None,
            error: Some(error),
            checked_at: now,
        });
        entry.next_due = now + interval;
        Ok(())
    }

    /// Latest result of a service.
    pub fn snapshot(&self, id: &str) -> Option<&ServiceSnapshot> {
        self.entries
            .iter()
            .find(|e| e.service.id == id)
            .and_then(|e| e.last.as_ref())
    }

    /// Status counts over enabled services.
    pub fn summary(&self) -> HealthSummary {
        let mut summary = HealthSummary::default();
        for entry in self.entries.iter().filter(|e| e.service.enabled) {
            match entry.last.as_ref().map(|s| s.status) {
                Some(HealthStatus::Healthy) => summary.healthy += 1,
                Some(HealthStatus::Degraded) => summary.degraded += 1,
                Some(HealthStatus::Unhealthy) => summary.unhealthy += 1,
                Some(HealthStatus::Unknown) | None => summary.unknown += 1,
            }
        }
        summary
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.service.id == id)
            .ok_or_else(|| Error::InvalidCommand(format!("Unknown service: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(now: Instant) -> HealthMonitor {
        let mut monitor = HealthMonitor::new(Duration::from_secs(30)).unwrap();
        monitor.register(MonitoredService::new("api", "API", "/api/health"), now);
        monitor.register(
            MonitoredService::new("auth", "Auth", "https://auth.example.com/health"),
            now,
        );
        monitor
    }

    fn report(status: HealthStatus) -> HealthReport {
        HealthReport {
            status,
            ..HealthReport::default()
        }
    }

    fn ids(services: Vec<&MonitoredService>) -> Vec<&str> {
        services.into_iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_interval_from_config() {
        let config = ClientConfig::from_toml_str("health_poll_interval_secs = 10").unwrap();
        let mut monitor = HealthMonitor::from_config(&config).unwrap();
        assert_eq!(monitor.interval(), Duration::from_secs(10));

        let now = Instant::now();
        monitor.register(MonitoredService::new("api", "API", "/api/health"), now);
        monitor.record_success("api", report(HealthStatus::Healthy), now).unwrap();
        assert!(monitor.due(now + Duration::from_secs(9)).is_empty());
        assert_eq!(ids(monitor.due(now + Duration::from_secs(10))), vec!["api"]);

        let zero = ClientConfig {
            health_poll_interval_secs: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(HealthMonitor::from_config(&zero), Err(Error::Config(_))));
    }

    #[test]
    fn test_new_services_due_immediately() {
        let now = Instant::now();
        let monitor = monitor(now);
        assert_eq!(ids(monitor.due(now)), vec!["api", "auth"]);
        assert_eq!(monitor.summary().unknown, 2);
    }

    #[test]
    fn test_reschedule_after_check() {
        let now = Instant::now();
        let mut monitor = monitor(now);
        monitor.record_success("api", report(HealthStatus::Healthy), now).unwrap();
        monitor.record_failure("auth", "connection refused", now).unwrap();

        assert!(monitor.due(now + Duration::from_secs(29)).is_empty());
        assert_eq!(monitor.due(now + Duration::from_secs(30)).len(), 2);
        assert_eq!(monitor.next_due(), Some(now + Duration::from_secs(30)));

        let auth = monitor.snapshot("auth").unwrap();
        assert_eq!(auth.status, HealthStatus::Unhealthy);
        assert_eq!(auth.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_summary() {
        let now = Instant::now();
        let mut monitor = monitor(now);
        monitor.register(MonitoredService::new("jobs", "Jobs", "/jobs/health"), now);
        monitor.record_success("api", report(HealthStatus::Healthy), now).unwrap();
        monitor.record_success("auth", report(HealthStatus::Degraded), now).unwrap();
        monitor.set_enabled("jobs", false).unwrap();

        let summary = monitor.summary();
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn test_auto_refresh_off() {
        let now = Instant::now();
        let mut monitor = monitor(now);
        monitor.set_auto_refresh(false);
        assert!(monitor.due(now).is_empty());
        monitor.set_auto_refresh(true);
        assert_eq!(monitor.due(now).len(), 2);
    }

    #[test]
    fn test_interval_change_reschedules() {
        let now = Instant::now();
        let mut monitor = monitor(now);
        monitor.record_success("api", report(HealthStatus::Healthy), now).unwrap();
        monitor.record_success("auth", report(HealthStatus::Healthy), now).unwrap();

        monitor.set_interval(Duration::from_secs(5), now).unwrap();
        assert_eq!(monitor.due(now + Duration::from_secs(5)).len(), 2);
        assert!(monitor.set_interval(Duration::ZERO, now).is_err());
    }

    #[test]
    fn test_unknown_service() {
        let now = Instant::now();
        let mut monitor = monitor(now);
        assert!(monitor.record_failure("nope", "x", now).is_err());
        assert!(monitor.unregister("api"));
        assert!(!monitor.unregister("api"));
        assert_eq!(monitor.services().count(), 1);
    }
}
