//! Service health reports and polling.

mod monitor;
mod report;

#[cfg(feature = "reqwest-runtime")]
mod refresh;

pub use monitor::{HealthMonitor, HealthSummary, MonitoredService, ServiceSnapshot};
pub use report::{CheckResult, HealthReport, HealthStatus};

#[cfg(feature = "reqwest-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest-runtime")))]
pub use refresh::{spawn_auto_refresh, AutoRefreshHandle};
