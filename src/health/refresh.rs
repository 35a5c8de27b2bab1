//! Background polling of monitored services on tokio.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::net_client::GradianClient;
use crate::runtime::HttpTransport;

use super::monitor::HealthMonitor;

const MIN_SLEEP: Duration = Duration::from_millis(50);

/// Handle to a running auto-refresh task. The task stops when the handle is dropped.
#[derive(Debug)]
pub struct AutoRefreshHandle {
    task: JoinHandle<()>,
}

impl AutoRefreshHandle {
    /// Stop polling.
    pub fn stop(self) {
        self.task.abort();
    }

    /// Whether the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutoRefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll every due service of `monitor` through `client` until stopped.
///
/// Checks run one at a time. A failed check is recorded as unhealthy and
/// retried at the next interval. While auto-refresh is off the task idles
/// for one interval at a time.
pub fn spawn_auto_refresh<T: HttpTransport>(
    client: Arc<Mutex<GradianClient<T>>>,
    monitor: Arc<Mutex<HealthMonitor>>,
) -> AutoRefreshHandle {
    let task = tokio::spawn(async move {
        loop {
            let due: Vec<(String, String)> = monitor
                .lock()
                .await
                .due(Instant::now())
                .into_iter()
                .map(|service| (service.id.clone(), service.health_url.clone()))
                .collect();

            for (id, url) in due {
                let result = {
                    let mut client = client.lock().await;
                    client.check_health(&url).await
                };

                let mut monitor = monitor.lock().await;
                let now = Instant::now();
                let recorded = match result {
                    Ok(report) => monitor.record_success(&id, report.0, now),
                    Err(e) => monitor.record_failure(&id, e.to_string(), now),
                };
                if let Err(e) = recorded {
                    debug!(service = %id, error = %e, "Service unregistered during check");
                }
            }

            let wait = {
                let monitor = monitor.lock().await;
                match monitor.next_due() {
                    Some(at) if monitor.auto_refresh() => {
                        at.saturating_duration_since(Instant::now())
                    }
                    _ => monitor.interval(),
                }
            };
            tokio::time::sleep(wait.max(MIN_SLEEP)).await;
        }
    });

    AutoRefreshHandle { task }
}
