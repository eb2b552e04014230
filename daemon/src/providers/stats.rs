//! Host load sampled through sysinfo

use std::path::Path;

use async_trait::async_trait;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::{debug, warn};

use super::{SystemStats, SystemUsage};

/// CPU, memory and root-disk usage of the local host
#[derive(Debug, Clone, Copy, Default)]
pub struct HostStats;

impl HostStats {
    /// Blocks for one CPU sampling interval
    fn sample() -> SystemUsage {
        let mut sys = System::new();
        sys.refresh_cpu();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first());
        let disk_percent = root
            .map(|d| {
                percent(
                    d.total_space().saturating_sub(d.available_space()),
                    d.total_space(),
                )
            })
            .unwrap_or(0.0);

        SystemUsage {
            cpu_percent: sys.global_cpu_info().cpu_usage(),
            ram_percent: percent(sys.used_memory(), sys.total_memory()),
            disk_percent,
        }
    }
}

#[async_trait]
impl SystemStats for HostStats {
    async fn usage(&self) -> Option<SystemUsage> {
        match tokio::task::spawn_blocking(Self::sample).await {
            Ok(usage) => {
                debug!(?usage, "host sampled");
                Some(usage)
            }
            Err(e) => {
                warn!(error = %e, "host sampling task failed");
                None
            }
        }
    }
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0) as f32
}
