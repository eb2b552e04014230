//! Battery probe backed by the Linux power-supply class

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{BatteryProbe, BatteryStatus};

/// Reads `capacity` and `status` from the first `BAT*` entry under
/// `/sys/class/power_supply`
#[derive(Debug, Clone)]
pub struct SysfsBattery {
    root: PathBuf,
}

impl SysfsBattery {
    pub fn new() -> Self {
        Self::with_root("/sys/class/power_supply")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn battery_dir(&self) -> Option<PathBuf> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("BAT"))
            .map(|entry| entry.path())
            .collect();
        dirs.sort();
        dirs.into_iter().next()
    }

    fn read_trimmed(path: &Path) -> Option<String> {
        fs::read_to_string(path).ok().map(|s| s.trim().to_string())
    }

    fn read(&self) -> Option<BatteryStatus> {
        let dir = self.battery_dir()?;
        let capacity: u8 = Self::read_trimmed(&dir.join("capacity"))?.parse().ok()?;
        let state = Self::read_trimmed(&dir.join("status")).unwrap_or_default();
        // "Discharging" is the only state where the charger is known to be out
        let plugged = !state.eq_ignore_ascii_case("discharging");
        debug!(capacity, %state, "battery read");
        Some(BatteryStatus {
            percent: capacity.min(100),
            plugged,
        })
    }
}

impl Default for SysfsBattery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatteryProbe for SysfsBattery {
    async fn status(&self) -> Option<BatteryStatus> {
        let probe = self.clone();
        match tokio::task::spawn_blocking(move || probe.read()).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "battery read task failed");
                None
            }
        }
    }
}
