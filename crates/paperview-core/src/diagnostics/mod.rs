//! Process resource snapshots.
//!
//! The daemon runs for months on small boards; a browser engine that leaks
//! descriptors shows up here long before the process dies.

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

/// Point-in-time resource usage of the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub open_files: Option<usize>,
    pub memory_bytes: u64,
}

/// Only memory is refreshed; the descriptor count is read on demand.
fn snapshot_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing().with_memory()
}

/// Read the current process's open descriptor count and resident memory.
///
/// Returns `None` when the platform does not expose the process table.
pub fn resource_snapshot() -> Option<ResourceSnapshot> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        snapshot_refresh_kind(),
    );
    let process = system.process(pid)?;

    Some(ResourceSnapshot {
        open_files: process.open_files().map(|count| count as usize),
        memory_bytes: process.memory(),
    })
}

/// Emit a debug event describing current resource usage.
pub fn log_resource_snapshot(context: &str) {
    match resource_snapshot() {
        Some(snapshot) => debug!(
            event = "core.diagnostics.resource_snapshot",
            context = context,
            open_files = ?snapshot.open_files,
            memory_bytes = snapshot.memory_bytes,
        ),
        None => debug!(
            event = "core.diagnostics.resource_snapshot_unavailable",
            context = context,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_snapshot_reports_memory() {
        let snapshot = resource_snapshot().expect("current process should be visible");
        assert!(snapshot.memory_bytes > 0);
    }

    #[test]
    fn test_refresh_kind_skips_expensive_fields() {
        let kind = snapshot_refresh_kind();
        assert!(kind.memory());
        assert!(!kind.cpu());
        assert!(!kind.disk_usage());
        assert!(!kind.tasks());
        assert_eq!(kind.cmd(), sysinfo::UpdateKind::Never);
        assert_eq!(kind.environ(), sysinfo::UpdateKind::Never);
        assert_eq!(kind.exe(), sysinfo::UpdateKind::Never);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_resource_snapshot_counts_open_files() {
        let _held = std::fs::File::open("/proc/self/status").unwrap();
        let snapshot = resource_snapshot().unwrap();
        assert!(snapshot.open_files.unwrap_or(0) > 0);
    }

    #[test]
    fn test_log_resource_snapshot_does_not_panic() {
        log_resource_snapshot("test");
    }
}
