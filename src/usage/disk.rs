use std::path::{Path, PathBuf};

use nix::sys::statvfs::statvfs;

use crate::error::{DuMailerError, Result};

/// Capacity snapshot of one filesystem
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    /// Path the sample was taken for
    pub path: PathBuf,

    /// Total capacity in bytes
    pub total: u64,

    /// Used space in bytes (total - free, reserved blocks count as used)
    pub used: u64,

    /// Free space in bytes, including reserved blocks
    pub free: u64,
}

impl DiskUsage {
    /// Used fraction of capacity, 0.0 for an empty filesystem
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64
        }
    }

    /// Human-readable used space
    pub fn used_human(&self) -> String {
        humansize::format_size(self.used, humansize::BINARY)
    }

    /// Human-readable total space
    pub fn total_human(&self) -> String {
        humansize::format_size(self.total, humansize::BINARY)
    }
}

/// Source of fresh filesystem samples
pub trait DiskSampler: Send + Sync {
    fn sample(&self) -> Result<DiskUsage>;
}

/// Samples a mount point with `statvfs(3)`
#[derive(Debug, Clone)]
pub struct StatvfsSampler {
    path: PathBuf,
}

impl StatvfsSampler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DiskSampler for StatvfsSampler {
    fn sample(&self) -> Result<DiskUsage> {
        check_disk_usage(&self.path)
    }
}

/// Check disk usage for a specific path
pub fn check_disk_usage(path: &Path) -> Result<DiskUsage> {
    let stat = statvfs(path).map_err(|source| DuMailerError::Disk {
        path: path.to_path_buf(),
        source,
    })?;

    let block_size = stat.fragment_size() as u64;
    let total = stat.blocks() as u64 * block_size;
    let free = stat.blocks_free() as u64 * block_size;

    Ok(DiskUsage {
        path: path.to_path_buf(),
        total,
        used: total.saturating_sub(free),
        free,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_disk_usage_root() {
        let usage = check_disk_usage(Path::new("/")).unwrap();

        assert!(usage.total > 0);
        assert_eq!(usage.used + usage.free, usage.total);
        assert!((0.0..=1.0).contains(&usage.ratio()));
    }

    #[test]
    fn test_check_disk_usage_missing_path() {
        let result = check_disk_usage(Path::new("/nonexistent/mount/point"));
        assert!(matches!(result, Err(DuMailerError::Disk { .. })));
    }

    #[test]
    fn test_ratio_of_empty_filesystem() {
        let usage = DiskUsage {
            path: PathBuf::from("/home"),
            total: 0,
            used: 0,
            free: 0,
        };
        assert_eq!(usage.ratio(), 0.0);
    }

    #[test]
    fn test_disk_usage_human_readable() {
        let usage = DiskUsage {
            path: PathBuf::from("/home"),
            total: 1024 * 1024 * 1024 * 100,
            used: 1024 * 1024 * 1024 * 80,
            free: 1024 * 1024 * 1024 * 20,
        };

        assert!(usage.total_human().contains("100"));
        assert!(usage.used_human().contains("80"));
        assert_eq!(usage.ratio(), 0.8);
    }

    #[test]
    fn test_statvfs_sampler() {
        let sampler = StatvfsSampler::new("/");
        assert_eq!(sampler.sample().unwrap().path, PathBuf::from("/"));
    }
}
