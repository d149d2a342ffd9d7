//! Per-user usage collection and filesystem sampling.

pub mod command;
pub mod disk;

pub use command::{parse_usage_output, CommandUsageSource};
pub use disk::{DiskSampler, DiskUsage, StatvfsSampler};

use crate::error::CollectionError;

/// Bytes consumed by one user's home directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UsageRecord {
    pub bytes: u64,
    pub owner: String,
}

impl UsageRecord {
    pub fn new(bytes: u64, owner: impl Into<String>) -> Self {
        Self {
            bytes,
            owner: owner.into(),
        }
    }
}

/// Source of per-user usage records
pub trait UsageSource: Send + Sync {
    /// Enumerate usage, largest consumer first
    fn collect(&self) -> Result<Vec<UsageRecord>, CollectionError>;
}

/// Largest first; ties broken by owner, descending.
pub fn sort_descending(records: &mut [UsageRecord]) {
    records.sort_by(|a, b| b.cmp(a));
}
