use std::os::unix::process::CommandExt;
use std::process::Command;

use super::{sort_descending, UsageRecord, UsageSource};
use crate::error::CollectionError;

/// Runs an external enumeration command, usually through `sudo`,
/// and parses its `<bytes>\t<path>` lines.
#[derive(Debug, Clone)]
pub struct CommandUsageSource {
    command: Vec<String>,
    prefix_len: usize,
}

impl CommandUsageSource {
    pub fn new(command: Vec<String>, prefix_len: usize) -> Self {
        Self {
            command,
            prefix_len,
        }
    }

    fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

impl UsageSource for CommandUsageSource {
    fn collect(&self) -> Result<Vec<UsageRecord>, CollectionError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(CollectionError::EmptyCommand)?;

        tracing::debug!(command = %self.display_command(), "Collecting home directory usage");

        // Own process group: a Ctrl-C or group-wide SIGTERM aimed at us
        // must not cut the collection short
        let output = Command::new(program)
            .args(args)
            .process_group(0)
            .output()
            .map_err(|source| CollectionError::Spawn {
                command: self.display_command(),
                source,
            })?;

        if !output.status.success() {
            return Err(CollectionError::CommandFailed {
                command: self.display_command(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = parse_usage_output(&stdout, self.prefix_len)?;

        tracing::debug!(count = records.len(), "Parsed usage records");

        Ok(records)
    }
}

/// Parse `<bytes>\t<prefix><user>` lines, largest first.
///
/// Blank lines are skipped. `prefix_len` counts characters, not bytes.
pub fn parse_usage_output(
    output: &str,
    prefix_len: usize,
) -> Result<Vec<UsageRecord>, CollectionError> {
    let mut records = Vec::new();

    for (idx, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;

        let (size, path) = line
            .split_once('\t')
            .ok_or_else(|| CollectionError::MissingSeparator {
                line: line_no,
                content: line.to_string(),
            })?;

        let bytes = size
            .trim()
            .parse::<u64>()
            .map_err(|source| CollectionError::InvalidSize {
                line: line_no,
                value: size.to_string(),
                source,
            })?;

        let owner = match path.char_indices().nth(prefix_len) {
            Some((offset, _)) => &path[offset..],
            None => {
                return Err(CollectionError::MissingOwner {
                    line: line_no,
                    path: path.to_string(),
                    prefix_len,
                })
            }
        };

        records.push(UsageRecord::new(bytes, owner));
    }

    sort_descending(&mut records);

    Ok(records)
}
