//! Log file management for the server binary.
//!
//! The active file is `{dir}/compliance_api.log`. It rolls over at local
//! midnight or once it reaches [`MAX_LOG_BYTES`], whichever comes first, and
//! rolled files become `compliance_api.log.1`, `.2`, ... up to
//! [`MAX_LOG_FILES`]. Files untouched for longer than [`LOG_RETENTION`] are
//! removed at startup.

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Name of the active log file.
pub const LOG_FILE_NAME: &str = "compliance_api.log";

/// Size that forces a rollover.
pub const MAX_LOG_BYTES: u64 = 500 * 1024 * 1024;

/// Rolled files kept next to the active one.
pub const MAX_LOG_FILES: usize = 10;

/// Age after which a log file is deleted.
pub const LOG_RETENTION: Duration = Duration::from_secs(10 * 24 * 60 * 60);

/// Prune expired logs in `dir`, then open the rolling appender.
pub fn open_log_file(dir: &Path) -> io::Result<BasicRollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    let removed = prune_expired_logs(dir, LOG_RETENTION, SystemTime::now())?;
    if removed > 0 {
        debug!("Removed {} expired log files from {}", removed, dir.display());
    }

    BasicRollingFileAppender::new(
        dir.join(LOG_FILE_NAME),
        RollingConditionBasic::new().daily().max_size(MAX_LOG_BYTES),
        MAX_LOG_FILES,
    )
}

/// Delete this service's log files in `dir` last modified before
/// `now - max_age`. Returns how many were removed.
pub fn prune_expired_logs(dir: &Path, max_age: Duration, now: SystemTime) -> io::Result<usize> {
    let Some(cutoff) = now.checked_sub(max_age) else {
        return Ok(0);
    };

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !is_log_file(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        if meta.modified()? < cutoff {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// `compliance_api.log` or a rolled `compliance_api.log.N`.
fn is_log_file(name: &str) -> bool {
    match name.strip_prefix(LOG_FILE_NAME) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('.')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}
