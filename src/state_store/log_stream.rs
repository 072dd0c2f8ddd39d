use tokio::sync::RwLock;

use crate::{
    data_model::{LogEntry, LogLevel, RunningCommand},
    utils::get_epoch_time_in_ms,
};

/// Snapshot of the run-state tracker with elapsed time computed at read.
#[derive(Debug, Clone)]
pub struct RunningStatus {
    pub command_id: String,
    pub command_type: String,
    pub elapsed_ms: u64,
}

#[derive(Default)]
struct LogStreamInner {
    logs: Vec<LogEntry>,
    errors: Vec<LogEntry>,
    running: Option<RunningCommand>,
}

/// Append-only log stream fed by the plugin, with an error-only side list
/// and the derived run-state tracker.
///
/// The tracker is driven by pattern-matching the free-text log lines the
/// plugin emits around command execution. This inherits the sequential
/// single-in-flight assumption of the plugin. Server-side command
/// execution never logs through the stream, so it reports transitions
/// through `set_running`/`clear_running` directly.
pub struct LogStream {
    inner: RwLock<LogStreamInner>,
}

impl LogStream {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LogStreamInner::default()),
        }
    }

    /// Appends to the main log; error entries are additionally kept on the
    /// error list, which only [`clear_errors`](Self::clear_errors) empties.
    pub async fn append(&self, message: String, level: LogLevel) {
        let entry = LogEntry {
            timestamp: get_epoch_time_in_ms(),
            message,
            level,
        };
        let mut inner = self.inner.write().await;
        if let Some((command_type, command_id)) = parse_execution_start(&entry.message) {
            inner.running = Some(RunningCommand {
                command_id,
                command_type,
                start_time: entry.timestamp,
            });
        } else if entry.message.starts_with("Completed in ") || entry.message.starts_with("Error:")
        {
            inner.running = None;
        }
        if entry.level == LogLevel::Error {
            inner.errors.push(entry.clone());
        }
        inner.logs.push(entry);
    }

    /// Returns the last `limit` entries of the main log, or all of them.
    pub async fn tail(&self, limit: Option<usize>) -> Vec<LogEntry> {
        let inner = self.inner.read().await;
        match limit {
            Some(limit) => {
                let skip = inner.logs.len().saturating_sub(limit);
                inner.logs[skip..].to_vec()
            }
            None => inner.logs.clone(),
        }
    }

    pub async fn errors(&self) -> Vec<LogEntry> {
        self.inner.read().await.errors.clone()
    }

    /// Empties the main log only; errors persist until `clear_errors`.
    pub async fn clear(&self) {
        self.inner.write().await.logs.clear();
    }

    pub async fn clear_errors(&self) {
        self.inner.write().await.errors.clear();
    }

    pub async fn set_running(&self, command_id: String, command_type: String) {
        self.inner.write().await.running = Some(RunningCommand {
            command_id,
            command_type,
            start_time: get_epoch_time_in_ms(),
        });
    }

    pub async fn clear_running(&self) {
        self.inner.write().await.running = None;
    }

    pub async fn running(&self) -> Option<RunningStatus> {
        let inner = self.inner.read().await;
        inner.running.as_ref().map(|running| RunningStatus {
            command_id: running.command_id.clone(),
            command_type: running.command_type.clone(),
            elapsed_ms: get_epoch_time_in_ms().saturating_sub(running.start_time),
        })
    }
}

/// Matches the plugin's execution-start line, `Executing: <type> (<id>...)`,
/// where the type carries no whitespace and the id prefix is lowercase hex
/// with dashes.
fn parse_execution_start(message: &str) -> Option<(String, String)> {
    let rest = message.strip_prefix("Executing: ")?;
    let (command_type, rest) = rest.split_once(" (")?;
    let id = rest.strip_suffix("...)")?;
    if command_type.is_empty() || command_type.contains(char::is_whitespace) {
        return None;
    }
    if id.is_empty()
        || !id
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f' | b'-'))
    {
        return None;
    }
    Some((command_type.to_string(), id.to_string()))
}
