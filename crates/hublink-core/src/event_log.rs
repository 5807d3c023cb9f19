//! Append-only JSONL event log used as the bridge diagnostic side channel.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

#[derive(Clone)]
pub struct JsonlEventLog {
    path: PathBuf,
    file: Arc<Mutex<std::fs::File>>,
}

impl JsonlEventLog {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn append(&self, value: &Value) -> Result<()> {
        let line = serde_json::to_string(value).context("failed to encode log event")?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("event log mutex is poisoned"))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::JsonlEventLog;

    #[test]
    fn unit_event_log_appends_one_line_per_event() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("diagnostics/ingress.jsonl");
        let log = JsonlEventLog::open(path.clone()).expect("open log");
        log.append(&json!({"outcome": "delivered"})).expect("first");
        log.append(&json!({"outcome": "skipped", "reason": "repo_not_connected"}))
            .expect("second");

        let lines = std::fs::read_to_string(&path)
            .expect("read log")
            .lines()
            .map(|line| line.to_string())
            .collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let replay: serde_json::Value = serde_json::from_str(&lines[1]).expect("parse line");
        assert_eq!(replay["reason"], "repo_not_connected");
    }
}
