//! # 服务状态

use std::fmt;
use std::fs;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, TimeDelta};
use serde::Serialize;

use crate::config::Settings;

use super::store::ProfileStore;

/// 产物与更新计划的快照
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub output: String,
    pub exists: bool,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub stale: bool,
    pub update_interval: u64,
    pub backups: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_check: Option<String>,
}

impl Status {
    pub fn collect(settings: &Settings) -> Result<Self> {
        let store = ProfileStore::from_settings(&settings.files);
        let interval = Duration::from_secs(settings.update_interval);

        let (size, modified) = if store.exists() {
            let meta = fs::metadata(store.output())?;
            let modified: DateTime<Local> = meta.modified()?.into();
            (meta.len(), Some(modified.to_rfc3339()))
        } else {
            (0, None)
        };

        let next_check = next_check(Local::now(), settings.update_interval);

        Ok(Self {
            output: store.output().display().to_string(),
            exists: store.exists(),
            size,
            modified,
            stale: store.is_stale(interval)?,
            update_interval: settings.update_interval,
            backups: store.backups()?.len(),
            next_check: next_check.map(|t| t.to_rfc3339()),
        })
    }
}

/// `now + interval`；超出时间范围时为 `None`
fn next_check(now: DateTime<Local>, interval_secs: u64) -> Option<DateTime<Local>> {
    let secs = i64::try_from(interval_secs).ok()?;
    now.checked_add_signed(TimeDelta::try_seconds(secs)?)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Output:          {}", self.output)?;
        writeln!(f, "Exists:          {}", self.exists)?;
        writeln!(f, "Size:            {} bytes", self.size)?;
        writeln!(f, "Modified:        {}", self.modified.as_deref().unwrap_or("-"))?;
        writeln!(f, "Stale:           {}", self.stale)?;
        writeln!(f, "Update interval: {}s", self.update_interval)?;
        writeln!(f, "Backups:         {}", self.backups)?;
        write!(
            f,
            "Next check:      {}",
            self.next_check.as_deref().unwrap_or("-")
        )
    }
}
