//! # 定时更新
//!
//! 单次更新：过期检查 → 生成 → 备份旧产物 → 写入 → 校验（失败则回滚）。
//! 守护模式按 `update_interval` 循环执行单次更新。
//! 同一个 `Updater` 上的所有运行（守护循环、HTTP 触发）严格串行。

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::config::Settings;
use crate::profile::OutputFormat;

use super::pipeline;
use super::store::ProfileStore;

/// 意外错误后的重试等待
const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// 单次更新的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// 产物仍在有效期内，未更新
    Fresh,
    /// 已生成新产物
    Updated {
        groups: usize,
        rules: usize,
        backup: Option<PathBuf>,
    },
}

/// 更新服务
#[derive(Debug)]
pub struct Updater {
    config_path: PathBuf,
    /// 运行锁，保证同一时刻只有一次生成
    running: Mutex<()>,
    last_update: Mutex<Option<DateTime<Local>>>,
}

impl Updater {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            running: Mutex::new(()),
            last_update: Mutex::new(None),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 最近一次成功更新的时间
    pub fn last_update(&self) -> Option<DateTime<Local>> {
        *self
            .last_update
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 执行一次更新；`force` 跳过过期检查
    ///
    /// 每次都重新加载设置，以便拾取运行期间的修改。
    pub fn run_once(&self, force: bool) -> Result<UpdateOutcome> {
        let _running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = self.update(force)?;
        if matches!(outcome, UpdateOutcome::Updated { .. }) {
            *self
                .last_update
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Local::now());
        }
        Ok(outcome)
    }

    fn update(&self, force: bool) -> Result<UpdateOutcome> {
        let settings = Settings::load(&self.config_path)?;
        let store = ProfileStore::from_settings(&settings.files);

        let max_age = Duration::from_secs(settings.update_interval);
        if !force && !store.is_stale(max_age)? {
            tracing::info!(path = %store.output().display(), "profile still fresh");
            return Ok(UpdateOutcome::Fresh);
        }

        // 先生成，生成失败时旧产物保持原位
        let rendered = pipeline::render(&settings, OutputFormat::Yaml, false)?;

        let backup = store.backup()?;
        store.write(&rendered.text)?;

        if let Err(e) = store.validate() {
            if let Some(ref previous) = backup {
                store.restore(previous)?;
            }
            return Err(e.context("New profile failed validation"));
        }

        tracing::info!(
            groups = rendered.group_count,
            rules = rendered.rule_count,
            "profile updated"
        );
        Ok(UpdateOutcome::Updated {
            groups: rendered.group_count,
            rules: rendered.rule_count,
            backup,
        })
    }

    /// 守护模式：不返回，除非设置文件无法读取
    pub fn run_daemon(&self) -> Result<()> {
        let settings = Settings::load(&self.config_path)
            .with_context(|| format!("Failed to load {}", self.config_path.display()))?;
        tracing::info!(
            interval_secs = settings.update_interval,
            "update daemon started"
        );

        loop {
            let wait = match self.run_once(false) {
                Ok(_) => self.current_interval(),
                Err(e) => {
                    tracing::error!("update failed: {:#}", e);
                    ERROR_BACKOFF
                }
            };
            tracing::info!(wait_secs = wait.as_secs(), "waiting for next check");
            thread::sleep(wait);
        }
    }

    /// 读取最新的更新间隔，读取失败时退回默认值
    fn current_interval(&self) -> Duration {
        let secs = Settings::load(&self.config_path)
            .map(|s| s.update_interval)
            .unwrap_or(crate::config::settings::DEFAULT_UPDATE_INTERVAL);
        Duration::from_secs(secs)
    }
}
