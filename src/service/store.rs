//! # 产物存储
//!
//! 负责输出文件的写入、过期检查、备份轮转、回滚与有效性检查。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use chrono::Local;
use regex::Regex;

use crate::config::settings::FileSettings;

/// 小于此大小的产物视为异常
pub const MIN_PROFILE_BYTES: u64 = 1000;

/// 产物存储
#[derive(Debug, Clone)]
pub struct ProfileStore {
    /// 输出文件
    output: PathBuf,
    /// 备份目录
    backup_dir: PathBuf,
    /// 最多保留的备份数
    keep: usize,
}

impl ProfileStore {
    pub fn new(output: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            output: output.into(),
            backup_dir: backup_dir.into(),
            keep,
        }
    }

    pub fn from_settings(files: &FileSettings) -> Self {
        Self::new(files.output.clone(), files.backup_dir.clone(), files.backup_keep)
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn exists(&self) -> bool {
        self.output.is_file()
    }

    /// 写入产物，必要时创建父目录
    pub fn write(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        fs::write(&self.output, content)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        tracing::info!(
            path = %self.output.display(),
            bytes = content.len(),
            "profile written"
        );
        Ok(())
    }

    /// 产物不存在或修改时间早于 `max_age` 之前
    pub fn is_stale(&self, max_age: Duration) -> Result<bool> {
        if !self.exists() {
            tracing::info!(path = %self.output.display(), "profile missing, needs generation");
            return Ok(true);
        }

        let modified = fs::metadata(&self.output)?.modified()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        Ok(age > max_age)
    }

    fn stem_and_ext(&self) -> (String, String) {
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "profile".to_string());
        let ext = self
            .output
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yaml".to_string());
        (stem, ext)
    }

    /// 备份文件名模式：`{stem}_YYYYmmdd_HHMMSS[_N].{ext}`
    ///
    /// 同一秒内的多次备份用递增序号区分。
    fn backup_pattern(&self) -> Result<Regex> {
        let (stem, ext) = self.stem_and_ext();
        let pattern = format!(
            r"^{}_(\d{{8}}_\d{{6}})(?:_(\d+))?\.{}$",
            regex::escape(&stem),
            regex::escape(&ext)
        );
        Ok(Regex::new(&pattern)?)
    }

    /// 本次备份的目标路径，不覆盖已有备份
    fn backup_target(&self) -> PathBuf {
        let (stem, ext) = self.stem_and_ext();
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        let mut target = self.backup_dir.join(format!("{}_{}.{}", stem, stamp, ext));
        let mut seq = 1u32;
        while target.exists() {
            target = self
                .backup_dir
                .join(format!("{}_{}_{}.{}", stem, stamp, seq, ext));
            seq += 1;
        }
        target
    }

    /// 把当前产物移入备份目录并轮转；没有产物时返回 `None`
    pub fn backup(&self) -> Result<Option<PathBuf>> {
        if !self.exists() {
            tracing::info!("no profile to back up");
            return Ok(None);
        }

        fs::create_dir_all(&self.backup_dir)
            .with_context(|| format!("Failed to create {}", self.backup_dir.display()))?;

        let target = self.backup_target();
        fs::rename(&self.output, &target).with_context(|| {
            format!(
                "Failed to move {} to {}",
                self.output.display(),
                target.display()
            )
        })?;
        tracing::info!(backup = %target.display(), "profile backed up");

        self.prune_backups()?;
        Ok(Some(target))
    }

    /// 备份列表，最新的在前
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        if !self.backup_dir.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = self.backup_pattern()?;
        let mut files: Vec<((String, u32), PathBuf)> = fs::read_dir(&self.backup_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter_map(|path| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                let caps = pattern.captures(&name)?;
                let stamp = caps[1].to_string();
                let seq = caps
                    .get(2)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0);
                Some(((stamp, seq), path))
            })
            .collect();

        // 时间戳字典序即时间序，同一秒内按序号
        files.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// 只保留最近 `keep` 个备份，返回被删除的文件
    pub fn prune_backups(&self) -> Result<Vec<PathBuf>> {
        let removed: Vec<PathBuf> = self.backups()?.into_iter().skip(self.keep).collect();
        for old in &removed {
            fs::remove_file(old).with_context(|| format!("Failed to remove {}", old.display()))?;
            tracing::info!(backup = %old.display(), "old backup removed");
        }
        Ok(removed)
    }

    /// 用备份覆盖当前产物
    pub fn restore(&self, backup: &Path) -> Result<()> {
        fs::rename(backup, &self.output).with_context(|| {
            format!(
                "Failed to restore {} to {}",
                backup.display(),
                self.output.display()
            )
        })?;
        tracing::warn!(backup = %backup.display(), "previous profile restored");
        Ok(())
    }

    /// 检查产物：存在、不过小、是合法 YAML
    pub fn validate(&self) -> Result<()> {
        if !self.exists() {
            bail!("profile {} does not exist", self.output.display());
        }

        let size = fs::metadata(&self.output)?.len();
        if size < MIN_PROFILE_BYTES {
            bail!(
                "profile {} is suspiciously small ({} bytes)",
                self.output.display(),
                size
            );
        }

        let text = fs::read_to_string(&self.output)?;
        serde_yaml::from_str::<serde_yaml::Value>(&text)
            .with_context(|| format!("profile {} is not valid YAML", self.output.display()))?;

        tracing::info!(path = %self.output.display(), "profile validated");
        Ok(())
    }
}

// ========================================
// 测试模块
// ========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, keep: usize) -> ProfileStore {
        ProfileStore::new(
            dir.join("output/clash_profile.yaml"),
            dir.join("backups"),
            keep,
        )
    }

    fn big_yaml() -> String {
        let mut text = String::from("rules:\n");
        for i in 0..100 {
            text.push_str(&format!("- DOMAIN,host{}.example,DIRECT\n", i));
        }
        text
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);

        assert!(store.is_stale(Duration::from_secs(3600)).unwrap());
        store.write("port: 7890\n").unwrap();
        assert!(store.exists());
        assert!(!store.is_stale(Duration::from_secs(3600)).unwrap());
    }

    #[test]
    fn test_backup_moves_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);

        assert!(store.backup().unwrap().is_none());

        store.write("port: 7890\n").unwrap();
        let backup = store.backup().unwrap().unwrap();
        assert!(!store.exists());
        assert!(backup.is_file());
        assert_eq!(store.backups().unwrap(), vec![backup.clone()]);

        store.restore(&backup).unwrap();
        assert!(store.exists());
        assert!(!backup.exists());
    }

    #[test]
    fn test_backups_within_same_second_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);

        store.write("port: 1\n").unwrap();
        let first = store.backup().unwrap().unwrap();
        store.write("port: 2\n").unwrap();
        let second = store.backup().unwrap().unwrap();
        assert_ne!(first, second);

        // 序号只在同一秒内出现；跨秒时两个名字也各不相同
        let backups = store.backups().unwrap();
        assert_eq!(backups, vec![second.clone(), first.clone()]);
        assert_eq!(fs::read_to_string(&first).unwrap(), "port: 1\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "port: 2\n");
    }

    #[test]
    fn test_backup_sequence_ordering() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);
        let backups = dir.path().join("backups");
        fs::create_dir_all(&backups).unwrap();

        for name in [
            "clash_profile_20240101_000000.yaml",
            "clash_profile_20240101_000000_2.yaml",
            "clash_profile_20240101_000000_10.yaml",
            "clash_profile_20231231_235959_3.yaml",
        ] {
            fs::write(backups.join(name), "x").unwrap();
        }

        let names: Vec<String> = store
            .backups()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "clash_profile_20240101_000000_10.yaml",
                "clash_profile_20240101_000000_2.yaml",
                "clash_profile_20240101_000000.yaml",
                "clash_profile_20231231_235959_3.yaml",
            ]
        );
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 2);
        let backups = dir.path().join("backups");
        fs::create_dir_all(&backups).unwrap();

        for stamp in ["20240101_000000", "20240102_000000", "20240103_000000"] {
            fs::write(backups.join(format!("clash_profile_{}.yaml", stamp)), "x").unwrap();
        }
        fs::write(backups.join("unrelated.yaml"), "x").unwrap();

        let removed = store.prune_backups().unwrap();
        assert_eq!(removed, vec![backups.join("clash_profile_20240101_000000.yaml")]);
        assert_eq!(store.backups().unwrap().len(), 2);
        assert!(backups.join("unrelated.yaml").exists());
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 10);

        assert!(store.validate().is_err());

        store.write("port: 7890\n").unwrap();
        assert!(store.validate().is_err(), "too small");

        store.write(&format!("{}bad: [unclosed\n", big_yaml())).unwrap();
        assert!(store.validate().is_err(), "invalid yaml");

        store.write(&big_yaml()).unwrap();
        store.validate().unwrap();
    }
}
