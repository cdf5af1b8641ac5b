//! # 生成流水线
//!
//! 加载模板 → 合成 → 输出诊断 → 编码。
//! `generate` / `check` / `update` 共用这一条路径。

use anyhow::{bail, Context, Result};

use crate::config::{Settings, Template};
use crate::group::Diagnostics;
use crate::profile::{self, OutputFormat};

/// 一次渲染的结果
#[derive(Debug)]
pub struct Rendered {
    /// 编码后的配置文本
    pub text: String,
    pub group_count: usize,
    pub rule_count: usize,
    pub diagnostics: Diagnostics,
}

/// 渲染配置
///
/// `strict` 为真时，任何 Warning 级诊断都视为失败。
pub fn render(settings: &Settings, format: OutputFormat, strict: bool) -> Result<Rendered> {
    let template = Template::load(&settings.files.rules_config)?;

    tracing::info!(
        providers = ?settings.provider_ids(),
        region_count = settings.regions.len(),
        regions = ?settings.regions.names(),
        "generating profile"
    );
    if settings.regions.is_empty() {
        tracing::warn!("no regions configured, only template groups will be generated");
    }

    let mut diagnostics = Diagnostics::new();
    let profile = profile::generate(settings, &template, &mut diagnostics)
        .context("Profile generation aborted")?;
    diagnostics.emit();

    if strict && diagnostics.has_warnings() {
        bail!(
            "{} warning(s) reported in strict mode",
            diagnostics.warnings().count()
        );
    }

    let text = profile::encode(&profile, format)?;
    Ok(Rendered {
        text,
        group_count: profile.proxy_groups.len(),
        rule_count: profile.rules.len(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn settings_with_template(dir: &Path, extra: &str) -> Settings {
        let rules = dir.join("rules.yaml");
        fs::write(
            &rules,
            "proxy_groups:\n  main_groups:\n    - name: G1\n      type: select\nruleset_rules: [\"MATCH,G1\"]\n",
        )
        .unwrap();

        let text = format!(
            "[files]\nrules_config = {}\n[proxy_providers]\np = https://p\n[regions]\nA = 🅰️,aa\n{}",
            rules.display(),
            extra
        );
        Settings::parse(&text, Path::new("test.ini")).unwrap()
    }

    #[test]
    fn test_render_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_template(dir.path(), "");

        let rendered = render(&settings, OutputFormat::Yaml, false).unwrap();
        assert_eq!(rendered.group_count, 2);
        assert_eq!(rendered.rule_count, 1);
        assert!(rendered.text.contains("🅰️A自动_P"));
    }

    #[test]
    fn test_strict_rejects_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_template(dir.path(), "[custom_groups]\n坏 = x,select\n");

        let lenient = render(&settings, OutputFormat::Yaml, false).unwrap();
        assert!(lenient.diagnostics.has_warnings());
        assert!(render(&settings, OutputFormat::Yaml, true).is_err());
    }

    #[test]
    fn test_missing_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!(
            "[files]\nrules_config = {}\n[proxy_providers]\np = https://p\n",
            dir.path().join("missing.yaml").display()
        );
        let settings = Settings::parse(&text, Path::new("test.ini")).unwrap();
        assert!(render(&settings, OutputFormat::Yaml, false).is_err());
    }
}
