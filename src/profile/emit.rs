//! # 配置编码
//!
//! 默认输出 YAML（客户端直接使用），也可以输出 JSON 便于其它工具处理。

use std::fmt;

use anyhow::{Context, Result};

use super::model::Profile;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Clash / Clash Meta YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// 按格式编码配置
pub fn encode(profile: &Profile, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(profile).context("Failed to encode profile as YAML")
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(profile).context("Failed to encode profile as JSON")
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_yaml::Mapping;

    use super::*;
    use crate::group::{GroupKind, GroupSpec};
    use crate::profile::model::ProviderDescriptors;

    fn sample() -> Profile {
        Profile {
            port: 7890,
            socks_port: 7891,
            allow_lan: true,
            mode: "Rule".into(),
            log_level: "info".into(),
            external_controller: ":9090".into(),
            proxy_providers: ProviderDescriptors::default(),
            proxy_groups: vec![GroupSpec::new("🚀节点选择", GroupKind::Select)],
            rule_providers: Mapping::new(),
            rules: vec!["MATCH,🚀节点选择".into()],
        }
    }

    #[test]
    fn test_yaml_top_level_order() {
        let yaml = encode(&sample(), OutputFormat::Yaml).unwrap();
        let keys: Vec<&str> = yaml
            .lines()
            .filter(|l| !l.starts_with(' ') && !l.starts_with('-') && l.contains(':'))
            .map(|l| l.split(':').next().unwrap())
            .collect();

        assert_eq!(
            keys,
            [
                "port",
                "socks-port",
                "allow-lan",
                "mode",
                "log-level",
                "external-controller",
                "proxy-providers",
                "proxy-groups",
                "rule-providers",
                "rules",
            ]
        );
        // 非 ASCII 字符原样输出
        assert!(yaml.contains("🚀节点选择"));
    }

    #[test]
    fn test_json_output_parses() {
        let json = encode(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["proxy-groups"][0]["type"], "select");
        assert_eq!(value["socks-port"], 7891);
    }
}
