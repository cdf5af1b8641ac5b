//! # 规则模板文档
//!
//! YAML 模板声明主组、特殊组、规则集提供者与规则。
//! `rule-providers` 作为不透明映射原样透传。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_yaml::Mapping;

use crate::error::ConfigError;
use crate::group::GroupKind;

/// 主组模板：成员由合成器填充
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MainGroupTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
}

/// 特殊组模板：成员为字面量列表，不绑定提供者
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecialGroupTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proxies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProxyGroupTemplates {
    #[serde(default, deserialize_with = "null_as_default")]
    pub main_groups: Vec<MainGroupTemplate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub special_groups: Vec<SpecialGroupTemplate>,
}

/// 自定义规则的两种历史格式
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CustomRules {
    /// 扁平列表
    Flat(Vec<String>),
    /// 旧格式：类别 -> 规则列表，按映射顺序展开
    Categorized(Mapping),
}

impl Default for CustomRules {
    fn default() -> Self {
        CustomRules::Flat(Vec::new())
    }
}

/// 模板文档
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Template {
    #[serde(default, deserialize_with = "null_as_default")]
    pub proxy_groups: ProxyGroupTemplates,
    #[serde(default, rename = "rule-providers", deserialize_with = "null_as_default")]
    pub rule_providers: Mapping,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_rules: CustomRules,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ruleset_rules: Vec<String>,
}

/// 键存在但值为空（例如条目全部被注释掉）时按缺省处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Template {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        // 空文档视为空模板
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: origin.to_path_buf(),
            source,
        })
    }
}
