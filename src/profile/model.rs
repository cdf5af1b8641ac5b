//! # 输出数据结构
//!
//! 顶层键按固定顺序输出：
//! `port, socks-port, allow-lan, mode, log-level, external-controller,
//! proxy-providers, proxy-groups, rule-providers, rules`。

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Mapping;

use crate::config::Provider;
use crate::group::GroupSpec;

/// 提供者拉取间隔（秒）
pub const PROVIDER_INTERVAL: u32 = 3600;
/// 提供者健康检查间隔（秒）
pub const HEALTH_CHECK_INTERVAL: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HealthCheck {
    pub enable: bool,
    pub url: String,
    pub interval: u32,
}

/// 单个提供者的描述
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProviderDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub url: String,
    pub interval: u32,
    #[serde(rename = "health-check")]
    pub health_check: HealthCheck,
}

impl ProviderDescriptor {
    pub fn http(provider: &Provider, test_url: &str) -> Self {
        Self {
            kind: "http".to_string(),
            path: format!("./profiles/proxies/{}_proxies.yaml", provider.id.to_lowercase()),
            url: provider.url.clone(),
            interval: PROVIDER_INTERVAL,
            health_check: HealthCheck {
                enable: true,
                url: test_url.to_string(),
                interval: HEALTH_CHECK_INTERVAL,
            },
        }
    }
}

/// 提供者 id -> 描述，保持声明顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderDescriptors(pub Vec<(String, ProviderDescriptor)>);

impl Serialize for ProviderDescriptors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, descriptor) in &self.0 {
            map.serialize_entry(id, descriptor)?;
        }
        map.end()
    }
}

/// 最终配置，一次生成一个，组装后不再修改
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Profile {
    pub port: u16,
    #[serde(rename = "socks-port")]
    pub socks_port: u16,
    #[serde(rename = "allow-lan")]
    pub allow_lan: bool,
    pub mode: String,
    #[serde(rename = "log-level")]
    pub log_level: String,
    #[serde(rename = "external-controller")]
    pub external_controller: String,
    #[serde(rename = "proxy-providers")]
    pub proxy_providers: ProviderDescriptors,
    #[serde(rename = "proxy-groups")]
    pub proxy_groups: Vec<GroupSpec>,
    #[serde(rename = "rule-providers")]
    pub rule_providers: Mapping,
    pub rules: Vec<String>,
}
