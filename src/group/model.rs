//! # 代理组数据结构
//!
//! `GroupSpec` 的字段顺序即输出顺序：
//! `name, type, use, filter, proxies, url, timeout, tolerance, strategy, interval`。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 字面量成员：不指向任何代理组，但客户端总能识别
pub const SENTINELS: [&str; 2] = ["DIRECT", "REJECT"];

/// 直连哨兵
pub const DIRECT: &str = "DIRECT";

/// 代理组类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    /// 手动选择
    Select,
    /// 按延迟自动选择
    UrlTest,
    /// 故障转移
    Fallback,
    /// 负载均衡
    LoadBalance,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Select => "select",
            GroupKind::UrlTest => "url-test",
            GroupKind::Fallback => "fallback",
            GroupKind::LoadBalance => "load-balance",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(GroupKind::Select),
            "url-test" => Ok(GroupKind::UrlTest),
            "fallback" => Ok(GroupKind::Fallback),
            "load-balance" => Ok(GroupKind::LoadBalance),
            other => Err(format!("unknown group type '{}'", other)),
        }
    }
}

/// 与组类型相关的调优参数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyParams {
    /// 健康检查地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
}

impl PolicyParams {
    /// 按提供者拆分的自动组：固定 `tolerance=100, interval=300`
    pub fn per_provider(test_url: &str) -> Self {
        Self {
            url: Some(test_url.to_string()),
            tolerance: Some(100),
            interval: Some(300),
            ..Default::default()
        }
    }

    /// 合并地区组与自定义组的按类型调优
    pub fn merged(kind: GroupKind, test_url: &str) -> Self {
        let url = Some(test_url.to_string());
        match kind {
            GroupKind::Fallback => Self {
                url,
                timeout: Some(5000),
                interval: Some(600),
                ..Default::default()
            },
            GroupKind::UrlTest => Self {
                url,
                tolerance: Some(500),
                interval: Some(600),
                ..Default::default()
            },
            GroupKind::LoadBalance => Self::load_balance("consistent-hashing", test_url),
            GroupKind::Select => Self {
                url,
                ..Default::default()
            },
        }
    }

    /// 负载均衡组，策略字符串来自配置
    pub fn load_balance(strategy: &str, test_url: &str) -> Self {
        Self {
            url: Some(test_url.to_string()),
            strategy: Some(strategy.to_string()),
            interval: Some(600),
            ..Default::default()
        }
    }
}

/// 一个代理组定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
    /// 引用的提供者 id
    #[serde(rename = "use", skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<String>,
    /// 节点名过滤正则
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// 成员（DIRECT / 其它组名 / 节点名）
    #[serde(rename = "proxies", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(flatten)]
    pub policy: PolicyParams,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            name: name.into(),
            kind,
            providers: Vec::new(),
            filter: None,
            members: Vec::new(),
            policy: PolicyParams::default(),
        }
    }
}

/// 自定义组：额外携带要插入的主组集合（空集表示插入所有主组）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomGroupSpec {
    pub group: GroupSpec,
    pub target_main_groups: Vec<String>,
}

impl CustomGroupSpec {
    /// 是否应出现在给定主组中
    pub fn targets(&self, main_group: &str) -> bool {
        self.target_main_groups.is_empty()
            || self.target_main_groups.iter().any(|t| t == main_group)
    }
}
