//! # 设置文档
//!
//! 把 INI 形式的设置文档一次性解析为类型化的 `Settings`。
//! 所有形状问题（非法整数/布尔值、未知组类型、非法关键词正则）汇总后一起报告，
//! 而不是在使用时逐个发现。
//!
//! 键名大小写不敏感；提供者 id 统一转为大写。

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, ParseOption};
use regex::Regex;

use crate::error::ConfigError;
use crate::group::GroupKind;
use crate::region::{Region, RegionCatalog};

// ========================================
// 默认值
// ========================================

pub const DEFAULT_PORT: u16 = 7890;
pub const DEFAULT_SOCKS_PORT: u16 = 7891;
pub const DEFAULT_MODE: &str = "Rule";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_CONTROLLER: &str = ":9090";
pub const DEFAULT_TEST_URL: &str = "http://connectivitycheck.gstatic.com/generate_204";
pub const DEFAULT_LB_STRATEGY: &str = "consistent-hashing";
pub const DEFAULT_UPDATE_INTERVAL: u64 = 3600;
/// 更新间隔上限：一年
pub const MAX_UPDATE_INTERVAL: u64 = 365 * 24 * 3600;
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_BACKUP_KEEP: usize = 10;

// ========================================
// 类型化设置
// ========================================

/// 代理提供者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    /// 大写 id
    pub id: String,
    /// 订阅地址
    pub url: String,
}

/// `[clash]` 段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClashSettings {
    pub port: u16,
    pub socks_port: u16,
    pub allow_lan: bool,
    pub mode: String,
    pub log_level: String,
    pub external_controller: String,
    pub test_url: String,
    /// 忽略 `[provider_regions]`，为每个提供者生成所有地区组
    pub generate_all_region_groups: bool,
    /// 使用合并地区组（否则按提供者拆分）
    pub use_merged_region_groups: bool,
}

impl Default for ClashSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            socks_port: DEFAULT_SOCKS_PORT,
            allow_lan: true,
            mode: DEFAULT_MODE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            external_controller: DEFAULT_CONTROLLER.to_string(),
            test_url: DEFAULT_TEST_URL.to_string(),
            generate_all_region_groups: false,
            use_merged_region_groups: false,
        }
    }
}

/// `[merged_regions]` 段：默认类型 + 按地区覆盖
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRegionSettings {
    pub default_type: GroupKind,
    pub overrides: Vec<(String, GroupKind)>,
}

impl Default for MergedRegionSettings {
    fn default() -> Self {
        Self {
            default_type: GroupKind::Fallback,
            overrides: Vec::new(),
        }
    }
}

impl MergedRegionSettings {
    /// 某地区合并组的类型
    pub fn kind_for(&self, region: &str) -> GroupKind {
        lookup(&self.overrides, region)
            .copied()
            .unwrap_or(self.default_type)
    }
}

/// `[custom_groups]` 中的一条原始声明
///
/// 记录格式 `glyph,type,providers|...,regions|...,targets|...` 在合成阶段解析，
/// 格式错误只跳过该组。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomGroupDecl {
    pub name: String,
    pub record: String,
}

/// `[manual_select]` 段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSelect {
    pub enabled: bool,
    pub name: String,
    pub glyph: String,
}

impl Default for ManualSelect {
    fn default() -> Self {
        Self {
            enabled: false,
            name: "手动选择".to_string(),
            glyph: "🔧".to_string(),
        }
    }
}

impl ManualSelect {
    pub fn group_name(&self) -> String {
        format!("{}{}", self.glyph, self.name)
    }
}

/// `[server]` 段中 HTTP 服务相关的键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// 为空时不校验 webhook 签名
    pub webhook_secret: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            webhook_secret: String::new(),
        }
    }
}

/// `[files]` 段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSettings {
    pub rules_config: PathBuf,
    pub output: PathBuf,
    pub backup_dir: PathBuf,
    pub backup_keep: usize,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            rules_config: PathBuf::from("config/rules.yaml"),
            output: PathBuf::from("output/clash_profile.yaml"),
            backup_dir: PathBuf::from("backups"),
            backup_keep: DEFAULT_BACKUP_KEEP,
        }
    }
}

/// 完整设置
#[derive(Debug, Clone)]
pub struct Settings {
    pub providers: Vec<Provider>,
    pub regions: RegionCatalog,
    /// 全局排除关键词，作用于所有地区组
    pub exclude_keywords: Vec<String>,
    /// 提供者 id -> 支持的地区（未出现的提供者支持所有地区）
    pub provider_regions: Vec<(String, Vec<String>)>,
    pub clash: ClashSettings,
    pub merged_regions: MergedRegionSettings,
    /// 地区 -> 额外负载均衡组的策略
    pub load_balance_regions: Vec<(String, String)>,
    pub custom_groups: Vec<CustomGroupDecl>,
    pub manual_select: ManualSelect,
    /// 主组名 -> 默认节点
    pub group_defaults: Vec<(String, String)>,
    pub files: FileSettings,
    /// 定时更新间隔（秒）
    pub update_interval: u64,
    pub server: ServerSettings,
}

impl Settings {
    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// 从文本解析，`origin` 只用于错误信息
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        // 关闭引号与转义处理，关键词里的反斜杠按原样保留
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(text, opt).map_err(|source| ConfigError::Ini {
            path: origin.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// 从已解析的 INI 构建并校验
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut r = Reader::new(ini);

        let providers = r
            .entries("proxy_providers")
            .into_iter()
            .filter_map(|(name, url)| {
                if url.is_empty() {
                    r.problem(format!("proxy_providers.{}: empty URL", name));
                    return None;
                }
                Some(Provider {
                    id: name.to_uppercase(),
                    url: url.to_string(),
                })
            })
            .collect();

        let regions = RegionCatalog::new(
            r.entries("regions")
                .into_iter()
                .map(|(name, value)| Region::parse(name, value)),
        );
        for region in regions.iter() {
            for kw in &region.keywords {
                r.check_pattern(&format!("regions.{}", region.name), kw);
            }
        }

        let exclude_keywords = split_list(r.get("filter", "exclude_keywords").unwrap_or(""), ',');
        for kw in &exclude_keywords {
            r.check_pattern("filter.exclude_keywords", kw);
        }

        let provider_regions = r
            .entries("provider_regions")
            .into_iter()
            .map(|(provider, list)| (provider.to_uppercase(), split_list(list, ',')))
            .filter(|(_, list)| !list.is_empty())
            .collect();

        let defaults = ClashSettings::default();
        let clash = ClashSettings {
            port: r.parse("clash", "port", defaults.port),
            socks_port: r.parse("clash", "socks_port", defaults.socks_port),
            allow_lan: r.boolean("clash", "allow_lan", defaults.allow_lan),
            mode: r.string("clash", "mode", &defaults.mode),
            log_level: r.string("clash", "log_level", &defaults.log_level),
            external_controller: r.string(
                "clash",
                "external_controller",
                &defaults.external_controller,
            ),
            test_url: r.string("clash", "test_url", &defaults.test_url),
            generate_all_region_groups: r.boolean("clash", "generate_all_region_groups", false),
            use_merged_region_groups: r.boolean("clash", "use_merged_region_groups", false),
        };

        let merged_regions = MergedRegionSettings {
            default_type: r.parse("merged_regions", "default_type", GroupKind::Fallback),
            overrides: r
                .entries("merged_regions")
                .into_iter()
                .filter(|(key, _)| !key.eq_ignore_ascii_case("default_type"))
                .filter_map(|(region, kind)| match kind.parse::<GroupKind>() {
                    Ok(kind) => Some((region.to_string(), kind)),
                    Err(e) => {
                        r.problem(format!("merged_regions.{}: {}", region, e));
                        None
                    }
                })
                .collect(),
        };

        let load_balance_regions = r
            .entries("load_balance_regions")
            .into_iter()
            .map(|(region, strategy)| {
                let strategy = if strategy.is_empty() {
                    DEFAULT_LB_STRATEGY
                } else {
                    strategy
                };
                (region.to_string(), strategy.to_string())
            })
            .collect();

        let custom_groups = r
            .entries("custom_groups")
            .into_iter()
            .map(|(name, record)| CustomGroupDecl {
                name: name.to_string(),
                record: record.to_string(),
            })
            .collect();

        let manual_defaults = ManualSelect::default();
        let manual_select = ManualSelect {
            enabled: r.boolean("manual_select", "enabled", false),
            name: r.string("manual_select", "name", &manual_defaults.name),
            glyph: r.string("manual_select", "glyph", &manual_defaults.glyph),
        };

        let group_defaults = r
            .entries("proxy_group_defaults")
            .into_iter()
            .filter(|(_, node)| !node.is_empty())
            .map(|(group, node)| (group.to_string(), node.to_string()))
            .collect();

        let file_defaults = FileSettings::default();
        let files = FileSettings {
            rules_config: r.path("files", "rules_config", &file_defaults.rules_config),
            output: r.path("files", "output", &file_defaults.output),
            backup_dir: r.path("files", "backup_dir", &file_defaults.backup_dir),
            backup_keep: r.parse("files", "backup_keep", file_defaults.backup_keep),
        };

        let update_interval = r.parse("server", "update_interval", DEFAULT_UPDATE_INTERVAL);
        if !(1..=MAX_UPDATE_INTERVAL).contains(&update_interval) {
            r.problem(format!(
                "server.update_interval: {} is outside 1..={} seconds",
                update_interval, MAX_UPDATE_INTERVAL
            ));
        }

        let server_defaults = ServerSettings::default();
        let server = ServerSettings {
            host: r.string("server", "host", &server_defaults.host),
            port: r.parse("server", "port", server_defaults.port),
            webhook_secret: r.get("server", "webhook_secret").unwrap_or("").to_string(),
        };

        r.finish()?;

        Ok(Self {
            providers,
            regions,
            exclude_keywords,
            provider_regions,
            clash,
            merged_regions,
            load_balance_regions,
            custom_groups,
            manual_select,
            group_defaults,
            files,
            update_interval,
            server,
        })
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.id.clone()).collect()
    }

    /// 某提供者的显式支持列表；`None` 表示未配置
    pub fn allow_list(&self, provider: &str) -> Option<&[String]> {
        lookup(&self.provider_regions, provider).map(Vec::as_slice)
    }

    /// 某地区的负载均衡策略；`None` 表示不创建额外的负载均衡组
    pub fn load_balance_strategy(&self, region: &str) -> Option<&str> {
        lookup(&self.load_balance_regions, region).map(String::as_str)
    }

    /// 某主组的默认节点
    pub fn default_node(&self, main_group: &str) -> Option<&str> {
        lookup(&self.group_defaults, main_group).map(String::as_str)
    }
}

/// 大小写不敏感的有序键值查找，后出现者优先
fn lookup<'a, V>(pairs: &'a [(String, V)], key: &str) -> Option<&'a V> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k.eq_ignore_ascii_case(key.trim()))
        .map(|(_, v)| v)
}

/// 按分隔符切分并去掉空白项
pub fn split_list(value: &str, sep: char) -> Vec<String> {
    value
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// INI 风格布尔值
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

// ========================================
// 读取辅助：收集所有问题后统一报告
// ========================================

struct Reader<'a> {
    ini: &'a Ini,
    problems: Vec<String>,
}

impl<'a> Reader<'a> {
    fn new(ini: &'a Ini) -> Self {
        Self {
            ini,
            problems: Vec::new(),
        }
    }

    fn problem(&mut self, msg: String) {
        self.problems.push(msg);
    }

    /// 某段的全部键值（去空白，保留顺序）
    fn entries(&self, section: &str) -> Vec<(&'a str, &'a str)> {
        self.ini
            .section(Some(section))
            .map(|props| props.iter().map(|(k, v)| (k.trim(), v.trim())).collect())
            .unwrap_or_default()
    }

    fn get(&self, section: &str, key: &str) -> Option<&'a str> {
        self.entries(section)
            .into_iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    fn string(&self, section: &str, key: &str, default: &str) -> String {
        match self.get(section, key) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => default.to_string(),
        }
    }

    fn path(&self, section: &str, key: &str, default: &Path) -> PathBuf {
        self.get(section, key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default.to_path_buf())
    }

    fn parse<T>(&mut self, section: &str, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(section, key) {
            Some(v) if !v.is_empty() => match v.parse::<T>() {
                Ok(parsed) => parsed,
                Err(e) => {
                    self.problem(format!("{}.{}: invalid value '{}': {}", section, key, v, e));
                    default
                }
            },
            _ => default,
        }
    }

    fn boolean(&mut self, section: &str, key: &str, default: bool) -> bool {
        match self.get(section, key) {
            Some(v) if !v.is_empty() => parse_bool(v).unwrap_or_else(|| {
                self.problem(format!("{}.{}: '{}' is not a boolean", section, key, v));
                default
            }),
            _ => default,
        }
    }

    /// 关键词会被拼进客户端正则，先确认它本身是合法的正则片段
    fn check_pattern(&mut self, field: &str, keyword: &str) {
        if let Err(e) = Regex::new(keyword) {
            self.problem(format!(
                "{}: keyword '{}' is not a valid pattern: {}",
                field, keyword, e
            ));
        }
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self.problems))
        }
    }
}

// ========================================
// 测试模块
// ========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Settings, ConfigError> {
        Settings::parse(text, Path::new("test.ini"))
    }

    const SAMPLE: &str = r#"
[proxy_providers]
alpha = https://a.example/sub
Beta = https://b.example/sub

[regions]
香港 = 🇭🇰,香港,HK,Hong Kong
日本 = 🇯🇵,日本,JP

[filter]
exclude_keywords = 过期, 剩余流量

[provider_regions]
beta = 日本

[clash]
port = 7900
allow_lan = no
use_merged_region_groups = true

[merged_regions]
default_type = url-test
日本 = fallback

[load_balance_regions]
香港 = round-robin

[custom_groups]
流媒体 = 🎬,select,,香港|日本,

[manual_select]
enabled = yes

[proxy_group_defaults]
🚀节点选择 = 🇭🇰香港
"#;

    #[test]
    fn test_parse_sample() {
        let s = parse(SAMPLE).unwrap();

        assert_eq!(s.provider_ids(), ["ALPHA", "BETA"]);
        assert_eq!(s.regions.names(), ["香港", "日本"]);
        assert_eq!(s.exclude_keywords, ["过期", "剩余流量"]);
        assert_eq!(s.allow_list("BETA").unwrap(), ["日本"]);
        assert!(s.allow_list("ALPHA").is_none());

        assert_eq!(s.clash.port, 7900);
        assert_eq!(s.clash.socks_port, DEFAULT_SOCKS_PORT);
        assert!(!s.clash.allow_lan);
        assert!(s.clash.use_merged_region_groups);
        assert_eq!(s.clash.external_controller, ":9090");

        assert_eq!(s.merged_regions.kind_for("香港"), GroupKind::UrlTest);
        assert_eq!(s.merged_regions.kind_for("日本"), GroupKind::Fallback);
        assert_eq!(s.load_balance_strategy("香港"), Some("round-robin"));
        assert_eq!(s.load_balance_strategy("日本"), None);

        assert_eq!(s.custom_groups.len(), 1);
        assert_eq!(s.custom_groups[0].name, "流媒体");
        assert!(s.manual_select.enabled);
        assert_eq!(s.manual_select.group_name(), "🔧手动选择");
        assert_eq!(s.default_node("🚀节点选择"), Some("🇭🇰香港"));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let s = parse("[proxy_providers]\na = https://a\n").unwrap();
        assert_eq!(s.clash, ClashSettings::default());
        assert_eq!(s.files, FileSettings::default());
        assert_eq!(s.update_interval, DEFAULT_UPDATE_INTERVAL);
        assert_eq!(s.server, ServerSettings::default());
        assert!(s.regions.is_empty());
        assert!(!s.manual_select.enabled);
    }

    #[test]
    fn test_empty_document_has_no_providers() {
        let s = parse("").unwrap();
        assert!(s.providers.is_empty());
    }

    #[test]
    fn test_all_problems_reported_together() {
        let text = r#"
[clash]
port = abc
allow_lan = maybe

[merged_regions]
default_type = relay
"#;
        match parse(text) {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 3, "{:?}", problems);
                assert!(problems[0].contains("clash.port"));
                assert!(problems[1].contains("clash.allow_lan"));
                assert!(problems[2].contains("merged_regions.default_type"));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_update_interval_bounded() {
        for value in ["0", "10000000000000000"] {
            let text = format!("[server]\nupdate_interval = {}\n", value);
            match parse(&text) {
                Err(ConfigError::Invalid(problems)) => {
                    assert_eq!(problems.len(), 1);
                    assert!(problems[0].contains("server.update_interval"));
                }
                other => panic!("unexpected: {:?}", other.map(|_| ())),
            }
        }

        let s = parse("[server]\nupdate_interval = 31536000\n").unwrap();
        assert_eq!(s.update_interval, MAX_UPDATE_INTERVAL);
    }

    #[test]
    fn test_server_section() {
        let s = parse("[server]\nhost = 0.0.0.0\nport = 5000\nwebhook_secret = s3cret\n").unwrap();
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.server.port, 5000);
        assert_eq!(s.server.webhook_secret, "s3cret");
    }

    #[test]
    fn test_invalid_keyword_pattern_rejected() {
        let text = "[regions]\n坏 = ❌,(unclosed\n";
        assert!(matches!(parse(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_allow_list_means_all() {
        let s = parse("[provider_regions]\na =\n").unwrap();
        assert!(s.allow_list("A").is_none());
    }

    #[test]
    fn test_empty_lb_strategy_defaults() {
        let s = parse("[load_balance_regions]\n香港 =\n").unwrap();
        assert_eq!(s.load_balance_strategy("香港"), Some(DEFAULT_LB_STRATEGY));
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
