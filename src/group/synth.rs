//! # 代理组合成器
//!
//! 一次生成的流程：
//! 1. 选择策略：按提供者拆分（每个提供者 × 支持地区一个 url-test 组）或按地区合并
//! 2. 生成地区组（两种策略互斥，名称只在这里推导一次，主组成员直接复用）
//! 3. 解析自定义组
//! 4. 可选的手动选择组
//! 5. 组装主组成员：默认节点 → DIRECT → 地区组 → 自定义组 → 手动选择组（去重）
//! 6. 合并：主组 ++ 特殊组 ++ 地区组 ++ 自定义组 ++ 手动选择组
//!
//! 除“没有提供者”外，所有问题都只跳过对应的组并写入诊断。

use std::collections::HashSet;

use crate::config::settings::{split_list, CustomGroupDecl, Settings};
use crate::config::Template;
use crate::error::GenerateError;
use crate::region::Region;

use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::filter;
use super::model::{CustomGroupSpec, GroupKind, GroupSpec, PolicyParams, DIRECT, SENTINELS};

/// 按提供者拆分的组名后缀
const AUTO_SUFFIX: &str = "自动_";
/// 额外负载均衡组的组名后缀
const LOAD_BALANCE_SUFFIX: &str = "_负载均衡";

/// 地区组的生成策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// 每个提供者 × 支持地区一个组
    PerProvider,
    /// 每个地区一个组，成员来自所有提供者
    Merged,
}

impl Strategy {
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.clash.use_merged_region_groups {
            Strategy::Merged
        } else {
            Strategy::PerProvider
        }
    }
}

/// 合成全部代理组
///
/// 可恢复问题写入 `diags`；唯一的错误是没有任何提供者。
pub fn synthesize(
    settings: &Settings,
    template: &Template,
    diags: &mut Diagnostics,
) -> Result<Vec<GroupSpec>, GenerateError> {
    if settings.providers.is_empty() {
        return Err(GenerateError::NoProviders);
    }

    let mut synth = Synthesizer {
        settings,
        template,
        providers: settings.provider_ids(),
        diags,
    };

    let regions = synth.region_groups(Strategy::from_settings(settings));
    let customs = synth.custom_groups();
    let manual = synth.manual_group();

    let mut groups = synth.main_groups(&regions, &customs, manual.as_ref());
    groups.extend(synth.special_groups());
    groups.extend(regions);
    groups.extend(customs.into_iter().map(|c| c.group));
    groups.extend(manual);

    check_consistency(&groups, synth.diags);
    Ok(groups)
}

struct Synthesizer<'a> {
    settings: &'a Settings,
    template: &'a Template,
    providers: Vec<String>,
    diags: &'a mut Diagnostics,
}

impl<'a> Synthesizer<'a> {
    // ========================================
    // 地区组
    // ========================================

    /// 地区组（名称与定义同源，主组成员直接取这里的名称）
    fn region_groups(&mut self, strategy: Strategy) -> Vec<GroupSpec> {
        let usable = self.usable_regions();
        match strategy {
            Strategy::PerProvider => self.per_provider_groups(&usable),
            Strategy::Merged => self.merged_groups(&usable),
        }
    }

    /// 有关键词的地区；没有关键词的地区报告一次后跳过
    fn usable_regions(&mut self) -> Vec<&'a Region> {
        let settings = self.settings;
        settings
            .regions
            .iter()
            .filter(|region| {
                if region.keywords.is_empty() {
                    self.diags.push(
                        DiagnosticKind::MissingKeywords,
                        &region.name,
                        "region has no keywords, no groups generated for it",
                    );
                    return false;
                }
                true
            })
            .collect()
    }

    fn filter_for(&self, keywords: &[String]) -> String {
        filter::compile(keywords, &self.settings.exclude_keywords)
    }

    /// 某提供者支持的地区
    fn supported_regions(&mut self, provider: &str, usable: &[&'a Region]) -> Vec<&'a Region> {
        let settings = self.settings;
        if settings.clash.generate_all_region_groups {
            return usable.to_vec();
        }
        let Some(allow) = settings.allow_list(provider) else {
            return usable.to_vec();
        };

        for name in allow {
            if !settings.regions.contains(name) {
                self.diags.push(
                    DiagnosticKind::UnknownAllowListRegion,
                    provider,
                    format!("allow-list names unknown region '{}'", name),
                );
            }
        }

        usable
            .iter()
            .copied()
            .filter(|region| {
                let allowed = allow.iter().any(|a| a.eq_ignore_ascii_case(&region.name));
                if !allowed {
                    self.diags.push(
                        DiagnosticKind::NotInAllowList,
                        provider,
                        format!("region '{}' not in allow-list, skipped", region.name),
                    );
                }
                allowed
            })
            .collect()
    }

    fn per_provider_groups(&mut self, usable: &[&'a Region]) -> Vec<GroupSpec> {
        let settings = self.settings;
        let test_url = &settings.clash.test_url;
        let mut groups = Vec::new();

        for provider in self.providers.clone() {
            for region in self.supported_regions(&provider, usable) {
                let mut group = GroupSpec::new(
                    format!("{}{}{}", region.label(), AUTO_SUFFIX, provider),
                    GroupKind::UrlTest,
                );
                group.providers = vec![provider.clone()];
                group.filter = Some(self.filter_for(&region.keywords));
                group.policy = PolicyParams::per_provider(test_url);
                groups.push(group);
            }
        }

        groups
    }

    fn merged_groups(&mut self, usable: &[&'a Region]) -> Vec<GroupSpec> {
        let settings = self.settings;
        let test_url = &settings.clash.test_url;

        for (region, _) in &settings.load_balance_regions {
            if !settings.regions.contains(region) {
                self.diags.push(
                    DiagnosticKind::UnknownLoadBalanceRegion,
                    region,
                    "load-balance entry names unknown region",
                );
            }
        }

        let mut groups = Vec::new();
        for region in usable {
            let kind = settings.merged_regions.kind_for(&region.name);
            let filter = self.filter_for(&region.keywords);

            let mut group = GroupSpec::new(region.label(), kind);
            group.providers = self.providers.clone();
            group.filter = Some(filter.clone());
            group.policy = PolicyParams::merged(kind, test_url);
            groups.push(group);

            // 额外的负载均衡组与主地区组并存
            if let Some(strategy) = settings.load_balance_strategy(&region.name) {
                let mut lb = GroupSpec::new(
                    format!("{}{}", region.label(), LOAD_BALANCE_SUFFIX),
                    GroupKind::LoadBalance,
                );
                lb.providers = self.providers.clone();
                lb.filter = Some(filter);
                lb.policy = PolicyParams::load_balance(strategy, test_url);
                groups.push(lb);
            }
        }

        groups
    }

    // ========================================
    // 自定义组
    // ========================================

    fn custom_groups(&mut self) -> Vec<CustomGroupSpec> {
        let settings = self.settings;
        let customs: Vec<_> = settings
            .custom_groups
            .iter()
            .filter_map(|decl| self.custom_group(decl))
            .collect();

        let template = self.template;
        let main_names: Vec<&str> = template
            .proxy_groups
            .main_groups
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        for custom in &customs {
            for target in &custom.target_main_groups {
                if !main_names.contains(&target.as_str()) {
                    self.diags.push(
                        DiagnosticKind::UnknownMainGroup,
                        &custom.group.name,
                        format!("target main group '{}' is not declared", target),
                    );
                }
            }
        }

        customs
    }

    /// 解析 `glyph,type,providers|...,regions|...,targets|...`
    fn custom_group(&mut self, decl: &CustomGroupDecl) -> Option<CustomGroupSpec> {
        let fields: Vec<&str> = decl.record.split(',').map(str::trim).collect();
        if fields.len() < 4 {
            self.diags.push(
                DiagnosticKind::MalformedCustomGroup,
                &decl.name,
                format!("expected at least 4 fields, got {}", fields.len()),
            );
            return None;
        }

        let kind = match fields[1].parse::<GroupKind>() {
            Ok(kind) => kind,
            Err(e) => {
                self.diags
                    .push(DiagnosticKind::MalformedCustomGroup, &decl.name, e);
                return None;
            }
        };

        let providers = self.resolve_providers(&decl.name, fields[2])?;
        let keywords = self.resolve_keywords(&decl.name, fields[3])?;
        let target_main_groups = fields.get(4).map(|t| split_list(t, '|')).unwrap_or_default();

        let mut group = GroupSpec::new(format!("{}{}", fields[0], decl.name), kind);
        group.providers = providers;
        group.filter = Some(self.filter_for(&keywords));
        group.policy = PolicyParams::merged(kind, &self.settings.clash.test_url);

        Some(CustomGroupSpec {
            group,
            target_main_groups,
        })
    }

    /// 空列表表示所有提供者；否则与已知提供者取交集，交集为空则跳过
    fn resolve_providers(&mut self, group: &str, field: &str) -> Option<Vec<String>> {
        let requested = split_list(field, '|');
        if requested.is_empty() {
            return Some(self.providers.clone());
        }

        let mut resolved = Vec::new();
        for name in requested {
            let id = name.to_uppercase();
            if !self.providers.contains(&id) {
                self.diags.push(
                    DiagnosticKind::UnknownProvider,
                    group,
                    format!("unknown provider '{}'", name),
                );
            } else if !resolved.contains(&id) {
                resolved.push(id);
            }
        }

        if resolved.is_empty() {
            self.diags.push(
                DiagnosticKind::UnknownProvider,
                group,
                "no known providers left, group skipped",
            );
            return None;
        }
        Some(resolved)
    }

    /// 合并所有引用地区的关键词（去重，保持首次出现顺序）
    ///
    /// 任一地区不存在或没有关键词都会跳过整个组。
    fn resolve_keywords(&mut self, group: &str, field: &str) -> Option<Vec<String>> {
        let regions = split_list(field, '|');
        if regions.is_empty() {
            self.diags.push(
                DiagnosticKind::MissingKeywords,
                group,
                "no regions listed, group skipped",
            );
            return None;
        }

        let mut keywords: Vec<String> = Vec::new();
        for name in &regions {
            match self.settings.regions.keywords(name) {
                None => {
                    self.diags.push(
                        DiagnosticKind::UnknownRegion,
                        group,
                        format!("unknown region '{}', group skipped", name),
                    );
                    return None;
                }
                Some([]) => {
                    self.diags.push(
                        DiagnosticKind::MissingKeywords,
                        group,
                        format!("region '{}' has no keywords, group skipped", name),
                    );
                    return None;
                }
                Some(found) => {
                    for kw in found {
                        if !keywords.contains(kw) {
                            keywords.push(kw.clone());
                        }
                    }
                }
            }
        }
        Some(keywords)
    }

    // ========================================
    // 手动选择组
    // ========================================

    fn manual_group(&self) -> Option<GroupSpec> {
        let manual = &self.settings.manual_select;
        if !manual.enabled {
            return None;
        }
        let mut group = GroupSpec::new(manual.group_name(), GroupKind::Select);
        group.providers = self.providers.clone();
        Some(group)
    }

    // ========================================
    // 主组与特殊组
    // ========================================

    fn main_groups(
        &self,
        regions: &[GroupSpec],
        customs: &[CustomGroupSpec],
        manual: Option<&GroupSpec>,
    ) -> Vec<GroupSpec> {
        self.template
            .proxy_groups
            .main_groups
            .iter()
            .map(|tmpl| {
                let mut members = Members::default();
                if let Some(node) = self.settings.default_node(&tmpl.name) {
                    members.push(node);
                }
                members.push(DIRECT);
                for region in regions {
                    members.push(&region.name);
                }
                for custom in customs.iter().filter(|c| c.targets(&tmpl.name)) {
                    members.push(&custom.group.name);
                }
                if let Some(manual) = manual {
                    members.push(&manual.name);
                }

                let mut group = GroupSpec::new(tmpl.name.clone(), tmpl.kind);
                group.providers = self.providers.clone();
                group.members = members.into_vec();
                group
            })
            .collect()
    }

    fn special_groups(&self) -> Vec<GroupSpec> {
        self.template
            .proxy_groups
            .special_groups
            .iter()
            .map(|tmpl| {
                let mut group = GroupSpec::new(tmpl.name.clone(), tmpl.kind);
                group.members = tmpl.proxies.clone();
                group
            })
            .collect()
    }
}

/// 保持插入顺序的去重成员列表
#[derive(Default)]
struct Members {
    seen: HashSet<String>,
    list: Vec<String>,
}

impl Members {
    fn push(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.list.push(name.to_string());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.list
    }
}

/// 报告重名组与悬空成员引用，不修改输出
fn check_consistency(groups: &[GroupSpec], diags: &mut Diagnostics) {
    let mut names = HashSet::new();
    for group in groups {
        if !names.insert(group.name.as_str()) {
            diags.push(
                DiagnosticKind::DuplicateGroupName,
                &group.name,
                "group name defined more than once",
            );
        }
    }

    for group in groups {
        for member in &group.members {
            if !SENTINELS.contains(&member.as_str()) && !names.contains(member.as_str()) {
                diags.push(
                    DiagnosticKind::DanglingMember,
                    &group.name,
                    format!("member '{}' is neither a sentinel nor a group", member),
                );
            }
        }
    }
}

// ========================================
// 测试模块
// ========================================
#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const TEMPLATE: &str = r#"
proxy_groups:
  main_groups:
    - name: G1
      type: select
    - name: G2
      type: select
  special_groups:
    - name: 🛑广告拦截
      type: select
      proxies: [REJECT, DIRECT]
"#;

    fn settings(text: &str) -> Settings {
        Settings::parse(text, Path::new("test.ini")).unwrap()
    }

    fn template() -> Template {
        Template::parse(TEMPLATE, Path::new("rules.yaml")).unwrap()
    }

    fn run(text: &str) -> (Vec<GroupSpec>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let groups = synthesize(&settings(text), &template(), &mut diags).unwrap();
        (groups, diags)
    }

    fn names(groups: &[GroupSpec]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    fn find<'g>(groups: &'g [GroupSpec], name: &str) -> &'g GroupSpec {
        groups
            .iter()
            .find(|g| g.name == name)
            .unwrap_or_else(|| panic!("group {} missing", name))
    }

    const BASE: &str = r#"
[proxy_providers]
p = https://p.example
q = https://q.example

[regions]
A = 🅰️,aa,AA
B = 🅱️,bb

[filter]
exclude_keywords = X
"#;

    #[test]
    fn test_per_provider_groups() {
        let (groups, diags) = run(BASE);

        assert_eq!(
            names(&groups),
            [
                "G1",
                "G2",
                "🛑广告拦截",
                "🅰️A自动_P",
                "🅱️B自动_P",
                "🅰️A自动_Q",
                "🅱️B自动_Q",
            ]
        );

        let g = find(&groups, "🅰️A自动_P");
        assert_eq!(g.kind, GroupKind::UrlTest);
        assert_eq!(g.providers, ["P"]);
        assert_eq!(g.filter.as_deref(), Some("(?!.*(X)).*(aa|AA)"));
        assert_eq!(g.policy.tolerance, Some(100));
        assert_eq!(g.policy.interval, Some(300));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_allow_list_respected() {
        let text = format!("{}\n[provider_regions]\np = A\n", BASE);
        let (groups, diags) = run(&text);

        let all = names(&groups);
        assert!(all.contains(&"🅰️A自动_P"));
        assert!(!all.contains(&"🅱️B自动_P"));
        assert!(all.contains(&"🅱️B自动_Q"));

        // 主组成员与地区组同源，也不包含被跳过的组
        assert!(!find(&groups, "G1").members.iter().any(|m| m == "🅱️B自动_P"));

        // 按支持列表跳过只是信息级诊断
        assert_eq!(diags.of_kind(DiagnosticKind::NotInAllowList).count(), 1);
        assert!(!diags.has_warnings());
    }

    #[test]
    fn test_generate_all_overrides_allow_list() {
        let text = format!(
            "{}\n[provider_regions]\np = A\n[clash]\ngenerate_all_region_groups = true\n",
            BASE
        );
        let (groups, _) = run(&text);
        assert!(names(&groups).contains(&"🅱️B自动_P"));
    }

    #[test]
    fn test_merged_groups() {
        let text = format!(
            "{}\n[clash]\nuse_merged_region_groups = true\n\
             [merged_regions]\nB = url-test\n\
             [load_balance_regions]\nA = round-robin\n",
            BASE
        );
        let (groups, _) = run(&text);

        assert_eq!(
            names(&groups),
            ["G1", "G2", "🛑广告拦截", "🅰️A", "🅰️A_负载均衡", "🅱️B"]
        );

        let a = find(&groups, "🅰️A");
        assert_eq!(a.kind, GroupKind::Fallback);
        assert_eq!(a.providers, ["P", "Q"]);
        assert_eq!(a.policy.timeout, Some(5000));

        let lb = find(&groups, "🅰️A_负载均衡");
        assert_eq!(lb.kind, GroupKind::LoadBalance);
        assert_eq!(lb.filter, a.filter);
        assert_eq!(lb.policy.strategy.as_deref(), Some("round-robin"));

        let b = find(&groups, "🅱️B");
        assert_eq!(b.kind, GroupKind::UrlTest);
        assert_eq!(b.policy.tolerance, Some(500));

        assert_eq!(
            find(&groups, "G1").members,
            ["DIRECT", "🅰️A", "🅰️A_负载均衡", "🅱️B"]
        );
    }

    #[test]
    fn test_strategies_never_mix() {
        let (per_provider, _) = run(BASE);
        assert!(per_provider.iter().all(|g| g.name != "🅰️A" && g.name != "🅱️B"));

        let merged_text = format!("{}\n[clash]\nuse_merged_region_groups = true\n", BASE);
        let (merged, _) = run(&merged_text);
        assert!(merged.iter().all(|g| !g.name.contains(AUTO_SUFFIX)));
    }

    #[test]
    fn test_default_node_not_duplicated() {
        let text = format!(
            "{}\n[clash]\nuse_merged_region_groups = true\n\
             [proxy_group_defaults]\nG1 = 🅱️B\n",
            BASE
        );
        let (groups, _) = run(&text);

        let g1 = find(&groups, "G1");
        assert_eq!(g1.members, ["🅱️B", "DIRECT", "🅰️A"]);
        assert_eq!(g1.members.iter().filter(|m| *m == "🅱️B").count(), 1);

        let g2 = find(&groups, "G2");
        assert_eq!(g2.members, ["DIRECT", "🅰️A", "🅱️B"]);
    }

    #[test]
    fn test_custom_group_targeting() {
        let text = format!(
            "{}\n[custom_groups]\n流媒体 = 🎬,select,,A|B,G1\n全部 = 🌐,url-test,q,A\n",
            BASE
        );
        let (groups, diags) = run(&text);

        let media = find(&groups, "🎬流媒体");
        assert_eq!(media.kind, GroupKind::Select);
        assert_eq!(media.providers, ["P", "Q"]);
        assert_eq!(media.filter.as_deref(), Some("(?!.*(X)).*(aa|AA|bb)"));

        let all = find(&groups, "🌐全部");
        assert_eq!(all.providers, ["Q"]);

        assert!(find(&groups, "G1").members.contains(&"🎬流媒体".to_string()));
        assert!(!find(&groups, "G2").members.contains(&"🎬流媒体".to_string()));
        assert!(find(&groups, "G2").members.contains(&"🌐全部".to_string()));
        assert!(!diags.has_warnings());
    }

    #[test]
    fn test_malformed_custom_group_skipped() {
        let text = format!("{}\n[custom_groups]\n坏 = 🎬,select,p\n", BASE);
        let mut diags = Diagnostics::new();
        let groups = synthesize(&settings(&text), &template(), &mut diags).unwrap();

        assert!(!names(&groups).iter().any(|n| n.contains('坏')));
        assert_eq!(diags.of_kind(DiagnosticKind::MalformedCustomGroup).count(), 1);
        assert!(!groups.is_empty());
    }

    #[test]
    fn test_custom_group_unresolvable_references() {
        let text = format!(
            "{}\n[custom_groups]\n\
             无提供者 = 🎬,select,nobody,A\n\
             无地区 = 🎬,select,,Z\n\
             坏类型 = 🎬,relay,,A\n\
             部分 = 🎬,select,p|nobody,A\n",
            BASE
        );
        let (groups, diags) = run(&text);

        let all = names(&groups);
        assert!(!all.contains(&"🎬无提供者"));
        assert!(!all.contains(&"🎬无地区"));
        assert!(!all.contains(&"🎬坏类型"));
        assert_eq!(find(&groups, "🎬部分").providers, ["P"]);

        assert_eq!(diags.of_kind(DiagnosticKind::UnknownRegion).count(), 1);
        assert_eq!(diags.of_kind(DiagnosticKind::MalformedCustomGroup).count(), 1);
        assert_eq!(diags.of_kind(DiagnosticKind::UnknownProvider).count(), 3);
    }

    #[test]
    fn test_custom_group_with_keywordless_region_skipped() {
        let text = r#"
[proxy_providers]
p = https://p

[regions]
A = 🅰️,aa
空 = 🫙

[custom_groups]
空组 = 🎬,select,,A|空,G1
"#;
        let (groups, diags) = run(text);

        assert!(!names(&groups).contains(&"🎬空组"));
        assert!(!find(&groups, "G1").members.iter().any(|m| m == "🎬空组"));

        let custom: Vec<_> = diags
            .of_kind(DiagnosticKind::MissingKeywords)
            .filter(|d| d.subject == "空组")
            .collect();
        assert_eq!(custom.len(), 1);
        assert!(custom[0].message.contains("空"));
    }

    #[test]
    fn test_unknown_target_main_group_reported() {
        let text = format!("{}\n[custom_groups]\n流媒体 = 🎬,select,,A,G9\n", BASE);
        let (groups, diags) = run(&text);

        assert!(names(&groups).contains(&"🎬流媒体"));
        assert_eq!(diags.of_kind(DiagnosticKind::UnknownMainGroup).count(), 1);
    }

    #[test]
    fn test_manual_select_group() {
        let text = format!(
            "{}\n[manual_select]\nenabled = true\nname = 手选\nglyph = ✋\n",
            BASE
        );
        let (groups, _) = run(&text);

        let manual = groups.last().unwrap();
        assert_eq!(manual.name, "✋手选");
        assert_eq!(manual.kind, GroupKind::Select);
        assert_eq!(manual.providers, ["P", "Q"]);
        assert!(manual.filter.is_none());
        assert_eq!(find(&groups, "G1").members.last().unwrap(), "✋手选");
    }

    #[test]
    fn test_main_group_member_order() {
        let text = format!(
            "{}\n[clash]\nuse_merged_region_groups = true\n\
             [custom_groups]\n流媒体 = 🎬,select,,A,G1\n\
             [manual_select]\nenabled = true\n\
             [proxy_group_defaults]\nG1 = 🅱️B\n",
            BASE
        );
        let (groups, diags) = run(&text);

        assert_eq!(
            find(&groups, "G1").members,
            ["🅱️B", "DIRECT", "🅰️A", "🎬流媒体", "🔧手动选择"]
        );
        assert_eq!(
            find(&groups, "G2").members,
            ["DIRECT", "🅰️A", "🅱️B", "🔧手动选择"]
        );
        assert!(!diags.has_warnings());
    }

    #[test]
    fn test_region_without_keywords_skipped() {
        let text = r#"
[proxy_providers]
p = https://p

[regions]
空 = 🫙
A = 🅰️,aa
"#;
        let (groups, diags) = run(text);
        assert!(!names(&groups).iter().any(|n| n.contains('空')));
        assert_eq!(diags.of_kind(DiagnosticKind::MissingKeywords).count(), 1);
    }

    #[test]
    fn test_special_groups_pass_through() {
        let (groups, _) = run(BASE);
        let special = find(&groups, "🛑广告拦截");
        assert_eq!(special.members, ["REJECT", "DIRECT"]);
        assert!(special.providers.is_empty());
    }

    #[test]
    fn test_duplicate_names_flagged_not_fixed() {
        let text = format!(
            "{}\n[clash]\nuse_merged_region_groups = true\n[custom_groups]\nA = 🅰️,select,,A\n",
            BASE
        );
        let (groups, diags) = run(&text);

        assert_eq!(groups.iter().filter(|g| g.name == "🅰️A").count(), 2);
        assert_eq!(diags.of_kind(DiagnosticKind::DuplicateGroupName).count(), 1);
    }

    #[test]
    fn test_dangling_default_node_flagged() {
        let text = format!("{}\n[proxy_group_defaults]\nG1 = 某节点\n", BASE);
        let (groups, diags) = run(&text);

        assert_eq!(find(&groups, "G1").members[0], "某节点");
        assert_eq!(diags.of_kind(DiagnosticKind::DanglingMember).count(), 1);
    }

    #[test]
    fn test_no_providers_is_fatal() {
        let mut diags = Diagnostics::new();
        let result = synthesize(&settings("[regions]\nA = 🅰️,aa\n"), &template(), &mut diags);
        assert_eq!(result, Err(GenerateError::NoProviders));
    }
}
