//! # 配置组装
//!
//! 纯组合：除字段装配外没有自己的控制流。

use crate::config::{Settings, Template};
use crate::error::GenerateError;
use crate::group::{self, Diagnostics, GroupSpec};
use crate::rule;

use super::model::{Profile, ProviderDescriptor, ProviderDescriptors};

/// 一次完整生成：合成代理组后组装配置
///
/// 可恢复问题写入 `diags`，只有“没有提供者”会返回错误。
pub fn generate(
    settings: &Settings,
    template: &Template,
    diags: &mut Diagnostics,
) -> Result<Profile, GenerateError> {
    let groups = group::synthesize(settings, template, diags)?;
    Ok(assemble(settings, template, groups))
}

/// 把已合成的代理组与设置、模板组合成配置
fn assemble(settings: &Settings, template: &Template, groups: Vec<GroupSpec>) -> Profile {
    let clash = &settings.clash;

    let proxy_providers = ProviderDescriptors(
        settings
            .providers
            .iter()
            .map(|p| (p.id.clone(), ProviderDescriptor::http(p, &clash.test_url)))
            .collect(),
    );

    Profile {
        port: clash.port,
        socks_port: clash.socks_port,
        allow_lan: clash.allow_lan,
        mode: clash.mode.clone(),
        log_level: clash.log_level.clone(),
        external_controller: clash.external_controller.clone(),
        proxy_providers,
        proxy_groups: groups,
        rule_providers: template.rule_providers.clone(),
        rules: rule::assemble(&template.custom_rules, &template.ruleset_rules),
    }
}
