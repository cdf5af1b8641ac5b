//! # 规则装配

use serde_yaml::Value;

use crate::config::CustomRules;

/// 装配最终规则列表：自定义规则在前，规则集引用在后
pub fn assemble(custom: &CustomRules, ruleset_rules: &[String]) -> Vec<String> {
    let mut rules = flatten(custom);
    rules.extend(ruleset_rules.iter().cloned());
    rules
}

/// 按映射顺序展开；非列表的类别值被忽略
fn flatten(custom: &CustomRules) -> Vec<String> {
    match custom {
        CustomRules::Flat(list) => list.clone(),
        CustomRules::Categorized(map) => map
            .values()
            .filter_map(Value::as_sequence)
            .flatten()
            .filter_map(|rule| rule.as_str().map(String::from))
            .collect(),
    }
}
