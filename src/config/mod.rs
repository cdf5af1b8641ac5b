//! # 配置模块
//!
//! 两个输入文档：
//! 1. 设置文档（INI）：提供者、地区、策略开关
//! 2. 规则模板（YAML）：主组/特殊组、规则集与规则

pub mod settings;
pub mod template;

// 重新导出常用类型
pub use settings::{Provider, Settings};
pub use template::{CustomRules, Template};
