//! # 代理组合成模块
//!
//! 此模块负责：
//! 1. 把地区关键词编译成节点过滤正则
//! 2. 按策略生成地区组（按提供者拆分 / 按地区合并）
//! 3. 解析自定义组、手动选择组，并组装主组成员
//! 4. 以诊断收集器报告被跳过的组，而不是中断生成

pub mod diagnostics;
pub mod filter;
mod model;
mod synth;

pub use diagnostics::Diagnostics;
pub use model::{GroupKind, GroupSpec};
pub use synth::synthesize;
