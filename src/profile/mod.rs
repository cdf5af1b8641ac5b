//! # 配置文件模块
//!
//! 把全局设置、提供者描述、代理组、规则集与规则组装成最终的客户端配置，
//! 并按选定格式编码。

mod builder;
mod emit;
mod model;

pub use builder::generate;
pub use emit::{encode, OutputFormat};
