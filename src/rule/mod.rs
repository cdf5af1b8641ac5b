//! # 规则模块
//!
//! 此模块负责：
//! 1. 展开自定义规则（扁平列表或旧的按类别映射）
//! 2. 在其后追加规则集引用
//!
//! 客户端自上而下匹配、首个命中生效，因此声明顺序必须原样保留。

mod assembler;

pub use assembler::assemble;
