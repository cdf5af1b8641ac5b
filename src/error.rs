//! # 错误类型
//!
//! 配置加载与配置生成两个阶段各自的错误枚举。
//! 编排层（service / main）统一转换为 `anyhow::Error`。

use std::path::PathBuf;

use thiserror::Error;

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件无法读取
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// INI 语法错误
    #[error("invalid settings file {path}: {source}")]
    Ini {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },

    /// YAML 模板语法或结构错误
    #[error("invalid template file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// 字段形状错误，一次性汇总全部问题
    #[error("settings contain {} problem(s):\n  - {}", .0.len(), .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// 配置生成错误（唯一的致命条件）
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenerateError {
    /// 没有配置任何代理提供者
    #[error("no proxy providers configured")]
    NoProviders,
}
