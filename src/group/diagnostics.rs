//! # 生成诊断
//!
//! 可恢复问题不会中断生成：出问题的组被跳过，原因按发现顺序记录在这里，
//! 由调用方决定是写日志、打印还是在严格模式下失败。

use std::fmt;

use serde::Serialize;

/// 严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 预期内的跳过（例如不在提供者支持列表中的地区）
    Info,
    /// 配置可能有误
    Warning,
}

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// 提供者/地区组合不在支持列表中
    NotInAllowList,
    /// 支持列表引用了不存在的地区
    UnknownAllowListRegion,
    /// 地区没有任何关键词
    MissingKeywords,
    /// 自定义组记录字段不足或类型非法
    MalformedCustomGroup,
    /// 引用了不存在的提供者
    UnknownProvider,
    /// 引用了不存在的地区
    UnknownRegion,
    /// 自定义组的目标主组不存在
    UnknownMainGroup,
    /// 负载均衡配置引用了不存在的地区
    UnknownLoadBalanceRegion,
    /// 组名重复
    DuplicateGroupName,
    /// 成员既不是哨兵也不是已定义的组
    DanglingMember,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::NotInAllowList => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// 单条诊断
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 相关的组名/提供者/地区
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.subject, self.message)
    }
}

/// 诊断收集器，显式传入合成器
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.entries.push(Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 按类别过滤
    #[cfg(test)]
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// 输出到日志：Warning -> warn，Info -> debug
    pub fn emit(&self) {
        for d in &self.entries {
            match d.severity() {
                Severity::Warning => tracing::warn!(kind = ?d.kind, "{}", d),
                Severity::Info => tracing::debug!(kind = ?d.kind, "{}", d),
            }
        }
    }
}
